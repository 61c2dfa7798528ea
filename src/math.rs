//! Pixel Blending

use crate::color::{cu8, Color, Rgba8};
use crate::paths::perceptible_reciprocal;

/// Interpolate a value between two end points using fixed point math
///
/// See agg_color_rgba.h:454 of agg version 2.4
///
pub fn lerp_u8(p: u8, q: u8, a: u8) -> u8 {
    let base_shift = 8;
    let base_msb = 1 << (base_shift - 1);
    let v = if p > q { 1 } else { 0 };
    let (q,p,a) = (i32::from(q), i32::from(p), i32::from(a));
    let t0 : i32  = (q - p) * a + base_msb - v; // Signed multiplication
    let t1 : i32 = ((t0>>base_shift) + t0) >> base_shift;
    (p + t1) as u8
}

/// Multiply two u8 values using fixed point math
///
/// See agg_color_rgba.h:395
pub fn multiply_u8(a: u8, b: u8) -> u8 {
    let base_shift = 8;
    let base_msb = 1 << (base_shift - 1);
    let (a,b) = (u32::from(a), u32::from(b));
    let t : u32  = a * b + base_msb;
    let tt : u32 = ((t >> base_shift) + t) >> base_shift;
    tt as u8
}

/// Interpolate every channel of two colors, `t` in [0,1]
pub fn lerp_color(p: Rgba8, q: Rgba8, t: f64) -> Rgba8 {
    let a = cu8(t);
    Rgba8::new(lerp_u8(p.r, q.r, a), lerp_u8(p.g, q.g, a),
               lerp_u8(p.b, q.b, a), lerp_u8(p.a, q.a, a))
}

/// Scale the alpha channel of a color by `opacity` in [0,1]
pub fn scale_alpha(c: Rgba8, opacity: f64) -> Rgba8 {
    c.with_alpha(multiply_u8(c.a, cu8(opacity)))
}

/// Composite `src` with effective opacity `alpha` over `dst`
///
/// `alpha` already includes the source color's own alpha. Color channels
/// are the normalized Porter-Duff "over" of the two pixels:
///
/// ```text
/// gamma = Sa + Da - Sa * Da
/// out   = (Sa * Sc + Da * Dc * (1 - Sa)) / gamma
/// ```
///
pub fn composite_over(src: Rgba8, alpha: f64, dst: Rgba8) -> Rgba8 {
    if alpha <= 0.0 {
        return dst;
    }
    let sa = alpha.min(1.0);
    let da = dst.alpha();
    let gamma = sa + da - sa * da;
    let g = perceptible_reciprocal(gamma);
    let over = |s: f64, d: f64| cu8(g * (sa * s + da * d * (1.0 - sa)));
    Rgba8::new(over(src.red(), dst.red()),
               over(src.green(), dst.green()),
               over(src.blue(), dst.blue()),
               cu8(gamma))
}
