//! Affine Image Compositing
//!
//! A source image is stamped onto the canvas through an affine matrix.
//! Every destination pixel inside the transformed source is mapped back
//! through the inverse matrix and the source is sampled there. Source
//! pixel `i` is centered on coordinate `i`, so an identity matrix copies
//! pixels one to one.

use crate::canvas::{Canvas, Mask};
use crate::color::{cu8, Color, Rgba8};
use crate::math::composite_over;
use crate::paths::{Bounds, Point};
use crate::transform::Affine;
use crate::DRAW_EPSILON;

use rayon::prelude::*;

/// How source pixels combine with the canvas
#[derive(Debug,Copy,Clone,PartialEq,Eq,Default)]
pub enum Compose {
    /// Porter-Duff source over destination
    #[default]
    Over,
    /// Source replaces destination
    Copy,
}

impl Compose {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "over" | "src-over" => Some(Compose::Over),
            "copy" | "src" => Some(Compose::Copy),
            _ => None,
        }
    }
    pub fn apply(&self, src: Rgba8, dst: Rgba8) -> Rgba8 {
        match self {
            Compose::Over => composite_over(src, src.alpha(), dst),
            Compose::Copy => src,
        }
    }
}

/// Reconstruct a color at a fractional source position
pub trait Sampler {
    /// Color at `(x, y)`, `None` outside the image
    fn sample(&self, image: &Canvas, x: f64, y: f64) -> Option<Rgba8>;
}

/// Interpolation methods
#[derive(Debug,Copy,Clone,PartialEq,Eq,Default)]
pub enum Interpolate {
    Nearest,
    #[default]
    Bilinear,
    /// Catmull-Rom cubic over a 4x4 neighbourhood
    Bicubic,
    /// Barycentric interpolation within the triangle holding the point
    Mesh,
}

impl Interpolate {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" | "nearest-neighbor" | "integer" => Some(Interpolate::Nearest),
            "bilinear" => Some(Interpolate::Bilinear),
            "bicubic" | "catrom" => Some(Interpolate::Bicubic),
            "mesh" => Some(Interpolate::Mesh),
            _ => None,
        }
    }
}

/// Pixel with coordinates clamped to the image
fn pixel(image: &Canvas, x: i64, y: i64) -> Rgba8 {
    let x = x.clamp(0, image.width as i64 - 1);
    let y = y.clamp(0, image.height as i64 - 1);
    image.get(x, y).unwrap_or_default()
}

/// Weighted sum of pixels in premultiplied space
fn blend(samples: &[(Rgba8, f64)]) -> Rgba8 {
    let (mut r, mut g, mut b, mut a) = (0.0, 0.0, 0.0, 0.0);
    for (c, w) in samples {
        let ca = c.alpha() * w;
        r += c.red() * ca;
        g += c.green() * ca;
        b += c.blue() * ca;
        a += ca;
    }
    if a <= 0.0 {
        return Rgba8::transparent();
    }
    Rgba8::new(cu8(r / a), cu8(g / a), cu8(b / a), cu8(a))
}

fn catmull_rom(t: f64) -> [f64; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

impl Sampler for Interpolate {
    fn sample(&self, image: &Canvas, x: f64, y: f64) -> Option<Rgba8> {
        let (w, h) = (image.width as f64, image.height as f64);
        if image.width == 0 || image.height == 0 ||
            x < -0.5 - DRAW_EPSILON || y < -0.5 - DRAW_EPSILON ||
            x > w - 0.5 + DRAW_EPSILON || y > h - 0.5 + DRAW_EPSILON {
            return None;
        }
        let (x0, y0) = (x.floor(), y.floor());
        let (fx, fy) = (x - x0, y - y0);
        let (i, j) = (x0 as i64, y0 as i64);
        let c = match self {
            Interpolate::Nearest => pixel(image, (x + 0.5).floor() as i64, (y + 0.5).floor() as i64),
            Interpolate::Bilinear => blend(&[
                (pixel(image, i, j), (1.0 - fx) * (1.0 - fy)),
                (pixel(image, i + 1, j), fx * (1.0 - fy)),
                (pixel(image, i, j + 1), (1.0 - fx) * fy),
                (pixel(image, i + 1, j + 1), fx * fy),
            ]),
            Interpolate::Bicubic => {
                let (wx, wy) = (catmull_rom(fx), catmull_rom(fy));
                let mut s = Vec::with_capacity(16);
                for (m, wym) in wy.iter().enumerate() {
                    for (n, wxn) in wx.iter().enumerate() {
                        s.push((pixel(image, i + n as i64 - 1, j + m as i64 - 1), wxn * wym));
                    }
                }
                let c = blend(&s);
                // negative lobes can overshoot on hard edges
                if c.a == 0 { pixel(image, i, j) } else { c }
            }
            Interpolate::Mesh => {
                let (p00, p10) = (pixel(image, i, j), pixel(image, i + 1, j));
                let (p01, p11) = (pixel(image, i, j + 1), pixel(image, i + 1, j + 1));
                if fx + fy <= 1.0 {
                    blend(&[(p00, 1.0 - fx - fy), (p10, fx), (p01, fy)])
                } else {
                    blend(&[(p11, fx + fy - 1.0), (p01, 1.0 - fx), (p10, 1.0 - fy)])
                }
            }
        };
        Some(c)
    }
}

/// Range of `x` on row `y` that maps inside the source
fn affine_edge(inv: &Affine, w: f64, h: f64, y: f64, mut x1: f64, mut x2: f64) -> Option<(f64, f64)> {
    let limits = [(inv.sx, inv.ry * y + inv.tx, w), (inv.rx, inv.sy * y + inv.ty, h)];
    for (a, b, size) in limits {
        let (lo, hi) = (-0.5 - DRAW_EPSILON, size - 0.5 + DRAW_EPSILON);
        if a.abs() < DRAW_EPSILON {
            if b < lo || b > hi {
                return None;
            }
            continue;
        }
        let (z1, z2) = ((lo - b) / a, (hi - b) / a);
        x1 = x1.max(z1.min(z2));
        x2 = x2.min(z1.max(z2));
    }
    if x1 > x2 { None } else { Some((x1, x2)) }
}

/// Stamp `source` onto `canvas` through `m`
///
/// Pixels of the canvas that map outside the source, or that `mask`
/// protects, are left untouched.
pub fn composite_affine<S: Sampler + Sync>(canvas: &mut Canvas, source: &Canvas, m: &Affine,
                                           sampler: &S, compose: Compose,
                                           mask: Option<&Mask>) {
    if source.width == 0 || source.height == 0 || canvas.width == 0 || canvas.height == 0 {
        return;
    }
    let (w, h) = (source.width as f64, source.height as f64);
    let corners = [Point::new(-0.5, -0.5), Point::new(w - 0.5, -0.5),
                   Point::new(-0.5, h - 0.5), Point::new(w - 0.5, h - 0.5)];
    let pts: Vec<Point> = corners.iter().map(|p| m.transform(*p)).collect();
    let b = match Bounds::of(&pts) {
        Some(b) => b,
        None => return,
    };
    let y1 = b.y1.ceil().max(0.0);
    let y2 = b.y2.floor().min(canvas.height as f64 - 1.0);
    let x1 = b.x1.ceil().max(0.0);
    let x2 = b.x2.floor().min(canvas.width as f64 - 1.0);
    if y1 > y2 || x1 > x2 {
        return;
    }
    let inv = m.inverse();
    tracing::debug!(x1, y1, x2, y2, "composite affine");
    let row_bytes = canvas.row_bytes();
    canvas.data.par_chunks_mut(row_bytes)
        .enumerate()
        .skip(y1 as usize)
        .take((y2 - y1) as usize + 1)
        .for_each(|(y, row)| {
            let yf = y as f64;
            let (start, stop) = match affine_edge(&inv, w, h, yf, x1, x2) {
                Some(e) => e,
                None => return,
            };
            let (start, stop) = (start.ceil() as usize, stop.floor() as usize);
            for x in start..=stop {
                if mask.is_some_and(|m| !m.allows(x, y)) {
                    continue;
                }
                let p = inv.transform(Point::new(x as f64, yf));
                if let Some(src) = sampler.sample(source, p.x, p.y) {
                    let px = &mut row[x * 4..x * 4 + 4];
                    let out = compose.apply(src, Rgba8::from_slice(px));
                    px.copy_from_slice(&out.to_array());
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> Canvas {
        let mut s = Canvas::new(2, 2, Rgba8::new(255, 0, 0, 255));
        s.put(1, 1, Rgba8::new(0, 0, 255, 255));
        s
    }

    #[test]
    fn identity_copies() {
        let mut c = Canvas::new(4, 4, Rgba8::white());
        composite_affine(&mut c, &source(), &Affine::identity(), &Interpolate::Nearest, Compose::Over, None);
        assert_eq!(c.get(0, 0), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(c.get(1, 1), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(c.get(2, 2), Some(Rgba8::white()));
    }

    #[test]
    fn translation_moves_image() {
        let mut c = Canvas::new(6, 6, Rgba8::white());
        composite_affine(&mut c, &source(), &Affine::translate(3.0, 2.0), &Interpolate::Bilinear,
                         Compose::Over, None);
        assert_eq!(c.get(4, 3), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(c.get(2, 2), Some(Rgba8::white()));
        assert_eq!(c.get(5, 5), Some(Rgba8::white()));
    }

    #[test]
    fn scaled_nearest() {
        let mut c = Canvas::new(4, 4, Rgba8::white());
        let m = Affine::translate(0.5, 0.5) * Affine::scale(2.0, 2.0);
        composite_affine(&mut c, &source(), &m, &Interpolate::Nearest, Compose::Over, None);
        assert_eq!(c.get(3, 3), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(c.get(0, 1), Some(Rgba8::new(255, 0, 0, 255)));
    }

    #[test]
    fn mask_protects_pixels() {
        let mut maskc = Canvas::new(4, 4, Rgba8::black());
        maskc.put(1, 1, Rgba8::white());
        let mask = Mask::from_canvas(&maskc);
        let mut c = Canvas::new(4, 4, Rgba8::white());
        composite_affine(&mut c, &source(), &Affine::identity(), &Interpolate::Nearest,
                         Compose::Over, Some(&mask));
        assert_eq!(c.get(0, 0), Some(Rgba8::white()));
        assert_eq!(c.get(1, 1), Some(Rgba8::new(0, 0, 255, 255)));
    }

    #[test]
    fn samplers_agree_on_pixel_centers() {
        let s = source();
        for m in [Interpolate::Nearest, Interpolate::Bilinear, Interpolate::Bicubic, Interpolate::Mesh] {
            assert_eq!(m.sample(&s, 1.0, 1.0), Some(Rgba8::new(0, 0, 255, 255)), "{:?}", m);
            assert_eq!(m.sample(&s, 3.0, 0.0), None);
        }
        let mid = Interpolate::Bilinear.sample(&s, 0.5, 0.0).unwrap();
        assert_eq!(mid, Rgba8::new(255, 0, 0, 255));
    }
}
