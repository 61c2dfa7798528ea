//! Paint Sources
//!
//! A paint answers "what color goes at pixel (x,y)". Solid paints return a
//! single color; pattern paints tile an image across the canvas. Gradients
//! are rendered once into a canvas sized tile and used as patterns.

use crate::canvas::Canvas;
use crate::color::{Color, Rgba8};
use crate::math::{lerp_color, scale_alpha};
use crate::paths::Point;

use std::sync::Arc;

/// Image repeated across the canvas
#[derive(Debug,Clone,PartialEq)]
pub struct Tile {
    pub image: Canvas,
    /// Device position of the tile's top left corner
    pub origin: Point,
}

impl Tile {
    pub fn new(image: Canvas, origin: Point) -> Self {
        Self { image, origin }
    }
    fn color_at(&self, x: i64, y: i64) -> Rgba8 {
        let (w, h) = (self.image.width as i64, self.image.height as i64);
        if w == 0 || h == 0 {
            return Rgba8::transparent();
        }
        let tx = (x - self.origin.x.round() as i64).rem_euclid(w);
        let ty = (y - self.origin.y.round() as i64).rem_euclid(h);
        self.image.get(tx, ty).unwrap_or_default()
    }
}

/// Fill or stroke paint
#[derive(Debug,Clone,PartialEq,Default)]
pub enum Paint {
    #[default]
    None,
    Solid(Rgba8),
    Pattern(Arc<Tile>),
}

impl Paint {
    /// Color at device pixel (x,y)
    pub fn color_at(&self, x: i64, y: i64) -> Rgba8 {
        match self {
            Paint::None => Rgba8::transparent(),
            Paint::Solid(c) => *c,
            Paint::Pattern(t) => t.color_at(x, y),
        }
    }
    /// Can this paint change a pixel
    pub fn is_visible(&self) -> bool {
        match self {
            Paint::None => false,
            Paint::Solid(c) => c.is_visible(),
            Paint::Pattern(_) => true,
        }
    }
    /// Same paint with its alpha multiplied by `opacity`
    pub fn with_opacity(&self, opacity: f64) -> Paint {
        if opacity >= 1.0 {
            return self.clone();
        }
        match self {
            Paint::None => Paint::None,
            Paint::Solid(c) => Paint::Solid(scale_alpha(*c, opacity)),
            Paint::Pattern(t) => {
                let mut image = t.image.clone();
                for px in image.data.chunks_exact_mut(4) {
                    let c = scale_alpha(Rgba8::from_slice(px), opacity);
                    px[3] = c.alpha8();
                }
                Paint::Pattern(Arc::new(Tile::new(image, t.origin)))
            }
        }
    }
}

/// Geometry of a gradient ramp
#[derive(Debug,Copy,Clone,PartialEq)]
pub enum GradientKind {
    /// Colors vary along the vector `start` -> `end`
    Linear { start: Point, end: Point },
    /// Colors vary with distance from `center`
    Radial { center: Point, radius: f64 },
}

/// Color ramp with stops in [0,1]; colors pad beyond the end stops
#[derive(Debug,Clone,PartialEq)]
pub struct Gradient {
    pub kind: GradientKind,
    pub stops: Vec<(f64, Rgba8)>,
}

impl Gradient {
    pub fn new(kind: GradientKind) -> Self {
        Self { kind, stops: vec![] }
    }
    /// Add a stop, keeping stops ordered by offset
    pub fn add_stop(&mut self, offset: f64, color: Rgba8) {
        let offset = offset.clamp(0.0, 1.0);
        let i = self.stops.partition_point(|(o, _)| *o <= offset);
        self.stops.insert(i, (offset, color));
    }
    /// Ramp position of point `p`
    fn position(&self, p: Point) -> f64 {
        let t = match self.kind {
            GradientKind::Linear { start, end } => {
                let (dx, dy) = (end.x - start.x, end.y - start.y);
                let len2 = dx * dx + dy * dy;
                if len2 <= 0.0 {
                    0.0
                } else {
                    ((p.x - start.x) * dx + (p.y - start.y) * dy) / len2
                }
            }
            GradientKind::Radial { center, radius } => {
                if radius <= 0.0 { 1.0 } else { p.distance(&center) / radius }
            }
        };
        t.clamp(0.0, 1.0)
    }
    /// Ramp color at position `t`
    pub fn color_at(&self, t: f64) -> Rgba8 {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return Rgba8::transparent(),
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        for w in self.stops.windows(2) {
            let ((o0, c0), (o1, c1)) = (w[0], w[1]);
            if t <= o1 {
                let span = o1 - o0;
                let f = if span <= 0.0 { 1.0 } else { (t - o0) / span };
                return lerp_color(c0, c1, f);
            }
        }
        last.1
    }
    /// Render the ramp over a `width` x `height` image sampled at pixel
    /// centers
    pub fn render(&self, width: usize, height: usize) -> Canvas {
        let mut c = Canvas::new(width, height, Rgba8::transparent());
        for y in 0..height {
            for x in 0..width {
                let t = self.position(Point::new(x as f64, y as f64));
                c.put(x as i64, y as i64, self.color_at(t));
            }
        }
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_tiles_from_origin() {
        let mut img = Canvas::new(2, 2, Rgba8::black());
        img.put(0, 0, Rgba8::white());
        let p = Paint::Pattern(Arc::new(Tile::new(img, Point::new(1., 1.))));
        assert_eq!(p.color_at(1, 1), Rgba8::white());
        assert_eq!(p.color_at(3, 5), Rgba8::white());
        assert_eq!(p.color_at(2, 1), Rgba8::black());
        assert_eq!(p.color_at(-1, -1), Rgba8::white());
    }

    #[test]
    fn opacity_scales_solid() {
        let p = Paint::Solid(Rgba8::black()).with_opacity(0.5);
        assert_eq!(p, Paint::Solid(Rgba8::new(0, 0, 0, 128)));
        assert!(!Paint::None.is_visible());
    }

    #[test]
    fn linear_ramp_pads() {
        let mut g = Gradient::new(GradientKind::Linear { start: Point::new(0., 0.), end: Point::new(10., 0.) });
        g.add_stop(1.0, Rgba8::white());
        g.add_stop(0.0, Rgba8::black());
        let c = g.render(20, 1);
        assert_eq!(c.get(0, 0), Some(Rgba8::black()));
        assert_eq!(c.get(15, 0), Some(Rgba8::white()));
        let mid = c.get(5, 0).unwrap();
        assert!(mid.r > 100 && mid.r < 155);
    }

    #[test]
    fn radial_ramp() {
        let mut g = Gradient::new(GradientKind::Radial { center: Point::new(5., 5.), radius: 5. });
        g.add_stop(0.0, Rgba8::white());
        g.add_stop(1.0, Rgba8::new(255, 0, 0, 255));
        let c = g.render(11, 11);
        assert_eq!(c.get(5, 5), Some(Rgba8::white()));
        assert_eq!(c.get(0, 0), Some(Rgba8::new(255, 0, 0, 255)));
    }
}
