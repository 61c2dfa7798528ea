//! Scanline Opacity
//!
//! Coverage of a pixel center by a [`Polygon`] is computed directly from
//! the edge list:
//!
//!   - the fill is opaque where the winding number says the pixel is
//!     inside, and fades out over one pixel outside the boundary
//!   - the stroke is opaque within `mid - 0.5` of any visible segment and
//!     fades out to zero at `mid + 0.75`
//!
//! A [`Sweep`] holds the per-edge cursors that make repeated queries along
//! a row cheap. Cursors only move forward, so each worker thread owns its
//! own sweep and visits rows top to bottom.

use crate::polygon::Polygon;
use crate::paths::perceptible_reciprocal;

/// Rule deciding which winding numbers are inside
#[derive(Debug,Copy,Clone,PartialEq,Eq,Default)]
pub enum FillRule {
    EvenOdd,
    #[default]
    NonZero,
}

impl FillRule {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "evenodd" => Some(FillRule::EvenOdd),
            "nonzero" => Some(FillRule::NonZero),
            _ => None,
        }
    }
    pub fn inside(&self, winding: i32) -> bool {
        match self {
            FillRule::EvenOdd => winding.abs() & 1 != 0,
            FillRule::NonZero => winding != 0,
        }
    }
}

#[derive(Debug,Copy,Clone)]
struct Cursor {
    /// Row the cursor was last positioned for
    scanline: f64,
    /// First segment that can touch `scanline`
    highwater: usize,
}

impl Default for Cursor {
    fn default() -> Self {
        Self { scanline: -1.0, highwater: 0 }
    }
}

/// Per-worker sweep state over a shared [`Polygon`]
#[derive(Debug,Clone)]
pub struct Sweep {
    cursors: Vec<Cursor>,
    /// Indices of edges not yet passed by the sweep, in sorted order
    live: Vec<usize>,
    last_y: f64,
}

impl Sweep {
    pub fn new(poly: &Polygon) -> Self {
        Self {
            cursors: vec![Cursor::default(); poly.len()],
            live: (0..poly.len()).collect(),
            last_y: f64::NEG_INFINITY,
        }
    }

    fn reset(&mut self) {
        self.cursors.iter_mut().for_each(|c| *c = Cursor::default());
        self.live = (0..self.cursors.len()).collect();
    }

    /// Fill and stroke opacity at pixel center `(x, y)`
    ///
    /// `mid` is half the stroke width in device units. When `fill` is false
    /// only the stroke is evaluated.
    pub fn opacity(&mut self, poly: &Polygon, mid: f64, fill: bool, rule: FillRule,
                   x: f64, y: f64) -> (f64, f64) {
        if y < self.last_y {
            self.reset();
        }
        self.last_y = y;
        let mut stroke_alpha: f64 = 0.0;
        let mut subpath_alpha: f64 = 0.0;
        let mut k = 0;
        while k < self.live.len() {
            let j = self.live[k];
            let e = &poly.edges[j];
            if y <= e.bounds.y1 - mid - 0.5 {
                break;
            }
            if y > e.bounds.y2 + mid + 0.5 {
                self.live.remove(k);
                continue;
            }
            k += 1;
            if x <= e.bounds.x1 - mid - 0.5 || x > e.bounds.x2 + mid + 0.5 {
                continue;
            }
            let cursor = &mut self.cursors[j];
            let pts = &e.points;
            for i in cursor.highwater.max(1)..pts.len() {
                if y <= pts[i - 1].y - mid - 0.5 {
                    break;
                }
                if y > pts[i].y + mid + 0.5 {
                    continue;
                }
                if cursor.scanline != y {
                    cursor.scanline = y;
                    cursor.highwater = i;
                }
                // squared distance from the pixel center to the segment
                let (q, q1) = (pts[i - 1], pts[i]);
                let (dx, dy) = (q1.x - q.x, q1.y - q.y);
                let beta = dx * (x - q.x) + dy * (y - q.y);
                let alpha = dx * dx + dy * dy;
                let distance = if beta < 0.0 {
                    (x - q.x).powi(2) + (y - q.y).powi(2)
                } else if beta > alpha {
                    (x - q1.x).powi(2) + (y - q1.y).powi(2)
                } else {
                    let cross = dx * (y - q.y) - dy * (x - q.x);
                    perceptible_reciprocal(alpha) * cross * cross
                };
                if !e.ghostline && stroke_alpha < 1.0 &&
                    distance <= (mid + 0.75) * (mid + 0.75) {
                    if distance <= (mid - 0.25) * (mid - 0.25) {
                        stroke_alpha = 1.0;
                    } else {
                        let a = distance.sqrt() - mid - 0.5;
                        stroke_alpha = stroke_alpha.max((a - 0.25) * (a - 0.25));
                    }
                }
                if !fill || distance > 1.0 || subpath_alpha >= 1.0 {
                    continue;
                }
                if distance <= 0.0 {
                    subpath_alpha = 1.0;
                    continue;
                }
                let a = distance.sqrt() - 1.0;
                subpath_alpha = subpath_alpha.max(a * a);
            }
        }
        if !fill {
            return (0.0, stroke_alpha);
        }
        if subpath_alpha >= 1.0 {
            return (1.0, stroke_alpha);
        }
        let mut winding = 0;
        for &j in &self.live {
            let e = &poly.edges[j];
            if y <= e.bounds.y1 {
                break;
            }
            if y > e.bounds.y2 || x <= e.bounds.x1 {
                continue;
            }
            if x > e.bounds.x2 {
                winding += e.winding();
                continue;
            }
            let pts = &e.points;
            let mut i = self.cursors[j].highwater.max(1);
            while i < pts.len() - 1 && y > pts[i].y {
                i += 1;
            }
            let (q, q1) = (pts[i - 1], pts[i]);
            if (q1.x - q.x) * (y - q.y) <= (q1.y - q.y) * (x - q.x) {
                winding += e.winding();
            }
        }
        let fill_alpha = if rule.inside(winding) { 1.0 } else { subpath_alpha };
        (fill_alpha, stroke_alpha)
    }
}

/// Fill and stroke opacity of a single pixel, without a reusable sweep
pub fn fill_and_stroke_opacity(poly: &Polygon, mid: f64, rule: FillRule,
                               x: f64, y: f64) -> (f64, f64) {
    Sweep::new(poly).opacity(poly, mid, true, rule, x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{to_path, Point};
    use crate::polygon::build_edges;

    fn poly(subpaths: &[Vec<Point>]) -> Polygon {
        build_edges(&to_path(subpaths)).unwrap()
    }

    fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Vec<Point> {
        crate::trace::trace_rectangle(Point::new(x1, y1), Point::new(x2, y2))
    }

    #[test]
    fn interior_and_exterior() {
        let p = poly(&[rect(10., 10., 20., 20.)]);
        for rule in [FillRule::EvenOdd, FillRule::NonZero] {
            assert_eq!(fill_and_stroke_opacity(&p, 0.5, rule, 15., 15.).0, 1.0);
            assert_eq!(fill_and_stroke_opacity(&p, 0.5, rule, 25., 25.).0, 0.0);
            assert_eq!(fill_and_stroke_opacity(&p, 0.5, rule, 2., 15.).0, 0.0);
        }
    }

    #[test]
    fn sweep_matches_fresh_queries() {
        let p = poly(&[rect(3., 2., 17., 9.)]);
        let mut s = Sweep::new(&p);
        for y in 0..12 {
            for x in 0..20 {
                let (x, y) = (x as f64, y as f64);
                let a = s.opacity(&p, 0.5, true, FillRule::NonZero, x, y);
                let b = fill_and_stroke_opacity(&p, 0.5, FillRule::NonZero, x, y);
                assert_eq!(a, b, "at {},{}", x, y);
            }
        }
    }

    #[test]
    fn even_odd_leaves_hole() {
        let p = poly(&[rect(0., 0., 30., 30.), rect(10., 10., 20., 20.)]);
        assert_eq!(fill_and_stroke_opacity(&p, 0.5, FillRule::EvenOdd, 15., 15.).0, 0.0);
        assert_eq!(fill_and_stroke_opacity(&p, 0.5, FillRule::NonZero, 15., 15.).0, 1.0);
        assert_eq!(fill_and_stroke_opacity(&p, 0.5, FillRule::EvenOdd, 5., 5.).0, 1.0);
    }

    #[test]
    fn stroke_ramps_with_distance() {
        let p = poly(&[vec![Point::new(0., 10.), Point::new(40., 10.)]]);
        let mid = 2.0;
        let at = |y: f64| Sweep::new(&p).opacity(&p, mid, false, FillRule::NonZero, 20., y).1;
        assert_eq!(at(10.), 1.0);
        assert_eq!(at(11.), 1.0);
        assert!(at(12.5) > 0.0 && at(12.5) < 1.0);
        assert_eq!(at(13.), 0.0);
    }

    #[test]
    fn ghostline_is_not_stroked() {
        // open "L" shape; the closing diagonal must stay invisible
        let p = poly(&[vec![Point::new(0., 0.), Point::new(0., 20.), Point::new(20., 20.)]]);
        let (_, s) = Sweep::new(&p).opacity(&p, 0.5, false, FillRule::NonZero, 10., 10.);
        assert_eq!(s, 0.0);
    }

    #[test]
    fn orientation_does_not_change_fill() {
        let cw = poly(&[vec![Point::new(0., 0.), Point::new(10., 0.), Point::new(10., 10.), Point::new(0., 0.)]]);
        let ccw = poly(&[vec![Point::new(0., 0.), Point::new(10., 10.), Point::new(10., 0.), Point::new(0., 0.)]]);
        for (x, y) in [(5., 2.), (8., 3.), (5., 5.), (2., 6.)] {
            assert_eq!(fill_and_stroke_opacity(&cw, 0.5, FillRule::NonZero, x, y),
                       fill_and_stroke_opacity(&ccw, 0.5, FillRule::NonZero, x, y));
        }
    }
}
