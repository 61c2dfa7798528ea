//! Path Stroking
//!
//! A stroke is drawn by filling its outline. The outline of an open path is
//! a single ring: the left offset walked forward, the end cap, the right
//! offset walked backward and the start cap. A closed path produces two
//! rings of opposite orientation, which fill as an annulus under the
//! nonzero rule.
//!
//! # Example
//!
//!     use mvg::{Stroke, LineCap, LineJoin, Point};
//!
//!     let path = vec![Point::new(0.0, 0.0),
//!                     Point::new(100.0, 100.0),
//!                     Point::new(200.0, 50.0)];
//!
//!     let mut stroke = Stroke::new();
//!     stroke.width(2.5);
//!     stroke.line_cap(LineCap::Square);
//!     stroke.line_join(LineJoin::Miter);
//!     stroke.miter_limit(5.0);
//!
//!     let rings = stroke.outline(&path);
//!     assert_eq!(rings.len(), 1);
//!

use crate::paths::Point;
use crate::trace::{ellipse_step, MAX_ARC_POINTS};

use std::f64::consts::PI;

/// Line End or Cap Style
#[derive(Debug,Copy,Clone,PartialEq,Eq,Default)]
pub enum LineCap {
    #[default]
    Butt,
    Square,
    Round,
}

impl LineCap {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "butt" => Some(LineCap::Butt),
            "square" => Some(LineCap::Square),
            "round" => Some(LineCap::Round),
            _ => None,
        }
    }
}

/// Lines Join Style on the outside
#[derive(Debug,Copy,Clone,PartialEq,Eq,Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "miter" => Some(LineJoin::Miter),
            "round" => Some(LineJoin::Round),
            "bevel" => Some(LineJoin::Bevel),
            _ => None,
        }
    }
}

/// Consecutive points closer than this are merged
const MIN_SEGMENT: f64 = 1.0e-6;

/// Stroke outline builder
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct Stroke {
    /// Half the line width, in device units
    width: f64,
    /// Maximum ratio of miter length to half the line width
    miter_limit: f64,
    /// Lower bound on the inner miter ratio, 1.01
    inner_miter_limit: f64,
    line_cap: LineCap,
    line_join: LineJoin,
}

impl Default for Stroke {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! prev {
    ($i:expr, $n:expr) => ( ($i + $n - 1) % $n )
}
macro_rules! next {
    ($i:expr, $n:expr) => ( ($i + 1) % $n )
}

impl Stroke {
    pub fn new() -> Self {
        Self {
            width: 0.5,
            miter_limit: 10.0,
            inner_miter_limit: 1.01,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
        }
    }
    /// Set the Stroke Width
    pub fn width(&mut self, width: f64) {
        self.width = width.abs() / 2.0;
    }
    /// Half the stroke width
    pub fn mid(&self) -> f64 {
        self.width
    }
    /// Set Line cap style
    pub fn line_cap(&mut self, line_cap: LineCap) {
        self.line_cap = line_cap;
    }
    /// Set Line Join style
    pub fn line_join(&mut self, line_join: LineJoin) {
        self.line_join = line_join;
    }
    /// Set miter limit; values below 1 are raised to 1
    pub fn miter_limit(&mut self, miter_limit: f64) {
        self.miter_limit = miter_limit.max(1.0);
    }

    /// Offset of the left side of the segment `p0` -> `p1`
    fn normal(&self, p0: &Point, p1: &Point) -> Point {
        let len = p0.distance(p1);
        Point::new(self.width * (p1.y - p0.y) / len, -self.width * (p1.x - p0.x) / len)
    }

    /// Points of an arc about `c` from offset `a` to offset `b`, turning
    /// with increasing angle
    fn calc_arc(&self, c: &Point, a: Point, b: Point) -> Vec<Point> {
        let mut out = vec![Point::new(c.x + a.x, c.y + a.y)];
        let mut a1 = a.y.atan2(a.x);
        let mut a2 = b.y.atan2(b.x);
        if a1 > a2 {
            a2 += 2.0 * PI;
        }
        let da = ellipse_step(Point::new(self.width, self.width));
        let n = (((a2 - a1) / da) as usize).min(MAX_ARC_POINTS);
        let da = (a2 - a1) / (n + 1) as f64;
        for _ in 0..n {
            a1 += da;
            out.push(Point::new(c.x + a1.cos() * self.width, c.y + a1.sin() * self.width));
        }
        out.push(Point::new(c.x + b.x, c.y + b.y));
        out
    }

    /// Cap at `v0` for a path leaving towards `v1`
    ///
    /// Returns the cap from the right offset around to the left offset.
    fn calc_cap(&self, v0: &Point, v1: &Point) -> Vec<Point> {
        let n = self.normal(v0, v1);
        let len = v0.distance(v1);
        // unit direction scaled by the half width
        let d = Point::new(self.width * (v1.x - v0.x) / len, self.width * (v1.y - v0.y) / len);
        match self.line_cap {
            LineCap::Butt => vec![Point::new(v0.x - n.x, v0.y - n.y),
                                  Point::new(v0.x + n.x, v0.y + n.y)],
            LineCap::Square => vec![Point::new(v0.x - n.x - d.x, v0.y - n.y - d.y),
                                    Point::new(v0.x + n.x - d.x, v0.y + n.y - d.y)],
            LineCap::Round => self.calc_arc(v0, Point::new(-n.x, -n.y), n),
        }
    }

    /// Intersection of the lines a-b and c-d, `None` if parallel
    fn calc_intersection(a: Point, b: Point, c: Point, d: Point) -> Option<Point> {
        let intersection_epsilon = 1.0e-30;
        let num = (a.y - c.y) * (d.x - c.x) - (a.x - c.x) * (d.y - c.y);
        let den = (b.x - a.x) * (d.y - c.y) - (b.y - a.y) * (d.x - c.x);
        if den.abs() < intersection_epsilon {
            return None;
        }
        let r = num / den;
        Some(Point::new(a.x + r * (b.x - a.x), a.y + r * (b.y - a.y)))
    }

    /// Miter corner, or the bevel corners when the miter point lies
    /// farther than `limit` half widths from the vertex
    fn calc_miter(&self, p0: &Point, p1: &Point, p2: &Point,
                  n1: Point, n2: Point, limit: f64) -> Vec<Point> {
        let off = |p: &Point, n: Point| Point::new(p.x + n.x, p.y + n.y);
        let bevel = vec![off(p1, n1), off(p1, n2)];
        match Self::calc_intersection(off(p0, n1), off(p1, n1), off(p1, n2), off(p2, n2)) {
            Some(i) => {
                let d2 = (i.x - p1.x).powi(2) + (i.y - p1.y).powi(2);
                if d2 <= limit * limit * self.width * self.width {
                    vec![i]
                } else {
                    bevel
                }
            }
            None => {
                // parallel offsets: either a straight continuation or a
                // complete reversal
                let d1 = Point::new(p1.x - p0.x, p1.y - p0.y);
                let d2 = Point::new(p2.x - p1.x, p2.y - p1.y);
                if d1.x * d2.x + d1.y * d2.y > 0.0 {
                    vec![off(p1, n1)]
                } else {
                    bevel
                }
            }
        }
    }

    /// Left side join at `p1` between `p0` -> `p1` and `p1` -> `p2`
    fn calc_join(&self, p0: &Point, p1: &Point, p2: &Point) -> Vec<Point> {
        let n1 = self.normal(p0, p1);
        let n2 = self.normal(p1, p2);
        let turn = (p1.x - p0.x) * (p2.y - p1.y) - (p1.y - p0.y) * (p2.x - p1.x);
        if turn < 0.0 {
            // Inner Join
            let len1 = p0.distance(p1);
            let len2 = p1.distance(p2);
            let limit = (len1.min(len2) / self.width).max(self.inner_miter_limit);
            return self.calc_miter(p0, p1, p2, n1, n2, limit);
        }
        // Outer Join
        match self.line_join {
            LineJoin::Miter => self.calc_miter(p0, p1, p2, n1, n2, self.miter_limit),
            LineJoin::Bevel => {
                if turn == 0.0 {
                    self.calc_miter(p0, p1, p2, n1, n2, 1.0)
                } else {
                    vec![Point::new(p1.x + n1.x, p1.y + n1.y), Point::new(p1.x + n2.x, p1.y + n2.y)]
                }
            }
            LineJoin::Round => self.calc_arc(p1, n1, n2),
        }
    }

    /// Outline of a lone point: a square or circle for square or round
    /// caps, nothing for butt caps
    fn dot(&self, p: &Point) -> Vec<Vec<Point>> {
        let w = self.width;
        let ring = match self.line_cap {
            LineCap::Butt => return vec![],
            LineCap::Square => vec![Point::new(p.x - w, p.y - w), Point::new(p.x + w, p.y - w),
                                    Point::new(p.x + w, p.y + w), Point::new(p.x - w, p.y + w)],
            LineCap::Round => self.calc_arc(p, Point::new(w, 0.0), Point::new(w, -1.0e-12)),
        };
        vec![close(ring)]
    }

    /// Fillable outline of one subpath
    ///
    /// The rings are closed and should be filled with the nonzero rule.
    pub fn outline(&self, points: &[Point]) -> Vec<Vec<Point>> {
        let v = clean_path(points);
        if v.is_empty() || self.width <= 0.0 {
            return vec![];
        }
        if v.len() == 1 {
            return self.dot(&v[0]);
        }
        let closed = v.len() > 2 && v[0].distance(&v[v.len() - 1]) < MIN_SEGMENT;
        if closed {
            let n = v.len() - 1;
            let mut outf = vec![];
            for i in 0..n {
                outf.extend(self.calc_join(&v[prev!(i, n)], &v[i], &v[next!(i, n)]));
            }
            let mut outb = vec![];
            for i in (0..n).rev() {
                outb.extend(self.calc_join(&v[next!(i, n)], &v[i], &v[prev!(i, n)]));
            }
            return vec![close(outf), close(outb)];
        }
        let n = v.len();
        let mut out = self.calc_cap(&v[0], &v[1]);
        for i in 1..n - 1 {
            out.extend(self.calc_join(&v[i - 1], &v[i], &v[i + 1]));
        }
        out.extend(self.calc_cap(&v[n - 1], &v[n - 2]));
        for i in (1..n - 1).rev() {
            out.extend(self.calc_join(&v[i + 1], &v[i], &v[i - 1]));
        }
        vec![close(out)]
    }
}

fn close(mut ring: Vec<Point>) -> Vec<Point> {
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    ring
}

/// Remove repeated vertices
///
/// A closed path keeps exactly one copy of its first point at the end.
fn clean_path(v: &[Point]) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(v.len());
    for p in v {
        match out.last() {
            Some(q) if q.distance(p) < MIN_SEGMENT => {}
            _ => out.push(*p),
        }
    }
    out
}

/// Extend both ends of an open path by `mid` along its end segments
///
/// Used when a square-capped stroke is drawn directly instead of through
/// its outline.
pub fn square_cap(points: &[Point], mid: f64) -> Vec<Point> {
    let mut v = points.to_vec();
    let n = v.len();
    if n < 2 || v[0].same(&v[n - 1]) {
        return v;
    }
    let extend = |a: Point, b: Point| {
        let d = a.distance(&b);
        Point::new(a.x + mid * (a.x - b.x) / d, a.y + mid * (a.y - b.y) / d)
    };
    if let Some(q) = v[1..].iter().find(|q| q.distance(&v[0]) > MIN_SEGMENT).copied() {
        v[0] = extend(v[0], q);
    }
    if let Some(q) = v[..n - 1].iter().rev().find(|q| q.distance(&v[n - 1]) > MIN_SEGMENT).copied() {
        v[n - 1] = extend(v[n - 1], q);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::Bounds;

    fn stroke(width: f64, cap: LineCap, join: LineJoin) -> Stroke {
        let mut s = Stroke::new();
        s.width(width);
        s.line_cap(cap);
        s.line_join(join);
        s
    }

    fn bounds(rings: &[Vec<Point>]) -> Bounds {
        rings.iter().filter_map(|r| Bounds::of(r)).reduce(|a, b| a.union(&b)).unwrap()
    }

    fn near(a: Bounds, b: Bounds) -> bool {
        (a.x1 - b.x1).abs() < 1e-9 && (a.y1 - b.y1).abs() < 1e-9 &&
            (a.x2 - b.x2).abs() < 1e-9 && (a.y2 - b.y2).abs() < 1e-9
    }

    #[test]
    fn butt_cap_line() {
        let r = stroke(4.0, LineCap::Butt, LineJoin::Miter)
            .outline(&[Point::new(0., 0.), Point::new(10., 0.)]);
        assert!(near(bounds(&r), Bounds::new(0., -2., 10., 2.)));
    }

    #[test]
    fn square_cap_extends_half_width() {
        let r = stroke(4.0, LineCap::Square, LineJoin::Miter)
            .outline(&[Point::new(0., 0.), Point::new(10., 0.)]);
        assert!(near(bounds(&r), Bounds::new(-2., -2., 12., 2.)));
    }

    #[test]
    fn round_cap_is_half_circle() {
        let r = stroke(4.0, LineCap::Round, LineJoin::Miter)
            .outline(&[Point::new(0., 0.), Point::new(10., 0.)]);
        let b = bounds(&r);
        assert!(b.x1 < -1.9 && b.x1 >= -2.0 - 1e-9);
        assert!(b.x2 > 11.9 && b.x2 <= 12.0 + 1e-9);
        for p in &r[0] {
            if p.x < 0.0 {
                assert!((p.distance(&Point::new(0., 0.)) - 2.).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn miter_corner_on_right_angle() {
        let r = stroke(2.0, LineCap::Butt, LineJoin::Miter)
            .outline(&[Point::new(0., 0.), Point::new(10., 0.), Point::new(10., 10.)]);
        assert!(r[0].iter().any(|p| p.distance(&Point::new(11., -1.)) < 1e-9));
    }

    #[test]
    fn sharp_miter_falls_back_to_bevel() {
        let path = [Point::new(0., 0.), Point::new(20., 1.), Point::new(0., 2.)];
        let mut miter = stroke(2.0, LineCap::Butt, LineJoin::Miter);
        miter.miter_limit(4.0);
        let bevel = stroke(2.0, LineCap::Butt, LineJoin::Bevel);
        assert_eq!(miter.outline(&path), bevel.outline(&path));
    }

    #[test]
    fn round_join_stays_on_radius() {
        let r = stroke(6.0, LineCap::Butt, LineJoin::Round)
            .outline(&[Point::new(0., 0.), Point::new(10., 0.), Point::new(10., 10.)]);
        let corner = Point::new(10., 0.);
        let around: Vec<_> = r[0].iter().filter(|p| p.x > 10.0 && p.y < 0.0).collect();
        assert!(!around.is_empty());
        for p in around {
            assert!((p.distance(&corner) - 3.).abs() < 1e-9);
        }
    }

    #[test]
    fn closed_path_gives_two_rings() {
        let sq = [Point::new(0., 0.), Point::new(10., 0.), Point::new(10., 10.),
                  Point::new(0., 10.), Point::new(0., 0.)];
        let r = stroke(2.0, LineCap::Butt, LineJoin::Miter).outline(&sq);
        assert_eq!(r.len(), 2);
        assert!(near(bounds(&r), Bounds::new(-1., -1., 11., 11.)));
    }

    #[test]
    fn degenerate_point() {
        let p = [Point::new(5., 5.), Point::new(5., 5.)];
        assert!(stroke(4.0, LineCap::Butt, LineJoin::Miter).outline(&p).is_empty());
        let sq = stroke(4.0, LineCap::Square, LineJoin::Miter).outline(&p);
        assert_eq!(bounds(&sq), Bounds::new(3., 3., 7., 7.));
    }

    #[test]
    fn square_cap_path_extension() {
        let v = square_cap(&[Point::new(0., 0.), Point::new(0., 0.), Point::new(10., 0.)], 2.0);
        assert_eq!(v[0], Point::new(-2., 0.));
        assert_eq!(v[2], Point::new(12., 0.));
    }
}
