//! Points, Bounds and Flattened Vector Paths

use crate::DRAW_EPSILON;

/// Point in device (or user) space
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
    /// Points closer than the drawing epsilon on both axes are the same
    pub fn same(&self, other: &Point) -> bool {
        (self.x - other.x).abs() < DRAW_EPSILON && (self.y - other.y).abs() < DRAW_EPSILON
    }
    pub fn distance(&self, other: &Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// Reciprocal that stays finite for vanishing values
pub fn perceptible_reciprocal(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    if sign * x >= 1.0e-12 {
        1.0 / x
    } else {
        sign / 1.0e-12
    }
}

/// Axis aligned bounding box
#[derive(Debug,Default,Copy,Clone,PartialEq)]
pub struct Bounds {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Bounds {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }
    pub fn from_point(p: Point) -> Self {
        Self::new(p.x, p.y, p.x, p.y)
    }
    /// Bounds of a point set, `None` when empty
    pub fn of(points: &[Point]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut b = Bounds::from_point(*first);
        for p in rest {
            b.include(*p);
        }
        Some(b)
    }
    pub fn include(&mut self, p: Point) {
        self.x1 = self.x1.min(p.x);
        self.y1 = self.y1.min(p.y);
        self.x2 = self.x2.max(p.x);
        self.y2 = self.y2.max(p.y);
    }
    pub fn union(&self, b: &Bounds) -> Bounds {
        Bounds::new(self.x1.min(b.x1), self.y1.min(b.y1),
                    self.x2.max(b.x2), self.y2.max(b.y2))
    }
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }
}

/// Role of a point in a flattened path
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum PathCode {
    /// Start of a closed subpath
    MoveTo,
    /// Start of a subpath that does not return to its first point
    OpenSubpath,
    /// Start of the invisible closing segment of an open subpath
    GhostlineMoveTo,
    LineTo,
    End,
}

/// Point of a flattened path, consumed by the edge builder
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct FlattenedPoint {
    pub x: f64,
    pub y: f64,
    pub code: PathCode,
}

impl FlattenedPoint {
    pub fn new(p: Point, code: PathCode) -> Self {
        Self { x: p.x, y: p.y, code }
    }
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Convert traced subpaths into a flattened vector path
///
/// Consecutive duplicate points are dropped. A subpath that does not end
/// where it started is marked `OpenSubpath` and gets a ghostline back to its
/// first point, so it can still be filled without the closing segment being
/// stroked. The result is terminated by an `End` point.
pub fn to_path(subpaths: &[Vec<Point>]) -> Vec<FlattenedPoint> {
    let n: usize = subpaths.iter().map(|s| s.len()).sum();
    let mut path = Vec::with_capacity(2 * n + 3);
    let mut last: Option<Point> = None;
    for sub in subpaths {
        let (first, end) = match (sub.first(), sub.last()) {
            (Some(f), Some(e)) => (*f, *e),
            _ => continue,
        };
        let start = path.len();
        for (i, p) in sub.iter().enumerate() {
            let code = if i == 0 { PathCode::MoveTo } else { PathCode::LineTo };
            // the first point of a subpath always starts it
            if i == 0 || last.map_or(true, |q| !q.same(p)) {
                path.push(FlattenedPoint::new(*p, code));
                last = Some(*p);
            }
        }
        if first.same(&end) {
            continue;
        }
        path[start].code = PathCode::OpenSubpath;
        path.push(FlattenedPoint::new(end, PathCode::GhostlineMoveTo));
        path.push(FlattenedPoint::new(first, PathCode::LineTo));
    }
    path.push(FlattenedPoint::new(Point::default(), PathCode::End));
    tracing::trace!(points = path.len(), "vector path");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_subpath_has_no_ghostline() {
        let sq = vec![Point::new(0.,0.), Point::new(1.,0.), Point::new(1.,1.), Point::new(0.,0.)];
        let path = to_path(&[sq]);
        assert_eq!(path[0].code, PathCode::MoveTo);
        assert!(path.iter().all(|p| p.code != PathCode::GhostlineMoveTo));
        assert_eq!(path.last().map(|p| p.code), Some(PathCode::End));
    }

    #[test]
    fn open_subpath_gets_ghostline() {
        let line = vec![Point::new(0.,0.), Point::new(10.,0.), Point::new(10.,0.)];
        let path = to_path(&[line]);
        let codes: Vec<_> = path.iter().map(|p| p.code).collect();
        assert_eq!(codes, vec![PathCode::OpenSubpath, PathCode::LineTo,
                               PathCode::GhostlineMoveTo, PathCode::LineTo, PathCode::End]);
        assert_eq!(path[3].point(), Point::new(0.,0.));
    }

    #[test]
    fn bounds_union() {
        let a = Bounds::of(&[Point::new(1.,2.), Point::new(3.,-1.)]).unwrap();
        let b = Bounds::from_point(Point::new(-4., 0.));
        assert_eq!(a.union(&b), Bounds::new(-4., -1., 3., 2.));
        assert!(Bounds::of(&[]).is_none());
    }
}
