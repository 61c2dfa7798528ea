//! Sorted Edge Lists
//!
//! A flattened path is cut into y-monotonic edges. Each edge stores its
//! points in ascending y order together with the direction the path
//! originally travelled, so the winding number comes out the same whatever
//! the drawing order. Edges are sorted top to bottom, which lets the
//! scanline sweep stop at the first edge below the current row.

use crate::error::{reserve, DrawResult};
use crate::paths::{Bounds, FlattenedPoint, PathCode, Point};
use crate::DRAW_EPSILON;

use std::cmp::Ordering;

/// Y-monotonic polyline of a polygon
#[derive(Debug,Clone,PartialEq)]
pub struct Edge {
    /// Points in ascending y
    pub points: Vec<Point>,
    pub bounds: Bounds,
    /// +1 if the path went down the page along this edge, -1 if up
    pub direction: i32,
    /// Edge closes an open subpath and is never stroked
    pub ghostline: bool,
}

impl Edge {
    fn new(mut points: Vec<Point>, direction: i32, ghostline: bool) -> Self {
        if direction < 0 {
            points.reverse();
        }
        let mut bounds = Bounds::of(&points).unwrap_or_default();
        bounds.y1 = points[0].y;
        bounds.y2 = points[points.len() - 1].y;
        Self { points, bounds, direction: if direction > 0 { 1 } else { -1 }, ghostline }
    }
    /// Winding contribution of a crossing
    pub fn winding(&self) -> i32 {
        self.direction
    }
}

/// Edges of a flattened path sorted by their first point
#[derive(Debug,Clone,Default,PartialEq)]
pub struct Polygon {
    pub edges: Vec<Edge>,
}

impl Polygon {
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
    pub fn len(&self) -> usize {
        self.edges.len()
    }
    /// Union of all edge bounds
    pub fn bounds(&self) -> Option<Bounds> {
        self.edges.iter().map(|e| e.bounds).reduce(|a, b| a.union(&b))
    }
}

/// Order edges by first point, ties broken by the turn between them
fn compare_edges(a: &Edge, b: &Edge) -> Ordering {
    let (p, q) = (&a.points, &b.points);
    p[0].y.total_cmp(&q[0].y)
        .then(p[0].x.total_cmp(&q[0].x))
        .then_with(|| {
            let cross = (p[1].x - p[0].x) * (q[1].y - q[0].y) -
                (p[1].y - p[0].y) * (q[1].x - q[0].x);
            cross.partial_cmp(&0.0).unwrap_or(Ordering::Equal)
        })
}

/// Convert a flattened path into a sorted edge list
///
/// The point stream is split at every moveto. Within a subpath a new edge
/// starts whenever the path reverses its vertical direction; the shared
/// turning point belongs to both edges. Edges with fewer than two points
/// are dropped.
pub fn build_edges(path: &[FlattenedPoint]) -> DrawResult<Polygon> {
    let mut edges: Vec<Edge> = vec![];
    let mut points: Vec<Point> = vec![];
    let mut direction = 0;
    let mut ghostline = false;
    let mut prev = Point::default();

    for fp in path.iter().take_while(|p| p.code != PathCode::End) {
        let p = fp.point();
        match fp.code {
            PathCode::MoveTo | PathCode::OpenSubpath | PathCode::GhostlineMoveTo => {
                if points.len() >= 2 {
                    reserve(&mut edges, 1)?;
                    edges.push(Edge::new(std::mem::take(&mut points), direction, ghostline));
                }
                points.clear();
                ghostline = fp.code == PathCode::GhostlineMoveTo;
                points.push(p);
                prev = p;
                direction = 0;
                continue;
            }
            _ => {}
        }
        let next_direction = if p.y > prev.y ||
            ((p.y - prev.y).abs() < DRAW_EPSILON && p.x > prev.x) { 1 } else { -1 };
        if direction != 0 && direction != next_direction && !points.is_empty() {
            let turn = points[points.len() - 1];
            reserve(&mut edges, 1)?;
            edges.push(Edge::new(std::mem::take(&mut points), direction, ghostline));
            // only the first edge of a ghostline subpath is the ghostline
            ghostline = false;
            points.push(turn);
        }
        direction = next_direction;
        if points.is_empty() {
            continue;
        }
        reserve(&mut points, 1)?;
        points.push(p);
        prev = p;
    }
    if points.len() >= 2 {
        reserve(&mut edges, 1)?;
        edges.push(Edge::new(points, direction, ghostline));
    }
    edges.sort_by(compare_edges);
    if tracing::enabled!(tracing::Level::TRACE) {
        for (i, e) in edges.iter().enumerate() {
            tracing::trace!(edge = i, direction = e.direction, ghostline = e.ghostline,
                            points = e.points.len(),
                            "bounds {},{} {},{}", e.bounds.x1, e.bounds.y1, e.bounds.x2, e.bounds.y2);
        }
    }
    Ok(Polygon { edges })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::to_path;

    fn square() -> Vec<Point> {
        vec![Point::new(10., 10.), Point::new(10., 20.), Point::new(20., 20.),
             Point::new(20., 10.), Point::new(10., 10.)]
    }

    #[test]
    fn square_splits_into_monotonic_edges() {
        let poly = build_edges(&to_path(&[square()])).unwrap();
        assert_eq!(poly.len(), 2);
        for e in &poly.edges {
            for w in e.points.windows(2) {
                assert!(w[0].y <= w[1].y);
            }
        }
        let w: i32 = poly.edges.iter().map(|e| e.winding()).sum();
        assert_eq!(w, 0);
    }

    #[test]
    fn edges_are_sorted() {
        let tri = vec![Point::new(5., 30.), Point::new(0., 0.), Point::new(10., 5.), Point::new(5., 30.)];
        let poly = build_edges(&to_path(&[tri, square()])).unwrap();
        for w in poly.edges.windows(2) {
            assert!(w[0].points[0].y <= w[1].points[0].y);
        }
    }

    #[test]
    fn bounds_match_primitive() {
        let poly = build_edges(&to_path(&[square()])).unwrap();
        assert_eq!(poly.bounds(), Some(Bounds::new(10., 10., 20., 20.)));
    }

    #[test]
    fn open_line_has_ghostline_edge() {
        let line = vec![Point::new(0., 0.), Point::new(10., 5.)];
        let poly = build_edges(&to_path(&[line])).unwrap();
        assert_eq!(poly.len(), 2);
        assert_eq!(poly.edges.iter().filter(|e| e.ghostline).count(), 1);
    }

    #[test]
    fn single_points_are_dropped() {
        let poly = build_edges(&to_path(&[vec![Point::new(3., 3.)]])).unwrap();
        assert!(poly.is_empty());
    }
}
