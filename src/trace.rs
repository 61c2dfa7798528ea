//! Geometry Tracers
//!
//! Every drawable shape is expanded into one or more subpaths of flattened
//! points. Tracers are pure: the same primitive always traces to the same
//! point sequence.
//!
//! # Example
//!
//!     use mvg::{Primitive, Point};
//!
//!     let circle = Primitive::Circle(Point::new(50.0, 50.0), Point::new(50.0, 60.0));
//!     let trace = circle.trace(0).unwrap();
//!     assert_eq!(trace.subpaths.len(), 1);
//!

use crate::compositor::Compose;
use crate::error::{DrawError, DrawResult};
use crate::path_parser;
use crate::paths::{Bounds, Point, perceptible_reciprocal};
use crate::transform::Affine;
use crate::DRAW_EPSILON;

use std::f64::consts::PI;
use std::fmt;

/// Segments per Bezier curve are capped at this many per control point
pub const BEZIER_QUANTUM: usize = 200;
/// Largest number of control points accepted for a `bezier` primitive
pub const MAX_BEZIER_COORDINATES: usize = 107;
/// Largest number of points an ellipse, circle or arc may trace to
pub const MAX_ARC_POINTS: usize = 21400;

/// Kind of drawing primitive
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum PrimitiveKind {
    Point,
    Line,
    Rectangle,
    RoundRectangle,
    Arc,
    Ellipse,
    Circle,
    Polyline,
    Polygon,
    Bezier,
    Path,
    Text,
    Image,
    Color,
    Alpha,
}

impl PrimitiveKind {
    /// Look up a primitive keyword, ignoring case
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        use PrimitiveKind::*;
        let k = keyword.to_ascii_lowercase();
        let kind = match k.as_str() {
            "point" => Point,
            "line" => Line,
            "rectangle" => Rectangle,
            "roundrectangle" => RoundRectangle,
            "arc" => Arc,
            "ellipse" => Ellipse,
            "circle" => Circle,
            "polyline" => Polyline,
            "polygon" => Polygon,
            "bezier" => Bezier,
            "path" => Path,
            "text" => Text,
            "image" => Image,
            "color" => Color,
            "alpha" | "matte" => Alpha,
            _ => return None,
        };
        Some(kind)
    }
    pub fn name(&self) -> &'static str {
        use PrimitiveKind::*;
        match self {
            Point => "point",
            Line => "line",
            Rectangle => "rectangle",
            RoundRectangle => "roundRectangle",
            Arc => "arc",
            Ellipse => "ellipse",
            Circle => "circle",
            Polyline => "polyline",
            Polygon => "polygon",
            Bezier => "bezier",
            Path => "path",
            Text => "text",
            Image => "image",
            Color => "color",
            Alpha => "alpha",
        }
    }
    /// Number of control points the primitive requires, `None` if variable
    pub fn required_points(&self) -> Option<usize> {
        use PrimitiveKind::*;
        match self {
            Point | Text | Color | Alpha => Some(1),
            Line | Rectangle | Circle | Image => Some(2),
            RoundRectangle | Arc | Ellipse => Some(3),
            Polyline | Polygon | Bezier | Path => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How the `color` and `alpha` primitives select pixels
#[derive(Debug,Copy,Clone,PartialEq,Eq)]
pub enum PaintMethod {
    /// Only the target pixel
    Point,
    /// Every pixel matching the target pixel's color
    Replace,
    /// Connected region matching the target pixel's color
    Floodfill,
    /// Connected region bounded by the border color
    FillToBorder,
    /// Every pixel
    Reset,
}

impl PaintMethod {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let m = match keyword.to_ascii_lowercase().as_str() {
            "point" => PaintMethod::Point,
            "replace" => PaintMethod::Replace,
            "floodfill" => PaintMethod::Floodfill,
            "filltoborder" => PaintMethod::FillToBorder,
            "reset" => PaintMethod::Reset,
            _ => return None,
        };
        Some(m)
    }
}

/// One drawing request with its control points
#[derive(Debug,Clone,PartialEq)]
pub enum Primitive {
    Point(Point),
    Line(Point, Point),
    Rectangle(Point, Point),
    /// Corners and corner radii
    RoundRectangle(Point, Point, Point),
    /// Bounding box corners and start/end angles in degrees
    Arc(Point, Point, Point),
    /// Center, radii and start/end angles in degrees
    Ellipse(Point, Point, Point),
    /// Center and a point on the perimeter
    Circle(Point, Point),
    Polyline(Vec<Point>),
    Polygon(Vec<Point>),
    Bezier(Vec<Point>),
    /// SVG path data
    Path(String),
    Text { at: Point, text: String },
    Image { compose: Compose, at: Point, size: Point, source: String },
    Color { at: Point, method: PaintMethod },
    Alpha { at: Point, method: PaintMethod },
}

/// Traced primitive: subpaths of flattened points
#[derive(Debug,Clone,PartialEq)]
pub struct Trace {
    pub kind: PrimitiveKind,
    pub subpaths: Vec<Vec<Point>>,
}

impl Trace {
    pub fn new(kind: PrimitiveKind, subpaths: Vec<Vec<Point>>) -> Self {
        Self { kind, subpaths }
    }
    pub fn single(kind: PrimitiveKind, points: Vec<Point>) -> Self {
        Self::new(kind, vec![points])
    }
    pub fn number_points(&self) -> usize {
        self.subpaths.iter().map(|s| s.len()).sum()
    }
    pub fn is_empty(&self) -> bool {
        self.number_points() == 0
    }
    /// First point of the trace, the anchor of point-like primitives
    pub fn first_point(&self) -> Option<Point> {
        self.subpaths.iter().flat_map(|s| s.first()).next().copied()
    }
    pub fn bounds(&self) -> Option<Bounds> {
        self.subpaths.iter()
            .filter_map(|s| Bounds::of(s))
            .reduce(|a, b| a.union(&b))
    }
    /// Map every point through `m`
    pub fn transform(&mut self, m: &Affine) {
        for p in self.subpaths.iter_mut().flatten() {
            *p = m.transform(*p);
        }
    }
    /// Does the subpath end where it starts
    pub fn is_closed(points: &[Point]) -> bool {
        match (points.first(), points.last()) {
            (Some(a), Some(b)) => points.len() > 1 && a.same(b),
            _ => false,
        }
    }
}

impl Primitive {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Primitive::Point(..) => PrimitiveKind::Point,
            Primitive::Line(..) => PrimitiveKind::Line,
            Primitive::Rectangle(..) => PrimitiveKind::Rectangle,
            Primitive::RoundRectangle(..) => PrimitiveKind::RoundRectangle,
            Primitive::Arc(..) => PrimitiveKind::Arc,
            Primitive::Ellipse(..) => PrimitiveKind::Ellipse,
            Primitive::Circle(..) => PrimitiveKind::Circle,
            Primitive::Polyline(..) => PrimitiveKind::Polyline,
            Primitive::Polygon(..) => PrimitiveKind::Polygon,
            Primitive::Bezier(..) => PrimitiveKind::Bezier,
            Primitive::Path(..) => PrimitiveKind::Path,
            Primitive::Text { .. } => PrimitiveKind::Text,
            Primitive::Image { .. } => PrimitiveKind::Image,
            Primitive::Color { .. } => PrimitiveKind::Color,
            Primitive::Alpha { .. } => PrimitiveKind::Alpha,
        }
    }

    /// Build a shape primitive from its parsed control points
    ///
    /// The point count is checked against the kind; `index` locates the
    /// primitive in diagnostics.
    pub fn from_points(kind: PrimitiveKind, pts: Vec<Point>, index: usize) -> DrawResult<Primitive> {
        let wrong = |reason: String| DrawError::geometry(kind.name(), index, reason);
        if let Some(n) = kind.required_points() {
            if pts.len() != n {
                return Err(wrong(format!("expected {} points, found {}", n, pts.len())));
            }
        }
        let p = |i: usize| pts[i];
        let prim = match kind {
            PrimitiveKind::Point => Primitive::Point(p(0)),
            PrimitiveKind::Line => Primitive::Line(p(0), p(1)),
            PrimitiveKind::Rectangle => Primitive::Rectangle(p(0), p(1)),
            PrimitiveKind::RoundRectangle => Primitive::RoundRectangle(p(0), p(1), p(2)),
            PrimitiveKind::Arc => Primitive::Arc(p(0), p(1), p(2)),
            PrimitiveKind::Ellipse => Primitive::Ellipse(p(0), p(1), p(2)),
            PrimitiveKind::Circle => Primitive::Circle(p(0), p(1)),
            PrimitiveKind::Polyline | PrimitiveKind::Polygon if pts.is_empty() => {
                return Err(wrong("expected at least 1 point".into()));
            }
            PrimitiveKind::Polyline => Primitive::Polyline(pts),
            PrimitiveKind::Polygon => Primitive::Polygon(pts),
            PrimitiveKind::Bezier => {
                if pts.len() < 3 {
                    return Err(wrong(format!("expected at least 3 points, found {}", pts.len())));
                }
                if pts.len() > MAX_BEZIER_COORDINATES {
                    return Err(wrong(format!("too many bezier coordinates ({})", pts.len())));
                }
                Primitive::Bezier(pts)
            }
            _ => return Err(wrong("primitive takes more than points".into())),
        };
        Ok(prim)
    }

    /// Trace the primitive in its own coordinate space
    pub fn trace(&self, index: usize) -> DrawResult<Trace> {
        let kind = self.kind();
        let limit = |n: usize| -> DrawResult<()> {
            if n > MAX_ARC_POINTS {
                Err(DrawError::geometry(kind.name(), index, format!("too many coordinates ({})", n)))
            } else {
                Ok(())
            }
        };
        let angles = |deg: &Point| -> DrawResult<()> {
            if deg.x.is_finite() && deg.y.is_finite() {
                Ok(())
            } else {
                Err(DrawError::geometry(kind.name(), index, "angles must be finite"))
            }
        };
        let trace = match self {
            Primitive::Point(p) => Trace::single(kind, trace_point(*p)),
            Primitive::Line(a, b) => {
                let pts = trace_line(*a, *b);
                // a zero-length line degrades to a point
                let kind = if pts.len() == 1 { PrimitiveKind::Point } else { kind };
                Trace::single(kind, pts)
            }
            Primitive::Rectangle(a, b) => Trace::single(kind, trace_rectangle(*a, *b)),
            Primitive::RoundRectangle(a, b, r) => {
                let w = (b.x - a.x).abs().min(2.0 * r.x.abs());
                let h = (b.y - a.y).abs().min(2.0 * r.y.abs());
                limit(4usize.saturating_mul(ellipse_points(Point::new(w / 2.0, h / 2.0), 90.0)))?;
                Trace::single(kind, trace_round_rectangle(*a, *b, *r))
            }
            Primitive::Arc(a, b, deg) => {
                angles(deg)?;
                let radii = Point::new((b.x - a.x).abs() / 2.0, (b.y - a.y).abs() / 2.0);
                limit(ellipse_points(radii, sweep(deg.x, deg.y)))?;
                Trace::single(kind, trace_arc(*a, *b, *deg))
            }
            Primitive::Ellipse(c, r, deg) => {
                angles(deg)?;
                limit(ellipse_points(*r, sweep(deg.x, deg.y)))?;
                Trace::single(kind, trace_ellipse(*c, *r, *deg))
            }
            Primitive::Circle(c, p) => {
                let r = c.distance(p);
                limit(ellipse_points(Point::new(r, r), 360.0))?;
                Trace::single(kind, trace_circle(*c, *p))
            }
            Primitive::Polyline(pts) => Trace::single(kind, pts.clone()),
            Primitive::Polygon(pts) => {
                let mut pts = pts.clone();
                if let Some(first) = pts.first().copied() {
                    pts.push(first);
                }
                Trace::single(kind, pts)
            }
            Primitive::Bezier(pts) => Trace::single(kind, trace_bezier(pts)),
            Primitive::Path(data) => Trace::new(kind, path_parser::trace_path(data)?),
            Primitive::Text { at, .. } |
            Primitive::Image { at, .. } |
            Primitive::Color { at, .. } |
            Primitive::Alpha { at, .. } => Trace::single(kind, vec![*at]),
        };
        Ok(trace)
    }
}

pub fn trace_point(p: Point) -> Vec<Point> {
    vec![p]
}

/// Line segment; a zero-length line collapses to a single point
pub fn trace_line(start: Point, end: Point) -> Vec<Point> {
    if start.same(&end) {
        vec![start]
    } else {
        vec![start, end]
    }
}

/// Closed rectangle through both corners
pub fn trace_rectangle(start: Point, end: Point) -> Vec<Point> {
    vec![start,
         Point::new(start.x, end.y),
         end,
         Point::new(end.x, start.y),
         start]
}

/// Rectangle with elliptical corners of radii `arc`, clamped to half the
/// side lengths
pub fn trace_round_rectangle(start: Point, end: Point, arc: Point) -> Vec<Point> {
    let x1 = start.x.min(end.x);
    let y1 = start.y.min(end.y);
    let w = (end.x - start.x).abs();
    let h = (end.y - start.y).abs();
    let arc = Point::new(arc.x.abs().min(0.5 * w), arc.y.abs().min(0.5 * h));
    let corners = [
        (Point::new(x1 + w - arc.x, y1 + arc.y), 270.0, 360.0),
        (Point::new(x1 + w - arc.x, y1 + h - arc.y), 0.0, 90.0),
        (Point::new(x1 + arc.x, y1 + h - arc.y), 90.0, 180.0),
        (Point::new(x1 + arc.x, y1 + arc.y), 180.0, 270.0),
    ];
    let mut out = vec![];
    for (center, a0, a1) in corners.iter() {
        out.extend(trace_ellipse(*center, arc, Point::new(*a0, *a1)));
    }
    if let Some(first) = out.first().copied() {
        out.push(first);
    }
    out
}

/// Elliptical arc inscribed in the box `start`,`end`
pub fn trace_arc(start: Point, end: Point, degrees: Point) -> Vec<Point> {
    let center = Point::new(0.5 * (end.x + start.x), 0.5 * (end.y + start.y));
    let radii = Point::new((center.x - start.x).abs(), (center.y - start.y).abs());
    trace_ellipse(center, radii, degrees)
}

/// Full circle about `center` through `perimeter`
pub fn trace_circle(center: Point, perimeter: Point) -> Vec<Point> {
    let r = center.distance(&perimeter);
    trace_ellipse(center, Point::new(r, r), Point::new(0.0, 360.0))
}

/// Angular step for an ellipse; shrinks as the radius grows so consecutive
/// points stay about a device unit apart
pub(crate) fn ellipse_step(radii: Point) -> f64 {
    let delta = 2.0 / radii.x.max(radii.y);
    if delta >= 0.0 && delta < PI / 8.0 {
        PI / (4.0 * (PI / delta / 2.0 + 0.5))
    } else {
        PI / 8.0
    }
}

/// Degrees swept from `start` to `end`; an end before the start wraps
/// forward by whole turns
fn sweep(start: f64, end: f64) -> f64 {
    if end < start { (end - start).rem_euclid(360.0) } else { end - start }
}

/// Number of points `trace_ellipse` produces for a sweep of `degrees`
fn ellipse_points(radii: Point, degrees: f64) -> usize {
    let n = (degrees.max(0.0).to_radians() / ellipse_step(radii)).ceil();
    if n.is_finite() { (n as usize).saturating_add(1) } else { usize::MAX }
}

/// Elliptical arc about `center` from `degrees.x` to `degrees.y`
///
/// The end angle wraps forward past the start angle, so `(350, 10)` sweeps
/// twenty degrees. At most [`MAX_ARC_POINTS`] points are produced.
pub fn trace_ellipse(center: Point, radii: Point, degrees: Point) -> Vec<Point> {
    if radii.x.abs() < DRAW_EPSILON && radii.y.abs() < DRAW_EPSILON {
        return vec![center];
    }
    if !degrees.x.is_finite() || !degrees.y.is_finite() {
        return vec![];
    }
    let step = ellipse_step(radii);
    let start = degrees.x.rem_euclid(360.0).to_radians();
    let stop = start + sweep(degrees.x, degrees.y).to_radians();
    let n = ellipse_points(radii, sweep(degrees.x, degrees.y)).min(MAX_ARC_POINTS);
    let at = |a: f64| {
        let a = a % (2.0 * PI);
        Point::new(a.cos() * radii.x + center.x, a.sin() * radii.y + center.y)
    };
    let mut out = Vec::with_capacity(n);
    for i in 0..n - 1 {
        let a = start + i as f64 * step;
        if a >= stop {
            break;
        }
        out.push(at(a));
    }
    out.push(at(stop));
    out
}

/// Binomial coefficient `n` choose `k`
fn permutate(n: usize, k: usize) -> f64 {
    let mut r = 1.0;
    for i in k + 1..=n {
        r *= i as f64;
    }
    for i in 1..=n - k {
        r /= i as f64;
    }
    r
}

/// Bezier curve of any degree evaluated from its Bernstein polynomial
///
/// The number of samples grows with the extent of the control polygon and is
/// capped at [`BEZIER_QUANTUM`] per control point.
pub fn trace_bezier(control: &[Point]) -> Vec<Point> {
    let n = control.len();
    if n == 0 {
        return vec![];
    }
    let mut quantum = n;
    for i in 0..n {
        for j in i + 1..n {
            let dx = (control[j].x - control[i].x).abs();
            let dy = (control[j].y - control[i].y).abs();
            quantum = quantum.max(dx as usize).max(dy as usize);
        }
    }
    let quantum = (quantum / n).min(BEZIER_QUANTUM);
    let samples = quantum * n;
    let coefficients: Vec<f64> = (0..n).map(|i| permutate(n - 1, i)).collect();
    let mut out = Vec::with_capacity(samples + 1);
    let mut weight = 0.0;
    for _ in 0..samples {
        let mut p = Point::default();
        let mut alpha = (1.0 - weight as f64).powi(n as i32 - 1);
        for (c, q) in coefficients.iter().zip(control) {
            p.x += alpha * c * q.x;
            p.y += alpha * c * q.y;
            alpha *= weight / (1.0 - weight);
        }
        out.push(p);
        weight += 1.0 / samples as f64;
    }
    out.push(control[n - 1]);
    out
}

/// SVG elliptical arc from `start` to `end`
///
/// Radii too small to span the endpoints are scaled up. The arc is split
/// into cubic Bezier pieces of at most a quarter turn each.
pub fn trace_arc_path(start: Point, end: Point, radii: Point, angle: f64,
                      large_arc: bool, sweep: bool) -> Vec<Point> {
    if start.same(&end) {
        return vec![end];
    }
    let mut radii = Point::new(radii.x.abs(), radii.y.abs());
    if radii.x < DRAW_EPSILON || radii.y < DRAW_EPSILON {
        return trace_line(start, end);
    }
    let (sine, cosine) = (angle % 360.0).to_radians().sin_cos();
    let cx = cosine * (end.x - start.x) / 2.0 + sine * (end.y - start.y) / 2.0;
    let cy = cosine * (end.y - start.y) / 2.0 - sine * (end.x - start.x) / 2.0;
    let delta = (cx * cx) / (radii.x * radii.x) + (cy * cy) / (radii.y * radii.y);
    if delta < DRAW_EPSILON {
        return trace_line(start, end);
    }
    if delta > 1.0 {
        radii.x *= delta.sqrt();
        radii.y *= delta.sqrt();
    }
    // endpoints in unit circle space
    let p0 = Point::new(cosine * start.x / radii.x + sine * start.y / radii.x,
                        cosine * start.y / radii.y - sine * start.x / radii.y);
    let p1 = Point::new(cosine * end.x / radii.x + sine * end.y / radii.x,
                        cosine * end.y / radii.y - sine * end.x / radii.y);
    let alpha = p1.x - p0.x;
    let beta = p1.y - p0.y;
    let mut factor = perceptible_reciprocal(alpha * alpha + beta * beta) - 0.25;
    if factor <= 0.0 {
        factor = 0.0;
    } else {
        factor = factor.sqrt();
        if sweep == large_arc {
            factor = -factor;
        }
    }
    let center = Point::new((p0.x + p1.x) / 2.0 - factor * beta,
                            (p0.y + p1.y) / 2.0 + factor * alpha);
    let a0 = (p0.y - center.y).atan2(p0.x - center.x);
    let mut theta = (p1.y - center.y).atan2(p1.x - center.x) - a0;
    if theta < 0.0 && sweep {
        theta += 2.0 * PI;
    } else if theta > 0.0 && !sweep {
        theta -= 2.0 * PI;
    }
    let segments = (theta / (0.5 * PI + DRAW_EPSILON)).abs().ceil().max(1.0) as usize;
    let to_user = |p: Point| Point::new(cosine * radii.x * p.x - sine * radii.y * p.y,
                                        sine * radii.x * p.x + cosine * radii.y * p.y);
    let mut out = vec![start];
    let mut from = start;
    for i in 0..segments {
        let t0 = a0 + i as f64 * theta / segments as f64;
        let t1 = a0 + (i + 1) as f64 * theta / segments as f64;
        let half = 0.5 * (t1 - t0);
        let gamma = (8.0 / 3.0) * (0.5 * half).sin().powi(2) / half.sin();
        let c1 = Point::new(center.x + t0.cos() - gamma * t0.sin(),
                            center.y + t0.sin() + gamma * t0.cos());
        let e = Point::new(center.x + t1.cos(), center.y + t1.sin());
        let c2 = Point::new(e.x + gamma * t1.sin(), e.y - gamma * t1.cos());
        let to = if i == segments - 1 { end } else { to_user(e) };
        let curve = trace_bezier(&[from, to_user(c1), to_user(c2), to]);
        out.extend(curve.into_iter().skip(1));
        from = to;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rectangle_is_closed_and_bounded() {
        let t = Primitive::Rectangle(Point::new(10., 10.), Point::new(20., 20.)).trace(0).unwrap();
        assert!(Trace::is_closed(&t.subpaths[0]));
        assert_eq!(t.bounds(), Some(Bounds::new(10., 10., 20., 20.)));
    }

    #[test]
    fn zero_length_line_is_a_point() {
        let t = Primitive::Line(Point::new(3., 4.), Point::new(3., 4.)).trace(0).unwrap();
        assert_eq!(t.kind, PrimitiveKind::Point);
        assert_eq!(t.subpaths, vec![vec![Point::new(3., 4.)]]);
    }

    #[test]
    fn ellipse_wraps_past_360() {
        let pts = trace_ellipse(Point::new(0., 0.), Point::new(10., 10.), Point::new(350., 10.));
        let last = pts[pts.len() - 1];
        assert!((last.x - 10f64.to_radians().cos() * 10.).abs() < 1e-9);
        assert!(pts.len() < 10);
    }

    #[test]
    fn huge_angles_wrap_to_one_turn() {
        let r = Point::new(10., 10.);
        let pts = trace_ellipse(Point::new(20., 20.), r, Point::new(1e20, 0.));
        assert!(!pts.is_empty() && pts.len() <= MAX_ARC_POINTS);
        let pts = trace_ellipse(Point::new(20., 20.), r, Point::new(1e17, 100000000000001024.));
        assert!(!pts.is_empty() && pts.len() <= MAX_ARC_POINTS);
        let e = Primitive::Ellipse(Point::new(20., 20.), r, Point::new(1e20, 0.));
        assert!(e.trace(0).is_ok());
    }

    #[test]
    fn non_finite_angles_are_rejected() {
        let r = Point::new(10., 10.);
        let e = Primitive::Ellipse(Point::new(20., 20.), r, Point::new(f64::INFINITY, 0.));
        assert!(matches!(e.trace(2), Err(DrawError::Geometry { index: 2, .. })));
        let a = Primitive::Arc(Point::new(0., 0.), Point::new(9., 9.), Point::new(0., f64::NAN));
        assert!(a.trace(0).is_err());
    }

    #[test]
    fn circle_points_lie_on_radius() {
        let pts = trace_circle(Point::new(5., 5.), Point::new(5., 25.));
        assert!(pts.len() > 16);
        for p in &pts {
            assert!((p.distance(&Point::new(5., 5.)) - 20.).abs() < 1e-9);
        }
        assert!(Trace::is_closed(&pts));
    }

    #[test]
    fn small_ellipse_uses_coarse_step() {
        let pts = trace_ellipse(Point::new(0., 0.), Point::new(1., 1.), Point::new(0., 360.));
        assert_eq!(pts.len(), 17);
    }

    #[test]
    fn bezier_hits_endpoints() {
        let ctl = [Point::new(0., 0.), Point::new(50., 100.), Point::new(100., 0.)];
        let pts = trace_bezier(&ctl);
        assert_eq!(pts[0], ctl[0]);
        assert_eq!(*pts.last().unwrap(), ctl[2]);
        // dense enough that neighbours are close
        for w in pts.windows(2) {
            assert!(w[0].distance(&w[1]) < 2.0);
        }
    }

    #[test]
    fn arc_path_half_circle() {
        let pts = trace_arc_path(Point::new(0., 0.), Point::new(20., 0.), Point::new(10., 10.),
                                 0.0, false, true);
        assert_eq!(pts[0], Point::new(0., 0.));
        assert_eq!(*pts.last().unwrap(), Point::new(20., 0.));
        for p in &pts {
            assert!((p.distance(&Point::new(10., 0.)) - 10.).abs() < 0.05);
        }
        // sweep flag set: the arc passes through negative y
        assert!(pts.iter().any(|p| p.y < -9.0));
    }

    #[test]
    fn arc_path_radii_scale_up() {
        let pts = trace_arc_path(Point::new(0., 0.), Point::new(40., 0.), Point::new(1., 1.),
                                 0.0, false, false);
        assert!(pts.iter().any(|p| p.y > 19.0));
    }

    #[test]
    fn point_counts_are_checked() {
        let e = Primitive::from_points(PrimitiveKind::Ellipse, vec![Point::default(); 2], 4).unwrap_err();
        assert!(matches!(e, DrawError::Geometry { index: 4, .. }));
        assert!(Primitive::from_points(PrimitiveKind::Bezier, vec![Point::default(); 108], 0).is_err());
        assert!(Primitive::from_points(PrimitiveKind::Polyline, vec![], 0).is_err());
    }

    #[test]
    fn huge_circles_are_rejected() {
        let c = Primitive::Circle(Point::new(0., 0.), Point::new(1.0e6, 0.));
        assert!(c.trace(0).is_err());
    }

    #[test]
    fn round_rectangle_clamps_radii() {
        let pts = trace_round_rectangle(Point::new(0., 0.), Point::new(10., 4.), Point::new(50., 50.));
        let b = Bounds::of(&pts).unwrap();
        assert!((b.x1 - 0.).abs() < 1e-9 && (b.x2 - 10.).abs() < 1e-9);
        assert!((b.y1 - 0.).abs() < 1e-9 && (b.y2 - 4.).abs() < 1e-9);
    }
}
