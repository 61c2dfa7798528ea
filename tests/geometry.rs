use mvg::{Affine, Bounds, DashPattern, FillRule, LineJoin, Point, Primitive, Stroke};
use mvg::{build_edges, dash_runs, fill_and_stroke_opacity, to_path};

fn union(subpaths: &[Vec<Point>]) -> Bounds {
    subpaths.iter()
        .filter_map(|p| Bounds::of(p))
        .reduce(|a, b| a.union(&b))
        .unwrap()
}

#[test]
fn overlapping_squares_winding() {
    // same orientation: winding 2 in the overlap
    let a = mvg::trace_rectangle(Point::new(0., 0.), Point::new(20., 20.));
    let b = mvg::trace_rectangle(Point::new(10., 10.), Point::new(30., 30.));
    let poly = build_edges(&to_path(&[a, b])).unwrap();
    let at = |rule, x, y| fill_and_stroke_opacity(&poly, 0.5, rule, x, y).0;
    assert_eq!(at(FillRule::NonZero, 15., 15.), 1.0);
    assert_eq!(at(FillRule::EvenOdd, 15., 15.), 0.0);
    assert_eq!(at(FillRule::EvenOdd, 5., 5.), 1.0);
    assert_eq!(at(FillRule::EvenOdd, 25., 25.), 1.0);
    assert_eq!(at(FillRule::NonZero, 25., 5.), 0.0);
}

#[test]
fn miter_limit_clamps_to_bevel() {
    let corner = [Point::new(0., 50.), Point::new(50., 0.), Point::new(100., 50.)];
    let top = |limit: f64| {
        let mut s = Stroke::new();
        s.width(20.0);
        s.line_join(LineJoin::Miter);
        s.miter_limit(limit);
        union(&s.outline(&corner)).y1
    };
    // right angle: the miter tip sits mid * sqrt(2) above the corner
    assert!((top(10.0) + 10.0 * 2f64.sqrt()).abs() < 1e-6, "{}", top(10.0));
    assert!(top(1.0) > -7.1 && top(1.0) < -7.0, "{}", top(1.0));
}

#[test]
fn dash_runs_cover_path() {
    let path = [Point::new(0., 0.), Point::new(7., 0.), Point::new(7., 9.), Point::new(20., 9.)];
    let total = 7.0 + 9.0 + 13.0;
    for (lengths, offset) in [(&[4., 2.][..], 0.), (&[3.][..], 1.5), (&[1., 2., 3.][..], 7.)] {
        let pattern = DashPattern::new(lengths, offset).unwrap();
        let runs = dash_runs(&path, &pattern);
        let sum: f64 = runs.iter().map(|r| r.length()).sum();
        assert!((sum - total).abs() < 1e-9, "{:?}: {}", lengths, sum);
        for w in runs.windows(2) {
            assert_eq!(w[0].end, w[1].start);
            assert_ne!(w[0].on, w[1].on);
        }
    }
}

#[test]
fn bounds_survive_affine_round_trip() {
    let prim = Primitive::Ellipse(Point::new(40., 30.), Point::new(20., 10.), Point::new(0., 360.));
    let trace = prim.trace(0).unwrap();
    let before = trace.bounds().unwrap();
    let m = Affine::translate(5., -3.) * Affine::rotate(30.) * Affine::scale(2., 0.5);
    let mut t = trace.clone();
    t.transform(&m);
    t.transform(&m.inverse());
    let after = t.bounds().unwrap();
    for (a, b) in [(before.x1, after.x1), (before.y1, after.y1), (before.x2, after.x2), (before.y2, after.y2)] {
        assert!((a - b).abs() < 1e-9, "{:?} {:?}", before, after);
    }
    assert!((before.x1 - 20.).abs() < 0.5 && (before.x2 - 60.).abs() < 0.5, "{:?}", before);
}

#[test]
fn tracing_is_repeatable() {
    let prims = [
        Primitive::Circle(Point::new(10., 10.), Point::new(10., 20.)),
        Primitive::RoundRectangle(Point::new(0., 0.), Point::new(30., 20.), Point::new(5., 5.)),
        Primitive::Arc(Point::new(0., 0.), Point::new(40., 20.), Point::new(0., 270.)),
        Primitive::Bezier(vec![Point::new(0., 0.), Point::new(10., 30.), Point::new(30., 0.)]),
        Primitive::Path("M 5 5 q 10 -10 20 0 t 20 0 a 5 5 0 1 1 -10 10 z".into()),
    ];
    for p in &prims {
        assert_eq!(p.trace(3).unwrap(), p.trace(3).unwrap(), "{:?}", p.kind());
    }
}
