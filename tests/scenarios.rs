use mvg::{Canvas, GraphicContext, Rgba8};
use mvg::{DashPattern, LineCap, Point, Stroke, Bounds};

fn draw(w: usize, h: usize, program: &str) -> Canvas {
    let mut canvas = Canvas::new(w, h, Rgba8::white());
    let status = mvg::render(&mut canvas, program, &GraphicContext::default()).unwrap();
    assert!(status.success, "{:?}", status.diagnostics);
    canvas
}

#[test]
fn filled_rectangle() {
    let c = draw(30, 30, "fill red rectangle 10,10 20,20");
    let red = Rgba8::new(255, 0, 0, 255);
    for y in 10..20 {
        for x in 10..20 {
            assert_eq!(c.get(x, y), Some(red), "pixel {},{}", x, y);
        }
    }
    assert_eq!(c.get(25, 25), Some(Rgba8::white()));
    assert_eq!(c.get(5, 15), Some(Rgba8::white()));
}

#[test]
fn square_cap_extends_line() {
    let mut s = Stroke::new();
    s.width(4.0);
    s.line_cap(LineCap::Square);
    let outline = s.outline(&[Point::new(0., 0.), Point::new(10., 0.)]);
    let b = outline.iter()
        .filter_map(|p| Bounds::of(p))
        .reduce(|a, b| a.union(&b))
        .unwrap();
    assert!((b.x1 + 2.0).abs() < 1e-9, "{:?}", b);
    assert!((b.x2 - 12.0).abs() < 1e-9, "{:?}", b);
    assert!((b.y1 + 2.0).abs() < 1e-9 && (b.y2 - 2.0).abs() < 1e-9, "{:?}", b);

    // rendered: the cap reaches 2px past each end but not further
    let c = draw(30, 20, "stroke black stroke-width 4 stroke-linecap square line 10,10 20,10");
    assert_eq!(c.get(8, 10), Some(Rgba8::black()));
    assert_eq!(c.get(22, 10), Some(Rgba8::black()));
    assert_eq!(c.get(5, 10), Some(Rgba8::white()));
    assert_eq!(c.get(25, 10), Some(Rgba8::white()));
}

#[test]
fn dashes_on_twelve_unit_line() {
    let pattern = DashPattern::new(&[4.0, 2.0], 0.0).unwrap();
    let path = [Point::new(0., 0.), Point::new(12., 0.)];
    let on: Vec<(f64, f64)> = mvg::dash_runs(&path, &pattern).into_iter()
        .filter(|r| r.on)
        .map(|r| (r.start, r.end))
        .collect();
    assert_eq!(on.len(), 3);
    assert_eq!(on[0], (0.0, 4.0));
    assert_eq!(on[1], (6.0, 10.0));
    // the path ends where the second gap ends
    assert_eq!(on[2].0, 12.0);
    assert_eq!(on[2].1, 12.0);
    assert_eq!(mvg::split_dashes(&path, &pattern).len(), 3);
}

#[test]
fn triangle_fill_ignores_orientation() {
    let a = draw(20, 20, "fill-rule nonzero path 'M0,0 L10,0 L10,10 Z'");
    let b = draw(20, 20, "fill-rule nonzero path 'M0,0 L10,10 L10,0 Z'");
    assert_eq!(a.get(5, 5), b.get(5, 5));
    assert_eq!(a.get(5, 5), Some(Rgba8::black()));
    assert_eq!(a.get(8, 3), Some(Rgba8::black()));
    assert_eq!(b.get(8, 3), Some(Rgba8::black()));
    assert_eq!(a.get(3, 8), b.get(3, 8));
    assert_eq!(a.get(3, 8), Some(Rgba8::white()));
}
