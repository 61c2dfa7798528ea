//! Hostile numbers and text must finish quickly with a diagnostic or an
//! error, never hang or panic.

mod assets;

use mvg::{Canvas, DrawError, ErrorKind, GraphicContext, Renderer, Rgba8};
use mvg::imageio;

fn blank() -> Canvas {
    Canvas::new(40, 40, Rgba8::white())
}

fn run(canvas: &mut Canvas, program: &str) -> mvg::Status {
    mvg::render(canvas, program, &GraphicContext::default()).unwrap()
}

#[test]
fn huge_angles() {
    for program in ["ellipse 20,20 10,10 1e20,0",
                    "ellipse 20,20 10,10 1e17,100000000000001024",
                    "ellipse 20,20 10,10 -1e300,1e300",
                    "arc 0,0 39,39 1e300,-1e300",
                    "stroke red fill none ellipse 20,20 15,15 7e15,3"] {
        let mut c = blank();
        let s = run(&mut c, program);
        assert!(s.success, "{}: {:?}", program, s.diagnostics);
    }
}

#[test]
fn overflowing_numbers_are_parse_errors() {
    let mut c = blank();
    let s = run(&mut c, "ellipse 20,20 10,10 0,1e999");
    assert!(!s.success);
    assert!(s.has(ErrorKind::Parse));
    assert_eq!(c.get(20, 20), Some(Rgba8::white()));
}

#[test]
fn huge_coordinates() {
    let mut c = blank();
    let s = run(&mut c, "rectangle -1e300,-1e300 1e300,1e300");
    assert!(s.success, "{:?}", s.diagnostics);
    assert_eq!(c.get(20, 20), Some(Rgba8::black()));

    let mut c = blank();
    let s = run(&mut c, "stroke red line 0,0 1e15,1e15 \
                         polyline -1e200,5 1e200,5 0,1e200 \
                         bezier 0,0 1e300,1e300 -1e300,1e300 \
                         path 'M 0,0 A 1e300,1e300 0 1 1 1e12,3 Z'");
    assert!(s.success, "{:?}", s.diagnostics);
}

#[test]
fn huge_circle_is_skipped() {
    let mut c = blank();
    let s = run(&mut c, "circle 0,0 1e300,0 fill red rectangle 0,0 9,9");
    assert!(s.success);
    assert!(s.has(ErrorKind::Geometry));
    assert_eq!(c.get(5, 5), Some(Rgba8::new(255, 0, 0, 255)));
}

#[test]
fn huge_stroke_width() {
    let mut c = blank();
    let s = run(&mut c, "fill none stroke blue stroke-width 1e9 stroke-linecap round \
                         stroke-linejoin round polyline 0,0 39,39 0,39");
    assert!(s.success, "{:?}", s.diagnostics);
}

#[test]
fn tiny_dashes_on_long_lines_are_skipped() {
    let mut c = blank();
    let s = run(&mut c, "stroke red stroke-dasharray 0.001 line 0,0 1e15,0 \
                         stroke-dasharray 1e-300 line 0,5 39,5 \
                         stroke-dasharray none line 0,9 39,9");
    assert!(s.success);
    assert_eq!(s.diagnostics.len(), 2);
    assert!(s.diagnostics.iter().all(|d| d.kind == ErrorKind::Geometry));
    assert_eq!(c.get(20, 9), Some(Rgba8::new(255, 0, 0, 255)));
}

#[test]
fn dashes_under_a_zero_scale() {
    let mut c = blank();
    let s = run(&mut c, "stroke red stroke-dasharray 2,2 scale 0,0 line 0,0 30,30 point 1,1");
    assert!(s.success, "{:?}", s.diagnostics);
}

#[test]
fn non_ascii_text() {
    for program in ["é", "fill 'ünknown' rectangle 0,0 5,5", "fill url(#ré)",
                    "text 2,2 'héllo wörld'", "push graphic-context ∂ pop graphic-context",
                    "rectangle 0,0 5,5 ☃"] {
        let mut c = blank();
        let s = run(&mut c, program);
        assert!(!s.diagnostics.is_empty(), "{}", program);
    }
}

#[test]
fn huge_image_size_is_an_allocation_error() {
    let dir = assets::scratch_dir().unwrap();
    imageio::write_file(&Canvas::new(2, 2, Rgba8::black()), dir.join("tiny.png")).unwrap();
    let mut c = blank();
    let r = Renderer::new()
        .base_dir(&dir)
        .render(&mut c, "image over 0,0 100000,100000 'tiny.png'", &GraphicContext::default());
    assert!(matches!(r, Err(DrawError::Allocation { .. })));

    let r = Renderer::new()
        .base_dir(&dir)
        .render(&mut c, "image over 0,0 1e12,1 'tiny.png'", &GraphicContext::default());
    assert!(matches!(r, Err(DrawError::Allocation { .. })));
}

#[test]
fn huge_pattern_is_an_allocation_error() {
    let mut c = blank();
    let r = mvg::render(&mut c, "push pattern big 0,0 100000,100000\npoint 0,0\npop pattern\n\
                                 fill big rectangle 0,0 9,9", &GraphicContext::default());
    assert!(matches!(r, Err(DrawError::Allocation { .. })));
}
