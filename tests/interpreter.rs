mod assets;

use mvg::{Canvas, ErrorKind, GraphicContext, Renderer, Rgba8};
use mvg::imageio;

const RED: Rgba8 = Rgba8 { r: 255, g: 0, b: 0, a: 255 };
const BLUE: Rgba8 = Rgba8 { r: 0, g: 0, b: 255, a: 255 };

fn blank() -> Canvas {
    Canvas::new(40, 40, Rgba8::white())
}

fn logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn run(canvas: &mut Canvas, program: &str) -> mvg::Status {
    mvg::render(canvas, program, &GraphicContext::default()).unwrap()
}

#[test]
fn pop_restores_context() {
    let mut c = blank();
    let s = run(&mut c, "fill red\n\
                         push graphic-context\n\
                           fill blue translate 20,0\n\
                           rectangle 0,0 9,9\n\
                         pop graphic-context\n\
                         rectangle 0,0 9,9");
    assert!(s.success);
    assert_eq!(c.get(25, 5), Some(BLUE));
    assert_eq!(c.get(5, 5), Some(RED));
}

#[test]
fn pop_underflow_reports_and_continues() {
    let mut c = blank();
    let s = run(&mut c, "pop graphic-context fill red rectangle 0,0 9,9");
    assert!(!s.success);
    assert_eq!(s.diagnostics.len(), 1);
    assert_eq!(s.diagnostics[0].kind, ErrorKind::Parse);
    assert_eq!(c.get(5, 5), Some(RED));
}

#[test]
fn bad_number_stops_program() {
    let mut c = blank();
    let s = run(&mut c, "fill red rectangle 0,0 9,9 stroke-width wide rectangle 20,20 30,30");
    assert!(!s.success);
    assert!(s.diagnostics[0].message.contains("stroke-width"));
    assert_eq!(c.get(5, 5), Some(RED));
    assert_eq!(c.get(25, 25), Some(Rgba8::white()));
}

#[test]
fn unknown_keyword_is_named() {
    let mut c = blank();
    let s = run(&mut c, "fill red sparkle 1,1");
    assert!(!s.success);
    assert_eq!(s.diagnostics[0].token.as_deref(), Some("sparkle"));
}

#[test]
fn geometry_error_skips_primitive() {
    let mut c = blank();
    let s = run(&mut c, "fill red line 0,0 rectangle 0,0 9,9");
    assert!(s.success);
    assert!(s.has(ErrorKind::Geometry));
    assert_eq!(s.diagnostics[0].primitive_index, Some(0));
    assert_eq!(c.get(5, 5), Some(RED));
}

#[test]
fn color_floodfill_and_reset() {
    let mut c = blank();
    let s = run(&mut c, "fill red stroke black rectangle 5,5 30,30 \
                         fill blue color 0,0 floodfill");
    assert!(s.success, "{:?}", s.diagnostics);
    assert_eq!(c.get(0, 39), Some(BLUE));
    assert_eq!(c.get(15, 15), Some(RED));

    let s = run(&mut c, "fill white color 0,0 reset");
    assert!(s.success);
    assert!(c.data.iter().all(|&v| v == 255));
}

#[test]
fn image_primitive_stamps_file() {
    let dir = assets::scratch_dir().unwrap();
    let mut src = Canvas::new(4, 4, BLUE);
    src.put(0, 0, RED);
    imageio::write_file(&src, dir.join("stamp.png")).unwrap();

    let mut c = blank();
    let s = Renderer::new()
        .base_dir(&dir)
        .render(&mut c, "image over 10,10 0,0 'stamp.png'", &GraphicContext::default())
        .unwrap();
    assert!(s.success, "{:?}", s.diagnostics);
    assert_eq!(c.get(10, 10), Some(RED));
    assert_eq!(c.get(12, 12), Some(BLUE));
    assert_eq!(c.get(9, 9), Some(Rgba8::white()));
    assert_eq!(c.get(14, 14), Some(Rgba8::white()));
}

#[test]
fn missing_image_is_reported() {
    let mut c = blank();
    let s = run(&mut c, "image over 0,0 0,0 'no-such-file.png' fill red rectangle 0,0 9,9");
    assert!(!s.success);
    assert!(s.has(ErrorKind::Io));
    assert_eq!(c.get(5, 5), Some(RED));
}

#[test]
fn program_from_file_with_pool() {
    logging();
    let dir = assets::scratch_dir().unwrap();
    std::fs::write(dir.join("square.mvg"), "fill blue\nrectangle 0,0 39,39\n").unwrap();
    let mut a = blank();
    let s = Renderer::new()
        .base_dir(&dir)
        .threads(Some(3))
        .render(&mut a, "@square.mvg", &GraphicContext::default())
        .unwrap();
    assert!(s.success);
    assert_eq!(a.get(20, 20), Some(BLUE));
}

#[test]
fn thread_count_does_not_change_pixels() {
    logging();
    let program = "stroke-width 3 stroke red fill #0080ff80 \
                   stroke-dasharray 5 3 ellipse 20,20 15,9 0,360 \
                   stroke-dasharray none stroke-linejoin round polyline 2,38 20,5 38,38";
    let mut one = blank();
    let mut many = blank();
    Renderer::new().threads(Some(1)).render(&mut one, program, &GraphicContext::default()).unwrap();
    Renderer::new().threads(Some(4)).render(&mut many, program, &GraphicContext::default()).unwrap();
    assert!(imageio::canvas_diff(&one, &many));
}

#[test]
fn written_png_reads_back() {
    let dir = assets::scratch_dir().unwrap();
    let mut c = blank();
    run(&mut c, "fill red circle 20,20 20,30 stroke blue line 0,0 39,39");
    let file = dir.join("circle.png");
    imageio::write_file(&c, &file).unwrap();
    let back = imageio::read_file(&file).unwrap();
    assert!(imageio::canvas_diff(&c, &back));
}
