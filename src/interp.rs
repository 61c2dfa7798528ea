//! Drawing Program Interpreter
//!
//! A program is a sequence of commands, each a keyword followed by its
//! arguments:
//!
//! ```text
//! push graphic-context
//!   fill red
//!   stroke-width 2
//!   rectangle 10,10 20,20
//! pop graphic-context
//! ```
//!
//! Commands run in order against a stack of graphic contexts; every
//! primitive is painted onto the canvas as soon as it is read.
//!
//! # Example
//!
//!     use mvg::{Canvas, GraphicContext, Rgba8};
//!
//!     let mut canvas = Canvas::new(32, 32, Rgba8::white());
//!     let status = mvg::render(&mut canvas, "fill blue circle 16,16 16,24",
//!                              &GraphicContext::default()).unwrap();
//!     assert!(status.success);
//!     assert_eq!(canvas.get(16, 16), Some(Rgba8::new(0, 0, 255, 255)));
//!

use crate::canvas::Canvas;
use crate::color::{parse_color, Color, Rgba8};
use crate::compositor::{Compose, Interpolate};
use crate::context::{ContextStack, GraphicContext};
use crate::draw::Painter;
use crate::error::{Diagnostic, DrawError, DrawResult, ErrorKind, Status};
use crate::font::GlyphProvider;
use crate::imageio;
use crate::math::scale_alpha;
use crate::paint::{Gradient, GradientKind, Paint, Tile};
use crate::paths::{Bounds, Point};
use crate::raster::FillRule;
use crate::stroke::{LineCap, LineJoin};
use crate::token::{Token, Tokenizer};
use crate::trace::{PaintMethod, Primitive, PrimitiveKind, Trace};
use crate::transform::Affine;

use rayon::ThreadPool;

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Patterns and clip paths may draw other patterns up to this depth
const MAX_NESTING: usize = 8;

/// Named bodies defined with `push pattern|gradient|clip-path`
#[derive(Debug,Clone)]
enum Definition {
    Pattern { body: String, origin: Point, width: usize, height: usize },
    Gradient(Gradient),
    ClipPath { body: String },
}

/// Configured interpreter
///
///     use mvg::{Canvas, GraphicContext, Renderer, Rgba8};
///
///     let mut canvas = Canvas::new(16, 16, Rgba8::white());
///     let status = Renderer::new()
///         .threads(Some(2))
///         .render(&mut canvas, "line 0,0 15,15", &GraphicContext::default())
///         .unwrap();
///     assert!(status.success);
///
#[derive(Clone,Default)]
pub struct Renderer {
    threads: Option<usize>,
    glyphs: Option<Arc<dyn GlyphProvider>>,
    base_dir: Option<PathBuf>,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("threads", &self.threads)
            .field("glyphs", &self.glyphs.is_some())
            .field("base_dir", &self.base_dir)
            .finish()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }
    /// Worker threads for row sweeps; `None` uses the global pool
    pub fn threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }
    /// Glyph outlines for `text` primitives
    pub fn glyphs<G: GlyphProvider + 'static>(mut self, provider: G) -> Self {
        self.glyphs = Some(Arc::new(provider));
        self
    }
    /// Directory that `@program` files, images and pattern files are
    /// relative to
    pub fn base_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    fn resolve(&self, name: &str) -> PathBuf {
        match &self.base_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }

    fn pool(&self) -> DrawResult<Option<ThreadPool>> {
        let n = match self.threads {
            Some(n) => n,
            None => return Ok(None),
        };
        let pool = rayon::ThreadPoolBuilder::new().num_threads(n.max(1)).build()?;
        Ok(Some(pool))
    }

    /// Program text; `@name` reads the program from a file
    fn program<'p>(&self, program: &'p str) -> DrawResult<Cow<'p, str>> {
        match program.trim_start().strip_prefix('@') {
            Some(name) => Ok(Cow::Owned(std::fs::read_to_string(self.resolve(name.trim()))?)),
            None => Ok(Cow::Borrowed(program)),
        }
    }

    /// Run `program` against `canvas`, starting from the context `ctx`
    ///
    /// Parse errors stop the program and clear `success`; geometry errors
    /// skip one primitive. Both are listed in the returned [`Status`].
    /// Allocation failures are returned as `Err`.
    #[tracing::instrument(level = "debug", skip_all, fields(width = canvas.width, height = canvas.height))]
    pub fn render(&self, canvas: &mut Canvas, program: &str, ctx: &GraphicContext) -> DrawResult<Status> {
        let program = self.program(program)?;
        let pool = self.pool()?;
        let mut base = ctx.clone();
        if base.viewbox.is_none() {
            base.viewbox = Some(Bounds::new(0.0, 0.0, canvas.width as f64, canvas.height as f64));
        }
        tracing::debug!("begin draw-image");
        let status = self.run(canvas, &program, base, pool.as_ref(), 0)?;
        tracing::debug!("end draw-image");
        Ok(status)
    }

    fn run(&self, canvas: &mut Canvas, program: &str, base: GraphicContext,
           pool: Option<&ThreadPool>, depth: usize) -> DrawResult<Status> {
        let mut interp = Interp {
            renderer: self,
            pool,
            canvas,
            stack: ContextStack::new(base),
            defs: HashMap::new(),
            status: Status::ok(),
            index: 0,
            depth,
        };
        interp.run(program)?;
        Ok(interp.status)
    }
}

/// Render `program` onto `canvas` with a default [`Renderer`]
pub fn render(canvas: &mut Canvas, program: &str, ctx: &GraphicContext) -> DrawResult<Status> {
    Renderer::new().render(canvas, program, ctx)
}

struct Interp<'r, 'c> {
    renderer: &'r Renderer,
    pool: Option<&'r ThreadPool>,
    canvas: &'c mut Canvas,
    stack: ContextStack,
    defs: HashMap<String, Definition>,
    status: Status,
    /// Primitives read so far
    index: usize,
    depth: usize,
}

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn color(keyword: &str, t: &Token) -> DrawResult<Rgba8> {
    parse_color(&t.text).ok_or_else(|| DrawError::parse(keyword, "color", t.text.clone()))
}

impl Interp<'_, '_> {
    fn run(&mut self, program: &str) -> DrawResult<()> {
        let mut t = Tokenizer::new(program);
        while let Some(tok) = t.next_token() {
            if !tok.quoted && tok.text.starts_with('#') {
                t.skip_line();
                continue;
            }
            if tok.is(";") {
                continue;
            }
            let index = self.index;
            let result = self.command(&mut t, &tok);
            tracing::debug!("  {}", t.slice_from(tok.offset).trim());
            let err = match result {
                Ok(()) => continue,
                Err(e) => e,
            };
            if err.is_fatal() {
                return Err(err);
            }
            let at = if self.index > index { Some(index) } else { None };
            self.status.report(Diagnostic::from_error(&err, at));
            match err.kind() {
                ErrorKind::Geometry | ErrorKind::Io => {}
                // underflow resets the stack and carries on
                _ if matches!(err, DrawError::UnbalancedPushPop) => {}
                _ => break,
            }
        }
        Ok(())
    }

    fn ctx(&mut self) -> &mut GraphicContext {
        self.stack.top_mut()
    }

    fn transform(&mut self, m: Affine) {
        if !m.is_identity() {
            let ctx = self.ctx();
            ctx.affine = ctx.affine * m;
        }
    }

    fn command(&mut self, t: &mut Tokenizer, tok: &Token) -> DrawResult<()> {
        let kw = tok.text.to_ascii_lowercase();
        let kw = kw.as_str();
        if let Some(kind) = PrimitiveKind::from_keyword(kw) {
            return self.primitive(t, kind, kw);
        }
        match kw {
            "affine" => {
                let mut v = [0.0; 6];
                for x in v.iter_mut() {
                    *x = t.number(kw)?;
                }
                self.transform(Affine::new(v[0], v[1], v[2], v[3], v[4], v[5]));
            }
            "translate" => {
                let (x, y) = (t.number(kw)?, t.number(kw)?);
                self.transform(Affine::translate(x, y));
            }
            "scale" => {
                let (x, y) = (t.number(kw)?, t.number(kw)?);
                self.transform(Affine::scale(x, y));
            }
            "rotate" => {
                let a = t.number(kw)?;
                self.transform(Affine::rotate(a));
            }
            "skewx" => {
                let a = t.number(kw)?;
                self.transform(Affine::skew_x(a));
            }
            "skewy" => {
                let a = t.number(kw)?;
                self.transform(Affine::skew_y(a));
            }
            "fill" | "stroke" => {
                let name = t.expect(kw, "color or pattern")?;
                let paint = self.paint(kw, &name)?;
                if kw == "fill" {
                    self.ctx().fill = paint;
                } else {
                    self.ctx().stroke = paint;
                }
            }
            "fill-opacity" => {
                let v = clamp01(t.fraction(kw)?);
                self.ctx().fill_opacity = v;
            }
            "stroke-opacity" => {
                let v = clamp01(t.fraction(kw)?);
                self.ctx().stroke_opacity = v;
            }
            "opacity" => {
                let v = clamp01(t.fraction(kw)?);
                self.ctx().opacity = v;
            }
            "fill-rule" | "clip-rule" => {
                let v = t.expect(kw, "fill rule")?;
                let rule = FillRule::from_keyword(&v.text)
                    .ok_or_else(|| DrawError::parse(kw, "evenodd or nonzero", v.text.clone()))?;
                if kw == "fill-rule" {
                    self.ctx().fill_rule = rule;
                } else {
                    self.ctx().clip_rule = rule;
                }
            }
            "stroke-width" => {
                let w = t.number(kw)?;
                if w < 0.0 {
                    return Err(DrawError::parse(kw, "non-negative width", w.to_string()));
                }
                self.ctx().stroke_width = w;
            }
            "stroke-linecap" => {
                let v = t.expect(kw, "line cap")?;
                self.ctx().line_cap = LineCap::from_keyword(&v.text)
                    .ok_or_else(|| DrawError::parse(kw, "butt, round or square", v.text.clone()))?;
            }
            "stroke-linejoin" => {
                let v = t.expect(kw, "line join")?;
                self.ctx().line_join = LineJoin::from_keyword(&v.text)
                    .ok_or_else(|| DrawError::parse(kw, "miter, round or bevel", v.text.clone()))?;
            }
            "interpolate" => {
                let v = t.expect(kw, "interpolation method")?;
                self.ctx().interpolate = Interpolate::from_keyword(&v.text)
                    .ok_or_else(|| DrawError::parse(kw, "nearest, bilinear, bicubic or mesh", v.text.clone()))?;
            }
            "stroke-miterlimit" => {
                let v = t.number(kw)?;
                self.ctx().miter_limit = v;
            }
            "stroke-dasharray" => {
                let mut dashes = vec![];
                if t.peek_number() {
                    while t.peek_number() {
                        let v = t.number(kw)?;
                        if v < 0.0 {
                            return Err(DrawError::parse(kw, "non-negative dash length", v.to_string()));
                        }
                        dashes.push(v);
                        t.skip_comma();
                    }
                } else {
                    let v = t.expect(kw, "dash lengths or none")?;
                    if !v.is("none") {
                        return Err(DrawError::parse(kw, "dash lengths or none", v.text));
                    }
                }
                self.ctx().dash_array = dashes;
            }
            "stroke-dashoffset" => {
                let v = t.number(kw)?;
                self.ctx().dash_offset = v;
            }
            "stroke-antialias" => {
                let v = t.number(kw)?;
                self.ctx().stroke_antialias = v != 0.0;
            }
            "text-antialias" => {
                let v = t.number(kw)?;
                self.ctx().text.antialias = v != 0.0;
            }
            "border-color" => {
                let v = t.expect(kw, "color")?;
                self.ctx().border_color = color(kw, &v)?;
            }
            "text-undercolor" => {
                let v = t.expect(kw, "color")?;
                self.ctx().text.undercolor = color(kw, &v)?;
            }
            "clip-path" => {
                let name = t.expect(kw, "clip path name")?;
                self.clip_path(&name.text)?;
            }
            "clip-units" => {
                let v = t.expect(kw, "clip units")?;
                match v.text.to_ascii_lowercase().as_str() {
                    "userspace" | "userspaceonuse" | "objectboundingbox" => {}
                    _ => return Err(DrawError::parse(kw, "clip units", v.text)),
                }
                self.ctx().clip_units = v.text;
            }
            "font" => {
                let v = t.expect(kw, "font")?;
                self.ctx().text.font = Some(v.text);
            }
            "font-family" => {
                let v = t.expect(kw, "font family")?;
                self.ctx().text.family = Some(v.text);
            }
            "font-size" => {
                let v = t.number(kw)?;
                self.ctx().text.size = v;
            }
            "font-stretch" => {
                let v = t.expect(kw, "font stretch")?;
                self.ctx().text.stretch = v.text;
            }
            "font-style" => {
                let v = t.expect(kw, "font style")?;
                self.ctx().text.style = v.text;
            }
            "font-weight" => {
                let v = t.expect(kw, "font weight")?;
                let current = self.stack.top().text.weight;
                let w = match v.text.to_ascii_lowercase().as_str() {
                    "all" | "normal" => 400,
                    "bold" => 700,
                    "bolder" => (current + 100).min(900),
                    "lighter" => current.saturating_sub(100).max(100),
                    s => s.parse::<u32>()
                        .map_err(|_| DrawError::parse(kw, "font weight", v.text.clone()))?,
                };
                self.ctx().text.weight = w;
            }
            "decorate" | "direction" | "gravity" | "text-align" | "text-anchor" => {
                let v = t.expect(kw, "keyword")?.text;
                let text = &mut self.ctx().text;
                match kw {
                    "decorate" => text.decorate = v,
                    "direction" => text.direction = v,
                    "gravity" => text.gravity = v,
                    "text-align" => text.align = v,
                    _ => text.anchor = v,
                }
            }
            "density" | "encoding" => {
                let v = t.expect(kw, "value")?.text;
                if kw == "density" {
                    self.ctx().text.density = Some(v);
                } else {
                    self.ctx().text.encoding = Some(v);
                }
            }
            "kerning" => {
                let v = t.number(kw)?;
                self.ctx().text.kerning = v;
            }
            "interline-spacing" => {
                let v = t.number(kw)?;
                self.ctx().text.interline_spacing = v;
            }
            "interword-spacing" => {
                let v = t.number(kw)?;
                self.ctx().text.interword_spacing = v;
            }
            "viewbox" => {
                let (x, y) = (t.number(kw)?, t.number(kw)?);
                let (w, h) = (t.number(kw)?, t.number(kw)?);
                self.ctx().viewbox = Some(Bounds::new(x, y, x + w, y + h));
            }
            "stop-color" => {
                // stops only mean something inside a gradient body
                let c = t.expect(kw, "color")?;
                color(kw, &c)?;
                t.fraction(kw)?;
            }
            "offset" | "gradient-units" => {
                t.expect(kw, "value")?;
            }
            "push" => return self.push(t),
            "pop" => return self.pop(t),
            _ => return Err(DrawError::UnknownKeyword { keyword: tok.text.clone(), offset: tok.offset }),
        }
        Ok(())
    }

    fn push(&mut self, t: &mut Tokenizer) -> DrawResult<()> {
        let what = t.expect("push", "graphic-context, pattern, gradient, clip-path or defs")?;
        match what.text.to_ascii_lowercase().as_str() {
            "graphic-context" => self.stack.push(),
            "defs" => Ok(()),
            "pattern" => {
                let name = t.expect("push pattern", "name")?.text;
                let origin = t.point("push pattern")?;
                let size = t.point("push pattern")?;
                let body = capture(t, "pattern")?;
                let origin = Point::new((origin.x - 0.5).ceil(), (origin.y - 0.5).ceil());
                let (width, height) = ((size.x + 0.5).floor().max(0.0) as usize,
                                       (size.y + 0.5).floor().max(0.0) as usize);
                self.defs.insert(name, Definition::Pattern { body, origin, width, height });
                Ok(())
            }
            "gradient" => {
                let name = t.expect("push gradient", "name")?.text;
                let kind = t.expect("push gradient", "linear or radial")?;
                let p1 = t.point("push gradient")?;
                let p2 = t.point("push gradient")?;
                let m = self.stack.top().affine;
                let kind = match kind.text.to_ascii_lowercase().as_str() {
                    "linear" => GradientKind::Linear { start: m.transform(p1), end: m.transform(p2) },
                    "radial" => {
                        let r = t.number("push gradient")?;
                        GradientKind::Radial { center: m.transform(p1), radius: r * m.expansion() }
                    }
                    _ => return Err(DrawError::parse("push gradient", "linear or radial", kind.text)),
                };
                let body = capture(t, "gradient")?;
                let gradient = gradient_stops(Gradient::new(kind), &body)?;
                self.defs.insert(name, Definition::Gradient(gradient));
                Ok(())
            }
            "clip-path" => {
                let name = t.expect("push clip-path", "name")?.text;
                let body = capture(t, "clip-path")?;
                self.defs.insert(name, Definition::ClipPath { body });
                Ok(())
            }
            _ => Err(DrawError::parse("push", "graphic-context, pattern, gradient, clip-path or defs",
                                      what.text)),
        }
    }

    fn pop(&mut self, t: &mut Tokenizer) -> DrawResult<()> {
        let what = t.expect("pop", "graphic-context, pattern, gradient, clip-path or defs")?;
        match what.text.to_ascii_lowercase().as_str() {
            "graphic-context" => self.stack.pop(),
            "defs" | "pattern" | "gradient" | "clip-path" => Ok(()),
            _ => Err(DrawError::parse("pop", "graphic-context, pattern, gradient, clip-path or defs",
                                      what.text)),
        }
    }

    /// Run a nested program on its own canvas
    fn nested(&mut self, canvas: &mut Canvas, body: &str, base: GraphicContext) -> DrawResult<()> {
        if self.depth >= MAX_NESTING {
            return Err(DrawError::parse("pattern", "shallower nesting", body.trim()));
        }
        let status = self.renderer.run(canvas, body, base, self.pool, self.depth + 1)?;
        if !status.success {
            self.status.success = false;
        }
        self.status.diagnostics.extend(status.diagnostics);
        Ok(())
    }

    /// Paint named by `t`: a definition, a color, or an image file
    fn paint(&mut self, keyword: &str, t: &Token) -> DrawResult<Paint> {
        match self.defs.get(&t.text).cloned() {
            Some(Definition::Pattern { body, origin, width, height }) => {
                tracing::debug!("begin pattern-path {} {}x{}", t.text, width, height);
                imageio::check_size(width, height)?;
                let mut tile = Canvas::try_new(width, height, Rgba8::transparent())?;
                self.nested(&mut tile, &body, GraphicContext::default())?;
                tracing::debug!("end pattern-path");
                return Ok(Paint::Pattern(Arc::new(Tile::new(tile, origin))));
            }
            Some(Definition::Gradient(g)) => {
                let tile = g.render(self.canvas.width, self.canvas.height);
                return Ok(Paint::Pattern(Arc::new(Tile::new(tile, Point::default()))));
            }
            Some(Definition::ClipPath { .. }) => {
                return Err(DrawError::parse(keyword, "color or pattern", t.text.clone()));
            }
            None => {}
        }
        if let Some(c) = parse_color(&t.text) {
            return Ok(if c.is_visible() { Paint::Solid(c) } else { Paint::None });
        }
        let path = self.renderer.resolve(&t.text);
        if path.is_file() {
            let image = imageio::read_file(path)?;
            return Ok(Paint::Pattern(Arc::new(Tile::new(image, Point::default()))));
        }
        Err(DrawError::parse(keyword, "color or pattern", t.text.clone()))
    }

    /// Render a clip path body into the context's write mask
    fn clip_path(&mut self, name: &str) -> DrawResult<()> {
        let body = match self.defs.get(name) {
            Some(Definition::ClipPath { body }) => body.clone(),
            _ => {
                tracing::warn!("clip path {} is not defined", name);
                let ctx = self.ctx();
                ctx.clip_path = Some(name.to_string());
                ctx.clip_mask = None;
                return Ok(());
            }
        };
        tracing::debug!("begin clip-path {}", name);
        let mut base = self.stack.top().clone();
        base.fill = Paint::Solid(Rgba8::white());
        base.stroke = Paint::None;
        base.fill_opacity = 1.0;
        base.opacity = 1.0;
        base.fill_rule = base.clip_rule;
        base.clip_mask = None;
        base.clip_path = None;
        let mut mask = Canvas::try_new(self.canvas.width, self.canvas.height, Rgba8::transparent())?;
        self.nested(&mut mask, &body, base)?;
        let ctx = self.ctx();
        ctx.clip_path = Some(name.to_string());
        ctx.clip_mask = Some(Arc::new(crate::canvas::Mask::from_canvas(&mask)));
        tracing::debug!("end clip-path");
        Ok(())
    }

    fn primitive(&mut self, t: &mut Tokenizer, kind: PrimitiveKind, kw: &str) -> DrawResult<()> {
        let index = self.index;
        self.index += 1;
        let compose = if kind == PrimitiveKind::Image {
            let c = t.expect(kw, "compose operator")?;
            Some(Compose::from_keyword(&c.text)
                 .ok_or_else(|| DrawError::parse(kw, "compose operator", c.text.clone()))?)
        } else {
            None
        };
        let pts = t.points(kw)?;
        let one = |pts: &[Point]| -> DrawResult<Point> {
            match pts {
                [p] => Ok(*p),
                _ => Err(DrawError::geometry(kind.name(), index,
                                             format!("expected 1 point, found {}", pts.len()))),
            }
        };
        let prim = match kind {
            PrimitiveKind::Path => {
                let data = t.expect(kw, "path data")?;
                Primitive::Path(data.text)
            }
            PrimitiveKind::Color | PrimitiveKind::Alpha => {
                let m = t.expect(kw, "paint method")?;
                let method = PaintMethod::from_keyword(&m.text)
                    .ok_or_else(|| DrawError::parse(kw, "paint method", m.text.clone()))?;
                let at = one(&pts)?;
                if kind == PrimitiveKind::Color {
                    Primitive::Color { at, method }
                } else {
                    Primitive::Alpha { at, method }
                }
            }
            PrimitiveKind::Text => {
                let text = t.expect(kw, "text")?.text;
                Primitive::Text { at: one(&pts)?, text }
            }
            PrimitiveKind::Image => {
                let source = t.expect(kw, "image file")?.text;
                if pts.len() != 2 {
                    return Err(DrawError::geometry(kind.name(), index,
                                                   format!("expected 2 points, found {}", pts.len())));
                }
                Primitive::Image { compose: compose.unwrap_or_default(), at: pts[0], size: pts[1], source }
            }
            _ => Primitive::from_points(kind, pts, index)?,
        };
        self.draw(&prim, index)
    }

    fn draw(&mut self, prim: &Primitive, index: usize) -> DrawResult<()> {
        let bounds = match prim {
            Primitive::Text { at, text } => self.draw_text(*at, text)?,
            Primitive::Image { compose, at, size, source } => self.draw_image(*compose, *at, *size, source)?,
            _ => {
                let mut painter = Painter::with_pool(&mut *self.canvas, self.pool);
                painter.draw_primitive(self.stack.top(), prim, index)?
            }
        };
        if let Some(b) = bounds {
            self.ctx().include(b);
        }
        Ok(())
    }

    fn draw_text(&mut self, at: Point, text: &str) -> DrawResult<Option<Bounds>> {
        let glyphs = match &self.renderer.glyphs {
            Some(g) => Arc::clone(g),
            None => return Err(DrawError::Font("no glyph provider for text primitive".into())),
        };
        let ctx = self.stack.top();
        let subpaths = glyphs.outline(text, &ctx.text)?;
        let mut trace = Trace::new(PrimitiveKind::Text, subpaths.into_iter()
            .map(|s| s.into_iter().map(|p| Point::new(p.x + at.x, p.y + at.y)).collect())
            .collect());
        trace.transform(&ctx.affine);
        let bounds = trace.bounds();
        let mut painter = Painter::with_pool(&mut *self.canvas, self.pool);
        if let (Some(b), true) = (bounds, ctx.text.undercolor.is_visible()) {
            let mut under = ctx.clone();
            under.fill = Paint::Solid(ctx.text.undercolor);
            under.stroke = Paint::None;
            let rect = Trace::single(PrimitiveKind::Rectangle, crate::trace::trace_rectangle(
                Point::new(b.x1, b.y1), Point::new(b.x2, b.y2)));
            painter.draw_shape(&under, &rect)?;
        }
        painter.draw_shape(ctx, &trace)?;
        Ok(bounds)
    }

    fn draw_image(&mut self, compose: Compose, at: Point, size: Point,
                  source: &str) -> DrawResult<Option<Bounds>> {
        let mut image = imageio::read_file(self.renderer.resolve(source))?;
        let w = (size.x - 0.5).ceil().max(0.0) as usize;
        let h = (size.y - 0.5).ceil().max(0.0) as usize;
        if w != 0 && h != 0 && (w != image.width || h != image.height) {
            image = imageio::resize(&image, w, h)?;
        }
        let ctx = self.stack.top();
        if ctx.opacity < 1.0 {
            for px in image.data.chunks_exact_mut(4) {
                let c = scale_alpha(Rgba8::from_slice(px), ctx.opacity);
                px[3] = c.a;
            }
        }
        let p = ctx.affine.transform(at);
        let mut painter = Painter::with_pool(&mut *self.canvas, self.pool);
        painter.draw_image(&image, p, &ctx.affine, compose, ctx.interpolate, ctx.clip_mask.as_deref());
        Ok(Some(Bounds::from_point(p)))
    }
}

/// Source text up to the matching `pop <what>`
fn capture(t: &mut Tokenizer, what: &str) -> DrawResult<String> {
    let start = t.offset();
    while let Some(tok) = t.next_token() {
        if tok.is("pop") && t.peek().is_some_and(|n| n.is(what)) {
            let body = t.source()[start..tok.offset].to_string();
            t.next_token();
            return Ok(body);
        }
    }
    Err(DrawError::parse("push", "matching pop", what))
}

/// Read the `stop-color <color> <offset>` entries of a gradient body
fn gradient_stops(mut g: Gradient, body: &str) -> DrawResult<Gradient> {
    let mut t = Tokenizer::new(body);
    while let Some(tok) = t.next_token() {
        if tok.is("stop-color") {
            let c = t.expect("stop-color", "color")?;
            let c = color("stop-color", &c)?;
            let offset = t.fraction("stop-color")?;
            g.add_stop(offset, c);
        }
    }
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(40, 40, Rgba8::white())
    }

    #[test]
    fn transforms_compose() {
        let mut c = canvas();
        let s = render(&mut c, "translate 10,10 scale 2,2 fill red rectangle 0,0 5,5",
                       &GraphicContext::default()).unwrap();
        assert!(s.success);
        assert_eq!(c.get(15, 15), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(c.get(5, 5), Some(Rgba8::white()));
    }

    #[test]
    fn unknown_keyword_stops() {
        let mut c = canvas();
        let s = render(&mut c, "bogus 1,2\nfill red rectangle 0,0 10,10",
                       &GraphicContext::default()).unwrap();
        assert!(!s.success);
        assert_eq!(s.diagnostics[0].token.as_deref(), Some("bogus"));
        assert_eq!(c.get(5, 5), Some(Rgba8::white()));
    }

    #[test]
    fn comments_are_skipped() {
        let mut c = canvas();
        let s = render(&mut c, "# a comment rectangle 0,0 39,39\npoint 1,1",
                       &GraphicContext::default()).unwrap();
        assert!(s.success);
        assert_eq!(c.get(1, 1), Some(Rgba8::black()));
        assert_eq!(c.get(20, 20), Some(Rgba8::white()));
    }

    #[test]
    fn pattern_fill_tiles() {
        let mut c = canvas();
        let program = "push pattern checks 0,0 2,2\n\
                       fill blue point 0,0 point 1,1\n\
                       pop pattern\n\
                       fill checks rectangle 0,0 10,10";
        let s = render(&mut c, program, &GraphicContext::default()).unwrap();
        assert!(s.success, "{:?}", s.diagnostics);
        assert_eq!(c.get(4, 4), Some(Rgba8::new(0, 0, 255, 255)));
        assert_eq!(c.get(5, 4), Some(Rgba8::white()));
    }

    #[test]
    fn clip_path_limits_drawing() {
        let mut c = canvas();
        let program = "push clip-path box\n rectangle 0,0 9,9\npop clip-path\n\
                       clip-path box fill red rectangle 0,0 39,39";
        let s = render(&mut c, program, &GraphicContext::default()).unwrap();
        assert!(s.success, "{:?}", s.diagnostics);
        assert_eq!(c.get(5, 5), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(c.get(20, 20), Some(Rgba8::white()));
    }

    #[test]
    fn gradient_paint() {
        let mut c = canvas();
        let program = "push gradient ramp linear 0,0 39,0\n\
                       stop-color black 0 stop-color white 1\n\
                       pop gradient\n\
                       fill ramp rectangle 0,0 39,39";
        let s = render(&mut c, program, &GraphicContext::default()).unwrap();
        assert!(s.success, "{:?}", s.diagnostics);
        assert_eq!(c.get(0, 10), Some(Rgba8::black()));
        assert_eq!(c.get(39, 10), Some(Rgba8::white()));
    }

    #[test]
    fn dasharray_takes_lengths_or_none() {
        let mut c = canvas();
        let s = render(&mut c, "stroke-dasharray rectangle 0,0 5,5", &GraphicContext::default()).unwrap();
        assert!(!s.success);
        assert!(s.diagnostics[0].message.contains("stroke-dasharray"));
        assert_eq!(s.diagnostics[0].token.as_deref(), Some("rectangle"));
        assert_eq!(c.get(2, 2), Some(Rgba8::white()));

        let mut c = canvas();
        let s = render(&mut c, "stroke-dasharray 2,2 stroke-dasharray None rectangle 0,0 5,5",
                       &GraphicContext::default()).unwrap();
        assert!(s.success, "{:?}", s.diagnostics);
        assert_eq!(c.get(2, 2), Some(Rgba8::black()));
    }

    #[test]
    fn dash_ending_on_a_boundary_leaves_no_dot() {
        let mut c = canvas();
        let s = render(&mut c, "fill none stroke red stroke-dasharray 4,2 line 0,5 12,5",
                       &GraphicContext::default()).unwrap();
        assert!(s.success, "{:?}", s.diagnostics);
        assert_eq!(c.get(2, 5), Some(Rgba8::new(255, 0, 0, 255)));
        assert_eq!(c.get(12, 5), Some(Rgba8::white()));
    }

    #[test]
    fn interpolate_keyword() {
        let mut c = canvas();
        let s = render(&mut c, "interpolate Bicubic interpolate nearest-neighbor point 1,1",
                       &GraphicContext::default()).unwrap();
        assert!(s.success, "{:?}", s.diagnostics);
        let s = render(&mut c, "interpolate sharpest point 1,1", &GraphicContext::default()).unwrap();
        assert!(!s.success);
        assert_eq!(s.diagnostics[0].token.as_deref(), Some("sharpest"));
    }

    #[test]
    fn non_ascii_keyword_is_unknown() {
        let mut c = canvas();
        let s = render(&mut c, "abcéx 1,1", &GraphicContext::default()).unwrap();
        assert!(!s.success);
        assert_eq!(s.diagnostics[0].kind, ErrorKind::Parse);
        assert!(s.diagnostics[0].message.contains("abcéx"));
        assert_eq!(s.diagnostics[0].token.as_deref(), Some("abcéx"));
    }

    #[test]
    fn x11_color_names_paint() {
        let mut c = canvas();
        let s = render(&mut c, "fill AliceBlue rectangle 0,0 9,9 fill gray50 rectangle 20,20 29,29",
                       &GraphicContext::default()).unwrap();
        assert!(s.success, "{:?}", s.diagnostics);
        assert_eq!(c.get(5, 5), Some(Rgba8::new(240, 248, 255, 255)));
        assert_eq!(c.get(25, 25), Some(Rgba8::new(127, 127, 127, 255)));
    }

    #[test]
    fn text_without_glyphs_is_skipped() {
        let mut c = canvas();
        let s = render(&mut c, "text 10,10 'hello' point 2,2", &GraphicContext::default()).unwrap();
        assert!(s.success);
        assert!(s.has(ErrorKind::Geometry));
        assert_eq!(c.get(2, 2), Some(Rgba8::black()));
    }
}
