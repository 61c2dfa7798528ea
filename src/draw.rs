//! Primitive Drawing
//!
//! A [`Painter`] takes primitives already mapped to device space and puts
//! them on a [`Canvas`]:
//!
//!   - shapes are converted to an edge list and every pixel of their
//!     bounding box is shaded from the fill and stroke opacity at its center
//!   - thick strokes whose joins or caps the distance test cannot express
//!     are drawn by filling their outline
//!   - dashed strokes are split into runs and each run is stroked on its own
//!   - color and alpha primitives write pixels selected by a paint method
//!
//! Rows of a bounding box are shaded in parallel; each worker carries its
//! own [`Sweep`] over the shared polygon.

use crate::canvas::{Canvas, Mask, BPP};
use crate::color::{Color, Rgba8};
use crate::compositor::{composite_affine, Compose, Interpolate};
use crate::context::GraphicContext;
use crate::dash::{split_dashes, MAX_DASH_RUNS};
use crate::error::{DrawError, DrawResult};
use crate::math::composite_over;
use crate::paint::Paint;
use crate::paths::{to_path, Bounds, Point};
use crate::polygon::{build_edges, Polygon};
use crate::raster::{FillRule, Sweep};
use crate::stroke::{square_cap, LineCap, LineJoin};
use crate::trace::{PaintMethod, Primitive, PrimitiveKind, Trace};
use crate::transform::Affine;

use rayon::prelude::*;
use rayon::ThreadPool;

use std::sync::Arc;

/// How a polygon is shaded
#[derive(Debug,Clone)]
pub struct Style {
    pub fill: Paint,
    pub stroke: Paint,
    /// Half the stroke width in device units
    pub mid: f64,
    pub fill_rule: FillRule,
    /// When off, coverage snaps to 0 or 1
    pub antialias: bool,
    pub clip: Option<Arc<Mask>>,
}

impl Style {
    pub fn from_context(ctx: &GraphicContext) -> Self {
        Self {
            fill: ctx.fill_paint(),
            stroke: ctx.stroke_paint(),
            mid: ctx.mid(),
            fill_rule: ctx.fill_rule,
            antialias: ctx.stroke_antialias,
            clip: ctx.clip_mask.clone(),
        }
    }
    /// Same style with the stroke turned off
    pub fn fill_only(&self) -> Self {
        Self { stroke: Paint::None, ..self.clone() }
    }
    /// Same style with the fill turned off
    pub fn stroke_only(&self) -> Self {
        Self { fill: Paint::None, ..self.clone() }
    }
    /// Style that fills a stroke outline with the stroke paint
    fn outline(&self) -> Self {
        Self {
            fill: self.stroke.clone(),
            stroke: Paint::None,
            mid: 0.0,
            fill_rule: FillRule::NonZero,
            ..self.clone()
        }
    }
    fn writes(&self, x: usize, y: usize) -> bool {
        self.clip.as_ref().map_or(true, |m| m.allows(x, y))
    }
}

/// Lower end of a bounding box range, clamped to `[0, size)`
fn clamp_low(v: f64, size: usize) -> f64 {
    if v < 0.0 {
        0.0
    } else if (v - 0.5).ceil() >= size as f64 {
        size as f64 - 1.0
    } else {
        v
    }
}

/// Upper end of a bounding box range, clamped to `[0, size)`
fn clamp_high(v: f64, size: usize) -> f64 {
    if v < 0.0 {
        0.0
    } else if (v + 0.5).floor() >= size as f64 {
        size as f64 - 1.0
    } else {
        v
    }
}

/// Paints device space primitives onto a canvas
pub struct Painter<'a> {
    pub canvas: &'a mut Canvas,
    pool: Option<&'a ThreadPool>,
}

impl<'a> Painter<'a> {
    pub fn new(canvas: &'a mut Canvas) -> Self {
        Self { canvas, pool: None }
    }
    /// Run row sweeps on `pool` instead of the global pool
    pub fn with_pool(canvas: &'a mut Canvas, pool: Option<&'a ThreadPool>) -> Self {
        Self { canvas, pool }
    }

    /// Shade the polygon formed by `subpaths`
    pub fn draw_polygon(&mut self, style: &Style, subpaths: &[Vec<Point>]) -> DrawResult<()> {
        let n: usize = subpaths.iter().map(|s| s.len()).sum();
        if n == 0 || self.canvas.width == 0 || self.canvas.height == 0 {
            return Ok(());
        }
        let path = to_path(subpaths);
        let poly = build_edges(&path)?;
        tracing::trace!("begin draw-polygon, {} edges", poly.len());
        let first = subpaths.iter().flat_map(|s| s.first()).next().copied()
            .unwrap_or_default();
        let b = poly.bounds().unwrap_or_else(|| Bounds::from_point(first));
        let pad = style.mid + 1.0;
        let (w, h) = (self.canvas.width, self.canvas.height);
        let b = Bounds::new(clamp_low(b.x1 - pad, w), clamp_low(b.y1 - pad, h),
                            clamp_high(b.x2 + pad, w), clamp_high(b.y2 + pad, h));
        if n == 1 || poly.is_empty() {
            self.draw_dot(style, first);
        } else {
            self.shade(style, &poly, b);
        }
        tracing::trace!("end draw-polygon");
        Ok(())
    }

    /// A polygon that collapsed to one point sets that pixel
    fn draw_dot(&mut self, style: &Style, p: Point) {
        let (x, y) = ((p.x - 0.5).ceil() as i64, (p.y - 0.5).ceil() as i64);
        if !self.canvas.contains(x, y) || !style.writes(x as usize, y as usize) {
            return;
        }
        let paint = if style.fill.is_visible() { &style.fill } else { &style.stroke };
        if paint.is_visible() {
            self.canvas.put(x, y, paint.color_at(x, y));
        }
    }

    fn shade(&mut self, style: &Style, poly: &Polygon, b: Bounds) {
        let start_y = (b.y1 - 0.5).ceil() as usize;
        let stop_y = (b.y2 + 0.5).floor() as usize;
        let start_x = (b.x1 - 0.5).ceil() as usize;
        let stop_x = (b.x2 + 0.5).floor() as usize;
        if start_y > stop_y || start_x > stop_x {
            return;
        }
        let fill = style.fill.is_visible();
        let stroke = style.stroke.is_visible();
        if !fill && !stroke {
            return;
        }
        let row_bytes = self.canvas.row_bytes();
        let data = &mut self.canvas.data;
        let mut job = move || {
            data.par_chunks_mut(row_bytes)
                .enumerate()
                .skip(start_y)
                .take(stop_y - start_y + 1)
                .for_each_init(|| Sweep::new(poly), |sweep, (y, row)| {
                    for x in start_x..=stop_x {
                        if !style.writes(x, y) {
                            continue;
                        }
                        let (mut fa, mut sa) = sweep.opacity(poly, style.mid, fill, style.fill_rule,
                                                             x as f64, y as f64);
                        if !style.antialias {
                            fa = if fa > 0.25 { 1.0 } else { 0.0 };
                            sa = if sa > 0.25 { 1.0 } else { 0.0 };
                        }
                        let px = &mut row[x * BPP..(x + 1) * BPP];
                        let mut c = Rgba8::from_slice(px);
                        if fill {
                            let f = style.fill.color_at(x as i64, y as i64);
                            c = composite_over(f, fa * f.alpha(), c);
                        }
                        if stroke {
                            let s = style.stroke.color_at(x as i64, y as i64);
                            c = composite_over(s, sa * s.alpha(), c);
                        }
                        px.copy_from_slice(&c.to_array());
                    }
                });
        };
        match self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        }
    }

    /// Stroke each subpath by filling its outline
    fn draw_stroke_outline(&mut self, ctx: &GraphicContext, style: &Style,
                           subpaths: &[Vec<Point>]) -> DrawResult<()> {
        let stroker = ctx.stroker();
        let fill = style.outline();
        for sub in subpaths {
            let rings = stroker.outline(sub);
            tracing::trace!(rings = rings.len(), "stroke outline");
            self.draw_polygon(&fill, &rings)?;
        }
        Ok(())
    }

    /// Stroke every "on" run of the dash pattern
    fn draw_dashes(&mut self, ctx: &GraphicContext, style: &Style,
                   subpaths: &[Vec<Point>]) -> DrawResult<()> {
        let pattern = match ctx.dash_pattern() {
            Some(p) => p,
            None => return Ok(()),
        };
        let thin = style.stroke_only();
        for sub in subpaths {
            for dash in split_dashes(sub, &pattern) {
                // a run that ends exactly on a boundary has no length
                if dash.iter().all(|p| p.same(&dash[0])) {
                    continue;
                }
                let dash = vec![dash];
                if style.mid > 1.0 {
                    self.draw_stroke_outline(ctx, style, &dash)?;
                } else {
                    self.draw_polygon(&thin, &dash)?;
                }
            }
        }
        Ok(())
    }

    /// Fill and stroke traced, device space subpaths
    pub fn draw_shape(&mut self, ctx: &GraphicContext, trace: &Trace) -> DrawResult<()> {
        let style = Style::from_context(ctx);
        let stroke = style.stroke.is_visible();
        let subpaths = &trace.subpaths;
        if stroke && ctx.dash_pattern().is_some() {
            if style.fill.is_visible() {
                self.draw_polygon(&style.fill_only(), subpaths)?;
            }
            return self.draw_dashes(ctx, &style, subpaths);
        }
        if stroke && style.mid > 1.0 {
            let closed = subpaths.iter().all(|s| Trace::is_closed(s));
            if (ctx.line_cap == LineCap::Round || closed) && ctx.line_join == LineJoin::Round {
                return self.draw_polygon(&style, subpaths);
            }
            if style.fill.is_visible() {
                self.draw_polygon(&style.fill_only(), subpaths)?;
            }
            return self.draw_stroke_outline(ctx, &style, subpaths);
        }
        if stroke && ctx.line_cap == LineCap::Square {
            let capped: Vec<Vec<Point>> = subpaths.iter()
                .map(|s| square_cap(s, style.mid))
                .collect();
            return self.draw_polygon(&style, &capped);
        }
        self.draw_polygon(&style, subpaths)
    }

    /// Composite the fill color over a single pixel
    pub fn draw_point(&mut self, ctx: &GraphicContext, p: Point) {
        let (x, y) = ((p.x - 0.5).ceil() as i64, (p.y - 0.5).ceil() as i64);
        let style = Style::from_context(ctx);
        if !self.canvas.contains(x, y) || !style.writes(x as usize, y as usize) {
            return;
        }
        let f = style.fill.color_at(x, y);
        if let Some(dst) = self.canvas.get(x, y) {
            self.canvas.put(x, y, composite_over(f, f.alpha(), dst));
        }
    }

    /// Trace, transform and draw a primitive
    ///
    /// Image and text primitives need outside resources and are drawn with
    /// [`Painter::draw_image`] and [`Painter::draw_shape`] instead.
    #[tracing::instrument(level = "debug", skip_all, fields(kind = %prim.kind(), index = index))]
    pub fn draw_primitive(&mut self, ctx: &GraphicContext, prim: &Primitive,
                          index: usize) -> DrawResult<Option<Bounds>> {
        let mut trace = prim.trace(index)?;
        trace.transform(&ctx.affine);
        tracing::debug!("affine: {:?}", ctx.affine);
        let bounds = trace.bounds();
        if let Some(pattern) = ctx.dash_pattern() {
            let length: f64 = trace.subpaths.iter()
                .flat_map(|s| s.windows(2))
                .map(|w| w[0].distance(&w[1]))
                .sum();
            let runs = pattern.run_count(length);
            if runs.is_nan() || runs > MAX_DASH_RUNS as f64 {
                return Err(DrawError::geometry(prim.kind().name(), index, "too many dashes"));
            }
        }
        match prim {
            Primitive::Color { method, .. } | Primitive::Alpha { method, .. } => {
                if let Some(p) = trace.first_point() {
                    let alpha_only = matches!(prim, Primitive::Alpha { .. });
                    self.draw_method(ctx, p, *method, alpha_only);
                }
            }
            Primitive::Image { .. } | Primitive::Text { .. } => {}
            _ if trace.kind == PrimitiveKind::Point => {
                if let Some(p) = trace.first_point() {
                    self.draw_point(ctx, p);
                }
            }
            _ => self.draw_shape(ctx, &trace)?,
        }
        Ok(bounds)
    }

    /// Apply a color or alpha paint method seeded at `p`
    ///
    /// With `alpha_only` just the alpha channel of selected pixels is
    /// replaced by the fill alpha.
    pub fn draw_method(&mut self, ctx: &GraphicContext, p: Point, method: PaintMethod,
                       alpha_only: bool) {
        let style = Style::from_context(ctx);
        let (x, y) = ((p.x - 0.5).ceil() as i64, (p.y - 0.5).ceil() as i64);
        let (w, h) = (self.canvas.width, self.canvas.height);
        let write = |canvas: &mut Canvas, i: usize, j: usize| {
            if !style.writes(i, j) {
                return;
            }
            let f = style.fill.color_at(i as i64, j as i64);
            let c = if alpha_only {
                canvas.get(i as i64, j as i64).unwrap_or_default().with_alpha(f.alpha8())
            } else {
                f
            };
            canvas.put(i as i64, j as i64, c);
        };
        match method {
            PaintMethod::Point => {
                if self.canvas.contains(x, y) {
                    write(&mut *self.canvas, x as usize, y as usize);
                }
            }
            PaintMethod::Replace => {
                let target = match self.canvas.get(x, y) {
                    Some(t) => t,
                    None => return,
                };
                for j in 0..h {
                    for i in 0..w {
                        if self.canvas.get(i as i64, j as i64) == Some(target) {
                            write(&mut *self.canvas, i, j);
                        }
                    }
                }
            }
            PaintMethod::Floodfill | PaintMethod::FillToBorder => {
                let region = if method == PaintMethod::Floodfill {
                    let target = match self.canvas.get(x, y) {
                        Some(t) => t,
                        None => return,
                    };
                    flood_region(&*self.canvas, x, y, |c| c == target)
                } else {
                    let border = ctx.border_color;
                    let same = |c: Rgba8| c.r == border.r && c.g == border.g && c.b == border.b;
                    flood_region(&*self.canvas, x, y, |c| !same(c))
                };
                for (i, j) in region {
                    write(&mut *self.canvas, i, j);
                }
            }
            PaintMethod::Reset => {
                for j in 0..h {
                    for i in 0..w {
                        write(&mut *self.canvas, i, j);
                    }
                }
            }
        }
    }

    /// Stamp an image with its top left corner at device point `at`
    ///
    /// The linear part of `affine` rotates, scales and skews the image.
    pub fn draw_image(&mut self, image: &Canvas, at: Point, affine: &Affine,
                      compose: Compose, interpolate: Interpolate, clip: Option<&Mask>) {
        let m = Affine {
            tx: (at.x - 0.5).ceil(),
            ty: (at.y - 0.5).ceil(),
            ..*affine
        };
        tracing::debug!("draw image {}x{} at {},{}", image.width, image.height, m.tx, m.ty);
        let canvas = &mut *self.canvas;
        let mut job = move || composite_affine(canvas, image, &m, &interpolate, compose, clip);
        match self.pool {
            Some(pool) => pool.install(job),
            None => job(),
        }
    }
}

/// 4-connected pixels reachable from `(x, y)` through pixels accepted by
/// `inside`
fn flood_region(canvas: &Canvas, x: i64, y: i64, inside: impl Fn(Rgba8) -> bool) -> Vec<(usize, usize)> {
    let (w, h) = (canvas.width, canvas.height);
    let mut seen = vec![false; w * h];
    let mut out = vec![];
    let mut stack = vec![(x, y)];
    while let Some((i, j)) = stack.pop() {
        let c = match canvas.get(i, j) {
            Some(c) => c,
            None => continue,
        };
        let k = j as usize * w + i as usize;
        if seen[k] || !inside(c) {
            continue;
        }
        seen[k] = true;
        out.push((i as usize, j as usize));
        stack.extend([(i + 1, j), (i - 1, j), (i, j + 1), (i, j - 1)]);
    }
    out
}
