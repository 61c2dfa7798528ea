//! Graphic Context
//!
//! The interpreter keeps a stack of [`GraphicContext`] frames. Frame 0 holds
//! the defaults; `push graphic-context` clones the top frame and `pop`
//! discards it again.

use crate::canvas::Mask;
use crate::color::Rgba8;
use crate::compositor::Interpolate;
use crate::dash::DashPattern;
use crate::error::{DrawError, DrawResult};
use crate::paint::Paint;
use crate::paths::Bounds;
use crate::raster::FillRule;
use crate::stroke::{LineCap, LineJoin, Stroke};
use crate::transform::Affine;

use std::sync::Arc;

/// Text settings, consumed by glyph providers
#[derive(Debug,Clone,PartialEq)]
pub struct TextStyle {
    /// Font file or font name
    pub font: Option<String>,
    pub family: Option<String>,
    /// Size in points
    pub size: f64,
    pub style: String,
    pub weight: u32,
    pub stretch: String,
    pub antialias: bool,
    pub undercolor: Rgba8,
    pub decorate: String,
    pub gravity: String,
    pub kerning: f64,
    pub interline_spacing: f64,
    pub interword_spacing: f64,
    pub align: String,
    pub anchor: String,
    pub direction: String,
    pub density: Option<String>,
    pub encoding: Option<String>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font: None,
            family: None,
            size: 12.0,
            style: "normal".into(),
            weight: 400,
            stretch: "normal".into(),
            antialias: true,
            undercolor: Rgba8::transparent(),
            decorate: "none".into(),
            gravity: "undefined".into(),
            kerning: 0.0,
            interline_spacing: 0.0,
            interword_spacing: 0.0,
            align: "undefined".into(),
            anchor: "undefined".into(),
            direction: "undefined".into(),
            density: None,
            encoding: None,
        }
    }
}

/// Drawing state of one stack frame
#[derive(Debug,Clone)]
pub struct GraphicContext {
    /// User to device transform
    pub affine: Affine,
    pub fill: Paint,
    pub stroke: Paint,
    /// `fill-opacity`, in [0,1]
    pub fill_opacity: f64,
    /// `stroke-opacity`, in [0,1]
    pub stroke_opacity: f64,
    /// `opacity`, applied to fill, stroke and images
    pub opacity: f64,
    /// Stroke width in user units
    pub stroke_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    /// Dash lengths in user units; empty means solid
    pub dash_array: Vec<f64>,
    pub dash_offset: f64,
    pub fill_rule: FillRule,
    pub stroke_antialias: bool,
    pub border_color: Rgba8,
    /// Resampling filter for image primitives
    pub interpolate: Interpolate,
    pub text: TextStyle,
    pub viewbox: Option<Bounds>,
    /// Name of the active clip path
    pub clip_path: Option<String>,
    pub clip_mask: Option<Arc<Mask>>,
    pub clip_rule: FillRule,
    pub clip_units: String,
    /// Device bounds of everything drawn in this frame
    pub bounds: Option<Bounds>,
}

impl Default for GraphicContext {
    fn default() -> Self {
        Self {
            affine: Affine::identity(),
            fill: Paint::Solid(Rgba8::black()),
            stroke: Paint::None,
            fill_opacity: 1.0,
            stroke_opacity: 1.0,
            opacity: 1.0,
            stroke_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 10.0,
            dash_array: vec![],
            dash_offset: 0.0,
            fill_rule: FillRule::NonZero,
            stroke_antialias: true,
            border_color: Rgba8::new(0xdf, 0xdf, 0xdf, 0xff),
            interpolate: Interpolate::default(),
            text: TextStyle::default(),
            viewbox: None,
            clip_path: None,
            clip_mask: None,
            clip_rule: FillRule::NonZero,
            clip_units: "userSpaceOnUse".into(),
            bounds: None,
        }
    }
}

impl GraphicContext {
    /// Fill paint with fill and group opacity applied
    pub fn fill_paint(&self) -> Paint {
        self.fill.with_opacity(self.fill_opacity * self.opacity)
    }
    /// Stroke paint with stroke and group opacity applied
    pub fn stroke_paint(&self) -> Paint {
        self.stroke.with_opacity(self.stroke_opacity * self.opacity)
    }
    /// Half the stroke width in device units
    pub fn mid(&self) -> f64 {
        self.affine.expansion() * self.stroke_width / 2.0
    }
    /// Dash pattern scaled to device units, if dashing is on
    ///
    /// A pattern whose first length is zero draws solid.
    pub fn dash_pattern(&self) -> Option<DashPattern> {
        match self.dash_array.first() {
            Some(v) if *v > 0.0 => {}
            _ => return None,
        }
        DashPattern::new(&self.dash_array, self.dash_offset)
            .and_then(|p| p.scaled(self.affine.expansion()))
    }
    /// Outline builder for the current stroke, in device units
    pub fn stroker(&self) -> Stroke {
        let mut s = Stroke::new();
        s.width(2.0 * self.mid());
        s.line_cap(self.line_cap);
        s.line_join(self.line_join);
        s.miter_limit(self.miter_limit);
        s
    }
    /// Grow the accumulated bounds
    pub fn include(&mut self, b: Bounds) {
        self.bounds = Some(match self.bounds {
            Some(a) => a.union(&b),
            None => b,
        });
    }
}

/// Stack of graphic contexts; never empty
#[derive(Debug,Clone)]
pub struct ContextStack {
    frames: Vec<GraphicContext>,
}

impl ContextStack {
    pub fn new(base: GraphicContext) -> Self {
        Self { frames: vec![base] }
    }
    /// Number of pushed frames above frame 0
    pub fn depth(&self) -> usize {
        self.frames.len() - 1
    }
    pub fn top(&self) -> &GraphicContext {
        &self.frames[self.frames.len() - 1]
    }
    pub fn top_mut(&mut self) -> &mut GraphicContext {
        let n = self.frames.len() - 1;
        &mut self.frames[n]
    }
    /// Clone the top frame onto the stack
    pub fn push(&mut self) -> DrawResult<()> {
        crate::error::reserve(&mut self.frames, 1)?;
        let top = self.top().clone();
        self.frames.push(top);
        Ok(())
    }
    /// Discard the top frame
    ///
    /// Popping frame 0 is an error; the stack is left holding frame 0 only.
    pub fn pop(&mut self) -> DrawResult<()> {
        if self.frames.len() <= 1 {
            self.frames.truncate(1);
            return Err(DrawError::UnbalancedPushPop);
        }
        self.frames.pop();
        Ok(())
    }
}

impl Default for ContextStack {
    fn default() -> Self {
        Self::new(GraphicContext::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_clones_pop_restores() {
        let mut s = ContextStack::default();
        s.top_mut().stroke_width = 3.0;
        s.push().unwrap();
        assert_eq!(s.top().stroke_width, 3.0);
        s.top_mut().stroke_width = 7.0;
        s.pop().unwrap();
        assert_eq!(s.top().stroke_width, 3.0);
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn underflow_keeps_frame_zero() {
        let mut s = ContextStack::default();
        s.top_mut().miter_limit = 4.0;
        assert!(matches!(s.pop(), Err(DrawError::UnbalancedPushPop)));
        assert_eq!(s.top().miter_limit, 4.0);
    }

    #[test]
    fn dash_scaled_by_expansion() {
        let mut g = GraphicContext::default();
        g.dash_array = vec![4.0, 2.0];
        g.affine = Affine::scale(2.0, 2.0);
        let p = g.dash_pattern().unwrap();
        assert_eq!(p.lengths(), &[8.0, 4.0]);
        g.dash_array = vec![0.0, 2.0];
        assert!(g.dash_pattern().is_none());
        assert_eq!(g.mid(), 1.0);
    }

    #[test]
    fn opacity_multiplies() {
        let mut g = GraphicContext::default();
        g.fill_opacity = 0.5;
        g.opacity = 0.5;
        assert_eq!(g.fill_paint(), Paint::Solid(Rgba8::new(0, 0, 0, 64)));
    }
}
