//! Glyph Outlines
//!
//! Text primitives are drawn like any other shape: a [`GlyphProvider`]
//! turns a string into flattened subpaths and the painter fills them.
//! [`TtfGlyphs`] reads TrueType/OpenType fonts when the `font` feature is
//! enabled.

use crate::context::TextStyle;
use crate::error::DrawResult;
use crate::paths::Point;

/// Source of glyph outlines for text primitives
pub trait GlyphProvider: Send + Sync {
    /// Flattened outlines of `text` in pixels
    ///
    /// The pen starts at the origin on the baseline and y grows downward.
    fn outline(&self, text: &str, style: &TextStyle) -> DrawResult<Vec<Vec<Point>>>;
}

#[cfg(feature = "font")]
pub use self::ttf::TtfGlyphs;

#[cfg(feature = "font")]
mod ttf {
    use super::GlyphProvider;
    use crate::context::TextStyle;
    use crate::error::{DrawError, DrawResult};
    use crate::paths::Point;
    use crate::trace::trace_bezier;

    use std::path::Path;

    /// Glyph provider backed by a font file
    #[derive(Debug,Clone)]
    pub struct TtfGlyphs {
        data: Vec<u8>,
        index: u32,
    }

    impl TtfGlyphs {
        /// Font from raw file data; `index` selects a face in a collection
        pub fn from_data(data: Vec<u8>, index: u32) -> DrawResult<Self> {
            ttf_parser::Face::parse(&data, index)
                .map_err(|e| DrawError::Font(e.to_string()))?;
            Ok(Self { data, index })
        }
        pub fn from_file<P: AsRef<Path>>(path: P) -> DrawResult<Self> {
            let data = std::fs::read(path)?;
            Self::from_data(data, 0)
        }
        fn face(&self) -> DrawResult<ttf_parser::Face<'_>> {
            ttf_parser::Face::parse(&self.data, self.index)
                .map_err(|e| DrawError::Font(e.to_string()))
        }
    }

    /// Collects flattened contours of one glyph
    struct Contours {
        scale: f64,
        pen: Point,
        subpaths: Vec<Vec<Point>>,
        current: Vec<Point>,
    }

    impl Contours {
        fn map(&self, x: f32, y: f32) -> Point {
            Point::new(self.pen.x + x as f64 * self.scale, self.pen.y - y as f64 * self.scale)
        }
        fn last(&self) -> Point {
            self.current.last().copied().unwrap_or(self.pen)
        }
        fn finish(&mut self) {
            if self.current.len() > 1 {
                self.subpaths.push(std::mem::take(&mut self.current));
            }
            self.current.clear();
        }
    }

    impl ttf_parser::OutlineBuilder for Contours {
        fn move_to(&mut self, x: f32, y: f32) {
            self.finish();
            let p = self.map(x, y);
            self.current.push(p);
        }
        fn line_to(&mut self, x: f32, y: f32) {
            let p = self.map(x, y);
            self.current.push(p);
        }
        fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
            let pts = [self.last(), self.map(x1, y1), self.map(x, y)];
            self.current.extend(trace_bezier(&pts).into_iter().skip(1));
        }
        fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
            let pts = [self.last(), self.map(x1, y1), self.map(x2, y2), self.map(x, y)];
            self.current.extend(trace_bezier(&pts).into_iter().skip(1));
        }
        fn close(&mut self) {
            if let Some(first) = self.current.first().copied() {
                self.current.push(first);
            }
            self.finish();
        }
    }

    impl GlyphProvider for TtfGlyphs {
        fn outline(&self, text: &str, style: &TextStyle) -> DrawResult<Vec<Vec<Point>>> {
            let face = self.face()?;
            let scale = style.size / f64::from(face.units_per_em());
            let mut out = Contours { scale, pen: Point::default(), subpaths: vec![], current: vec![] };
            let line_height = f64::from(face.height()) * scale + style.interline_spacing;
            let mut prev: Option<ttf_parser::GlyphId> = None;
            for ch in text.chars() {
                if ch == '\n' {
                    out.pen = Point::new(0.0, out.pen.y + line_height);
                    prev = None;
                    continue;
                }
                let id = match face.glyph_index(ch) {
                    Some(id) => id,
                    None => {
                        tracing::debug!("no glyph for {:?}", ch);
                        continue;
                    }
                };
                if let (Some(p), Some(kern)) = (prev, face.tables().kern) {
                    let k = kern.subtables.into_iter()
                        .filter(|s| s.horizontal && !s.has_cross_stream)
                        .find_map(|s| s.glyphs_kerning(p, id));
                    if let Some(k) = k {
                        out.pen.x += f64::from(k) * scale;
                    }
                }
                face.outline_glyph(id, &mut out);
                out.finish();
                let advance = face.glyph_hor_advance(id).map_or(0.0, f64::from) * scale;
                out.pen.x += advance + style.kerning;
                if ch == ' ' {
                    out.pen.x += style.interword_spacing;
                }
                prev = Some(id);
            }
            Ok(out.subpaths)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Boxes;

    impl GlyphProvider for Boxes {
        fn outline(&self, text: &str, style: &TextStyle) -> DrawResult<Vec<Vec<Point>>> {
            let s = style.size;
            Ok(text.chars().enumerate().map(|(i, _)| {
                let x = i as f64 * s;
                vec![Point::new(x, -s), Point::new(x + s / 2.0, -s),
                     Point::new(x + s / 2.0, 0.0), Point::new(x, 0.0), Point::new(x, -s)]
            }).collect())
        }
    }

    #[test]
    fn provider_is_object_safe() {
        let p: Box<dyn GlyphProvider> = Box::new(Boxes);
        let v = p.outline("ab", &TextStyle::default()).unwrap();
        assert_eq!(v.len(), 2);
        assert_eq!(v[1][0], Point::new(12.0, -12.0));
    }
}
