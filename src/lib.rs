//! Vector drawing programs rendered onto RGBA canvases
//!
//! How does this work
//!
//!    render(canvas, program, ctx)
//!      Tokenizer          -- keywords, numbers, points, quoted text
//!      ContextStack       -- push/pop graphic-context
//!      primitive
//!        Primitive::trace()         -- flattened subpaths
//!        Trace::transform(affine)
//!        Painter::draw_shape()
//!          dash_runs() / split_dashes()    -- dashed strokes
//!          Stroke::outline()                -- thick strokes
//!          build_edges()                    -- sorted monotone edges
//!          draw_polygon()
//!            rows in parallel, one Sweep per worker
//!              Sweep::opacity()   -- fill (winding) + stroke (distance)
//!              composite_over()   -- fill then stroke
//!
//! # Example
//!
//!     use mvg::{Canvas, GraphicContext, Rgba8};
//!
//!     let mut canvas = Canvas::new(100, 100, Rgba8::white());
//!     let program = "fill red stroke blue stroke-width 3 \
//!                    roundRectangle 10,10 90,90 10,10";
//!     let status = mvg::render(&mut canvas, program, &GraphicContext::default()).unwrap();
//!     assert!(status.success);
//!     assert_eq!(canvas.get(50, 50), Some(Rgba8::new(255, 0, 0, 255)));
//!

pub mod error;
pub mod transform;
pub mod paths;
pub mod trace;
pub mod path_parser;
pub mod polygon;
pub mod raster;
pub mod stroke;
pub mod dash;
pub mod color;
mod colornames;
pub mod math;
pub mod canvas;
pub mod paint;
pub mod compositor;
pub mod draw;
pub mod context;
pub mod token;
pub mod interp;
pub mod font;
pub mod imageio;

pub use error::*;
pub use transform::*;
pub use paths::*;
pub use trace::*;
pub use path_parser::*;
pub use polygon::*;
pub use raster::*;
pub use stroke::*;
pub use dash::*;
pub use color::*;
pub use math::*;
pub use canvas::*;
pub use paint::*;
pub use compositor::*;
pub use draw::*;
pub use context::*;
pub use token::*;
pub use interp::*;
pub use font::*;

/// Distances and determinants below this are treated as zero
pub const DRAW_EPSILON: f64 = 1.0e-10;
