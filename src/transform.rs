//! Affine Transformations
//!
//! Points map through the matrix as
//!
//! ```text
//! x' = sx * x + ry * y + tx
//! y' = rx * x + sy * y + ty
//! ```
//!

use crate::paths::Point;
use crate::DRAW_EPSILON;

use std::ops::Mul;

/// 2x3 affine matrix
#[derive(Debug,Copy,Clone,PartialEq)]
pub struct Affine {
    pub sx: f64,
    pub rx: f64,
    pub ry: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

impl Affine {
    pub fn new(sx: f64, rx: f64, ry: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self { sx, rx, ry, sy, tx, ty }
    }
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }
    pub fn translate(tx: f64, ty: f64) -> Self {
        Self { tx, ty, ..Self::identity() }
    }
    pub fn scale(sx: f64, sy: f64) -> Self {
        Self { sx, sy, ..Self::identity() }
    }
    /// Rotation, angle in degrees
    pub fn rotate(degrees: f64) -> Self {
        let a = (degrees % 360.0).to_radians();
        let (sin, cos) = a.sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }
    /// Shear along x, angle in degrees
    pub fn skew_x(degrees: f64) -> Self {
        Self { ry: degrees.to_radians().tan(), ..Self::identity() }
    }
    /// Shear along y, angle in degrees
    pub fn skew_y(degrees: f64) -> Self {
        Self { rx: degrees.to_radians().tan(), ..Self::identity() }
    }

    pub fn is_identity(&self) -> bool {
        (self.sx - 1.0).abs() < DRAW_EPSILON && self.rx.abs() < DRAW_EPSILON &&
            self.ry.abs() < DRAW_EPSILON && (self.sy - 1.0).abs() < DRAW_EPSILON &&
            self.tx.abs() < DRAW_EPSILON && self.ty.abs() < DRAW_EPSILON
    }

    /// Perform the transform
    pub fn transform(&self, p: Point) -> Point {
        Point::new(self.sx * p.x + self.ry * p.y + self.tx,
                   self.rx * p.x + self.sy * p.y + self.ty)
    }

    fn determinant(&self) -> f64 {
        self.sx * self.sy - self.rx * self.ry
    }

    /// Inverse matrix; a singular matrix yields a huge but finite inverse
    pub fn inverse(&self) -> Affine {
        let d = crate::paths::perceptible_reciprocal(self.determinant());
        let sx = d * self.sy;
        let rx = d * -self.rx;
        let ry = d * -self.ry;
        let sy = d * self.sx;
        Affine {
            sx, rx, ry, sy,
            tx: -self.tx * sx - self.ty * ry,
            ty: -self.tx * rx - self.ty * sy,
        }
    }

    /// Square root of the area scale factor; the amount of "scaling" the
    /// matrix applies to stroke widths and dash lengths
    pub fn expansion(&self) -> f64 {
        self.determinant().abs().sqrt()
    }

    /// Apply `m` first, then `self`
    ///
    /// This is how a transform keyword composes with the current matrix.
    pub fn then_local(&self, m: &Affine) -> Affine {
        Affine {
            sx: self.sx * m.sx + self.ry * m.rx,
            rx: self.rx * m.sx + self.sy * m.rx,
            ry: self.sx * m.ry + self.ry * m.sy,
            sy: self.rx * m.ry + self.sy * m.sy,
            tx: self.sx * m.tx + self.ry * m.ty + self.tx,
            ty: self.rx * m.tx + self.sy * m.ty + self.ty,
        }
    }
}

/// `a * b` applies `b` first
impl Mul<Affine> for Affine {
    type Output = Affine;
    fn mul(self, rhs: Affine) -> Affine {
        self.then_local(&rhs)
    }
}
