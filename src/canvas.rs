//! Canvas
//!
//! RGBA pixel storage in row-major order, four bytes per pixel.

use crate::color::Rgba8;
use crate::error::{DrawError, DrawResult};
use crate::math::multiply_u8;

use std::ops::Index;
use std::ops::IndexMut;

/// Bytes per pixel
pub const BPP: usize = 4;

/// Image the interpreter draws on
#[derive(Debug,Clone,Default,PartialEq)]
pub struct Canvas {
    /// Pixel / Component level data of Image
    pub data: Vec<u8>,
    /// Image Width in pixels
    pub width: usize,
    /// Image Height in pixels
    pub height: usize,
}

impl Canvas {
    /// Create a new canvas filled with `background`
    pub fn new(width: usize, height: usize, background: Rgba8) -> Self {
        let mut c = Self { width, height, data: vec![0u8; width * height * BPP] };
        c.clear(background);
        c
    }
    /// Like `new`, but reports allocation failure instead of aborting
    pub fn try_new(width: usize, height: usize, background: Rgba8) -> DrawResult<Self> {
        let n = width.checked_mul(height)
            .and_then(|v| v.checked_mul(BPP))
            .ok_or(DrawError::Allocation { requested: usize::MAX })?;
        let mut data = vec![];
        data.try_reserve_exact(n).map_err(|_| DrawError::Allocation { requested: n })?;
        data.resize(n, 0);
        let mut c = Self { width, height, data };
        c.clear(background);
        Ok(c)
    }
    pub fn clear(&mut self, c: Rgba8) {
        let px = c.to_array();
        self.data.chunks_exact_mut(BPP).for_each(|p| p.copy_from_slice(&px));
    }
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height
    }
    /// Pixel at (x,y), `None` outside the canvas
    pub fn get(&self, x: i64, y: i64) -> Option<Rgba8> {
        if !self.contains(x, y) {
            return None;
        }
        Some(Rgba8::from_slice(&self[(x as usize, y as usize)]))
    }
    /// Set pixel at (x,y); writes outside the canvas are dropped
    pub fn put(&mut self, x: i64, y: i64, c: Rgba8) {
        if self.contains(x, y) {
            self[(x as usize, y as usize)][..BPP].copy_from_slice(&c.to_array());
        }
    }
    /// Copy a rectangular window; pixels outside the canvas read as
    /// transparent
    pub fn get_window(&self, x: i64, y: i64, width: usize, height: usize) -> Vec<Rgba8> {
        let mut out = Vec::with_capacity(width * height);
        for j in 0..height as i64 {
            for i in 0..width as i64 {
                out.push(self.get(x + i, y + j).unwrap_or_default());
            }
        }
        out
    }
    /// Write a rectangular window, clipped to the canvas
    pub fn put_window(&mut self, x: i64, y: i64, width: usize, pixels: &[Rgba8]) {
        if width == 0 {
            return;
        }
        for (k, c) in pixels.iter().enumerate() {
            let (i, j) = ((k % width) as i64, (k / width) as i64);
            self.put(x + i, y + j, *c);
        }
    }
    /// Bytes of one row
    pub fn row_bytes(&self) -> usize {
        self.width * BPP
    }
    /// Mutable slice of row `y`
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        let n = self.row_bytes();
        &mut self.data[y * n..(y + 1) * n]
    }
    /// Convert to an `image` buffer
    pub fn to_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
    }
    pub fn from_image(img: &image::RgbaImage) -> Self {
        let (w, h) = img.dimensions();
        Self { width: w as usize, height: h as usize, data: img.as_raw().clone() }
    }
}

impl Index<(usize,usize)> for Canvas {
    type Output = [u8];
    fn index(&self, index: (usize, usize)) -> &[u8] {
        let i = ((index.1 * self.width) + index.0) * BPP;
        &self.data[i..i + BPP]
    }
}
impl IndexMut<(usize,usize)> for Canvas {
    fn index_mut(&mut self, index: (usize, usize)) -> &mut [u8] {
        let i = ((index.1 * self.width) + index.0) * BPP;
        &mut self.data[i..i + BPP]
    }
}

/// Write mask: pixels whose mask value is at most half intensity are
/// protected from drawing
#[derive(Debug,Clone,PartialEq)]
pub struct Mask {
    pub width: usize,
    pub height: usize,
    data: Vec<u8>,
}

impl Mask {
    /// Mask from the red channel of a canvas; black protects, white writes
    pub fn from_canvas(c: &Canvas) -> Self {
        let data = c.data.chunks_exact(BPP).map(|p| multiply_u8(p[0], p[3])).collect();
        Self { width: c.width, height: c.height, data }
    }
    /// Can pixel (x,y) be written
    pub fn allows(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[y * self.width + x] > 127
    }
}
