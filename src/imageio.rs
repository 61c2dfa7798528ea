//! Reading and writing canvases
//!
//! Files are decoded and encoded by the `image` crate; the format follows
//! the file extension.

use crate::canvas::{Canvas, BPP};
use crate::error::{DrawError, DrawResult};

use std::path::Path;

/// Dimensions of a `width` x `height` RGBA image as `u32`, if it fits the
/// allocation limits the decoder applies to files
pub(crate) fn check_size(width: usize, height: usize) -> DrawResult<(u32, u32)> {
    let requested = width.saturating_mul(height).saturating_mul(BPP);
    let too_big = || DrawError::Allocation { requested };
    let w = u32::try_from(width).map_err(|_| too_big())?;
    let h = u32::try_from(height).map_err(|_| too_big())?;
    let mut limits = image::Limits::default();
    limits.check_dimensions(w, h).map_err(|_| too_big())?;
    limits.reserve(requested as u64).map_err(|_| too_big())?;
    Ok((w, h))
}

/// Decode an image file into a canvas
pub fn read_file<P: AsRef<Path>>(filename: P) -> DrawResult<Canvas> {
    let img = image::open(filename)?.to_rgba8();
    Ok(Canvas::from_image(&img))
}

/// Encode a canvas into an image file
pub fn write_file<P: AsRef<Path>>(canvas: &Canvas, filename: P) -> DrawResult<()> {
    let (w, h) = check_size(canvas.width, canvas.height)?;
    image::save_buffer(filename, &canvas.data, w, h, image::ExtendedColorType::Rgba8)?;
    Ok(())
}

/// Scale a canvas to `width` x `height`
pub fn resize(canvas: &Canvas, width: usize, height: usize) -> DrawResult<Canvas> {
    let (w, h) = check_size(width, height)?;
    let img = canvas.to_image()
        .ok_or(DrawError::Allocation { requested: canvas.data.len() })?;
    let out = image::imageops::resize(&img, w, h, image::imageops::FilterType::Triangle);
    Ok(Canvas::from_image(&out))
}

/// Compare two canvases pixel by pixel, logging every difference
pub fn canvas_diff(a: &Canvas, b: &Canvas) -> bool {
    if a.width != b.width || a.height != b.height {
        tracing::warn!("size differs: {}x{} vs {}x{}", a.width, a.height, b.width, b.height);
        return false;
    }
    let mut flag = true;
    for (i, (v1, v2)) in a.data.iter().zip(b.data.iter()).enumerate() {
        if v1 != v2 {
            tracing::debug!("{} [{},{},{}]: {} {}", i, (i / 4) % a.width, (i / 4) / a.width, i % 4, v1, v2);
            flag = false;
        }
    }
    flag
}

/// Compare two image files
pub fn img_diff<P: AsRef<Path>>(f1: P, f2: P) -> DrawResult<bool> {
    Ok(canvas_diff(&read_file(f1)?, &read_file(f2)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba8;

    #[test]
    fn oversized_resize_is_an_allocation_error() {
        let c = Canvas::new(2, 2, Rgba8::white());
        let e = resize(&c, 100_000, 100_000).unwrap_err();
        assert!(matches!(e, DrawError::Allocation { requested: 40_000_000_000 }));
        assert!(matches!(resize(&c, u32::MAX as usize + 1, 1), Err(DrawError::Allocation { .. })));
        let r = resize(&c, 3, 5).unwrap();
        assert_eq!((r.width, r.height), (3, 5));
    }
}
