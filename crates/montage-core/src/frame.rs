//! Video frame payload carried by slots.
//!
//! A [`Frame`] is immutable once built. Its pixels live behind an `Arc`, so
//! handing a frame from an output to a connected input is a cheap copy of the
//! handle, never of the pixel data. Effects that change pixels build a new
//! frame with [`Frame::map_pixels`].
//!
//! Pixels are packed RGBA, one `u32` per pixel, red in the most significant
//! byte.

use std::sync::Arc;

/// Pack four 8-bit channels into one RGBA pixel.
#[inline]
pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32
}

/// Split an RGBA pixel into its `[r, g, b, a]` channels.
#[inline]
pub const fn channels(pixel: u32) -> [u8; 4] {
    pixel.to_be_bytes()
}

/// One decoded video frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pts: i64,
    pixels: Arc<[u32]>,
}

impl Frame {
    /// Build a frame from packed RGBA pixels in row-major order.
    ///
    /// # Panics
    ///
    /// Panics if `pixels.len() != width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<u32>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize,
            "pixel buffer does not match a {width}x{height} frame"
        );
        Self {
            width,
            height,
            pts: 0,
            pixels: pixels.into(),
        }
    }

    /// Build a frame filled with a single colour.
    pub fn solid(width: u32, height: u32, color: u32) -> Self {
        Self::new(width, height, vec![color; width as usize * height as usize])
    }

    /// Returns a copy of this frame stamped with a presentation timestamp.
    pub fn with_pts(mut self, pts: i64) -> Self {
        self.pts = pts;
        self
    }

    /// Frame width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Presentation timestamp.
    #[inline]
    pub fn pts(&self) -> i64 {
        self.pts
    }

    /// All pixels in row-major order.
    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }

    /// Returns a new frame with `f` applied to every pixel. Timestamp and
    /// dimensions are preserved.
    pub fn map_pixels(&self, f: impl FnMut(u32) -> u32) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pts: self.pts,
            pixels: self.pixels.iter().copied().map(f).collect(),
        }
    }

    /// Returns true if both frames share the same pixel allocation.
    pub fn shares_pixels_with(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.pixels, &other.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgba_round_trip() {
        let px = rgba(0x12, 0x34, 0x56, 0x78);
        assert_eq!(px, 0x1234_5678);
        assert_eq!(channels(px), [0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn solid_frame_dimensions() {
        let frame = Frame::solid(4, 3, rgba(255, 0, 0, 255));
        assert_eq!(frame.width(), 4);
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.pixels().len(), 12);
        assert_eq!(frame.pixel(3, 2), Some(rgba(255, 0, 0, 255)));
        assert_eq!(frame.pixel(4, 0), None);
    }

    #[test]
    fn clone_shares_pixels() {
        let frame = Frame::solid(2, 2, 0);
        let copy = frame.clone();
        assert!(copy.shares_pixels_with(&frame));
    }

    #[test]
    fn map_pixels_allocates_new_buffer() {
        let frame = Frame::solid(2, 1, 1).with_pts(7);
        let mapped = frame.map_pixels(|p| p + 1);
        assert_eq!(mapped.pixels(), &[2, 2]);
        assert_eq!(mapped.pts(), 7);
        assert!(!mapped.shares_pixels_with(&frame));
    }

    #[test]
    #[should_panic(expected = "does not match")]
    fn new_rejects_wrong_buffer_len() {
        let _ = Frame::new(2, 2, vec![0; 3]);
    }
}
