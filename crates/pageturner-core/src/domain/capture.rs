//! Capture geometry and raster types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies the window being read.
///
/// The value is adapter-defined (an X11 window id, a compositor handle, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHandle(String);

impl TargetHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pixels trimmed from each edge of a captured window.
///
/// Insets remove reader chrome (toolbars, page numbers) before OCR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropInsets {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropInsets {
    /// No trimming.
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Region left after applying the insets to a `width` x `height` image.
    ///
    /// Returns `None` when the insets consume the whole image.
    #[must_use]
    pub const fn region(&self, width: u32, height: u32) -> Option<CropRegion> {
        let horizontal = self.left.saturating_add(self.right);
        let vertical = self.top.saturating_add(self.bottom);
        if horizontal >= width || vertical >= height {
            return None;
        }
        Some(CropRegion {
            x: self.left,
            y: self.top,
            width: width - horizontal,
            height: height - vertical,
        })
    }
}

impl Default for CropInsets {
    fn default() -> Self {
        Self::new(75, 110, 20, 50)
    }
}

/// Absolute rectangle inside an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// An RGBA8 raster produced by a capture provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wrap RGBA8 pixel data.
    ///
    /// Returns `None` if the buffer length does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    #[must_use]
    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    /// True when every pixel has the same color (or there are none).
    ///
    /// A uniform capture carries no text, so it is reported as blank.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        let mut chunks = self.pixels.chunks_exact(4);
        let Some(first) = chunks.next() else {
            return true;
        };
        chunks.all(|px| px == first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_applies_insets() {
        let crop = CropInsets::new(75, 110, 20, 50);
        let region = crop.region(800, 600).unwrap();
        assert_eq!(
            region,
            CropRegion {
                x: 75,
                y: 110,
                width: 705,
                height: 440
            }
        );
    }

    #[test]
    fn test_region_consumed_by_insets() {
        let crop = CropInsets::new(50, 0, 50, 0);
        assert!(crop.region(100, 100).is_none());
        assert!(CropInsets::NONE.region(0, 10).is_none());
    }

    #[test]
    fn test_raster_length_checked() {
        assert!(RasterImage::from_rgba(2, 2, vec![0; 16]).is_some());
        assert!(RasterImage::from_rgba(2, 2, vec![0; 15]).is_none());
    }

    #[test]
    fn test_uniform_detection() {
        let blank = RasterImage::from_rgba(2, 1, vec![255, 255, 255, 255, 255, 255, 255, 255])
            .unwrap();
        assert!(blank.is_uniform());

        let text = RasterImage::from_rgba(2, 1, vec![255, 255, 255, 255, 0, 0, 0, 255]).unwrap();
        assert!(!text.is_uniform());
    }

    #[test]
    fn test_target_handle_display() {
        let handle = TargetHandle::new("0x04a00007");
        assert_eq!(handle.to_string(), "0x04a00007");
        assert_eq!(handle.as_str(), "0x04a00007");
    }
}
