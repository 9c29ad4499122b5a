//! Framebuffer capture and pixel conversion for fbmirror.
//!
//! This crate defines the [`FrameSource`] trait that framebuffer backends
//! implement, plus the RGB565 → RGB888 converter that turns a source's raw
//! pixels into a [`Frame`] ready to blit. The fbdev backend lives behind the
//! `linux` feature; an in-memory source for tests behind `mock`.

use fbmirror_types::{DisplayGeometry, Frame, Region, RGB_BYTES};

pub mod convert;
pub mod error;
#[cfg(feature = "linux")]
pub mod linux;
#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use error::DisplayError;

/// A raw pixel surface shared with the guest's display pipeline.
///
/// The surface is written concurrently by a producer this process cannot
/// synchronize with, so every read is a best-effort snapshot.
pub trait FrameSource: Send + 'static {
    /// Geometry fixed at open time.
    fn geometry(&self) -> DisplayGeometry;

    /// The whole mapped surface.
    fn pixels(&mut self) -> Result<&[u8], DisplayError>;

    /// Copy the raw bytes of `region` (clamped to the visible window),
    /// row by row with stride padding removed.
    fn snapshot(&mut self, region: Region) -> Result<Vec<u8>, DisplayError> {
        let geometry = self.geometry();
        let region = geometry.clamp(region);
        let bpp = geometry.bytes_per_pixel as usize;
        let row_len = region.width as usize * bpp;
        let mut out = Vec::with_capacity(row_len * region.height as usize);
        if region.is_empty() {
            return Ok(out);
        }

        let pixels = self.pixels()?;
        for row in 0..region.height {
            let start = geometry.byte_offset(region.x, region.y + row);
            let bytes = pixels.get(start..start + row_len).ok_or_else(|| {
                DisplayError::Read(format!("row {row} lies outside the mapping"))
            })?;
            out.extend_from_slice(bytes);
        }
        Ok(out)
    }
}

/// Capture the visible window of `source` and convert it into `frame`.
///
/// `frame` must already have the visible resolution.
pub fn capture_frame(source: &mut dyn FrameSource, frame: &mut Frame) -> Result<(), DisplayError> {
    let geometry = source.geometry();
    let expected = geometry.visible().area() * RGB_BYTES;
    if frame.width() != geometry.width || frame.height() != geometry.height {
        return Err(DisplayError::Destination {
            expected,
            actual: frame.data().len(),
        });
    }
    let pixels = source.pixels()?;
    convert::convert_region(pixels, &geometry, geometry.visible(), frame.data_mut())
}
