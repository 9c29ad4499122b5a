//! Framebuffer geometry and rectangular regions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Geometry of the guest framebuffer, read once at startup.
///
/// `width`/`height` are the visible resolution; the visible window starts at
/// (`x_offset`, `y_offset`) inside the virtual surface. Rows are
/// `stride_pixels` pixels apart in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayGeometry {
    pub width: u32,
    pub height: u32,
    pub virtual_width: u32,
    pub virtual_height: u32,
    pub x_offset: u32,
    pub y_offset: u32,
    pub bytes_per_pixel: u32,
    pub stride_pixels: u32,
}

/// Violations of the [`DisplayGeometry`] invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("empty visible resolution {width}x{height}")]
    Empty { width: u32, height: u32 },

    #[error("zero bytes per pixel")]
    ZeroDepth,

    #[error("visible window {width}x{height}+{x_offset}+{y_offset} exceeds virtual resolution {virtual_width}x{virtual_height}")]
    OutsideVirtual {
        width: u32,
        height: u32,
        x_offset: u32,
        y_offset: u32,
        virtual_width: u32,
        virtual_height: u32,
    },

    #[error("stride of {stride} pixels is narrower than virtual width {virtual_width}")]
    StrideTooSmall { stride: u32, virtual_width: u32 },

    #[error("mapping of {mapped} bytes cannot hold the visible window ({required} bytes)")]
    MappingTooSmall { required: usize, mapped: usize },
}

impl DisplayGeometry {
    /// Geometry of an unpadded surface with no panning offset.
    #[must_use]
    pub fn packed(width: u32, height: u32, bytes_per_pixel: u32) -> Self {
        Self {
            width,
            height,
            virtual_width: width,
            virtual_height: height,
            x_offset: 0,
            y_offset: 0,
            bytes_per_pixel,
            stride_pixels: width,
        }
    }

    /// Check the invariants against a mapping of `mapped_len` bytes.
    pub fn validate(&self, mapped_len: usize) -> Result<(), GeometryError> {
        if self.width == 0 || self.height == 0 {
            return Err(GeometryError::Empty {
                width: self.width,
                height: self.height,
            });
        }
        if self.bytes_per_pixel == 0 {
            return Err(GeometryError::ZeroDepth);
        }
        let fits_x = self
            .x_offset
            .checked_add(self.width)
            .is_some_and(|right| right <= self.virtual_width);
        let fits_y = self
            .y_offset
            .checked_add(self.height)
            .is_some_and(|bottom| bottom <= self.virtual_height);
        if !fits_x || !fits_y {
            return Err(GeometryError::OutsideVirtual {
                width: self.width,
                height: self.height,
                x_offset: self.x_offset,
                y_offset: self.y_offset,
                virtual_width: self.virtual_width,
                virtual_height: self.virtual_height,
            });
        }
        if self.stride_pixels < self.virtual_width {
            return Err(GeometryError::StrideTooSmall {
                stride: self.stride_pixels,
                virtual_width: self.virtual_width,
            });
        }
        let required = self.required_len();
        if required > mapped_len {
            return Err(GeometryError::MappingTooSmall {
                required,
                mapped: mapped_len,
            });
        }
        Ok(())
    }

    /// Number of mapped bytes needed to read the whole visible window.
    #[must_use]
    pub fn required_len(&self) -> usize {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let last_row = (self.y_offset + self.height - 1) as usize;
        let end_px = last_row * self.stride_pixels as usize
            + self.x_offset as usize
            + self.width as usize;
        end_px * self.bytes_per_pixel as usize
    }

    /// Byte offset of visible pixel (`x`, `y`) inside the mapping.
    #[must_use]
    pub fn byte_offset(&self, x: u32, y: u32) -> usize {
        let row = (self.y_offset + y) as usize * self.stride_pixels as usize;
        (row + (self.x_offset + x) as usize) * self.bytes_per_pixel as usize
    }

    /// The whole visible window.
    #[must_use]
    pub fn visible(&self) -> Region {
        Region::new(0, 0, self.width, self.height)
    }

    /// Intersect `region` with the visible window.
    #[must_use]
    pub fn clamp(&self, region: Region) -> Region {
        let x = region.x.min(self.width);
        let y = region.y.min(self.height);
        Region {
            x,
            y,
            width: region.width.min(self.width - x),
            height: region.height.min(self.height - y),
        }
    }
}

/// A rectangle in visible-window pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    #[must_use]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}
