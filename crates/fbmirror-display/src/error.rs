//! Display subsystem errors.

use fbmirror_types::GeometryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("failed to open framebuffer: {0}")]
    DeviceOpen(String),

    #[error("failed to query framebuffer: {0}")]
    Query(String),

    #[error("failed to map framebuffer: {0}")]
    Map(String),

    #[error("unsupported pixel format: {bits_per_pixel} bits per pixel")]
    UnsupportedFormat { bits_per_pixel: u32 },

    #[error("invalid geometry: {0}")]
    Geometry(#[from] GeometryError),

    #[error("failed to read framebuffer: {0}")]
    Read(String),

    #[error("destination holds {actual} bytes, expected {expected}")]
    Destination { expected: usize, actual: usize },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
