//! Input subsystem errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("failed to open input device: {0}")]
    DeviceOpen(String),

    #[error("failed to query axis ranges: {0}")]
    Query(String),

    #[error("failed to write event: {0}")]
    Write(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
