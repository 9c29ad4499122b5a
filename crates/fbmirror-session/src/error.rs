//! Session errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("display error: {0}")]
    Display(#[from] fbmirror_display::DisplayError),

    #[error("input error: {0}")]
    Input(#[from] fbmirror_input::InputError),

    #[error("capture worker error: {0}")]
    Worker(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
