//! Runtime errors.

use sim_core::{StoreError, WindowError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    /// A content file could not be loaded.
    #[error("content error: {0}")]
    Content(String),

    #[error(transparent)]
    Window(#[from] WindowError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
