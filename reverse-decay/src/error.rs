//! Error types for the reverse decay core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Parameters rejected before any computation starts.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Reject NaN and infinities for a named input.
pub(crate) fn ensure_finite(name: &str, value: f64) -> CoreResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(CoreError::invalid_input(format!("{name} must be finite, got {value}")))
    }
}

/// Reject anything that is not a finite, strictly positive number.
pub(crate) fn ensure_positive(name: &str, value: f64) -> CoreResult<()> {
    ensure_finite(name, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(CoreError::invalid_input(format!("{name} must be positive, got {value}")))
    }
}
