//! Engine error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Calibration angles that do not produce a usable rotation
    #[error("degenerate calibration: {0}")]
    DegenerateCalibration(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
