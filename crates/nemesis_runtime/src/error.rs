//! Runtime error types

use nemesis_ai::AiError;
use thiserror::Error;

/// Errors surfaced by the encounter runner
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad encounter file or command line
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Engine error: {0}")]
    Ai(#[from] AiError),

    #[error("Report error: {0}")]
    Report(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, RuntimeError>;
