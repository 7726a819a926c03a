use thiserror::Error;

/// Top-level error type used across the workspace.
#[derive(Debug, Error)]
pub enum VscopeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("scheduling error: {0}")]
    Scheduling(String),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

pub type Result<T, E = VscopeError> = std::result::Result<T, E>;
