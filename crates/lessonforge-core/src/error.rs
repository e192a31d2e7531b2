use thiserror::Error;

/// Core error type shared across Lessonforge crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A chemical equation could not be parsed.
    #[error("invalid equation: {0}")]
    InvalidEquation(String),
}

/// Convenience alias for results returned by Lessonforge crates.
pub type Result<T> = std::result::Result<T, Error>;
