use thiserror::Error;

/// Raised when a path argument itself is malformed (caller misuse, never user content)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Malformed path {input:?} at offset {offset}: {reason}")]
    Malformed {
        input: String,
        offset: usize,
        reason: &'static str,
    },

    #[error("Invalid JSON pointer {0:?}: must be empty or start with '/'")]
    InvalidPointer(String),
}
