//! Error types for the editor

use crate::document::StoreId;
use crate::format::FormatError;
use metaconf_common::{Path, PathError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Cannot address `{key}` inside a sequence at '{path}'")]
    PathMismatch { path: Path, key: String },

    #[error("Index {index} at '{path}' is too far past the end of a sequence of {len}")]
    IndexOutOfReach { path: Path, index: usize, len: usize },

    #[error("History belongs to store {expected}, not {actual}")]
    ForeignStore { expected: StoreId, actual: StoreId },
}
