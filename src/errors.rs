//! Error types for sourcepack.

use std::path::PathBuf;

use crate::filter::FilterError;
use crate::output::OutputError;
use crate::walker::WalkError;

/// Top-level error type for sourcepack operations.
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error("An empty output is not allowed (no dump, no tree, and no outline).")]
    EmptyOutput,

    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("cannot load ignore file: {0}")]
    IgnoreFile(#[source] FilterError),

    #[error("walk error: {0}")]
    Walk(#[from] WalkError),

    #[error("output error: {0}")]
    Output(#[from] OutputError),
}

/// Map an error to its exit code.
pub fn exit_code(error: &PackError) -> i32 {
    match error {
        PackError::EmptyOutput => 2,
        PackError::PathNotFound(_) => 3,
        PackError::Walk(WalkError::NotFound { .. }) => 3,
        PackError::IgnoreFile(_) => 4,
        PackError::Walk(_) => 1,
        PackError::Output(_) => 1,
    }
}
