use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by local storage
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}
