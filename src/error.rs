use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a whole reading run.
///
/// Per-position problems never show up here: an unmatched segment pattern
/// becomes `Symbol::Unrecognized` and a failed diagnostic write is only logged.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("cannot load image {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot read label file {}: {source}", .path.display())]
    LabelSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("label parse failed: {0}")]
    Parse(#[from] LabelError),

    #[error("invalid config {}: {reason}", .path.display())]
    Config { path: PathBuf, reason: String },

    #[error("invalid reader settings: {0}")]
    Settings(String),
}

/// Label text problems.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LabelError {
    #[error("no line with 9 or more values found in {preview:?}")]
    NoRegions { preview: String },

    #[error("line {line}: {token:?} is not an integer")]
    InvalidToken { line: usize, token: String },
}
