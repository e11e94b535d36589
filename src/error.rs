// THEORY:
// Every fallible step of the compositor reports through one error type. The
// variants mirror the places a batch can go wrong: the directories around it,
// the individual sprite files, and the small amount of run configuration. Each
// file-level variant carries the path it refers to so a report line is useful
// on its own, without the surrounding log context.

use image::ImageError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompositeError>;

#[derive(Debug, Error)]
pub enum CompositeError {
    #[error("input directory {} does not exist or cannot be listed", .path.display())]
    InputDirectoryNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot create output directory {}", .path.display())]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a regular file", .path.display())]
    NotAFile { path: PathBuf },

    #[error("cannot decode {} as an image", .path.display())]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    /// The source is too narrow to have a right-hand neighbour for any column.
    #[error("image is {width} pixels wide, a composite needs at least 1")]
    DegenerateWidth { width: u32 },

    #[error("cannot write {}", .path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("cannot read the game name")]
    Prompt(#[source] io::Error),

    #[error("worker pool failure: {0}")]
    WorkerPool(&'static str),

    #[error("{} was not processed because the batch was aborted", .path.display())]
    Cancelled { path: PathBuf },
}

/// Renders `error` followed by every underlying cause, separated by `": "`.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
