//! Error types for the interpreter.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of an [`Error`].
///
/// Every variant aborts the run; the kind only tells the caller what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Allocation of the tape or loop stack failed.
    Resource,
    /// The source program could not be opened or read, or the I/O streams failed.
    Io,
    /// A `]` with no open loop to return to or leave.
    Structural,
    /// The tape pointer left the tape under the checked bounds policy.
    Bounds,
    /// The configured step limit was reached.
    Limit,
    /// The engine configuration was rejected before execution.
    Config,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("out of memory while allocating {what} of size {size}")]
    Resource { what: &'static str, size: usize },

    #[error("{}: could not read file", path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unmatched ']' at byte offset {offset}")]
    Unbalanced { offset: u64 },

    #[error("tape pointer moved out of bounds: {pointer} {delta:+} is outside 0..{len}")]
    OutOfBounds {
        pointer: usize,
        delta: isize,
        len: usize,
    },

    #[error("step limit of {0} reached")]
    StepLimit(u64),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Resource { .. } => ErrorKind::Resource,
            Error::Source { .. } | Error::Io(_) => ErrorKind::Io,
            Error::Unbalanced { .. } => ErrorKind::Structural,
            Error::OutOfBounds { .. } => ErrorKind::Bounds,
            Error::StepLimit(_) => ErrorKind::Limit,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
