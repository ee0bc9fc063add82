//! Error types.

pub mod compile;
pub mod encode;
pub mod parse;
pub mod processor;
pub mod transform;

pub use compile::CompileError;
pub use encode::EncodeError;
pub use parse::{ParseDataError, ParseError};
pub use processor::ZoneProcessorError;
pub use transform::TransformError;

use std::io;
use std::path::PathBuf;

/// Unified error type for everything in the crate
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error
    #[error("unable to read {path:?}: {source}")]
    Io {
        /// Path of the file
        path: PathBuf,
        /// Underlying error
        source: io::Error,
    },
    /// Unified error type for every non I/O error in the crate
    #[error(transparent)]
    Tz(TzError),
}

impl Error {
    /// Construct an I/O error for a path
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

impl<T: Into<TzError>> From<T> for Error {
    fn from(error: T) -> Self {
        Self::Tz(error.into())
    }
}

/// Unified error type for every non I/O error in the crate
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum TzError {
    /// Error while parsing a TZ database line
    #[error("invalid TZ database line: {0}")]
    Parse(#[from] ParseError),
    /// Fatal transformer error
    #[error("transformer failure: {0}")]
    Transform(#[from] TransformError),
    /// Fatal encoding error
    #[error("encoding failure: {0}")]
    Encode(#[from] EncodeError),
    /// Zone processor error
    #[error("zone processor failure: {0}")]
    ZoneProcessor(#[from] ZoneProcessorError),
    /// Compiler pipeline error
    #[error("compiler failure: {0}")]
    Compile(#[from] CompileError),
}
