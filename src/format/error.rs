//! Errors raised by format resolution and instantiation

use crate::stream::StreamError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FormatError {
    /// No registered format gave the file a positive score
    #[error("No registered format understands {}", path.display())]
    Unrecognized { path: PathBuf },

    /// The best format matched, but not confidently enough for the caller
    #[error("Best match for {} is {format} with score {score}, below the required {required}", path.display())]
    BelowThreshold {
        path: PathBuf,
        format: &'static str,
        score: u32,
        required: u32,
    },

    /// A specific format was requested for a file it does not understand
    #[error("{format} does not understand {}", path.display())]
    Misdeclared { format: &'static str, path: PathBuf },

    #[error("Malformed {format} header: {reason}")]
    Header { format: &'static str, reason: String },

    #[error("{format} does not support {operation}")]
    Unsupported {
        format: &'static str,
        operation: &'static str,
    },

    #[error(transparent)]
    Stream(#[from] StreamError),
}

/// Errors raised while building a registry
#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Format {format} specializes {parent}, which is not registered")]
    UnknownParent {
        format: &'static str,
        parent: &'static str,
    },
}
