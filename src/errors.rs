use std::path::PathBuf;
use thiserror::Error;

use crate::substitution::convert::LeafKind;

/// Application-level errors surfaced by the command line.
///
/// Each variant maps to a distinct process exit code through
/// [`get_exit_code`], so pipelines can tell a misconfigured invocation apart
/// from a failed run.
#[derive(Error, Debug)]
pub enum StampError {
    #[error("Missing working directory. Use --working-directory <DIR>.")]
    MissingWorkingDirectory,

    #[error("Working directory does not exist: {path}")]
    WorkingDirectoryNotFound { path: PathBuf },

    #[error("Error while parsing --variables option: {token} (expected KEY=VALUE)")]
    InvalidVariableFormat { token: String },

    #[error("Path '{path}' was intended for processing, but it is neither a zip file nor a directory.")]
    UnsupportedTarget { path: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Usage error: {0}")]
    Usage(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Failure of a single substitution call. Every variant leaves the source
/// document untouched.
#[derive(Error, Debug)]
pub enum SubstitutionError {
    #[error("Document is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed processing variable '{key}': {source}")]
    Variable {
        key: String,
        #[source]
        source: VariableError,
    },

    #[error("Failed to serialize substituted document: {0}")]
    Serialize(serde_json::Error),
}

impl SubstitutionError {
    /// The variable key that aborted the substitution, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            SubstitutionError::Variable { key, .. } => Some(key),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum VariableError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// Errors raised while walking a key path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("segment '{segment}' is not a valid array index")]
    InvalidIndex { segment: String },

    #[error("index {index} is out of range for array of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// A replacement string that does not parse as the target leaf's type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot convert '{value}' to {kind}: {reason}")]
pub struct ConversionError {
    pub kind: LeafKind,
    pub value: String,
    pub reason: String,
}

impl ConversionError {
    pub fn new(kind: LeafKind, value: &str, reason: impl ToString) -> Self {
        Self {
            kind,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, StampError>;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_MISSING_WORKING_DIRECTORY: u8 = 1;
pub const EXIT_WRONG_VARIABLES_FORMAT: u8 = 2;
pub const EXIT_UNKNOWN_ERROR: u8 = 3;

/// Determine the appropriate process exit code for an error.
pub fn get_exit_code(e: &anyhow::Error) -> u8 {
    match e.downcast_ref::<StampError>() {
        Some(StampError::MissingWorkingDirectory)
        | Some(StampError::WorkingDirectoryNotFound { .. }) => EXIT_MISSING_WORKING_DIRECTORY,
        Some(StampError::InvalidVariableFormat { .. }) => EXIT_WRONG_VARIABLES_FORMAT,
        _ => EXIT_UNKNOWN_ERROR,
    }
}
