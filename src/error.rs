//! Error Types
//!
//! Configuration, parse and load failures surfaced to callers.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problems found while validating a [`SessionConfig`](crate::SessionConfig),
/// before any model file is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No model file path was configured")]
    MissingModelPath,

    #[error("No non-empty word group definitions were configured")]
    NoWordGroups,

    #[error("Vector dimension must be a positive integer (got {0})")]
    InvalidDimension(i64),

    #[error("Vocabulary size must be a positive integer or -1 for unknown (got {0})")]
    InvalidVocabularySize(i64),

    #[error("Unknown text encoding: {0}")]
    UnknownEncoding(String),

    #[error("Settings file {}: {message}", path.display())]
    SettingsFile { path: PathBuf, message: String },
}

/// What was wrong with a single model line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The line did not have `dimension + 1` fields.
    FieldCount { expected: usize, found: usize },
    /// A vector component was not a finite number.
    InvalidComponent { column: usize, value: String },
}

/// A malformed line in the model file. Fatal to the whole load.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed model line {line}: {kind}")]
pub struct ParseError {
    /// 1-based line number in the model file
    pub line: usize,
    pub kind: ParseErrorKind,
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseErrorKind::FieldCount { expected, found } => {
                write!(f, "expected {} fields, found {}", expected, found)
            }
            ParseErrorKind::InvalidComponent { column, value } => {
                write!(f, "component {} is not a finite number: {:?}", column, value)
            }
        }
    }
}

/// Failures while streaming a model file into memory.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read model file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(
        "Out of memory allocating a {rows} x {dimension} model matrix. \
         Consider using a model with a smaller vocabulary or fewer dimensions"
    )]
    ResourceExhausted { rows: usize, dimension: usize },

    #[error("Model file has more distinct words than the configured vocabulary size {declared} (line {line})")]
    VocabularyOverflow { declared: usize, line: usize },

    #[error("Model file changed between loading passes (line {line})")]
    SourceChanged { line: usize },

    #[error("Model load was cancelled")]
    Cancelled,
}

impl LoadError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Failures while reading documents to score.
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Failed to read documents: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid document on input line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error for opening a scoring session.
#[derive(Error, Debug)]
pub enum DdrError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Load(#[from] LoadError),
}

impl From<ParseError> for DdrError {
    fn from(err: ParseError) -> Self {
        DdrError::Load(LoadError::Parse(err))
    }
}

pub type Result<T, E = DdrError> = std::result::Result<T, E>;
