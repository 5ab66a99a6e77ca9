/*!
 * Error types for the chunkwise application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the chunking and protection pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration that can never work (zero budget, bad ignore tags)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Input of the wrong shape handed to a pipeline stage
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The markup parser gave up on the document
    #[error("Failed to parse markup at byte {position}: {message}")]
    Parse {
        /// Byte offset where the parser stopped
        position: usize,
        /// Parser error message
        message: String,
    },
}

/// Errors that can occur when reading or writing the checkpoint record
#[derive(Error, Debug)]
pub enum StorageError {
    /// Filesystem failure while touching the state file
    #[error("Checkpoint I/O error on {path:?}: {source}")]
    Io {
        /// Path of the state file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The in-memory state could not be encoded
    #[error("Failed to serialize checkpoint state: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The temporary file could not be moved over the state file
    #[error("Failed to persist checkpoint state to {path:?}: {source}")]
    Persist {
        /// Path of the state file
        path: PathBuf,
        /// Underlying persist error
        #[source]
        source: tempfile::PersistError,
    },
}

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The model answered with nothing usable
    #[error("Provider returned an empty translation")]
    EmptyResponse,
}

/// Errors that can occur during translation
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Error from the provider API
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the chunking pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from the checkpoint store
    #[error("Checkpoint error: {0}")]
    Storage(#[from] StorageError),

    /// The sink receiving translated sub-files refused one
    #[error("Output error: {0}")]
    Output(String),
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from a provider
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Error from the chunking pipeline
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Error from the checkpoint store
    #[error("Checkpoint error: {0}")]
    Storage(#[from] StorageError),

    /// Error from translation
    #[error("Translation error: {0}")]
    Translation(#[from] TranslationError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

// Utility functions for error conversion
impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}

/// Maximum number of offending tokens carried in an integrity warning
pub const INTEGRITY_SAMPLE_LIMIT: usize = 5;

/// Non-fatal report that placeholder restoration was incomplete.
///
/// Leftover tokens are placeholder-shaped strings that no longer match any
/// stored original (usually mangled by the translator or cut by a split).
/// Missing tokens are placeholders that never came back at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntegrityWarning {
    /// Number of leftover placeholder-shaped substrings
    pub leftover_count: usize,
    /// First few leftover tokens
    pub sample: Vec<String>,
    /// Number of stored placeholders absent from the translated text
    pub missing_count: usize,
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} placeholder(s) left unrestored {:?}, {} placeholder(s) missing from translation",
            self.leftover_count, self.sample, self.missing_count
        )
    }
}
