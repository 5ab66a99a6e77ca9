/*!
 * Tests for error types and their conversions
 */

use std::path::PathBuf;

use chunkwise::errors::{
    AppError, IntegrityWarning, PipelineError, ProviderError, StorageError, TranslationError,
};

/// Test that provider errors carry their details into the message
#[test]
fn test_providerError_display_shouldIncludeDetails() {
    let error = ProviderError::ApiError {
        status_code: 429,
        message: "Too many requests".to_string(),
    };
    assert_eq!(error.to_string(), "API responded with error: 429 - Too many requests");
    assert_eq!(
        ProviderError::EmptyResponse.to_string(),
        "Provider returned an empty translation"
    );
}

/// Test that parse errors report the byte position
#[test]
fn test_pipelineError_parse_shouldIncludePosition() {
    let error = PipelineError::Parse {
        position: 42,
        message: "unexpected end".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("42"));
    assert!(message.contains("unexpected end"));
}

/// Test that lower-level errors convert into translation errors
#[test]
fn test_translationError_from_shouldWrapSources() {
    let provider: TranslationError = ProviderError::ConnectionError("reset".to_string()).into();
    assert!(matches!(provider, TranslationError::Provider(_)));

    let pipeline: TranslationError = PipelineError::InvalidInput("bad".to_string()).into();
    assert!(matches!(pipeline, TranslationError::Pipeline(_)));

    let storage: TranslationError = StorageError::Io {
        path: PathBuf::from("state.json"),
        source: std::io::Error::other("denied"),
    }
    .into();
    assert!(matches!(storage, TranslationError::Storage(_)));
    assert!(storage.to_string().contains("state.json"));
}

/// Test that app errors wrap I/O and provider errors
#[test]
fn test_appError_from_shouldWrapSources() {
    let io: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
    assert!(matches!(io, AppError::File(_)));

    let provider: AppError = ProviderError::AuthenticationError("bad key".to_string()).into();
    assert!(provider.to_string().contains("bad key"));
}

/// Test that the integrity warning summarizes both counts
#[test]
fn test_integrityWarning_display_shouldSummarize() {
    let warning = IntegrityWarning {
        leftover_count: 2,
        sample: vec!["{ABCDEFGH}".to_string()],
        missing_count: 1,
    };
    let message = warning.to_string();
    assert!(message.contains("2 placeholder(s) left unrestored"));
    assert!(message.contains("{ABCDEFGH}"));
    assert!(message.contains("1 placeholder(s) missing"));
}
