//! # Error Handling
//!
//! `AppError` is the single error type handlers return. Its `ResponseError`
//! impl turns every failure into the same JSON envelope, and the `From` impls
//! below decide which status each lower-level error earns.

use crate::audio::ContainerError;
use crate::codec::CodecError;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// ## Error Categories:
/// - **Internal**: Server-side problems (500 errors)
/// - **BadRequest**: Client sent invalid data (400 errors)
/// - **NotFound**: No route matches the request (404 errors)
/// - **ConfigError**: Configuration problems (500 errors)
/// - **ValidationError**: Data validation failed (400 errors)
/// - **FormatMismatch**: Well-formed audio in the wrong PCM format (422 errors)
#[derive(Debug)]
pub enum AppError {
    Internal(String),

    BadRequest(String),

    NotFound(String),

    /// The configured codec parameters cannot produce a signal
    ConfigError(String),

    /// Input is well-formed but breaks a limit or rule
    ValidationError(String),

    /// Audio parsed fine but its sample rate, channel count or bit depth is wrong
    FormatMismatch(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::FormatMismatch(msg) => write!(f, "Format mismatch: {}", msg),
        }
    }
}

/// JSON error envelope.
///
/// ```json
/// {
///   "error": {
///     "type": "format_mismatch",
///     "message": "audio format mismatch: sample_rate is 22050, expected 44100",
///     "timestamp": "2025-01-01T12:00:00Z"
///   }
/// }
/// ```
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "bad_request",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "not_found",
                msg.clone(),
            ),
            AppError::ConfigError(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                msg.clone(),
            ),
            AppError::ValidationError(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
            ),
            AppError::FormatMismatch(msg) => (
                actix_web::http::StatusCode::UNPROCESSABLE_ENTITY,
                "format_mismatch",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

/// ## Mapping:
/// - Empty or non-digit text → BadRequest
/// - Wrong PCM format → FormatMismatch (422)
/// - Short buffer under `strict_length` → BadRequest
/// - Bad codec parameters → ConfigError (the parameters come from server configuration)
impl From<CodecError> for AppError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::EmptyInput
            | CodecError::InvalidSymbol { .. }
            | CodecError::TruncatedInput { .. } => AppError::BadRequest(err.to_string()),
            CodecError::FormatMismatch { .. } => AppError::FormatMismatch(err.to_string()),
            CodecError::InvalidParams(_) => AppError::ConfigError(err.to_string()),
        }
    }
}

/// Bytes that are not a readable WAV file are the client's fault (400). A WAV
/// in an encoding we cannot read at all (float, 24-bit) is a format problem (422).
impl From<ContainerError> for AppError {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::Malformed(_) => AppError::BadRequest(err.to_string()),
            ContainerError::UnsupportedEncoding(_) | ContainerError::UnsupportedBitDepth { .. } => {
                AppError::FormatMismatch(err.to_string())
            }
        }
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::BadRequest(format!("Invalid base64 payload: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Result type every handler returns.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(AppError::BadRequest("x".into()).error_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).error_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::FormatMismatch("x".into()).error_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_codec_error_mapping() {
        let err: AppError = CodecError::InvalidSymbol { character: 'x', position: 3 }.into();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg.contains("position 3")));

        let err: AppError = CodecError::FormatMismatch {
            field: "sample_rate",
            expected: 44100,
            actual: 8000,
        }
        .into();
        assert!(matches!(err, AppError::FormatMismatch(_)));

        let err: AppError = CodecError::InvalidParams("cell size".into()).into();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_container_error_mapping() {
        let err: AppError = ContainerError::UnsupportedEncoding(3).into();
        assert!(matches!(err, AppError::FormatMismatch(_)));

        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "no RIFF header");
        let err: AppError = ContainerError::Malformed(io).into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
