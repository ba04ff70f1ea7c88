//! Error types for the ocr-langdetect library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`OcrLangError`] — the request cannot proceed (unreadable input, no
//!   engine configured, malformed candidates, engine failure). Returned as
//!   `Err(OcrLangError)` from [`crate::extract::Extractor::detect`] and the
//!   input helpers; folded into a failed [`crate::output::ExtractionResult`]
//!   by [`crate::extract::Extractor::extract`].
//!
//! * [`EngineError`] — what an engine adapter reports when the recognition
//!   or extraction backend fails. Its display text is carried verbatim into
//!   [`OcrLangError::ExtractionEngine`] so callers see exactly what the
//!   backend said.
//!
//! Nothing here is retried by the library. Retry is a caller decision,
//! usually a second `extract` call with an explicit language.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// The three failure kinds a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    /// Malformed input: bad candidate data, unreadable or unsupported file.
    InvalidInput,
    /// Recognition succeeded but produced no usable language candidate.
    NoLanguageDetected,
    /// The external engine failed or timed out.
    ExtractionEngineError,
}

/// All errors returned by the ocr-langdetect library.
#[derive(Debug, Error)]
pub enum OcrLangError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// Malformed input data (candidate without a code, bad path string, …).
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file was read but is neither a PDF nor a supported image.
    #[error("Unsupported file format: '{name}'\nFirst bytes: {magic:?}")]
    UnsupportedFormat { name: String, magic: Vec<u8> },

    // ── Detection / extraction errors ─────────────────────────────────────
    /// Recognition returned zero usable candidates.
    #[error("No language detected; choose a language explicitly and retry")]
    NoLanguageDetected,

    /// The recognition or extraction engine failed. `message` is verbatim.
    #[error("{message}")]
    ExtractionEngine { engine: String, message: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The configured engine is not initialised (missing API key, URL …).
    #[error("Engine '{engine}' is not configured.\n{hint}")]
    ProviderNotConfigured { engine: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrLangError {
    pub(crate) fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub(crate) fn engine(engine: impl Into<String>, source: EngineError) -> Self {
        Self::ExtractionEngine {
            engine: engine.into(),
            message: source.to_string(),
        }
    }

    /// Classify this error into one of the caller-facing kinds.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoLanguageDetected => ErrorKind::NoLanguageDetected,
            Self::ExtractionEngine { .. }
            | Self::ProviderNotConfigured { .. }
            | Self::DownloadFailed { .. }
            | Self::DownloadTimeout { .. }
            | Self::Internal(_) => ErrorKind::ExtractionEngineError,
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::InvalidInput { .. }
            | Self::UnsupportedFormat { .. }
            | Self::InvalidConfig(_) => ErrorKind::InvalidInput,
        }
    }
}

/// A failure reported by an engine adapter.
///
/// Engine adapters never retry; the orchestrator surfaces the display text
/// unchanged as an [`ErrorKind::ExtractionEngineError`].
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum EngineError {
    /// The backend returned an error.
    #[error("{0}")]
    Failed(String),

    /// The backend call exceeded the configured timeout.
    #[error("engine call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The engine cannot process this kind of file.
    #[error("engine '{engine}' does not support {what}")]
    Unsupported { engine: String, what: String },

    /// The backend answered, but the payload could not be understood.
    #[error("malformed engine response: {0}")]
    MalformedResponse(String),
}
