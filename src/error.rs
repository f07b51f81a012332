//! Error types for the depict-board library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DepictError`] is **fatal**: the render pass cannot proceed at all
//!   (unreadable input, an option value outside its closed set, a broken
//!   configuration). Returned as `Err(DepictError)` from the top-level
//!   entry points.
//!
//! * [`RecordError`] is **non-fatal**: a single record's depiction failed to
//!   load (the service rejected the structure, the service was unreachable).
//!   Stored inside [`crate::output::ProbeOutcome`] so one bad structure never
//!   hides the others.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the depict-board library.
///
/// Per-record image failures use [`RecordError`] and are attached to the
/// record's fragment rather than propagated here.
#[derive(Debug, Error)]
pub enum DepictError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("Input file not found: '{path}'\nCheck the path exists and is readable.")]
    InputNotFound { path: PathBuf },

    /// Input file exists but could not be read.
    #[error("Failed to read input '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Option errors ─────────────────────────────────────────────────────
    /// A display option was given a value outside its closed set.
    #[error("Invalid value '{value}' for option '{name}'. Expected one of: {expected}")]
    InvalidOption {
        name: String,
        value: String,
        expected: String,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── HTTP errors ───────────────────────────────────────────────────────
    /// The HTTP client used for image probing could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    /// Probing was requested but the root URL is not an absolute http(s) URL.
    #[error("Cannot probe depictions against relative root URL '{root}'\nPass an absolute URL with --root-url.")]
    RelativeRootUrl { root: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single record's depiction.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum RecordError {
    /// The service answered with an error status and (usually) an HTML
    /// error fragment explaining why.
    #[error("Record {position}: depiction service returned HTTP {status}: {message}")]
    Service {
        position: usize,
        status: u16,
        message: String,
    },

    /// The request never produced a response.
    #[error("Record {position}: depiction service unreachable: {detail}")]
    Unreachable { position: usize, detail: String },

    /// The request timed out.
    #[error("Record {position}: depiction request timed out after {secs}s")]
    Timeout { position: usize, secs: u64 },
}

impl RecordError {
    /// The text shown in place of the broken image.
    pub fn display_message(&self) -> String {
        match self {
            RecordError::Service { message, .. } => message.clone(),
            RecordError::Unreachable { .. } => "Depiction service unreachable".to_string(),
            RecordError::Timeout { secs, .. } => format!("Depiction timed out after {secs}s"),
        }
    }
}
