//! Error types for the thesis-check library.
//!
//! Two types reflect two failure scopes:
//!
//! * [`IntakeRejection`]: the candidate file was refused locally (wrong type
//!   or too large). It never reaches the network and is meant to be shown as
//!   inline text next to the file picker.
//!
//! * [`ThesisCheckError`]: everything returned as `Err` from the public
//!   entry points. Upload failures, malformed responses and render faults
//!   are kept as separate variants so callers can surface them differently:
//!   a transport fault invites a retry, a malformed body is a contract
//!   violation, and a render fault only affects the export action.

use std::path::PathBuf;
use thiserror::Error;

/// Why the intake gate refused a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum IntakeRejection {
    /// Neither a Word document (by MIME type) nor a LaTeX source (by extension),
    /// or a kind the current deployment does not accept.
    #[error("unsupported file type: '{name}' (expected {expected})")]
    UnsupportedFileType { name: String, expected: String },

    /// Candidate is at or above the upload limit.
    #[error("file too large: '{name}' is {size} bytes, limit is {limit} bytes")]
    FileTooLarge { name: String, size: u64, limit: u64 },
}

/// All errors returned by the thesis-check library.
#[derive(Debug, Error)]
pub enum ThesisCheckError {
    // ── Intake ────────────────────────────────────────────────────────────
    /// The intake gate refused the candidate.
    #[error(transparent)]
    IntakeRejected(#[from] IntakeRejection),

    /// Candidate file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the candidate.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// An upload or export was requested with nothing to act on.
    #[error("Nothing to {action}: {reason}")]
    NotReady { action: &'static str, reason: &'static str },

    // ── Transfer ──────────────────────────────────────────────────────────
    /// Transport error or non-2xx status from the validation backend.
    #[error("Upload to '{url}' failed: {reason}\nCheck the validation service is running, then try again.")]
    UploadFailed {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    // ── Result model ──────────────────────────────────────────────────────
    /// The backend answered 2xx but the body matches neither known shape.
    #[error("Validation service returned an unrecognised response: {detail}")]
    MalformedResponse { detail: String },

    // ── Report ────────────────────────────────────────────────────────────
    /// PDF generation failed. Table and chart views are unaffected.
    #[error("PDF report generation failed: {detail}")]
    RenderFailed { detail: String },

    /// The report font could not be read or parsed.
    #[error("Failed to load report font '{path}': {detail}\nPass --font with a TrueType font that covers Cyrillic text.")]
    FontLoadFailed { path: PathBuf, detail: String },

    /// Could not create or write the report file.
    #[error("Failed to write report '{path}': {source}")]
    ReportWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config ────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ThesisCheckError {
    /// `true` for failures the user recovers from by uploading again.
    pub fn is_upload_failure(&self) -> bool {
        matches!(self, ThesisCheckError::UploadFailed { .. })
    }
}
