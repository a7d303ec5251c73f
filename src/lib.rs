//! # thesis-check
//!
//! Check a thesis template against a formatting validation service and show
//! what it found.
//!
//! The heavy lifting (parsing the `.docx` or `.tex` and applying the
//! formatting rules) happens in a remote backend. This crate is the client
//! side: it decides whether a file may be uploaded, sends it with progress
//! reporting, reconciles the backend's response shapes into one result
//! model, and renders that result as a paginated table, a bar chart and a
//! PDF report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! file
//!  │
//!  ├─ 1. Intake     type (Word MIME / .tex) then size (< 5 MiB), local only
//!  ├─ 2. Transfer   multipart POST to the kind's endpoint, byte-counted progress
//!  ├─ 3. Normalize  bare list or bundle → ValidationResult
//!  └─ 4. Report     table page / chart bars / PDF
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use thesis_check::{validate, TableView, ValidatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ValidatorConfig::default();
//!     let result = validate("thesis.docx", &config).await?;
//!     let table = TableView::new(&result, config.report.page_size, 40);
//!     for row in table.page(1).rows {
//!         println!("{} {}", row.code, row.message);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `thesis-check` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! thesis-check = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod report;
pub mod session;
pub mod stream;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AcceptPolicy, DocumentKind, EndpointMap, ReportConfig, ValidatorConfig, ValidatorConfigBuilder};
pub use error::{IntakeRejection, ThesisCheckError};
pub use output::{ValidationError, ValidationResult, ValidationSummary};
pub use pipeline::intake::UploadCandidate;
pub use pipeline::normalize::{normalize, RawValidationResponse};
pub use progress::{NoopProgressCallback, ProgressCallback, UploadProgressCallback};
pub use report::{ChartView, TableView};
pub use session::{Applied, Session, SessionEvent, UploadEvent, UploadEventKind, UploadFailure};
pub use stream::{upload_stream, UploadStream};
pub use validate::{validate, validate_sync, Validator};
