//! High-level entry points: select a file, upload it, read the result.
//!
//! [`Validator`] bundles a configuration, one HTTP client and a
//! [`Session`], and drives the pipeline the way an interactive front-end
//! would: `select` gates the file, `upload` streams it and folds every event
//! into the session, `export_pdf` renders whatever result is current.
//!
//! [`validate`] is the one-call version for scripts: gate, upload, return
//! the result.

use crate::config::{DocumentKind, ValidatorConfig};
use crate::error::ThesisCheckError;
use crate::output::ValidationResult;
use crate::pipeline::intake::{self, UploadCandidate};
use crate::pipeline::transfer::TransferClient;
use crate::report::pdf::{self, RenderSummary};
use crate::session::{Applied, Session, SessionEvent, UploadEvent};
use crate::stream::{spawn_upload, UploadStream};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Stateful driver for one user's validation session.
#[derive(Debug)]
pub struct Validator {
    config: ValidatorConfig,
    client: Arc<TransferClient>,
    session: Session,
}

impl Validator {
    pub fn new(config: ValidatorConfig) -> Result<Self, ThesisCheckError> {
        let client = Arc::new(TransferClient::new(&config)?);
        Ok(Self {
            config,
            client,
            session: Session::new(),
        })
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Describe the file at `path` and run it through the intake gate.
    ///
    /// A rejection is recorded in the session and also returned as
    /// [`ThesisCheckError::IntakeRejected`]; the previous candidate stays
    /// selected.
    pub async fn select(&mut self, path: impl AsRef<Path>) -> Result<DocumentKind, ThesisCheckError> {
        let candidate = UploadCandidate::from_path(path).await?;
        self.select_candidate(candidate)
    }

    /// Gate an already-described candidate.
    pub fn select_candidate(&mut self, candidate: UploadCandidate) -> Result<DocumentKind, ThesisCheckError> {
        match intake::accept(&candidate, self.config.accept, self.config.max_upload_bytes) {
            Ok(kind) => {
                info!("Selected {} ({})", candidate.name, kind);
                self.session
                    .apply(SessionEvent::SetCandidate { candidate, kind });
                Ok(kind)
            }
            Err(rejection) => {
                info!("Rejected {}: {}", candidate.name, rejection);
                self.session
                    .apply(SessionEvent::SetRejection(rejection.clone()));
                Err(rejection.into())
            }
        }
    }

    /// Drop the selected file together with its result.
    pub fn remove(&mut self) {
        self.session.apply(SessionEvent::ClearCandidate);
    }

    /// Start uploading the selected file and return its event stream.
    ///
    /// Events are not applied automatically; pass each one to
    /// [`Validator::handle`]. Starting another upload before this one ends
    /// makes its remaining events stale.
    pub fn start_upload(&mut self) -> Result<UploadStream, ThesisCheckError> {
        let (candidate, kind) = match (self.session.candidate(), self.session.kind()) {
            (Some(c), Some(k)) => (c.clone(), k),
            _ => {
                return Err(ThesisCheckError::NotReady {
                    action: "upload",
                    reason: "no file selected",
                })
            }
        };
        let generation = self.session.begin_upload();
        Ok(spawn_upload(
            Arc::clone(&self.client),
            candidate,
            kind,
            generation,
            self.config.progress_callback.clone(),
        ))
    }

    /// Fold one upload event into the session.
    pub fn handle(&mut self, event: UploadEvent) -> Applied {
        let applied = self.session.apply(event.into());
        if applied != Applied::Accepted {
            debug!("Upload event not applied: {:?}", applied);
        }
        applied
    }

    /// Upload the selected file and wait for the result.
    pub async fn upload(&mut self) -> Result<&ValidationResult, ThesisCheckError> {
        let mut events = self.start_upload()?;
        while let Some(event) = events.next().await {
            self.handle(event);
        }
        self.outcome()
    }

    /// Result of the current upload, or why there is none.
    pub fn outcome(&self) -> Result<&ValidationResult, ThesisCheckError> {
        if let Some(failure) = self.session.failure() {
            return Err(failure.clone().into());
        }
        self.session.result().ok_or(ThesisCheckError::NotReady {
            action: "show",
            reason: "no validation result yet",
        })
    }

    /// Render the current result as PDF bytes.
    pub fn export_pdf(&self) -> Result<Vec<u8>, ThesisCheckError> {
        pdf::export_pdf(self.current_result()?, &self.config.report)
    }

    /// Render the current result to the configured report file.
    pub async fn export_pdf_to_file(&self) -> Result<RenderSummary, ThesisCheckError> {
        let result = self.current_result()?;
        pdf::export_pdf_to_file(result, &self.config.report, &self.config.report.filename).await
    }

    fn current_result(&self) -> Result<&ValidationResult, ThesisCheckError> {
        self.session.result().ok_or(ThesisCheckError::NotReady {
            action: "export",
            reason: "no validation result yet",
        })
    }
}

/// Gate and upload the file at `path`, returning the normalised result.
///
/// # Example
/// ```rust,no_run
/// use thesis_check::{validate, ValidatorConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let result = validate("thesis.docx", &ValidatorConfig::default()).await?;
/// for (code, count) in &result.error_type_counts {
///     println!("{code}: {count}");
/// }
/// # Ok(())
/// # }
/// ```
pub async fn validate(
    path: impl AsRef<Path>,
    config: &ValidatorConfig,
) -> Result<ValidationResult, ThesisCheckError> {
    let mut validator = Validator::new(config.clone())?;
    validator.select(path).await?;
    validator.upload().await?;
    validator.session.take_result().ok_or(ThesisCheckError::Internal(
        "upload finished without a result".into(),
    ))
}

/// Synchronous wrapper around [`validate`].
///
/// Creates a temporary tokio runtime internally.
pub fn validate_sync(
    path: impl AsRef<Path>,
    config: &ValidatorConfig,
) -> Result<ValidationResult, ThesisCheckError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ThesisCheckError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(validate(path, config))
}
