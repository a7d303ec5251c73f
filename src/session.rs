//! Session state for one user working through the pipeline.
//!
//! A [`Session`] owns everything a front-end shows: the selected candidate,
//! the last intake rejection, upload progress, the loading flag, the latest
//! result and the latest failure. It changes only through
//! [`Session::apply`] (plus [`Session::begin_upload`], which hands out the
//! generation token).
//!
//! ## Supersession
//!
//! A user can pick a new file and upload it before the previous upload has
//! answered. Every upload gets a fresh generation from a monotonically
//! increasing counter, and every upload event carries the generation it
//! belongs to. `apply` drops events whose generation is not the current one,
//! so a slow response from an older upload can never overwrite what a newer
//! upload produced.

use crate::config::DocumentKind;
use crate::error::{IntakeRejection, ThesisCheckError};
use crate::output::ValidationResult;
use crate::pipeline::intake::UploadCandidate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Why an upload produced no result.
///
/// A clonable summary of [`ThesisCheckError`] suitable for carrying through
/// the event channel and showing as a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadFailure {
    /// Transport or server fault. The user may retry.
    Transport {
        url: String,
        status: Option<u16>,
        reason: String,
    },
    /// The backend answered 2xx with a body of unknown shape.
    Malformed { detail: String },
    /// The file no longer passed the intake gate when it was read for
    /// sending; nothing went over the network.
    Refused(IntakeRejection),
}

impl UploadFailure {
    /// Summarise `err` for an upload that was sent to `url`.
    pub fn from_error(err: &ThesisCheckError, url: &str) -> Self {
        match err {
            ThesisCheckError::UploadFailed {
                url,
                status,
                reason,
            } => UploadFailure::Transport {
                url: url.clone(),
                status: *status,
                reason: reason.clone(),
            },
            ThesisCheckError::MalformedResponse { detail } => UploadFailure::Malformed {
                detail: detail.clone(),
            },
            ThesisCheckError::IntakeRejected(rejection) => UploadFailure::Refused(rejection.clone()),
            other => UploadFailure::Transport {
                url: url.to_string(),
                status: None,
                reason: other.to_string(),
            },
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, UploadFailure::Malformed { .. })
    }
}

impl std::fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadFailure::Transport { reason, .. } => write!(f, "upload failed: {reason}"),
            UploadFailure::Malformed { detail } => write!(f, "unrecognised response: {detail}"),
            UploadFailure::Refused(rejection) => write!(f, "not sent: {rejection}"),
        }
    }
}

impl From<UploadFailure> for ThesisCheckError {
    fn from(f: UploadFailure) -> Self {
        match f {
            UploadFailure::Transport {
                url,
                status,
                reason,
            } => ThesisCheckError::UploadFailed {
                url,
                status,
                reason,
            },
            UploadFailure::Malformed { detail } => ThesisCheckError::MalformedResponse { detail },
            UploadFailure::Refused(rejection) => ThesisCheckError::IntakeRejected(rejection),
        }
    }
}

/// What happened during one upload attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEventKind {
    /// Rounded percentage of the body sent.
    Progress(u8),
    /// Backend answered and the body was normalised.
    Completed(ValidationResult),
    /// Transport failure or malformed response.
    Failed(UploadFailure),
}

/// An upload event tagged with the generation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadEvent {
    pub generation: u64,
    pub kind: UploadEventKind,
}

impl UploadEvent {
    pub fn progress(generation: u64, percent: u8) -> Self {
        Self {
            generation,
            kind: UploadEventKind::Progress(percent),
        }
    }

    pub fn completed(generation: u64, result: ValidationResult) -> Self {
        Self {
            generation,
            kind: UploadEventKind::Completed(result),
        }
    }

    pub fn failed(generation: u64, failure: UploadFailure) -> Self {
        Self {
            generation,
            kind: UploadEventKind::Failed(failure),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.kind, UploadEventKind::Progress(_))
    }
}

/// The transitions a session accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A file passed the intake gate. A file already held is discarded
    /// first, as with `ClearCandidate`.
    SetCandidate {
        candidate: UploadCandidate,
        kind: DocumentKind,
    },
    /// The user removed the file; candidate and result go together.
    ClearCandidate,
    /// The intake gate refused a file.
    SetRejection(IntakeRejection),
    SetProgress { generation: u64, percent: u8 },
    SetResult {
        generation: u64,
        result: ValidationResult,
    },
    SetError {
        generation: u64,
        failure: UploadFailure,
    },
}

impl From<UploadEvent> for SessionEvent {
    fn from(ev: UploadEvent) -> Self {
        let generation = ev.generation;
        match ev.kind {
            UploadEventKind::Progress(percent) => SessionEvent::SetProgress {
                generation,
                percent,
            },
            UploadEventKind::Completed(result) => SessionEvent::SetResult { generation, result },
            UploadEventKind::Failed(failure) => SessionEvent::SetError {
                generation,
                failure,
            },
        }
    }
}

/// Outcome of [`Session::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// State changed.
    Accepted,
    /// Event belongs to a superseded upload and was dropped.
    Stale { event: u64, current: u64 },
    /// The current upload already reached its terminal state.
    AlreadySettled,
    /// Progress at or below what is already shown.
    Ignored,
}

/// Everything a front-end displays, owned in one place.
#[derive(Debug, Clone, Default)]
pub struct Session {
    candidate: Option<UploadCandidate>,
    kind: Option<DocumentKind>,
    rejection: Option<IntakeRejection>,
    result: Option<ValidationResult>,
    failure: Option<UploadFailure>,
    progress: u8,
    loading: bool,
    generation: u64,
    settled: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate(&self) -> Option<&UploadCandidate> {
        self.candidate.as_ref()
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        self.kind
    }

    pub fn rejection(&self) -> Option<&IntakeRejection> {
        self.rejection.as_ref()
    }

    pub fn result(&self) -> Option<&ValidationResult> {
        self.result.as_ref()
    }

    pub fn failure(&self) -> Option<&UploadFailure> {
        self.failure.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Generation of the most recent upload (0 before any upload).
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// `true` once the current upload has completed or failed.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Start a new upload attempt and return its generation.
    ///
    /// Progress resets to 0 and the previous result and failure are
    /// dropped; anything still in flight from earlier generations becomes
    /// stale.
    pub fn begin_upload(&mut self) -> u64 {
        self.generation += 1;
        self.progress = 0;
        self.loading = true;
        self.settled = false;
        self.result = None;
        self.failure = None;
        debug!("Upload generation {} started", self.generation);
        self.generation
    }

    /// Take the result out of the session, leaving the rest untouched.
    pub fn take_result(&mut self) -> Option<ValidationResult> {
        self.result.take()
    }

    /// Apply one transition.
    pub fn apply(&mut self, event: SessionEvent) -> Applied {
        match event {
            SessionEvent::SetCandidate { candidate, kind } => {
                if self.candidate.is_some() {
                    self.discard_candidate();
                }
                self.candidate = Some(candidate);
                self.kind = Some(kind);
                self.rejection = None;
                Applied::Accepted
            }
            SessionEvent::ClearCandidate => {
                self.discard_candidate();
                Applied::Accepted
            }
            SessionEvent::SetRejection(reason) => {
                self.rejection = Some(reason);
                Applied::Accepted
            }
            SessionEvent::SetProgress {
                generation,
                percent,
            } => {
                if let Some(skip) = self.check_generation(generation) {
                    return skip;
                }
                let percent = percent.min(100);
                if percent <= self.progress && self.progress != 0 {
                    return Applied::Ignored;
                }
                self.progress = percent;
                Applied::Accepted
            }
            SessionEvent::SetResult { generation, result } => {
                if let Some(skip) = self.check_generation(generation) {
                    return skip;
                }
                self.result = Some(result);
                self.failure = None;
                self.progress = 100;
                self.loading = false;
                self.settled = true;
                Applied::Accepted
            }
            SessionEvent::SetError {
                generation,
                failure,
            } => {
                if let Some(skip) = self.check_generation(generation) {
                    return skip;
                }
                self.result = None;
                self.failure = Some(failure);
                self.progress = 0;
                self.loading = false;
                self.settled = true;
                Applied::Accepted
            }
        }
    }

    /// Drop the held file with everything derived from it.
    fn discard_candidate(&mut self) {
        self.candidate = None;
        self.kind = None;
        self.result = None;
        self.failure = None;
        self.rejection = None;
        self.progress = 0;
        self.loading = false;
        // Anything still in flight belongs to the discarded file.
        self.generation += 1;
        self.settled = true;
    }

    fn check_generation(&self, generation: u64) -> Option<Applied> {
        if generation != self.generation {
            debug!(
                "Dropping event from upload generation {} (current {})",
                generation, self.generation
            );
            return Some(Applied::Stale {
                event: generation,
                current: self.generation,
            });
        }
        if self.settled {
            return Some(Applied::AlreadySettled);
        }
        None
    }
}
