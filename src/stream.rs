//! Event-stream upload API: observe an upload as a `Stream` of events.
//!
//! [`upload_stream`] gates the candidate, spawns the upload on the tokio
//! runtime and hands back a stream of [`UploadEvent`]s tagged with the
//! caller's generation token. The
//! spawned task is the only writer on the channel, so events arrive in the
//! order they happened: zero or more `Progress` values, never decreasing,
//! then exactly one terminal `Completed` or `Failed`, then end of stream.
//!
//! Hosts that keep their own [`crate::session::Session`] feed each event to
//! `Session::apply`; events from a superseded generation are dropped there.

use crate::config::{DocumentKind, ValidatorConfig};
use crate::error::ThesisCheckError;
use crate::pipeline::intake::{self, UploadCandidate};
use crate::pipeline::normalize::normalize;
use crate::pipeline::transfer::{ProgressSink, TransferClient};
use crate::progress::ProgressCallback;
use crate::session::{UploadEvent, UploadFailure};
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// A boxed stream of upload events.
pub type UploadStream = Pin<Box<dyn Stream<Item = UploadEvent> + Send>>;

/// Upload `candidate` as `generation`, streaming events as they happen.
///
/// The candidate goes through the intake gate first and is routed by the
/// kind the gate detects; a refused file returns
/// [`ThesisCheckError::IntakeRejected`] without touching the network.
///
/// Must be called from within a tokio runtime.
///
/// # Example
/// ```rust,no_run
/// use thesis_check::{upload_stream, UploadCandidate, ValidatorConfig};
/// use futures::StreamExt;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let candidate = UploadCandidate::from_path("thesis.docx").await?;
/// let config = ValidatorConfig::default();
/// let mut events = upload_stream(candidate, 1, &config)?;
/// while let Some(ev) = events.next().await {
///     println!("{ev:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub fn upload_stream(
    candidate: UploadCandidate,
    generation: u64,
    config: &ValidatorConfig,
) -> Result<UploadStream, ThesisCheckError> {
    let kind = intake::accept(&candidate, config.accept, config.max_upload_bytes)?;
    let client = Arc::new(TransferClient::new(config)?);
    Ok(spawn_upload(
        client,
        candidate,
        kind,
        generation,
        config.progress_callback.clone(),
    ))
}

/// Spawn an upload on an existing client.
pub(crate) fn spawn_upload(
    client: Arc<TransferClient>,
    candidate: UploadCandidate,
    kind: DocumentKind,
    generation: u64,
    callback: Option<ProgressCallback>,
) -> UploadStream {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let url = client.endpoint_for(kind).to_string();
        if let Some(cb) = &callback {
            cb.on_upload_start(generation, &candidate.name, candidate.size_bytes);
        }

        let sink: ProgressSink = {
            let tx = tx.clone();
            let callback = callback.clone();
            Arc::new(move |pct: u8| {
                if let Some(cb) = &callback {
                    cb.on_progress(generation, pct);
                }
                // A closed receiver means the host stopped listening.
                let _ = tx.send(UploadEvent::progress(generation, pct));
            })
        };

        let outcome = match client.upload(&candidate, kind, sink).await {
            Ok(body) => normalize(body),
            Err(e) => Err(e),
        };

        let terminal = match outcome {
            Ok(result) => {
                info!(
                    "Generation {}: {} errors in {}",
                    generation,
                    result.len(),
                    candidate.name
                );
                if let Some(cb) = &callback {
                    cb.on_upload_complete(generation, result.len());
                }
                UploadEvent::completed(generation, result)
            }
            Err(e) => {
                warn!("Generation {} failed: {}", generation, e);
                if let Some(cb) = &callback {
                    cb.on_upload_failed(generation, &e.to_string());
                }
                UploadEvent::failed(generation, UploadFailure::from_error(&e, &url))
            }
        };

        if tx.send(terminal).is_err() {
            debug!("Generation {} finished after its listener went away", generation);
        }
    });

    Box::pin(UnboundedReceiverStream::new(rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AcceptPolicy, EndpointMap};
    use crate::error::IntakeRejection;
    use crate::session::UploadEventKind;
    use futures::StreamExt;

    #[tokio::test]
    async fn unreachable_backend_yields_one_failed_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.tex");
        std::fs::write(&path, b"\\section{Intro}").unwrap();
        let candidate = UploadCandidate::from_path(&path).await.unwrap();

        let config = ValidatorConfig::builder()
            .endpoints(EndpointMap::single("http://127.0.0.1:9/api/validate"))
            .build()
            .unwrap();

        let events: Vec<UploadEvent> = upload_stream(candidate, 7, &config)
            .unwrap()
            .collect()
            .await;

        let terminal: Vec<&UploadEvent> = events.iter().filter(|e| e.is_terminal()).collect();
        assert_eq!(terminal.len(), 1);
        assert!(events.iter().all(|e| e.generation == 7));
        assert!(events.last().unwrap().is_terminal());
        match &terminal[0].kind {
            UploadEventKind::Failed(f) => assert!(!f.is_malformed()),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn refused_candidate_never_starts() {
        let config = ValidatorConfig::builder()
            .endpoints(EndpointMap::single("http://127.0.0.1:9/api/validate"))
            .build()
            .unwrap();

        let pdf = UploadCandidate::new("/tmp/thesis.pdf", "application/pdf", 10);
        assert!(matches!(
            upload_stream(pdf, 1, &config),
            Err(ThesisCheckError::IntakeRejected(IntakeRejection::UnsupportedFileType { .. }))
        ));

        let big = UploadCandidate::new("/tmp/main.tex", "text/x-tex", config.max_upload_bytes);
        assert!(matches!(
            upload_stream(big, 1, &config),
            Err(ThesisCheckError::IntakeRejected(IntakeRejection::FileTooLarge { .. }))
        ));
    }

    #[tokio::test]
    async fn latex_only_policy_refuses_word() {
        let config = ValidatorConfig::builder()
            .endpoints(EndpointMap::single("http://127.0.0.1:9/api/validate"))
            .accept(AcceptPolicy::LatexOnly)
            .build()
            .unwrap();
        let docx = UploadCandidate::new("/tmp/thesis.docx", crate::pipeline::intake::WORD_MIME, 10);
        assert!(upload_stream(docx, 1, &config).is_err());
    }
}
