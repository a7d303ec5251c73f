//! Transfer client: post the candidate to the validation backend.
//!
//! The file is read into memory (the intake gate caps it at a few MiB) and
//! handed to reqwest as a chunked stream. Every chunk hyper pulls off the
//! stream advances a [`PercentTracker`], which is how upload progress is
//! measured without a transport-specific hook.
//!
//! Any failure (connect error, timeout, non-2xx status, unreadable body)
//! becomes [`ThesisCheckError::UploadFailed`]; the response body of a failed
//! request is never parsed. A 2xx body that is not JSON is a contract
//! violation and becomes [`ThesisCheckError::MalformedResponse`] instead.

use crate::config::{DocumentKind, EndpointMap, ValidatorConfig};
use crate::error::{IntakeRejection, ThesisCheckError};
use crate::pipeline::intake::UploadCandidate;
use crate::progress::PercentTracker;
use futures::stream::{self, StreamExt};
use reqwest::multipart::{Form, Part};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

/// Size of the pieces the body stream yields.
pub const CHUNK_SIZE: usize = 16 * 1024;

/// Receives rounded upload percentages, never decreasing.
pub type ProgressSink = Arc<dyn Fn(u8) + Send + Sync>;

/// HTTP client bound to one endpoint layout.
#[derive(Debug, Clone)]
pub struct TransferClient {
    http: reqwest::Client,
    endpoints: EndpointMap,
    field_name: String,
    timeout_secs: u64,
    max_upload_bytes: u64,
}

impl TransferClient {
    pub fn new(config: &ValidatorConfig) -> Result<Self, ThesisCheckError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upload_timeout_secs))
            .build()
            .map_err(|e| ThesisCheckError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoints: config.endpoints.clone(),
            field_name: config.field_name.clone(),
            timeout_secs: config.upload_timeout_secs,
            max_upload_bytes: config.max_upload_bytes,
        })
    }

    /// URL an upload of `kind` goes to.
    pub fn endpoint_for(&self, kind: DocumentKind) -> &str {
        self.endpoints.url_for(kind)
    }

    /// Upload `candidate` and return the backend's JSON body.
    ///
    /// `progress` is called with each new percentage as the body is sent and
    /// at least once with 100 when the request succeeds.
    pub async fn upload(
        &self,
        candidate: &UploadCandidate,
        kind: DocumentKind,
        progress: ProgressSink,
    ) -> Result<serde_json::Value, ThesisCheckError> {
        let url = self.endpoint_for(kind).to_string();
        info!("Uploading {} ({} bytes) to {}", candidate.name, candidate.size_bytes, url);

        let fail = |status: Option<u16>, reason: String| ThesisCheckError::UploadFailed {
            url: url.clone(),
            status,
            reason,
        };

        let read_err = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ThesisCheckError::FileNotFound {
                    path: candidate.path.clone(),
                }
            } else {
                fail(None, format!("could not read '{}': {e}", candidate.path.display()))
            }
        };

        // The file may have grown since it was gated; never read past the limit.
        let file = tokio::fs::File::open(&candidate.path).await.map_err(read_err)?;
        let mut bytes = Vec::new();
        file.take(self.max_upload_bytes)
            .read_to_end(&mut bytes)
            .await
            .map_err(read_err)?;
        if bytes.len() as u64 >= self.max_upload_bytes {
            warn!("{} grew past the upload limit after selection", candidate.name);
            return Err(IntakeRejection::FileTooLarge {
                name: candidate.name.clone(),
                size: bytes.len() as u64,
                limit: self.max_upload_bytes,
            }
            .into());
        }

        let total = bytes.len() as u64;
        let tracker = Arc::new(Mutex::new(PercentTracker::new(total)));
        let body = progress_body(bytes, Arc::clone(&tracker), Arc::clone(&progress));

        let part = Part::stream_with_length(body, total)
            .file_name(candidate.name.clone())
            .mime_str(&candidate.mime_type)
            .map_err(|e| fail(None, format!("invalid MIME type '{}': {e}", candidate.mime_type)))?;
        let form = Form::new().part(self.field_name.clone(), part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    fail(None, format!("timed out after {}s", self.timeout_secs))
                } else {
                    fail(None, e.to_string())
                }
            })?;

        let status = response.status();
        debug!("Validation service answered HTTP {}", status);
        if !status.is_success() {
            warn!("Upload of {} rejected with HTTP {}", candidate.name, status);
            return Err(fail(Some(status.as_u16()), format!("HTTP {status}")));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| fail(Some(status.as_u16()), e.to_string()))?;

        // Some transports finish without pulling the last chunk through the
        // counter (e.g. an empty file); success always ends at 100.
        let finished = tracker.lock().ok().and_then(|mut t| t.finish());
        if let Some(pct) = finished {
            progress(pct);
        }

        serde_json::from_slice(&body).map_err(|e| ThesisCheckError::MalformedResponse {
            detail: format!("response body is not JSON: {e}"),
        })
    }
}

/// Wrap `bytes` in a request body that reports progress as chunks are sent.
fn progress_body(
    bytes: Vec<u8>,
    tracker: Arc<Mutex<PercentTracker>>,
    progress: ProgressSink,
) -> reqwest::Body {
    reqwest::Body::wrap_stream(progress_stream(bytes, tracker, progress))
}

fn progress_stream(
    bytes: Vec<u8>,
    tracker: Arc<Mutex<PercentTracker>>,
    progress: ProgressSink,
) -> impl futures::Stream<Item = Result<Vec<u8>, std::io::Error>> + Send + Sync + 'static {
    let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
    stream::iter(chunks).map(move |chunk| {
        let advanced = tracker
            .lock()
            .ok()
            .and_then(|mut t| t.advance(chunk.len() as u64));
        if let Some(pct) = advanced {
            progress(pct);
        }
        Ok::<_, std::io::Error>(chunk)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn client(endpoints: EndpointMap) -> TransferClient {
        let config = ValidatorConfig::builder()
            .endpoints(endpoints)
            .build()
            .unwrap();
        TransferClient::new(&config).unwrap()
    }

    #[test]
    fn routes_by_kind() {
        let c = client(EndpointMap::routed("http://w/v", "http://l/v"));
        assert_eq!(c.endpoint_for(DocumentKind::Word), "http://w/v");
        assert_eq!(c.endpoint_for(DocumentKind::Latex), "http://l/v");
    }

    #[test]
    fn single_endpoint_for_all_kinds() {
        let c = client(EndpointMap::single("http://x/api/validate"));
        assert_eq!(c.endpoint_for(DocumentKind::Word), "http://x/api/validate");
        assert_eq!(c.endpoint_for(DocumentKind::Latex), "http://x/api/validate");
    }

    #[tokio::test]
    async fn unreachable_backend_is_upload_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.tex");
        std::fs::write(&path, b"\\documentclass{article}").unwrap();
        let candidate = UploadCandidate::new(&path, "text/x-tex", 23);

        // Port 9 (discard) on localhost is closed in test environments.
        let c = client(EndpointMap::single("http://127.0.0.1:9/api/validate"));
        let err = c
            .upload(&candidate, DocumentKind::Latex, Arc::new(|_: u8| {}))
            .await
            .unwrap_err();
        assert!(err.is_upload_failure(), "got: {err:?}");
    }

    #[tokio::test]
    async fn file_grown_past_limit_is_refused_before_sending() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("main.tex");
        std::fs::write(&path, vec![b'%'; 4096]).unwrap();
        // Described as small, but the file on disk is at the limit.
        let candidate = UploadCandidate::new(&path, "text/x-tex", 16);

        let config = ValidatorConfig::builder()
            .endpoints(EndpointMap::single("http://127.0.0.1:9/api/validate"))
            .max_upload_bytes(4096)
            .build()
            .unwrap();
        let c = TransferClient::new(&config).unwrap();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink_sent = Arc::clone(&sent);
        let err = c
            .upload(
                &candidate,
                DocumentKind::Latex,
                Arc::new(move |p: u8| sink_sent.lock().unwrap().push(p)),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ThesisCheckError::IntakeRejected(IntakeRejection::FileTooLarge { limit: 4096, .. })
        ));
        assert!(sent.lock().unwrap().is_empty());
    }

    #[test]
    fn body_stream_reports_monotonic_progress() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |p: u8| sink_seen.lock().unwrap().push(p));

        let data = vec![0u8; CHUNK_SIZE * 4];
        let tracker = Arc::new(Mutex::new(PercentTracker::new(data.len() as u64)));
        let stream = progress_stream(data, Arc::clone(&tracker), sink);
        let collected: Vec<Vec<u8>> = tokio_test::block_on(stream.try_collect()).unwrap();

        assert_eq!(collected.len(), 4);
        assert_eq!(*seen.lock().unwrap(), vec![25, 50, 75, 100]);
        assert_eq!(tracker.lock().unwrap().finish(), None);
    }

    #[test]
    fn uneven_tail_chunk_still_reaches_hundred() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = Arc::clone(&seen);
        let sink: ProgressSink = Arc::new(move |p: u8| sink_seen.lock().unwrap().push(p));

        let data = vec![1u8; CHUNK_SIZE + 10];
        let tracker = Arc::new(Mutex::new(PercentTracker::new(data.len() as u64)));
        let collected: Vec<Vec<u8>> =
            tokio_test::block_on(progress_stream(data, tracker, sink).try_collect()).unwrap();

        assert_eq!(collected.iter().map(Vec::len).sum::<usize>(), CHUNK_SIZE + 10);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
    }
}
