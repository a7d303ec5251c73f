//! Intake gate: describe the selected file and decide whether to upload it.
//!
//! Rules run in a fixed order and the first failure wins: the type check
//! comes before the size check, so a wrong-type file is reported as such
//! whatever its size. The gate is advisory only. The backend re-validates
//! both type and size.

use crate::config::{AcceptPolicy, DocumentKind};
use crate::error::{IntakeRejection, ThesisCheckError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// MIME type of an Office Open XML word-processing document.
pub const WORD_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// The file the user selected, prior to upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCandidate {
    /// File name including extension, as sent in the multipart body.
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Lower-cased extension without the dot; empty when there is none.
    pub extension: String,
    /// Where the bytes are read from at upload time.
    pub path: PathBuf,
}

impl UploadCandidate {
    /// Describe a file without touching the file system.
    pub fn new(
        path: impl Into<PathBuf>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = extension_of(&name);
        Self {
            name,
            mime_type: mime_type.into(),
            size_bytes,
            extension,
            path,
        }
    }

    /// Describe a file on disk, guessing its MIME type from the extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ThesisCheckError> {
        let path = path.as_ref();
        let meta = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                return Err(ThesisCheckError::PermissionDenied {
                    path: path.to_path_buf(),
                });
            }
            Err(_) => {
                return Err(ThesisCheckError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
        };
        if !meta.is_file() {
            return Err(ThesisCheckError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let candidate = Self::new(path, mime, meta.len());
        debug!(
            "Candidate {}: {} bytes, {}",
            candidate.name, candidate.size_bytes, candidate.mime_type
        );
        Ok(candidate)
    }

    /// Which kind of document this is, if any.
    ///
    /// Word is recognised by MIME type, LaTeX by a case-insensitive `.tex`
    /// extension.
    pub fn kind(&self) -> Option<DocumentKind> {
        if self.mime_type.eq_ignore_ascii_case(WORD_MIME) {
            Some(DocumentKind::Word)
        } else if self.extension == "tex" {
            Some(DocumentKind::Latex)
        } else {
            None
        }
    }
}

/// Gate a candidate. Returns its document kind when accepted.
pub fn accept(
    candidate: &UploadCandidate,
    policy: AcceptPolicy,
    max_bytes: u64,
) -> Result<DocumentKind, IntakeRejection> {
    let kind = candidate
        .kind()
        .filter(|k| policy.allows(*k))
        .ok_or_else(|| IntakeRejection::UnsupportedFileType {
            name: candidate.name.clone(),
            expected: policy.describe().to_string(),
        })?;

    if candidate.size_bytes >= max_bytes {
        return Err(IntakeRejection::FileTooLarge {
            name: candidate.name.clone(),
            size: candidate.size_bytes,
            limit: max_bytes,
        });
    }

    debug!("Accepted {} as {}", candidate.name, kind);
    Ok(kind)
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_UPLOAD_BYTES;

    const MIB: u64 = 1024 * 1024;

    fn docx(size: u64) -> UploadCandidate {
        UploadCandidate::new("/tmp/thesis.docx", WORD_MIME, size)
    }

    fn tex(name: &str, size: u64) -> UploadCandidate {
        UploadCandidate::new(format!("/tmp/{name}"), "text/x-tex", size)
    }

    #[test]
    fn candidate_fields() {
        let c = tex("Main.TEX", 10);
        assert_eq!(c.name, "Main.TEX");
        assert_eq!(c.extension, "tex");
        assert_eq!(c.kind(), Some(DocumentKind::Latex));
    }

    #[test]
    fn accepts_small_word_and_latex() {
        let limit = DEFAULT_MAX_UPLOAD_BYTES;
        assert_eq!(
            accept(&docx(2 * MIB), AcceptPolicy::Both, limit),
            Ok(DocumentKind::Word)
        );
        assert_eq!(
            accept(&tex("a.tex", 100), AcceptPolicy::Both, limit),
            Ok(DocumentKind::Latex)
        );
    }

    #[test]
    fn rejects_at_or_above_five_mib_regardless_of_type() {
        let limit = DEFAULT_MAX_UPLOAD_BYTES;
        for size in [5 * MIB, 5 * MIB + 1, 50 * MIB] {
            for c in [docx(size), tex("a.tex", size)] {
                let err = accept(&c, AcceptPolicy::Both, limit).unwrap_err();
                assert!(
                    matches!(err, IntakeRejection::FileTooLarge { .. }),
                    "size {size}: {err:?}"
                );
            }
        }
        assert!(accept(&docx(5 * MIB - 1), AcceptPolicy::Both, limit).is_ok());
    }

    #[test]
    fn disallowed_type_rejected_before_size() {
        let limit = DEFAULT_MAX_UPLOAD_BYTES;
        for size in [0, MIB, 5 * MIB, 100 * MIB] {
            let pdf = UploadCandidate::new("/tmp/thesis.pdf", "application/pdf", size);
            assert!(matches!(
                accept(&pdf, AcceptPolicy::Both, limit),
                Err(IntakeRejection::UnsupportedFileType { .. })
            ));
        }
    }

    #[test]
    fn docx_extension_without_word_mime_is_rejected() {
        let c = UploadCandidate::new("/tmp/thesis.docx", "application/octet-stream", 10);
        assert!(accept(&c, AcceptPolicy::Both, DEFAULT_MAX_UPLOAD_BYTES).is_err());
    }

    #[test]
    fn policy_restricts_kinds() {
        let limit = DEFAULT_MAX_UPLOAD_BYTES;
        assert!(matches!(
            accept(&tex("a.tex", 1), AcceptPolicy::WordOnly, limit),
            Err(IntakeRejection::UnsupportedFileType { .. })
        ));
        assert!(matches!(
            accept(&docx(1), AcceptPolicy::LatexOnly, limit),
            Err(IntakeRejection::UnsupportedFileType { .. })
        ));
    }

    #[tokio::test]
    async fn from_path_guesses_word_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("template.docx");
        std::fs::write(&path, b"PK\x03\x04").unwrap();

        let c = UploadCandidate::from_path(&path).await.unwrap();
        assert_eq!(c.mime_type, WORD_MIME);
        assert_eq!(c.size_bytes, 4);
        assert_eq!(c.kind(), Some(DocumentKind::Word));
    }

    #[tokio::test]
    async fn from_path_missing_file() {
        let err = UploadCandidate::from_path("/definitely/not/here.docx")
            .await
            .unwrap_err();
        assert!(matches!(err, ThesisCheckError::FileNotFound { .. }));
    }
}
