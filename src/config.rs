//! Configuration types for upload, validation and report rendering.
//!
//! All pipeline behaviour is controlled through [`ValidatorConfig`], built via
//! its [`ValidatorConfigBuilder`]. Rendering knobs live in the nested
//! [`ReportConfig`] so the views can be handed their settings without the
//! transport ones.

use crate::error::ThesisCheckError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Upload limit used by the intake gate unless overridden: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

/// Multipart field name both validation backends read the file from.
pub const DEFAULT_FIELD_NAME: &str = "file";

pub const DEFAULT_WORD_ENDPOINT: &str = "http://localhost:8080/api/validate/docx";
pub const DEFAULT_LATEX_ENDPOINT: &str = "http://localhost:5000/api/validate/latex";

/// Page sizes the table view can be switched between.
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [5, 10, 20, 50];

/// Configuration for one validation session.
///
/// # Example
/// ```rust
/// use thesis_check::{EndpointMap, ValidatorConfig};
///
/// let config = ValidatorConfig::builder()
///     .endpoints(EndpointMap::single("http://localhost:8080/api/validate"))
///     .upload_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
/// ```
#[derive(Clone)]
pub struct ValidatorConfig {
    /// Where uploads are sent. Default: routed Word/LaTeX endpoints.
    pub endpoints: EndpointMap,

    /// Which document kinds this deployment accepts. Default: both.
    pub accept: AcceptPolicy,

    /// Strict upper bound on candidate size in bytes. Default: 5 MiB.
    ///
    /// A candidate of exactly this size is rejected.
    pub max_upload_bytes: u64,

    /// Multipart field name carrying the file. Default: `file`.
    pub field_name: String,

    /// Whole-request timeout for the upload in seconds. Default: 120.
    pub upload_timeout_secs: u64,

    /// Optional upload progress observer.
    pub progress_callback: Option<ProgressCallback>,

    /// Table, chart and PDF settings.
    pub report: ReportConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            endpoints: EndpointMap::default(),
            accept: AcceptPolicy::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            field_name: DEFAULT_FIELD_NAME.to_string(),
            upload_timeout_secs: 120,
            progress_callback: None,
            report: ReportConfig::default(),
        }
    }
}

impl fmt::Debug for ValidatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorConfig")
            .field("endpoints", &self.endpoints)
            .field("accept", &self.accept)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("field_name", &self.field_name)
            .field("upload_timeout_secs", &self.upload_timeout_secs)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn UploadProgressCallback>"),
            )
            .field("report", &self.report)
            .finish()
    }
}

impl ValidatorConfig {
    /// Create a new builder for `ValidatorConfig`.
    pub fn builder() -> ValidatorConfigBuilder {
        ValidatorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ValidatorConfig`].
#[derive(Debug)]
pub struct ValidatorConfigBuilder {
    config: ValidatorConfig,
}

impl ValidatorConfigBuilder {
    pub fn endpoints(mut self, endpoints: EndpointMap) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    pub fn accept(mut self, policy: AcceptPolicy) -> Self {
        self.config.accept = policy;
        self
    }

    pub fn max_upload_bytes(mut self, bytes: u64) -> Self {
        self.config.max_upload_bytes = bytes;
        self
    }

    pub fn field_name(mut self, name: impl Into<String>) -> Self {
        self.config.field_name = name.into();
        self
    }

    pub fn upload_timeout_secs(mut self, secs: u64) -> Self {
        self.config.upload_timeout_secs = secs.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn report(mut self, report: ReportConfig) -> Self {
        self.config.report = report;
        self
    }

    pub fn report_title(mut self, title: impl Into<String>) -> Self {
        self.config.report.title = title.into();
        self
    }

    pub fn report_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report.font_path = Some(path.into());
        self
    }

    pub fn report_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.report.filename = path.into();
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.config.report.page_size = size;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ValidatorConfig, ThesisCheckError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(ThesisCheckError::InvalidConfig(
                "max upload size must be > 0 bytes".into(),
            ));
        }
        if c.field_name.trim().is_empty() {
            return Err(ThesisCheckError::InvalidConfig(
                "multipart field name must not be empty".into(),
            ));
        }
        c.endpoints.validate()?;
        if !PAGE_SIZE_OPTIONS.contains(&c.report.page_size) {
            return Err(ThesisCheckError::InvalidConfig(format!(
                "page size must be one of {:?}, got {}",
                PAGE_SIZE_OPTIONS, c.report.page_size
            )));
        }
        if c.report.font_size <= 0.0 {
            return Err(ThesisCheckError::InvalidConfig(format!(
                "report font size must be positive, got {}",
                c.report.font_size
            )));
        }
        Ok(self.config)
    }
}

// ── Report settings ──────────────────────────────────────────────────────

/// Settings shared by the table, chart and PDF views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Title line at the top of the PDF report.
    pub title: String,

    /// File name the PDF is saved under. Default: `validation_report.pdf`.
    pub filename: PathBuf,

    /// TrueType font embedded in the PDF.
    ///
    /// Must cover every character the report contains (Cyrillic labels at
    /// minimum). When `None`, [`crate::report::pdf::discover_font`] looks in
    /// the usual system font directories.
    pub font_path: Option<PathBuf>,

    /// Body font size in points. Title uses `font_size + 2`. Default: 10.
    pub font_size: f32,

    /// Characters of context shown in the terminal table before the ellipsis.
    pub context_display_width: usize,

    /// Rows per table page; one of [`PAGE_SIZE_OPTIONS`]. Default: 5.
    pub page_size: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Отчет о проверке шаблона ВКР".to_string(),
            filename: PathBuf::from("validation_report.pdf"),
            font_path: None,
            font_size: 10.0,
            context_display_width: 40,
            page_size: PAGE_SIZE_OPTIONS[0],
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// The two document kinds the validation backends understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Office Open XML word-processing document (`.docx`).
    Word,
    /// LaTeX source (`.tex`).
    Latex,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Word => f.write_str("Word"),
            DocumentKind::Latex => f.write_str("LaTeX"),
        }
    }
}

/// Which document kinds a deployment accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AcceptPolicy {
    WordOnly,
    LatexOnly,
    /// Accept both kinds (default).
    #[default]
    Both,
}

impl AcceptPolicy {
    pub fn allows(&self, kind: DocumentKind) -> bool {
        match self {
            AcceptPolicy::WordOnly => kind == DocumentKind::Word,
            AcceptPolicy::LatexOnly => kind == DocumentKind::Latex,
            AcceptPolicy::Both => true,
        }
    }

    /// Human-readable list of accepted files, used in rejection messages.
    pub fn describe(&self) -> &'static str {
        match self {
            AcceptPolicy::WordOnly => ".docx",
            AcceptPolicy::LatexOnly => ".tex",
            AcceptPolicy::Both => ".docx or .tex",
        }
    }
}

/// Where uploads go.
///
/// Deployments either expose one generic validation endpoint or one endpoint
/// per document kind; a config picks exactly one of the two layouts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointMap {
    /// Every kind goes to the same URL.
    Single(String),
    /// Word and LaTeX are handled by different services.
    Routed { word: String, latex: String },
}

impl Default for EndpointMap {
    fn default() -> Self {
        EndpointMap::Routed {
            word: DEFAULT_WORD_ENDPOINT.to_string(),
            latex: DEFAULT_LATEX_ENDPOINT.to_string(),
        }
    }
}

impl EndpointMap {
    pub fn single(url: impl Into<String>) -> Self {
        EndpointMap::Single(url.into())
    }

    pub fn routed(word: impl Into<String>, latex: impl Into<String>) -> Self {
        EndpointMap::Routed {
            word: word.into(),
            latex: latex.into(),
        }
    }

    /// URL an upload of `kind` is posted to.
    pub fn url_for(&self, kind: DocumentKind) -> &str {
        match self {
            EndpointMap::Single(url) => url.as_str(),
            EndpointMap::Routed { word, .. } if kind == DocumentKind::Word => word.as_str(),
            EndpointMap::Routed { latex, .. } => latex.as_str(),
        }
    }

    fn validate(&self) -> Result<(), ThesisCheckError> {
        let urls: Vec<&str> = match self {
            EndpointMap::Single(url) => vec![url.as_str()],
            EndpointMap::Routed { word, latex } => vec![word.as_str(), latex.as_str()],
        };
        for url in urls {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ThesisCheckError::InvalidConfig(format!(
                    "endpoint must be an HTTP/HTTPS URL, got '{url}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let config = ValidatorConfig::builder().build().unwrap();
        assert_eq!(config.max_upload_bytes, 5_242_880);
        assert_eq!(config.field_name, "file");
        assert_eq!(config.report.page_size, 5);
        assert_eq!(
            config.report.filename,
            PathBuf::from("validation_report.pdf")
        );
    }

    #[test]
    fn routed_endpoints_pick_by_kind() {
        let map = EndpointMap::routed("http://w/api", "http://l/api");
        assert_eq!(map.url_for(DocumentKind::Word), "http://w/api");
        assert_eq!(map.url_for(DocumentKind::Latex), "http://l/api");
    }

    #[test]
    fn single_endpoint_ignores_kind() {
        let map = EndpointMap::single("http://x/api/validate");
        assert_eq!(map.url_for(DocumentKind::Word), "http://x/api/validate");
        assert_eq!(map.url_for(DocumentKind::Latex), "http://x/api/validate");
    }

    #[test]
    fn rejects_non_http_endpoint() {
        let err = ValidatorConfig::builder()
            .endpoints(EndpointMap::single("ftp://example.com"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp://example.com"));
    }

    #[test]
    fn rejects_unknown_page_size() {
        assert!(ValidatorConfig::builder().page_size(7).build().is_err());
        for size in PAGE_SIZE_OPTIONS {
            assert!(ValidatorConfig::builder().page_size(size).build().is_ok());
        }
    }

    #[test]
    fn rejects_zero_upload_limit() {
        assert!(ValidatorConfig::builder()
            .max_upload_bytes(0)
            .build()
            .is_err());
    }

    #[test]
    fn accept_policy_allows() {
        assert!(AcceptPolicy::Both.allows(DocumentKind::Latex));
        assert!(AcceptPolicy::WordOnly.allows(DocumentKind::Word));
        assert!(!AcceptPolicy::WordOnly.allows(DocumentKind::Latex));
        assert!(!AcceptPolicy::LatexOnly.allows(DocumentKind::Word));
    }
}
