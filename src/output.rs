//! Canonical result types shared by every report view.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// One formatting problem reported by the validation backend.
///
/// The front-end never constructs these from document content; it only
/// relays what the backend sent. Both backends name the excerpt field
/// `content`, so that spelling is accepted alongside `context`; when a
/// record carries both, a non-empty `context` wins.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "RawValidationError")]
pub struct ValidationError {
    /// Error-kind identifier, e.g. `FontSizeMismatch`.
    pub code: String,
    /// Human-readable description.
    pub message: String,
    /// Human-readable fix.
    pub suggestion: String,
    /// Excerpt of the offending content.
    pub context: String,
}

#[derive(Deserialize)]
struct RawValidationError {
    code: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    message: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    suggestion: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    context: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    content: String,
}

impl From<RawValidationError> for ValidationError {
    fn from(raw: RawValidationError) -> Self {
        let context = if raw.context.is_empty() {
            raw.content
        } else {
            raw.context
        };
        Self {
            code: raw.code,
            message: raw.message,
            suggestion: raw.suggestion,
            context,
        }
    }
}

// The Word backend serialises absent text as `null`.
fn null_as_empty<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Optional aggregate figures some backends attach to their statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Paragraphs (or source lines) the backend inspected.
    pub total_paragraphs: Option<u64>,
    /// Errors the backend counted; equals `errors.len()` when not supplied.
    pub total_errors: u64,
}

/// The normalised, shape-independent backend output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Errors in the order the backend reported them.
    pub errors: Vec<ValidationError>,
    /// Occurrences per error code, iterated in code order.
    pub error_type_counts: BTreeMap<String, u64>,
    pub summary: ValidationSummary,
}

impl ValidationResult {
    /// Build a result whose counts are derived from `errors`.
    pub fn from_errors(errors: Vec<ValidationError>) -> Self {
        let error_type_counts = count_by_code(&errors);
        let total_errors = errors.len() as u64;
        Self {
            errors,
            error_type_counts,
            summary: ValidationSummary {
                total_paragraphs: None,
                total_errors,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }
}

/// Group `errors` by `code` and count occurrences.
///
/// The counts always sum to `errors.len()`.
pub fn count_by_code(errors: &[ValidationError]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for e in errors {
        *counts.entry(e.code.clone()).or_insert(0) += 1;
    }
    counts
}
