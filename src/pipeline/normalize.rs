//! Result model: turn whichever response shape the backend sent into a
//! [`ValidationResult`].
//!
//! Deployments disagree on the body layout. Some return the error list as
//! the top-level JSON value; others wrap it in an object next to a
//! statistics block:
//!
//! ```json
//! { "messages": [ { "code": "BoldError", ... } ],
//!   "stats": { "errorTypeCount": { "BoldError": 1 }, "totalParagraphs": 40, "totalErrors": 1 } }
//! ```
//!
//! [`RawValidationResponse`] names the two shapes; [`normalize`] matches on
//! the JSON value's shape first and only then deserialises the branch, so a
//! body that fits neither is reported with a useful detail instead of
//! serde's "did not match any variant".

use crate::error::ThesisCheckError;
use crate::output::{count_by_code, ValidationError, ValidationResult, ValidationSummary};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// The two response layouts the validation backends produce.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValidationResponse {
    /// The body is the error list itself.
    List(Vec<ValidationError>),
    /// The body bundles the error list with aggregate statistics.
    Bundle(RawBundle),
}

/// Object-shaped response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBundle {
    #[serde(alias = "errors")]
    pub messages: Vec<ValidationError>,
    #[serde(default)]
    pub stats: Option<RawStats>,
    /// Counts placed next to the list rather than inside `stats`.
    #[serde(default, alias = "errorTypeCount")]
    pub error_type_counts: Option<BTreeMap<String, u64>>,
}

/// Statistics block of a bundle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStats {
    #[serde(default, alias = "errorTypeCounts")]
    pub error_type_count: Option<BTreeMap<String, u64>>,
    #[serde(default)]
    pub total_paragraphs: Option<u64>,
    #[serde(default)]
    pub total_errors: Option<u64>,
}

/// Keys under which a bundle may carry its error list.
const LIST_KEYS: [&str; 2] = ["messages", "errors"];

impl RawValidationResponse {
    /// Classify a JSON body by shape.
    pub fn from_value(value: Value) -> Result<Self, ThesisCheckError> {
        let is_bundle = matches!(
            &value,
            Value::Object(map) if LIST_KEYS.iter().any(|k| map.contains_key(*k))
        );

        match value {
            Value::Array(_) => serde_json::from_value(value)
                .map(RawValidationResponse::List)
                .map_err(|e| malformed(format!("error list has an invalid entry: {e}"))),
            Value::Object(_) if is_bundle => serde_json::from_value(value)
                .map(RawValidationResponse::Bundle)
                .map_err(|e| malformed(format!("response object is invalid: {e}"))),
            Value::Object(map) => {
                let backend_error = map.get("error").and_then(Value::as_str);
                Err(malformed(match backend_error {
                    Some(msg) => format!("no error list in response; service said: {msg}"),
                    None => {
                        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                        format!("no 'messages' or 'errors' list in response (keys: {keys:?})")
                    }
                }))
            }
            other => Err(malformed(format!(
                "expected a list or an object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

/// Normalise a backend body into the canonical result.
pub fn normalize(raw: Value) -> Result<ValidationResult, ThesisCheckError> {
    let result = match RawValidationResponse::from_value(raw)? {
        RawValidationResponse::List(errors) => {
            debug!("Normalising bare list of {} errors", errors.len());
            ValidationResult::from_errors(errors)
        }
        RawValidationResponse::Bundle(bundle) => {
            debug!("Normalising bundle of {} errors", bundle.messages.len());
            from_bundle(bundle)
        }
    };
    Ok(result)
}

fn from_bundle(bundle: RawBundle) -> ValidationResult {
    let stats = bundle.stats.unwrap_or_default();
    let supplied = stats.error_type_count.or(bundle.error_type_counts);
    let errors = bundle.messages;

    // Supplied counts must agree with the list code for code.
    let derived = count_by_code(&errors);
    let error_type_counts = match supplied {
        Some(counts) if counts == derived => counts,
        Some(counts) => {
            warn!(
                "Backend counts {:?} disagree with the {} listed errors; recounting",
                counts,
                errors.len()
            );
            derived
        }
        None => derived,
    };

    let summary = ValidationSummary {
        total_paragraphs: stats.total_paragraphs,
        total_errors: stats.total_errors.unwrap_or(errors.len() as u64),
    };

    ValidationResult {
        errors,
        error_type_counts,
        summary,
    }
}

fn malformed(detail: String) -> ThesisCheckError {
    ThesisCheckError::MalformedResponse { detail }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
