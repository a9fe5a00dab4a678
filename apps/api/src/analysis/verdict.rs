//! Verdict types and the parse-and-normalize step for reasoning-service output.
//!
//! The service is an untrusted producer. Its text goes through
//! [`parse_verdict`] before anything downstream sees it: contact fields and
//! lists are coerced leniently, the score is clamped into 0..=100, and a body
//! that cannot yield a score at all becomes a `MalformedResponse`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::{strip_json_fences, LlmError};

/// Default score at or above which a candidate is accepted.
pub const DEFAULT_ACCEPT_THRESHOLD: u8 = 70;

/// Placeholder strings the model uses when it could not find a value.
const UNKNOWN_MARKERS: [&str; 5] = ["unknown", "n/a", "na", "null", "none"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Accepted,
    Rejected,
}

impl Status {
    pub fn from_score(match_score: u8, accept_threshold: u8) -> Self {
        if match_score >= accept_threshold {
            Status::Accepted
        } else {
            Status::Rejected
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Accepted => "Accepted",
            Status::Rejected => "Rejected",
        }
    }
}

/// Validated result of one resume-vs-job comparison.
/// `None` in a contact field means the value is unknown.
///
/// Serialize-only: every inbound verdict is built by [`verdict_from_value`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub candidate_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub experience: Option<String>,
    pub match_score: u8,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub suggestions: Vec<String>,
    pub status: Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    UnreadableDocument,
    ServiceError,
    MalformedResponse,
    InternalError,
    Cancelled,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::UnreadableDocument => "UnreadableDocument",
            ErrorKind::ServiceError => "ServiceError",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::InternalError => "InternalError",
            ErrorKind::Cancelled => "Cancelled",
        };
        f.write_str(name)
    }
}

/// Typed failure substituted for a `Verdict`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{kind}: {detail}")]
pub struct ErrorVerdict {
    pub kind: ErrorKind,
    pub detail: String,
}

impl ErrorVerdict {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn unreadable(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnreadableDocument, detail)
    }

    pub fn service(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceError, detail)
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedResponse, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InternalError, detail)
    }

    pub fn cancelled(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, detail)
    }
}

impl From<LlmError> for ErrorVerdict {
    fn from(err: LlmError) -> Self {
        if err.is_malformed_response() {
            ErrorVerdict::malformed(err.to_string())
        } else {
            ErrorVerdict::service(err.to_string())
        }
    }
}

/// Parses raw service text into a `Verdict`, deriving `status` from the
/// clamped score.
pub fn parse_verdict(raw: &str, accept_threshold: u8) -> Result<Verdict, ErrorVerdict> {
    let value: Value = serde_json::from_str(strip_json_fences(raw))
        .map_err(|e| ErrorVerdict::malformed(format!("response is not valid JSON: {e}")))?;
    verdict_from_value(value, accept_threshold)
}

/// Normalizes an already-decoded JSON value into a `Verdict`. Any `status`
/// in the input is ignored and re-derived from the clamped score.
pub fn verdict_from_value(value: Value, accept_threshold: u8) -> Result<Verdict, ErrorVerdict> {
    // Some models wrap the object in a one-element array.
    let value = match value {
        Value::Array(items) if items.len() == 1 => {
            items.into_iter().next().unwrap_or(Value::Null)
        }
        other => other,
    };

    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ErrorVerdict::malformed(format!(
                "expected a JSON object, got {}",
                json_type(&other)
            )))
        }
    };

    let match_score = fields
        .get("match_score")
        .ok_or_else(|| ErrorVerdict::malformed("response has no match_score"))
        .and_then(coerce_score)?;

    Ok(Verdict {
        candidate_name: text_field(&fields, "candidate_name"),
        email: text_field(&fields, "email"),
        phone: text_field(&fields, "phone"),
        experience: text_field(&fields, "experience"),
        match_score,
        matched_skills: string_list(&fields, "matched_skills"),
        missing_skills: string_list(&fields, "missing_skills"),
        suggestions: string_list(&fields, "suggestions"),
        status: Status::from_score(match_score, accept_threshold),
    })
}

/// Accepts integers, floats and numeric strings ("95", "87%"); clamps into
/// 0..=100 and truncates toward zero.
fn coerce_score(value: &Value) -> Result<u8, ErrorVerdict> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .and_then(clamp_score)
        .ok_or_else(|| ErrorVerdict::malformed(format!("match_score is not a number: {value}")))
}

pub fn clamp_score(score: f64) -> Option<u8> {
    if !score.is_finite() {
        return None;
    }
    Some(score.clamp(0.0, 100.0).trunc() as u8)
}

fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let text = match fields.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };

    let is_placeholder = UNKNOWN_MARKERS
        .iter()
        .any(|marker| text.eq_ignore_ascii_case(marker));

    if text.is_empty() || is_placeholder {
        None
    } else {
        Some(text)
    }
}

fn string_list(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    let items = match fields.get(key) {
        Some(Value::Array(items)) => items.as_slice(),
        Some(single @ Value::String(_)) => std::slice::from_ref(single),
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
