//! Picogen error types

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// All possible errors from the Picogen client
#[derive(Error, Debug)]
pub enum PicogenError {
    /// Configuration rejected when building the client
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The API answered with a non-2xx status
    #[error("API error ({status}): {payload}")]
    Http { status: u16, payload: ErrorPayload },

    /// Network error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API returned an array without a usable record
    #[error("Empty response from {endpoint}")]
    EmptyResponse { endpoint: String },

    /// Polling used every attempt without the job producing a result
    #[error("Failed to get job {job_id} after {attempts} attempts")]
    Exhausted { job_id: String, attempts: u32 },

    /// Polling stopped early on a failure that retrying would not fix
    #[error("Failed to get job {job_id}: {source}")]
    Aborted {
        job_id: String,
        #[source]
        source: Box<PicogenError>,
    },
}

impl PicogenError {
    /// Returns true if the poll loop retries this error
    pub fn is_retryable(&self) -> bool {
        matches!(self, PicogenError::Http { .. })
    }

    /// Returns the HTTP status if the server rejected the request
    pub fn status(&self) -> Option<u16> {
        match self {
            PicogenError::Http { status, .. } => Some(*status),
            PicogenError::Aborted { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Returns the server-provided error body, if any
    pub fn payload(&self) -> Option<&ErrorPayload> {
        match self {
            PicogenError::Http { payload, .. } => Some(payload),
            _ => None,
        }
    }
}

/// Error body returned by the Picogen API.
///
/// The body is kept as raw JSON. A body that is not valid JSON is stored as
/// a top-level string. `Display` renders it as a dict literal, e.g.
/// `{'error': 'bad prompt'}`, which is the form users see in tool output.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPayload(pub Value);

impl ErrorPayload {
    /// Parse a response body, falling back to the raw text
    pub fn from_body(body: &str) -> Self {
        match serde_json::from_str(body) {
            Ok(value) => Self(value),
            Err(_) => Self(Value::String(body.to_string())),
        }
    }

    /// The raw JSON body
    pub fn value(&self) -> &Value {
        &self.0
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(text) => f.write_str(text),
            other => write_literal(f, other),
        }
    }
}

fn write_literal(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match value {
        Value::Null => f.write_str("None"),
        Value::Bool(true) => f.write_str("True"),
        Value::Bool(false) => f.write_str("False"),
        Value::Number(n) => write!(f, "{}", n),
        Value::String(s) => write_quoted(f, s),
        Value::Array(items) => {
            f.write_str("[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_literal(f, item)?;
            }
            f.write_str("]")
        }
        Value::Object(map) => {
            f.write_str("{")?;
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_quoted(f, key)?;
                f.write_str(": ")?;
                write_literal(f, item)?;
            }
            f.write_str("}")
        }
    }
}

// Single quotes unless the text holds a single quote and no double quote.
fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    write!(f, "{}", quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}

/// Result type for Picogen operations
pub type Result<T> = std::result::Result<T, PicogenError>;
