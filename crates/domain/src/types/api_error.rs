//! Structured error bodies reported by the XDR API
//!
//! The server uses two shapes. Most endpoints nest the error under `reply`:
//!
//! ```json
//! {"reply": {"err_code": 500, "err_msg": "...", "err_extra": "..."}}
//! ```
//!
//! where `err_extra` is either a bare string or a list of validation failures.
//! Gateway-level errors use a flat shape with `errorCode`, `message` and
//! `details.params.message`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Decoded server-reported error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ApiErrorBody {
    /// Error nested under a `reply` object
    Reply(ReplyError),
    /// Flat gateway error
    Flat(FlatError),
}

impl ApiErrorBody {
    /// Numeric or textual error code, when the server sent one.
    pub fn code(&self) -> Option<String> {
        match self {
            Self::Reply(reply) => reply.err_code.map(|code| code.to_string()),
            Self::Flat(flat) => flat.error_code.clone(),
        }
    }

    /// Primary error message, when the server sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Reply(reply) => reply.err_msg.as_deref(),
            Self::Flat(flat) => flat.message.as_deref(),
        }
    }

    /// Human-readable summary including nested details.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        if let Some(code) = self.code() {
            out.push_str(&format!("[{code}] "));
        }
        out.push_str(self.message().unwrap_or("unknown error"));

        match self {
            Self::Reply(ReplyError { err_extra: Some(extra), .. }) => {
                out.push_str(": ");
                out.push_str(&extra.to_string());
            }
            Self::Flat(FlatError { details_message: Some(details), .. }) => {
                out.push_str(": ");
                out.push_str(details);
            }
            _ => {}
        }

        out
    }
}

impl fmt::Display for ApiErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Error nested under `reply`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyError {
    pub err_code: Option<i64>,
    pub err_msg: Option<String>,
    pub err_extra: Option<ErrExtra>,
}

/// Extra error details: a bare message or a list of validation failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrExtra {
    Message(String),
    Validation(Vec<ValidationFailure>),
}

impl fmt::Display for ErrExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => f.write_str(message),
            Self::Validation(failures) => {
                let rendered: Vec<String> = failures.iter().map(ToString::to_string).collect();
                f.write_str(&rendered.join("; "))
            }
        }
    }
}

/// A single request validation failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationFailure {
    #[serde(rename = "type")]
    pub kind: String,
    pub loc: Vec<Value>,
    pub msg: String,
    pub input: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctx: Option<ValidationContext>,
}

impl ValidationFailure {
    /// Dotted location path, e.g. `request_data.filters.0`.
    pub fn location(&self) -> String {
        self.loc
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.location(), self.kind, self.msg)?;
        if let Some(ctx) = &self.ctx {
            if let Some(expected) = &ctx.expected {
                write!(f, ", expected {expected}")?;
            }
            if let Some(min_length) = ctx.min_length {
                write!(f, ", min length {min_length}")?;
            }
        }
        Ok(())
    }
}

/// Constraint context attached to a validation failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationContext {
    pub expected: Option<String>,
    pub min_length: Option<u64>,
}

/// Flat gateway error
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatError {
    pub error_code: Option<String>,
    pub message: Option<String>,
    pub details_message: Option<String>,
}
