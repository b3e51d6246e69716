//! Status classification and structured API error decoding
//!
//! Error bodies come in two shapes (see [`ApiErrorBody`]). The shape is
//! chosen by probing the parsed JSON: an object with a `reply` object is the
//! nested shape, any other object is the flat shape. `err_extra` is probed the
//! same way: a string is a bare message, an array is a list of validation
//! failures.

use serde_json::{Map, Value};
use tracing::error;
use xdr_domain::constants::RETRYABLE_STATUSES;
use xdr_domain::{
    ApiErrorBody, ErrExtra, FlatError, ReplyError, ValidationFailure, XdrError,
};

/// Whether another attempt should be made for this HTTP status.
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUSES.contains(&status)
}

/// Whether the status is a success (2xx).
pub fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Turn a non-2xx response into the caller-visible error.
///
/// Decodable bodies produce `XdrError::Api`; anything else falls back to
/// `XdrError::ApiResponseParse` carrying the raw status and body.
pub fn classify_error_response(status: u16, body: Vec<u8>) -> XdrError {
    match parse_error_body(&body) {
        Ok(error) => XdrError::Api { status, error, body },
        Err(reason) => {
            error!(
                status,
                reason = %reason,
                body = %String::from_utf8_lossy(&body),
                "failed to decode API error response"
            );
            XdrError::ApiResponseParse { status, reason, body }
        }
    }
}

/// Decode an error body into its structured shape.
///
/// # Errors
/// Returns a description of the mismatch if the body is not JSON or does not
/// match either shape.
pub fn parse_error_body(body: &[u8]) -> Result<ApiErrorBody, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| format!("invalid JSON: {e}"))?;
    let Value::Object(mut object) = value else {
        return Err("error body is not a JSON object".to_string());
    };

    match object.remove("reply") {
        Some(Value::Object(reply)) => parse_reply(reply).map(ApiErrorBody::Reply),
        Some(Value::Null) | None => Ok(ApiErrorBody::Flat(parse_flat(&object)?)),
        Some(_) => Err("`reply` is not an object".to_string()),
    }
}

fn parse_reply(mut reply: Map<String, Value>) -> Result<ReplyError, String> {
    let err_code = match reply.remove("err_code") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => {
            Some(n.as_i64().ok_or_else(|| format!("`err_code` is not an integer: {n}"))?)
        }
        Some(other) => return Err(format!("`err_code` is not an integer: {other}")),
    };

    let err_msg = match reply.remove("err_msg") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => return Err(format!("`err_msg` is not a string: {other}")),
    };

    let err_extra = match reply.remove("err_extra") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(ErrExtra::Message(s)),
        Some(Value::Array(items)) => Some(ErrExtra::Validation(
            items
                .into_iter()
                .map(serde_json::from_value::<ValidationFailure>)
                .collect::<Result<_, _>>()
                .map_err(|e| format!("invalid validation failure in `err_extra`: {e}"))?,
        )),
        Some(other) => return Err(format!("unsupported `err_extra` shape: {other}")),
    };

    Ok(ReplyError { err_code, err_msg, err_extra })
}

fn parse_flat(object: &Map<String, Value>) -> Result<FlatError, String> {
    let error_code = match object.get("errorCode") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => return Err(format!("`errorCode` has unsupported type: {other}")),
    };

    let message = optional_string(object.get("message"), "message")?;
    let details_message = optional_string(
        object.get("details").and_then(|d| d.get("params")).and_then(|p| p.get("message")),
        "details.params.message",
    )?;

    Ok(FlatError { error_code, message, details_message })
}

fn optional_string(value: Option<&Value>, field: &str) -> Result<Option<String>, String> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(format!("`{field}` is not a string: {other}")),
    }
}
