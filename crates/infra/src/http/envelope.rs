//! JSON envelope wrapping and unwrapping
//!
//! Outbound payloads are nested under the request wrapper keys
//! (`{"request_data": {...}}`); inbound bodies are unwrapped by descending
//! through the response wrapper keys (`{"reply": {...}}`). Both key lists are
//! ordered outermost first. With no keys the codec is plain JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use xdr_domain::{Result, XdrError};

/// Serialize `input`, nested under `keys`.
///
/// # Errors
/// Returns `XdrError::Serialization` if `input` cannot be serialized.
pub fn wrap<I>(input: &I, keys: &[String]) -> Result<Vec<u8>>
where
    I: Serialize + ?Sized,
{
    if keys.is_empty() {
        return serde_json::to_vec(input).map_err(|source| XdrError::Serialization { source });
    }

    let mut value =
        serde_json::to_value(input).map_err(|source| XdrError::Serialization { source })?;
    for key in keys.iter().rev() {
        let mut object = Map::with_capacity(1);
        object.insert(key.clone(), value);
        value = Value::Object(object);
    }

    serde_json::to_vec(&value).map_err(|source| XdrError::Serialization { source })
}

/// Deserialize `body` after descending through `keys`.
///
/// # Errors
/// - `XdrError::WrapperKeyNotFound` if a level lacks the next key
/// - `XdrError::Deserialization` if the body or final fragment does not
///   decode
pub fn unwrap<O>(body: &[u8], keys: &[String]) -> Result<O>
where
    O: DeserializeOwned,
{
    if keys.is_empty() {
        return serde_json::from_slice(body).map_err(|source| XdrError::Deserialization { source });
    }

    let mut current: Value =
        serde_json::from_slice(body).map_err(|source| XdrError::Deserialization { source })?;
    for key in keys {
        current = match current {
            Value::Object(mut object) => object
                .remove(key)
                .ok_or_else(|| XdrError::WrapperKeyNotFound { key: key.clone() })?,
            _ => return Err(XdrError::WrapperKeyNotFound { key: key.clone() }),
        };
    }

    serde_json::from_value(current).map_err(|source| XdrError::Deserialization { source })
}
