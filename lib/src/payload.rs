// lib/src/payload.rs

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{AccessError, AccessResult};

/// A request body as it arrived. Raw bodies are decoded only after the
/// operation's access checks pass.
#[derive(Debug, Clone)]
pub enum Payload<T> {
    Decoded(T),
    /// JSON text, or `Value::Null` when no body was sent.
    Raw(Value),
    /// A body that is not JSON at all.
    Malformed(String),
}

impl<T> From<T> for Payload<T> {
    fn from(value: T) -> Self {
        Payload::Decoded(value)
    }
}

impl<T: DeserializeOwned> Payload<T> {
    /// Reads raw body bytes. An empty body reads as `Raw(Value::Null)`.
    pub fn from_slice(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Payload::Raw(Value::Null);
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Payload::Raw(value),
            Err(e) => Payload::Malformed(e.to_string()),
        }
    }

    /// Decodes the payload. A missing body decodes as an empty object.
    pub fn decode(self) -> AccessResult<T> {
        let value = match self {
            Payload::Decoded(value) => return Ok(value),
            Payload::Malformed(reason) => {
                return Err(AccessError::InvalidPayload(format!("Request body is not valid JSON: {}", reason)));
            }
            Payload::Raw(Value::Null) => Value::Object(Map::new()),
            Payload::Raw(value) => value,
        };
        serde_json::from_value(value)
            .map_err(|e| AccessError::InvalidPayload(format!("Invalid request body: {}", e)))
    }
}
