//! JSON encoder - wraps each payload as one JSON object per line

use serde::Serialize;

use crate::{EncodeError, Encoder};

#[derive(Serialize)]
struct Record<'a> {
    message: &'a str,
}

/// Encodes each event as a JSON object on its own line (JSON Lines).
///
/// The payload is exposed under the configured field name; bytes that are
/// not valid UTF-8 are replaced lossily.
#[derive(Debug, Clone)]
pub struct JsonEncoder {
    field: String,
}

impl JsonEncoder {
    /// Create a JSON encoder writing the payload under `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new("message")
    }
}

impl Encoder for JsonEncoder {
    fn name(&self) -> &'static str {
        "json"
    }

    fn validate(&self) -> Result<(), EncodeError> {
        if self.field.is_empty() {
            return Err(EncodeError::config("json encoder field name is empty"));
        }
        Ok(())
    }

    fn encode(&self, payload: &[u8]) -> Result<Vec<u8>, EncodeError> {
        let text = String::from_utf8_lossy(payload);
        let mut out = if self.field == "message" {
            serde_json::to_vec(&Record { message: &text })?
        } else {
            let mut map = serde_json::Map::with_capacity(1);
            map.insert(
                self.field.clone(),
                serde_json::Value::String(text.into_owned()),
            );
            serde_json::to_vec(&serde_json::Value::Object(map))?
        };
        out.push(b'\n');
        Ok(out)
    }
}
