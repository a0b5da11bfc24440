pub mod portrait;
pub mod sanitizer;
pub mod trigger;

pub use portrait::Portrait;
pub use sanitizer::{display_text, sanitize_html, strip_html};
pub use tabletop_reactions_config::{ImagePosition, Percentage};
pub use trigger::Trigger;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Positional payload carried by the broadcast channel:
/// `(sender_name, portrait_ref, text, position?, size?)`.
pub type Payload = Vec<Value>;

/// Most fields a reaction payload carries.
pub const MAX_PAYLOAD_FIELDS: usize = 5;

/// One reaction broadcast to every client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionEvent {
    pub sender_name: String,
    pub portrait_ref: String,
    pub text: String,
    pub position: Option<ImagePosition>,
    pub size: Option<Percentage>,
}

/// Why an inbound payload was rejected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventError {
    #[error("malformed reaction: {0}")]
    Malformed(String),
}

impl EventError {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }
}

impl ReactionEvent {
    pub fn new(sender_name: impl Into<String>, portrait_ref: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_name: sender_name.into(),
            portrait_ref: portrait_ref.into(),
            text: text.into(),
            position: None,
            size: None,
        }
    }

    pub fn with_position(mut self, position: ImagePosition) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_size(mut self, size: Percentage) -> Self {
        self.size = Some(size);
        self
    }

    /// Encode as positional fields, dropping absent trailing ones.
    pub fn to_payload(&self) -> Payload {
        let mut payload = vec![
            Value::String(self.sender_name.clone()),
            Value::String(self.portrait_ref.clone()),
            Value::String(self.text.clone()),
        ];

        match (&self.position, &self.size) {
            (None, None) => {}
            (position, size) => {
                payload.push(serde_json::to_value(position).unwrap_or(Value::Null));
                if let Some(size) = size {
                    payload.push(serde_json::to_value(size).unwrap_or(Value::Null));
                }
            }
        }

        payload
    }

    /// Decode a positional payload of 2 to 5 fields.
    ///
    /// Two fields are the oldest `(sender_name, text)` form. From three fields
    /// on the order is fixed; missing trailing fields, `null`s and unparsable
    /// optional fields all read as absent.
    pub fn from_payload(payload: &[Value]) -> Result<Self, EventError> {
        let (name, portrait, text, rest) = match payload {
            [name, text] => (name, None, text, &[][..]),
            [name, portrait, text, rest @ ..] if rest.len() <= 2 => (name, Some(portrait), text, rest),
            [] | [_] => {
                return Err(EventError::malformed(format!(
                    "expected at least 2 fields, got {}",
                    payload.len()
                )));
            }
            _ => {
                return Err(EventError::malformed(format!(
                    "expected at most {MAX_PAYLOAD_FIELDS} fields, got {}",
                    payload.len()
                )));
            }
        };

        let sender_name = required_text(name, "sender name")?;
        let text = required_text(text, "text")?;
        let portrait_ref = match portrait {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => {
                return Err(EventError::malformed(format!("portrait is not a string: {other}")));
            }
        };

        let position = rest.first().and_then(|v| optional::<ImagePosition>(v, "position"));
        let size = rest.get(1).and_then(|v| optional::<Percentage>(v, "size"));

        Ok(Self {
            sender_name,
            portrait_ref,
            text,
            position,
            size,
        })
    }
}

fn required_text(value: &Value, field: &str) -> Result<String, EventError> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Ok(s.clone()),
        Value::String(_) => Err(EventError::malformed(format!("{field} is empty"))),
        other => Err(EventError::malformed(format!("{field} is not a string: {other}"))),
    }
}

fn optional<T: serde::de::DeserializeOwned>(value: &Value, field: &str) -> Option<T> {
    if value.is_null() {
        return None;
    }
    match T::deserialize(value) {
        Ok(v) => Some(v),
        Err(err) => {
            tracing::debug!("ignoring unreadable {field} {value}: {err}");
            None
        }
    }
}
