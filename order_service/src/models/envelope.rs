// topup-order-service/src/models/envelope.rs
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// `{message, data, errors}`: the response shape shared by this service and
/// every collaborator it calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
  #[serde(default)]
  pub message: String,
  pub data: Option<T>,
  #[serde(default)]
  pub errors: Option<JsonValue>,
}

impl<T> Envelope<T> {
  pub fn data(message: impl Into<String>, data: T) -> Self {
    Self {
      message: message.into(),
      data: Some(data),
      errors: None,
    }
  }
}

impl Envelope<()> {
  pub fn message(message: impl Into<String>) -> Self {
    Self {
      message: message.into(),
      data: None,
      errors: None,
    }
  }

  pub fn errors(message: impl Into<String>, errors: JsonValue) -> Self {
    Self {
      message: message.into(),
      data: None,
      errors: Some(errors),
    }
  }
}
