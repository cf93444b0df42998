// topup-order-service/src/errors.rs

use crate::fees::FeeError;
use crate::gateway::GatewayError;
use crate::models::Envelope;
use crate::store::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use topup_flow::FlowError;

#[derive(Debug, Error)]
pub enum AppError {
  /// Field-level request validation failure; `errors` maps field name to messages.
  #[error("Validation Error: {message}")]
  Validation { message: String, errors: JsonValue },

  #[error("Invalid payment method: {0}")]
  InvalidChannelCode(String),

  #[error("Bad Request: {0}")]
  BadRequest(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  /// A collaborator rejected a request this service computed.
  #[error("Upstream rejected request: {0}")]
  UpstreamInvalidArgument(String),

  #[error("Upstream unavailable: {0}")]
  UpstreamUnavailable(String),

  #[error("Payment simulation rejected: {0}")]
  SimulationRejected(String),

  #[error("Persistence Error: {0}")]
  Persistence(#[from] StoreError),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Flow Error: {0}")]
  Flow(#[from] FlowError),

  #[error("Internal Server Error: {0}")]
  Internal(String),

  #[error("dev endpoint is unavailable")]
  DevOnlyUnavailable,
}

impl From<FeeError> for AppError {
  fn from(err: FeeError) -> Self {
    match err {
      FeeError::InvalidChannelCode(code) => AppError::InvalidChannelCode(code),
      // Price came from the catalog, not the client.
      other => AppError::Internal(other.to_string()),
    }
  }
}

impl From<GatewayError> for AppError {
  fn from(err: GatewayError) -> Self {
    match err {
      GatewayError::NotFound(m) => AppError::NotFound(m),
      GatewayError::InvalidArgument(m) => AppError::UpstreamInvalidArgument(m),
      GatewayError::Unavailable(m) => AppError::UpstreamUnavailable(m),
      GatewayError::Rejected(m) => AppError::SimulationRejected(m),
    }
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(errs: validator::ValidationErrors) -> Self {
    let mut fields = Map::new();
    for (field, field_errors) in errs.field_errors() {
      let messages: Vec<JsonValue> = field_errors
        .iter()
        .map(|e| match &e.message {
          Some(m) => JsonValue::String(m.to_string()),
          None => JsonValue::String(format!("failed '{}' check", e.code)),
        })
        .collect();
      fields.insert(field.to_string(), JsonValue::Array(messages));
    }
    AppError::Validation {
      message: "Invalid request".to_string(),
      errors: JsonValue::Object(fields),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<sqlx::Error>() {
      Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
      Err(other) => AppError::Internal(format!("{:#}", other)),
    }
  }
}

impl AppError {
  /// Message shown to the client. Internal details stay in the logs.
  fn public_message(&self) -> String {
    match self {
      AppError::Validation { message, .. } => message.clone(),
      AppError::InvalidChannelCode(_) => "Invalid payment method".to_string(),
      AppError::BadRequest(m)
      | AppError::Unauthorized(m)
      | AppError::NotFound(m)
      | AppError::UpstreamInvalidArgument(m)
      | AppError::SimulationRejected(m) => m.clone(),
      AppError::DevOnlyUnavailable => "dev endpoint is unavailable".to_string(),
      AppError::UpstreamUnavailable(_)
      | AppError::Persistence(_)
      | AppError::Sqlx(_)
      | AppError::Config(_)
      | AppError::Flow(_)
      | AppError::Internal(_) => "Internal Server Error".to_string(),
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation { .. }
      | AppError::InvalidChannelCode(_)
      | AppError::BadRequest(_)
      | AppError::UpstreamInvalidArgument(_) => StatusCode::BAD_REQUEST,
      AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::SimulationRejected(_) => StatusCode::EXPECTATION_FAILED,
      AppError::DevOnlyUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      AppError::UpstreamUnavailable(_)
      | AppError::Persistence(_)
      | AppError::Sqlx(_)
      | AppError::Config(_)
      | AppError::Flow(_)
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Rejecting request");
    }

    let body = match self {
      AppError::Validation { errors, .. } => Envelope::errors(self.public_message(), errors.clone()),
      _ => Envelope::message(self.public_message()),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_codes_follow_error_taxonomy() {
    assert_eq!(
      AppError::InvalidChannelCode("X".into()).status_code(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      AppError::from(GatewayError::NotFound("Product not found".into())).status_code(),
      StatusCode::NOT_FOUND
    );
    assert_eq!(
      AppError::from(GatewayError::InvalidArgument("bad amount".into())).status_code(),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      AppError::from(GatewayError::Unavailable("timeout".into())).status_code(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(AppError::DevOnlyUnavailable.status_code(), StatusCode::SERVICE_UNAVAILABLE);
  }

  #[test]
  fn internal_details_are_not_exposed() {
    let err = AppError::UpstreamUnavailable("connection refused to 10.0.0.7".into());
    assert_eq!(err.public_message(), "Internal Server Error");
  }

  #[test]
  fn non_channel_fee_errors_are_internal() {
    assert!(matches!(AppError::from(FeeError::NegativePrice(-5)), AppError::Internal(_)));
    assert!(matches!(
      AppError::from(FeeError::InvalidChannelCode("PAYPAL".into())),
      AppError::InvalidChannelCode(code) if code == "PAYPAL"
    ));
  }

  #[test]
  fn anyhow_errors_keep_database_cause() {
    let err = anyhow::Error::new(sqlx::Error::PoolTimedOut).context("connecting to the order database");
    assert!(matches!(AppError::from(err), AppError::Sqlx(sqlx::Error::PoolTimedOut)));

    let err = anyhow::anyhow!("disk full").context("running database migrations");
    assert!(matches!(
      AppError::from(err),
      AppError::Internal(m) if m == "running database migrations: disk full"
    ));
  }
}
