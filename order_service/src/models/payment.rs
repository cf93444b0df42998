// topup-order-service/src/models/payment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const ACTION_REDIRECT_CUSTOMER: &str = "REDIRECT_CUSTOMER";

/// Body of `POST /api/payments` on the payment service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatePaymentRequest {
  pub reference_id: String,
  pub channel_code: String,
  pub amount: i64,
  pub buyer_email: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub buyer_mobile_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPayment {
  /// Payment request id assigned by the gateway; stored as the order's
  /// `payment_reference_id`.
  #[serde(rename = "xendit_payment_id")]
  pub external_payment_id: String,
  pub status: String,
  #[serde(default)]
  pub failure_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAction {
  #[serde(rename = "type")]
  pub action_type: String,
  #[serde(default)]
  pub descriptor: String,
  #[serde(default)]
  pub value: String,
}

/// Live payment state as reported by the payment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSnapshot {
  pub payment_request_id: String,
  pub request_amount: i64,
  #[serde(default)]
  pub channel_code: String,
  #[serde(default)]
  pub channel_properties: JsonValue,
  #[serde(default)]
  pub actions: Vec<PaymentAction>,
  pub status: String,
  #[serde(default)]
  pub failure_code: Option<String>,
  #[serde(default)]
  pub created: Option<DateTime<Utc>>,
  #[serde(default)]
  pub updated: Option<DateTime<Utc>>,
}
