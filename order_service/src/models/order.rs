// topup-order-service/src/models/order.rs

use crate::models::payment::PaymentSnapshot;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

pub const STATUS_SUCCEEDED: &str = "SUCCEEDED";
pub const STATUS_FAILED: &str = "FAILED";

/// Body of `POST /api/orders`. Missing fields deserialize to empty values so
/// they are reported through validation like any other bad field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
pub struct CreateOrderRequest {
  #[serde(default)]
  #[validate(length(min = 1, message = "destination is required"))]
  pub destination: String,
  #[serde(default)]
  pub server_id: Option<String>,
  #[serde(default)]
  #[validate(range(min = 1, message = "product_id must be a positive integer"))]
  pub product_id: i64,
  #[serde(default)]
  #[validate(length(min = 1, message = "payment_method is required"))]
  pub payment_method: String,
  #[serde(default)]
  #[validate(email(message = "buyer_email must be a valid email address"))]
  pub buyer_email: String,
}

/// A persisted order. Catalog and fee fields are a snapshot taken at creation
/// and never recomputed; only `status`, `failure_code` and `updated_at` change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub payment_reference_id: String,
  pub buyer_id: Option<i64>,
  pub buyer_email: String,
  pub buyer_phone: Option<String>,
  pub product_id: i64,
  pub product_name: String,
  pub destination: String,
  pub server_id: Option<String>,
  pub channel_code: String,
  pub total_product_amount: i64,
  pub service_charge: i64,
  pub total_amount: i64,
  pub status: String,
  pub failure_code: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Everything needed to insert an order; timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
  pub id: Uuid,
  pub payment_reference_id: String,
  pub buyer_id: Option<i64>,
  pub buyer_email: String,
  pub buyer_phone: Option<String>,
  pub product_id: i64,
  pub product_name: String,
  pub destination: String,
  pub server_id: Option<String>,
  pub channel_code: String,
  pub total_product_amount: i64,
  pub service_charge: i64,
  pub total_amount: i64,
  pub status: String,
  pub failure_code: Option<String>,
}

impl NewOrder {
  pub fn into_order(self, now: DateTime<Utc>) -> Order {
    Order {
      id: self.id,
      payment_reference_id: self.payment_reference_id,
      buyer_id: self.buyer_id,
      buyer_email: self.buyer_email,
      buyer_phone: self.buyer_phone,
      product_id: self.product_id,
      product_name: self.product_name,
      destination: self.destination,
      server_id: self.server_id,
      channel_code: self.channel_code,
      total_product_amount: self.total_product_amount,
      service_charge: self.service_charge,
      total_amount: self.total_amount,
      status: self.status,
      failure_code: self.failure_code,
      created_at: now,
      updated_at: now,
    }
  }
}

/// Order read back together with the live payment state from the gateway.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithPayment {
  #[serde(flatten)]
  pub order: Order,
  pub payment_details: PaymentSnapshot,
}

/// Payload of the `new_order`, `order_succeeded` and `order_failed` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderMessage {
  pub id: Uuid,
  pub status: String,
  pub failure_code: Option<String>,
  pub product_id: i64,
  pub product_name: String,
  pub product_price: i64,
  pub destination: String,
  pub server_id: Option<String>,
  pub channel_code: String,
  pub buyer_email: String,
  pub service_charge: i64,
  pub total_product_amount: i64,
  pub total_amount: i64,
  pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderMessage {
  fn from(order: &Order) -> Self {
    Self {
      id: order.id,
      status: order.status.clone(),
      failure_code: order.failure_code.clone(),
      product_id: order.product_id,
      product_name: order.product_name.clone(),
      product_price: order.total_product_amount,
      destination: order.destination.clone(),
      server_id: order.server_id.clone(),
      channel_code: order.channel_code.clone(),
      buyer_email: order.buyer_email.clone(),
      service_charge: order.service_charge,
      total_product_amount: order.total_product_amount,
      total_amount: order.total_amount,
      created_at: order.created_at,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_fields_surface_as_field_errors() {
    let request: CreateOrderRequest = serde_json::from_str(r#"{"buyer_email": "not-an-email"}"#).unwrap();
    let errors = request.validate().unwrap_err();
    let fields = errors.field_errors();
    for field in ["destination", "product_id", "payment_method", "buyer_email"] {
      assert!(fields.contains_key(field), "expected error for {}", field);
    }
    assert!(!fields.contains_key("server_id"));
  }

  #[test]
  fn well_formed_request_passes() {
    let request = CreateOrderRequest {
      destination: "123456".to_string(),
      server_id: None,
      product_id: 3,
      payment_method: "QRIS".to_string(),
      buyer_email: "buyer@example.com".to_string(),
    };
    assert!(request.validate().is_ok());
  }
}
