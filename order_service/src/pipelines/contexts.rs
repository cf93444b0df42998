// topup-order-service/src/pipelines/contexts.rs

//! Data structs the order pipelines run over. Handlers receive them wrapped in
//! `topup_flow::ContextData`.

use crate::events::{EventPublisher, TOPIC_ORDER_FAILED, TOPIC_ORDER_SUCCEEDED};
use crate::fees::PaymentMethodDetails;
use crate::gateway::{CallerIdentity, ServiceGateway, UserTokenDecoder};
use crate::models::order::{STATUS_FAILED, STATUS_SUCCEEDED};
use crate::models::{CreateOrderRequest, CreatedPayment, Order, Product, User};
use crate::store::OrderStore;
use actix_web::web::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Collaborators shared by every pipeline run.
#[derive(Clone)]
pub struct OrderDeps {
  pub gateway: Arc<dyn ServiceGateway>,
  pub store: Arc<dyn OrderStore>,
  pub publisher: Arc<dyn EventPublisher>,
  pub user_tokens: Arc<UserTokenDecoder>,
  pub publish_timeout: Duration,
}

// --- Order creation ---

#[derive(Clone)]
pub struct CreateOrderCtxData {
  pub deps: OrderDeps,
  pub request: CreateOrderRequest,
  pub caller: CallerIdentity,
  pub order_id: Option<Uuid>,
  pub buyer: Option<User>,
  pub product: Option<Product>,
  pub fees: Option<PaymentMethodDetails>,
  pub payment: Option<CreatedPayment>,
  pub order: Option<Order>,
}

impl CreateOrderCtxData {
  pub fn new(deps: OrderDeps, request: CreateOrderRequest, caller: CallerIdentity) -> Self {
    Self {
      deps,
      request,
      caller,
      order_id: None,
      buyer: None,
      product: None,
      fees: None,
      payment: None,
      order: None,
    }
  }
}

// --- Webhook reconciliation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
  Succeeded,
  Failed,
}

impl TerminalStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      TerminalStatus::Succeeded => STATUS_SUCCEEDED,
      TerminalStatus::Failed => STATUS_FAILED,
    }
  }

  pub fn topic(&self) -> &'static str {
    match self {
      TerminalStatus::Succeeded => TOPIC_ORDER_SUCCEEDED,
      TerminalStatus::Failed => TOPIC_ORDER_FAILED,
    }
  }
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
  /// Lower-cased header name carrying the shared secret.
  pub header_name: String,
  pub token: String,
}

/// Provider callback body: `{"data": {...}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackEnvelope {
  pub data: PaymentCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentCallback {
  /// Payment request id assigned by the gateway.
  pub id: String,
  /// Order id echoed back by the gateway.
  #[serde(default)]
  pub reference_id: Option<String>,
  pub status: String,
  #[serde(default)]
  pub failure_code: Option<String>,
}

#[derive(Clone)]
pub struct WebhookCtxData {
  pub deps: OrderDeps,
  pub settings: Arc<WebhookSettings>,
  pub expected: TerminalStatus,
  pub presented_token: Option<String>,
  pub raw_payload: Bytes,
  pub callback: Option<PaymentCallback>,
  pub order: Option<Order>,
}

impl WebhookCtxData {
  pub fn new(
    deps: OrderDeps,
    settings: Arc<WebhookSettings>,
    expected: TerminalStatus,
    presented_token: Option<String>,
    raw_payload: Bytes,
  ) -> Self {
    Self {
      deps,
      settings,
      expected,
      presented_token,
      raw_payload,
      callback: None,
      order: None,
    }
  }
}
