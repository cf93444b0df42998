// topup-order-service/src/gateway/mod.rs

//! Boundary to the collaborator services: identity, catalog and payment.

pub mod http;
pub mod identity;
pub mod token_cache;

pub use http::HttpServiceGateway;
pub use identity::{CallerIdentity, UserTokenDecoder};
pub use token_cache::{Clock, ServiceTokenCache, SystemClock};

use crate::models::{CreatePaymentRequest, CreatedPayment, PaymentSnapshot, Product, User};
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
  #[error("Not found: {0}")]
  NotFound(String),

  /// The collaborator rejected the request as malformed.
  #[error("Invalid argument: {0}")]
  InvalidArgument(String),

  /// Transport failure, timeout, 5xx, service-auth failure or undecodable body.
  #[error("Service unavailable: {0}")]
  Unavailable(String),

  /// The payment provider processed a simulation but did not succeed it.
  #[error("Rejected: {0}")]
  Rejected(String),
}

#[async_trait]
pub trait ServiceGateway: Send + Sync {
  /// `Ok(None)` when the user service does not know `id`.
  async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, GatewayError>;

  async fn get_product_by_id(&self, id: i64) -> Result<Product, GatewayError>;

  /// Not idempotent; never retried.
  async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatedPayment, GatewayError>;

  async fn get_payment_by_id(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError>;

  /// Asks the payment provider's test mode to complete `payment`. Dev only.
  async fn simulate_payment(&self, payment: &PaymentSnapshot) -> Result<(), GatewayError>;
}
