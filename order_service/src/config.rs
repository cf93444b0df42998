// topup-order-service/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

const DEFAULT_WEBHOOK_TOKEN_HEADER: &str = "x-callback-token";
const DEFAULT_EWALLET_MOCK_CALLBACK_URL: &str =
  "https://ewallet-mock-connector.xendit.co/v1/ewallet_connector/payment_callbacks";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStoreKind {
  Postgres,
  Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub app_env: String,

  pub order_store: OrderStoreKind,
  pub database_url: Option<String>,

  pub user_service_url: String,
  pub product_service_url: String,
  pub payment_service_url: String,
  pub gateway_timeout: Duration,

  pub service_name: String,
  pub service_jwt_secret: String,
  pub user_jwt_secret: String,

  pub webhook_token_header: String,
  pub webhook_token: String,

  pub kafka_brokers: Option<String>,
  pub publish_timeout: Duration,

  pub xendit_api_url: String,
  pub xendit_api_key: String,
  pub ewallet_mock_callback_url: String,
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok();
    Self::from_lookup(|name| env::var(name).ok())
  }

  /// Builds the configuration from any key lookup; `from_env` passes the
  /// process environment.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let optional = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let required =
      |name: &str| optional(name).ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", name)));
    let millis = |name: &str, default: u64| -> Result<Duration> {
      match optional(name) {
        Some(raw) => raw
          .parse::<u64>()
          .map(Duration::from_millis)
          .map_err(|e| AppError::Config(format!("Invalid {}: {}", name, e))),
        None => Ok(Duration::from_millis(default)),
      }
    };

    let server_host = optional("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = optional("SERVER_PORT")
      .unwrap_or_else(|| "8080".to_string())
      .parse::<u16>()
      .map_err(|e| AppError::Config(format!("Invalid SERVER_PORT: {}", e)))?;
    let app_env = optional("APP_ENV").unwrap_or_else(|| "development".to_string());

    let order_store = match optional("ORDER_STORE").as_deref() {
      None | Some("postgres") => OrderStoreKind::Postgres,
      Some("memory") => OrderStoreKind::Memory,
      Some(other) => {
        return Err(AppError::Config(format!(
          "Invalid ORDER_STORE '{}', expected 'postgres' or 'memory'",
          other
        )))
      }
    };
    let database_url = match order_store {
      OrderStoreKind::Postgres => Some(required("DATABASE_URL")?),
      OrderStoreKind::Memory => optional("DATABASE_URL"),
    };

    let config = Self {
      server_host,
      server_port,
      app_env,
      order_store,
      database_url,
      user_service_url: trim_base_url(required("USER_SERVICE_URL")?),
      product_service_url: trim_base_url(required("PRODUCT_SERVICE_URL")?),
      payment_service_url: trim_base_url(required("PAYMENT_SERVICE_URL")?),
      gateway_timeout: millis("GATEWAY_TIMEOUT_MS", 10_000)?,
      service_name: optional("SERVICE_NAME").unwrap_or_else(|| "order_service".to_string()),
      service_jwt_secret: required("SERVICE_JWT_SECRET_KEY")?,
      user_jwt_secret: required("USER_JWT_SECRET_KEY")?,
      webhook_token_header: optional("WEBHOOK_TOKEN_HEADER")
        .unwrap_or_else(|| DEFAULT_WEBHOOK_TOKEN_HEADER.to_string())
        .to_ascii_lowercase(),
      webhook_token: required("WEBHOOK_TOKEN")?,
      kafka_brokers: optional("KAFKA_BROKERS"),
      publish_timeout: millis("PUBLISH_TIMEOUT_MS", 2_000)?,
      xendit_api_url: trim_base_url(optional("XENDIT_API_URL").unwrap_or_else(|| "https://api.xendit.co".to_string())),
      xendit_api_key: optional("XENDIT_API_KEY").unwrap_or_default(),
      ewallet_mock_callback_url: optional("EWALLET_MOCK_CALLBACK_URL")
        .unwrap_or_else(|| DEFAULT_EWALLET_MOCK_CALLBACK_URL.to_string()),
    };

    tracing::info!(
      app_env = %config.app_env,
      order_store = ?config.order_store,
      kafka = config.kafka_brokers.is_some(),
      "Application configuration loaded successfully."
    );
    Ok(config)
  }

  pub fn is_production(&self) -> bool {
    self.app_env.eq_ignore_ascii_case("production")
  }

  pub fn bind_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

fn trim_base_url(url: String) -> String {
  url.trim_end_matches('/').to_string()
}
