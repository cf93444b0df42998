// topup-order-service/src/state.rs

use crate::config::{AppConfig, OrderStoreKind};
use crate::errors::{AppError, Result as AppResult};
use crate::events::{EventPublisher, LogEventPublisher};
use crate::gateway::http::GatewayEndpoints;
use crate::gateway::{HttpServiceGateway, ServiceGateway, ServiceTokenCache, SystemClock, UserTokenDecoder};
use crate::pipelines::contexts::{OrderDeps, WebhookSettings};
use crate::services::{OrderOrchestrator, WebhookReconciler};
use crate::store::{InMemoryOrderStore, OrderStore, PgOrderStore};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>,
  pub orchestrator: Arc<OrderOrchestrator>,
  pub reconciler: Arc<WebhookReconciler>,
}

impl AppState {
  /// Wires the services around already-built collaborators.
  pub fn from_parts(config: Arc<AppConfig>, deps: OrderDeps) -> Self {
    let settings = WebhookSettings {
      header_name: config.webhook_token_header.clone(),
      token: config.webhook_token.clone(),
    };
    Self {
      orchestrator: Arc::new(OrderOrchestrator::new(deps.clone())),
      reconciler: Arc::new(WebhookReconciler::new(deps, settings)),
      config,
    }
  }

  /// Connects the configured store (running migrations for Postgres), the
  /// HTTP gateway and the event publisher. A connection failure surfaces as
  /// `AppError::Sqlx`; other store setup failures as `AppError::Internal`.
  pub async fn build(config: Arc<AppConfig>) -> AppResult<Self> {
    let store = build_store(&config).await.map_err(AppError::from)?;

    let tokens = Arc::new(ServiceTokenCache::new(
      config.service_name.clone(),
      &config.service_jwt_secret,
      Arc::new(SystemClock),
    ));
    let endpoints = GatewayEndpoints {
      user_service_url: config.user_service_url.clone(),
      product_service_url: config.product_service_url.clone(),
      payment_service_url: config.payment_service_url.clone(),
      xendit_api_url: config.xendit_api_url.clone(),
      xendit_api_key: config.xendit_api_key.clone(),
      ewallet_mock_callback_url: config.ewallet_mock_callback_url.clone(),
    };
    let gateway: Arc<dyn ServiceGateway> =
      Arc::new(HttpServiceGateway::new(endpoints, tokens, config.gateway_timeout)?);

    let deps = OrderDeps {
      gateway,
      store,
      publisher: build_publisher(&config)?,
      user_tokens: Arc::new(UserTokenDecoder::new(&config.user_jwt_secret)),
      publish_timeout: config.publish_timeout,
    };
    Ok(Self::from_parts(config, deps))
  }
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn OrderStore>> {
  match config.order_store {
    OrderStoreKind::Memory => {
      warn!("Using the in-memory order store; orders are lost on restart.");
      Ok(Arc::new(InMemoryOrderStore::new()))
    }
    OrderStoreKind::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for the postgres store")?;
      let pool = PgPool::connect(url)
        .await
        .context("connecting to the order database")?;
      info!("Successfully connected to the database.");

      let store = PgOrderStore::new(pool);
      store.migrate().await.context("running database migrations")?;
      info!("Database migrations applied.");
      Ok(Arc::new(store))
    }
  }
}

#[cfg(feature = "kafka")]
fn build_publisher(config: &AppConfig) -> AppResult<Arc<dyn EventPublisher>> {
  match config.kafka_brokers.as_deref() {
    Some(brokers) => {
      let publisher = crate::events::KafkaEventPublisher::new(brokers, config.publish_timeout)
        .map_err(|e| AppError::Config(format!("Kafka producer could not be created: {}", e)))?;
      info!(brokers, "Publishing order events to Kafka.");
      Ok(Arc::new(publisher))
    }
    None => {
      warn!("KAFKA_BROKERS not set; order events are only logged.");
      Ok(Arc::new(LogEventPublisher))
    }
  }
}

#[cfg(not(feature = "kafka"))]
fn build_publisher(config: &AppConfig) -> AppResult<Arc<dyn EventPublisher>> {
  if config.kafka_brokers.is_some() {
    warn!("KAFKA_BROKERS is set but the kafka feature is not compiled in; order events are only logged.");
  }
  Ok(Arc::new(LogEventPublisher))
}
