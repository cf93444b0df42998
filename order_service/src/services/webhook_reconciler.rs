// topup-order-service/src/services/webhook_reconciler.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::Order;
use crate::pipelines::build_webhook_pipeline;
use crate::pipelines::contexts::{OrderDeps, TerminalStatus, WebhookCtxData, WebhookSettings};
use actix_web::web::Bytes;
use std::sync::Arc;
use topup_flow::{ContextData, Pipeline, PipelineResult};
use tracing::{error, instrument};

#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
  /// The order now carries the terminal status.
  Applied(Order),
  /// Authenticated callback whose status does not belong to this endpoint.
  Ignored,
}

pub struct WebhookReconciler {
  deps: OrderDeps,
  settings: Arc<WebhookSettings>,
  pipeline: Pipeline<WebhookCtxData, AppError>,
}

impl WebhookReconciler {
  pub fn new(deps: OrderDeps, settings: WebhookSettings) -> Self {
    Self {
      deps,
      settings: Arc::new(settings),
      pipeline: build_webhook_pipeline(),
    }
  }

  /// Header the shared secret is read from.
  pub fn header_name(&self) -> &str {
    &self.settings.header_name
  }

  #[instrument(
    name = "reconciler::reconcile",
    skip(self, presented_token, raw_payload),
    fields(expected = expected.as_str(), payload_len = raw_payload.len())
  )]
  pub async fn reconcile(
    &self,
    expected: TerminalStatus,
    presented_token: Option<String>,
    raw_payload: Bytes,
  ) -> AppResult<ReconcileOutcome> {
    let ctx_data = ContextData::new(WebhookCtxData::new(
      self.deps.clone(),
      self.settings.clone(),
      expected,
      presented_token,
      raw_payload,
    ));

    match self.pipeline.run(ctx_data.clone()).await? {
      PipelineResult::Stopped => Ok(ReconcileOutcome::Ignored),
      PipelineResult::Completed => {
        let order = { ctx_data.read().order.clone() };
        order.map(ReconcileOutcome::Applied).ok_or_else(|| {
          error!("Webhook pipeline completed without an updated order.");
          AppError::Internal("terminal status was not applied".to_string())
        })
      }
    }
  }
}
