// topup-order-service/src/services/order_orchestrator.rs

use crate::errors::{AppError, Result as AppResult};
use crate::gateway::{CallerIdentity, GatewayError};
use crate::models::order::{STATUS_FAILED, STATUS_SUCCEEDED};
use crate::models::{CreateOrderRequest, Order, OrderWithPayment, PaymentSnapshot};
use crate::pipelines::build_create_order_pipeline;
use crate::pipelines::contexts::{CreateOrderCtxData, OrderDeps};
use topup_flow::{ContextData, Pipeline, PipelineResult};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Result of a dev-only payment simulation request.
#[derive(Debug, Clone, PartialEq)]
pub enum SimulationOutcome {
  AlreadySucceeded(PaymentSnapshot),
  AlreadyFailed(PaymentSnapshot),
  Simulated(PaymentSnapshot),
}

impl SimulationOutcome {
  pub fn message(&self) -> &'static str {
    match self {
      SimulationOutcome::AlreadySucceeded(_) => "Payment already succeeded",
      SimulationOutcome::AlreadyFailed(_) => "Payment already failed",
      SimulationOutcome::Simulated(_) => "Payment simulated successfully",
    }
  }

  pub fn snapshot(&self) -> &PaymentSnapshot {
    match self {
      SimulationOutcome::AlreadySucceeded(s) | SimulationOutcome::AlreadyFailed(s) | SimulationOutcome::Simulated(s) => s,
    }
  }
}

pub struct OrderOrchestrator {
  deps: OrderDeps,
  create_pipeline: Pipeline<CreateOrderCtxData, AppError>,
}

impl OrderOrchestrator {
  pub fn new(deps: OrderDeps) -> Self {
    Self {
      deps,
      create_pipeline: build_create_order_pipeline(),
    }
  }

  /// Runs the create-order pipeline and returns the persisted order.
  #[instrument(
    name = "orchestrator::create_order",
    skip(self, request, caller),
    fields(product_id = request.product_id, payment_method = %request.payment_method)
  )]
  pub async fn create_order(&self, request: CreateOrderRequest, caller: CallerIdentity) -> AppResult<Order> {
    let ctx_data = ContextData::new(CreateOrderCtxData::new(self.deps.clone(), request, caller));

    match self.create_pipeline.run(ctx_data.clone()).await? {
      PipelineResult::Completed => {
        let order = { ctx_data.read().order.clone() };
        order.ok_or_else(|| {
          error!("Create-order pipeline completed without a persisted order.");
          AppError::Internal("order was not persisted".to_string())
        })
      }
      PipelineResult::Stopped => {
        warn!("Create-order pipeline stopped before completion.");
        Err(AppError::Internal("order creation halted".to_string()))
      }
    }
  }

  #[instrument(name = "orchestrator::list_orders", skip(self))]
  pub async fn list_orders(&self) -> AppResult<Vec<Order>> {
    let orders = self.deps.store.list().await?;
    info!(count = orders.len(), "Orders listed.");
    Ok(orders)
  }

  /// Stored order plus the live payment state from the gateway.
  #[instrument(name = "orchestrator::get_order", skip(self))]
  pub async fn get_order(&self, id: Uuid) -> AppResult<OrderWithPayment> {
    let order = self.find_order(id).await?;
    let payment_details = self.payment_snapshot(&order).await?;
    Ok(OrderWithPayment { order, payment_details })
  }

  /// Dev only. Terminal payments are reported as they are and not simulated again.
  #[instrument(name = "orchestrator::simulate_payment", skip(self))]
  pub async fn simulate_payment(&self, id: Uuid) -> AppResult<SimulationOutcome> {
    let order = self.find_order(id).await?;
    let snapshot = self.payment_snapshot(&order).await?;

    match snapshot.status.as_str() {
      STATUS_SUCCEEDED => return Ok(SimulationOutcome::AlreadySucceeded(snapshot)),
      STATUS_FAILED => return Ok(SimulationOutcome::AlreadyFailed(snapshot)),
      _ => {}
    }

    self.deps.gateway.simulate_payment(&snapshot).await.map_err(|e| match e {
      GatewayError::Rejected(m) => AppError::SimulationRejected(m),
      other => AppError::UpstreamUnavailable(other.to_string()),
    })?;
    info!(order_id = %order.id, payment_id = %snapshot.payment_request_id, "Payment simulation triggered.");
    Ok(SimulationOutcome::Simulated(snapshot))
  }

  async fn find_order(&self, id: Uuid) -> AppResult<Order> {
    self
      .deps
      .store
      .find_by_id(id)
      .await?
      .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
  }

  /// Any gateway failure here is internal: the order exists locally, so its
  /// payment must exist upstream.
  async fn payment_snapshot(&self, order: &Order) -> AppResult<PaymentSnapshot> {
    self
      .deps
      .gateway
      .get_payment_by_id(&order.payment_reference_id)
      .await
      .map_err(|e| {
        error!(order_id = %order.id, payment_reference_id = %order.payment_reference_id, error = %e, "Payment read-back failed.");
        AppError::UpstreamUnavailable(e.to_string())
      })
  }
}
