// topup-order-service/src/web/handlers/webhook_handlers.rs

use crate::errors::Result as AppResult;
use crate::models::Envelope;
use crate::pipelines::contexts::TerminalStatus;
use crate::services::ReconcileOutcome;
use crate::state::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use tracing::{info, instrument};

async fn reconcile(
  app_state: &AppState,
  req: &HttpRequest,
  body: web::Bytes,
  expected: TerminalStatus,
) -> AppResult<HttpResponse> {
  let reconciler = &app_state.reconciler;
  let presented_token = req
    .headers()
    .get(reconciler.header_name())
    .and_then(|h| h.to_str().ok())
    .map(String::from);

  match reconciler.reconcile(expected, presented_token, body).await? {
    ReconcileOutcome::Applied(order) => {
      info!(order_id = %order.id, status = %order.status, "Callback applied.");
      Ok(HttpResponse::Ok().json(Envelope::data("Order updated successfully", order)))
    }
    ReconcileOutcome::Ignored => Ok(HttpResponse::Ok().json(Envelope::<()>::message("Callback acknowledged"))),
  }
}

#[instrument(name = "handler::payment_succeeded", skip(app_state, req, body), fields(payload_len = body.len()))]
pub async fn payment_succeeded_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> AppResult<HttpResponse> {
  reconcile(&app_state, &req, body, TerminalStatus::Succeeded).await
}

#[instrument(name = "handler::payment_failed", skip(app_state, req, body), fields(payload_len = body.len()))]
pub async fn payment_failed_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  body: web::Bytes,
) -> AppResult<HttpResponse> {
  reconcile(&app_state, &req, body, TerminalStatus::Failed).await
}
