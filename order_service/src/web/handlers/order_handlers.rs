// topup-order-service/src/web/handlers/order_handlers.rs

use crate::errors::{AppError, Result as AppResult};
use crate::gateway::CallerIdentity;
use crate::models::{CreateOrderRequest, Envelope};
use crate::state::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn parse_order_id(raw: &str) -> AppResult<Uuid> {
  Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid order id".to_string()))
}

/// A header that is present but not visible ASCII is an unusable credential,
/// never an anonymous caller.
fn caller_identity(req: &HttpRequest) -> CallerIdentity {
  match req.headers().get(AUTHORIZATION).map(|h| h.to_str()) {
    None => CallerIdentity::Anonymous,
    Some(Ok(value)) => CallerIdentity::from_authorization_header(Some(value)),
    Some(Err(_)) => {
      warn!("Authorization header is not valid ASCII.");
      CallerIdentity::Bearer(String::new())
    }
  }
}

#[instrument(name = "handler::create_order", skip(app_state, req, payload))]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  req: HttpRequest,
  payload: web::Json<CreateOrderRequest>,
) -> AppResult<HttpResponse> {
  let caller = caller_identity(&req);

  let order = app_state
    .orchestrator
    .create_order(payload.into_inner(), caller)
    .await?;
  info!(order_id = %order.id, status = %order.status, "Order created.");

  Ok(HttpResponse::Created().json(Envelope::data("Order created successfully", order)))
}

#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> AppResult<HttpResponse> {
  let orders = app_state.orchestrator.list_orders().await?;
  Ok(HttpResponse::Ok().json(Envelope::data("Orders retrieved successfully", orders)))
}

#[instrument(name = "handler::get_order", skip(app_state, order_id), fields(order_id = %order_id.as_str()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
) -> AppResult<HttpResponse> {
  let id = parse_order_id(&order_id)?;
  let order = app_state.orchestrator.get_order(id).await?;
  Ok(HttpResponse::Ok().json(Envelope::data("Order retrieved successfully", order)))
}

/// Dev only; refused outright in production.
#[instrument(name = "handler::simulate_payment", skip(app_state, order_id), fields(order_id = %order_id.as_str()))]
pub async fn simulate_payment_handler(
  app_state: web::Data<AppState>,
  order_id: web::Path<String>,
) -> AppResult<HttpResponse> {
  if app_state.config.is_production() {
    warn!("Payment simulation requested in production.");
    return Err(AppError::DevOnlyUnavailable);
  }

  let id = parse_order_id(&order_id)?;
  let outcome = app_state.orchestrator.simulate_payment(id).await?;
  let snapshot = outcome.snapshot();
  Ok(HttpResponse::Ok().json(Envelope::data(
    outcome.message(),
    json!({
      "payment_request_id": snapshot.payment_request_id,
      "status": snapshot.status,
    }),
  )))
}
