// topup-order-service/src/web/routes.rs

use crate::errors::AppError;
use crate::models::Envelope;
use crate::web::handlers::{order_handlers, webhook_handlers};
use actix_web::{web, HttpResponse};
use tracing::warn;

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(Envelope::data("ok", serde_json::json!({ "status": "ok" })))
}

/// Malformed JSON bodies answer with the standard envelope instead of actix's
/// plain-text error.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| {
    warn!(error = %err, "Request body rejected.");
    AppError::BadRequest("Invalid request".to_string()).into()
  })
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.app_data(json_config()).service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::get().to(order_handlers::list_orders_handler))
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
          .route(
            "/{order_id}/simulate",
            web::post().to(order_handlers::simulate_payment_handler),
          ),
      )
      .service(
        web::scope("/webhook/orders")
          .route(
            "/succeeded",
            web::post().to(webhook_handlers::payment_succeeded_handler),
          )
          .route("/failed", web::post().to(webhook_handlers::payment_failed_handler)),
      ),
  );
}
