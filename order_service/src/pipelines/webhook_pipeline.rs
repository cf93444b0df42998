// topup-order-service/src/pipelines/webhook_pipeline.rs

use crate::errors::AppError;
use crate::events::emit_best_effort;
use crate::pipelines::contexts::{CallbackEnvelope, OrderDeps, PaymentCallback, WebhookCtxData};
use topup_flow::{ContextData, FlowError, Pipeline, PipelineControl};
use tracing::{info, warn};
use uuid::Uuid;

pub const STEP_AUTHENTICATE_CALLBACK: &str = "authenticate_callback";
pub const STEP_PARSE_CALLBACK: &str = "parse_callback";
pub const STEP_MATCH_EXPECTED_STATUS: &str = "match_expected_status";
pub const STEP_APPLY_TERMINAL_STATUS: &str = "apply_terminal_status";
pub const STEP_PUBLISH_STATUS_CHANGE: &str = "publish_status_change";

pub fn build_webhook_pipeline() -> Pipeline<WebhookCtxData, AppError> {
  let mut p = Pipeline::<WebhookCtxData, AppError>::new(
    "payment_webhook",
    &[
      (STEP_AUTHENTICATE_CALLBACK, false),
      (STEP_PARSE_CALLBACK, false),
      (STEP_MATCH_EXPECTED_STATUS, false),
      (STEP_APPLY_TERMINAL_STATUS, false),
      (STEP_PUBLISH_STATUS_CHANGE, false),
    ],
  );

  // Step 1: shared secret header
  p.on_root(STEP_AUTHENTICATE_CALLBACK, |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let authenticated = {
        let guard = ctx_data.read();
        let expected = guard.settings.token.as_bytes();
        guard
          .presented_token
          .as_deref()
          .is_some_and(|presented| tokens_match(presented.as_bytes(), expected))
      };

      if !authenticated {
        warn!("Callback token mismatch.");
        return Err(AppError::Unauthorized("Invalid Token".to_string()));
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 2: provider envelope
  p.on_root(STEP_PARSE_CALLBACK, |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let raw_payload = { ctx_data.read().raw_payload.clone() };

      let envelope: CallbackEnvelope = serde_json::from_slice(&raw_payload).map_err(|e| {
        warn!(error = %e, payload_len = raw_payload.len(), "Callback payload could not be parsed.");
        AppError::BadRequest("Invalid request".to_string())
      })?;
      let mut callback = envelope.data;
      if callback.id.trim().is_empty() || callback.status.trim().is_empty() {
        return Err(AppError::BadRequest("Invalid request".to_string()));
      }
      callback.failure_code = callback.failure_code.filter(|c| !c.is_empty());

      info!(
        payment_reference_id = %callback.id,
        order_reference_id = callback.reference_id.as_deref().unwrap_or(""),
        status = %callback.status,
        "Callback parsed."
      );
      ctx_data.write().callback = Some(callback);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 3: each endpoint applies one terminal status; anything else is acknowledged and ignored
  p.on_root(STEP_MATCH_EXPECTED_STATUS, |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (expected, received) = {
        let guard = ctx_data.read();
        let received = guard
          .callback
          .as_ref()
          .map(|c| c.status.clone())
          .ok_or_else(|| FlowError::missing_state(STEP_MATCH_EXPECTED_STATUS, "callback"))?;
        (guard.expected, received)
      };

      if received != expected.as_str() {
        info!(
          expected = expected.as_str(),
          received = %received,
          "Callback status does not match endpoint, ignoring."
        );
        return Ok(PipelineControl::Stop);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 4: one transaction keyed by payment reference
  p.on_root(STEP_APPLY_TERMINAL_STATUS, |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (deps, expected, callback) = {
        let guard = ctx_data.read();
        let callback = guard
          .callback
          .clone()
          .ok_or_else(|| FlowError::missing_state(STEP_APPLY_TERMINAL_STATUS, "callback"))?;
        (guard.deps.clone(), guard.expected, callback)
      };

      verify_echoed_order(&deps, &callback).await?;

      let updated = deps
        .store
        .apply_terminal_status(&callback.id, expected.as_str(), callback.failure_code.as_deref())
        .await?;

      let Some(order) = updated else {
        warn!(payment_reference_id = %callback.id, "No order carries this payment reference.");
        return Err(AppError::NotFound("Order not found".to_string()));
      };

      info!(
        order_id = %order.id,
        status = %order.status,
        failure_code = order.failure_code.as_deref().unwrap_or(""),
        "Terminal status applied."
      );
      ctx_data.write().order = Some(order);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 5: after commit; a publish failure is logged and the callback still acknowledged
  p.on_root(STEP_PUBLISH_STATUS_CHANGE, |ctx_data: ContextData<WebhookCtxData>| {
    Box::pin(async move {
      let (deps, expected, order) = {
        let guard = ctx_data.read();
        (guard.deps.clone(), guard.expected, guard.order.clone())
      };
      let order = order.ok_or_else(|| FlowError::missing_state(STEP_PUBLISH_STATUS_CHANGE, "order"))?;

      emit_best_effort(&deps.publisher, expected.topic(), &order, deps.publish_timeout).await;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p
}

/// The echoed order id, when it names a stored order, must belong to the same
/// payment. An id naming no stored order is only logged; the payment reference
/// alone then decides the outcome.
async fn verify_echoed_order(deps: &OrderDeps, callback: &PaymentCallback) -> Result<(), AppError> {
  let Some(echoed) = callback.reference_id.as_deref().filter(|r| !r.is_empty()) else {
    return Ok(());
  };
  let Ok(order_id) = Uuid::parse_str(echoed) else {
    warn!(payment_reference_id = %callback.id, order_reference_id = echoed, "Callback echoes an unparseable order id.");
    return Ok(());
  };

  match deps.store.find_by_id(order_id).await? {
    Some(order) if order.payment_reference_id != callback.id => {
      warn!(
        payment_reference_id = %callback.id,
        %order_id,
        order_payment_reference_id = %order.payment_reference_id,
        "Callback payment does not belong to the echoed order."
      );
      Err(AppError::BadRequest("Callback reference mismatch".to_string()))
    }
    Some(_) => Ok(()),
    None => {
      warn!(payment_reference_id = %callback.id, %order_id, "Callback echoes an unknown order id.");
      Ok(())
    }
  }
}

/// Comparison time does not depend on where the first differing byte is.
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
  if presented.len() != expected.len() {
    return false;
  }
  presented
    .iter()
    .zip(expected)
    .fold(0u8, |acc, (a, b)| acc | (a ^ b))
    == 0
}
