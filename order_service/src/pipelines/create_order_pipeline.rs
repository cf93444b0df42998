// topup-order-service/src/pipelines/create_order_pipeline.rs

use crate::errors::AppError;
use crate::events::{emit_best_effort, TOPIC_NEW_ORDER};
use crate::fees;
use crate::gateway::{CallerIdentity, GatewayError};
use crate::models::{CreatePaymentRequest, NewOrder, User};
use crate::pipelines::contexts::{CreateOrderCtxData, OrderDeps};
use tracing::{error, info, warn};
use topup_flow::{ContextData, FlowError, Pipeline, PipelineControl};
use uuid::Uuid;
use validator::Validate;

pub const STEP_VALIDATE_REQUEST: &str = "validate_request";
pub const STEP_ALLOCATE_ORDER_ID: &str = "allocate_order_id";
pub const STEP_RESOLVE_BUYER_AND_PRODUCT: &str = "resolve_buyer_and_product";
pub const STEP_COMPUTE_FEES: &str = "compute_fees";
pub const STEP_CREATE_PAYMENT: &str = "create_payment";
pub const STEP_PERSIST_ORDER: &str = "persist_order";
pub const STEP_PUBLISH_ORDER_CREATED: &str = "publish_order_created";

pub fn build_create_order_pipeline() -> Pipeline<CreateOrderCtxData, AppError> {
  let mut p = Pipeline::<CreateOrderCtxData, AppError>::new(
    "create_order",
    &[
      (STEP_VALIDATE_REQUEST, false),
      (STEP_ALLOCATE_ORDER_ID, false),
      (STEP_RESOLVE_BUYER_AND_PRODUCT, false),
      (STEP_COMPUTE_FEES, false),
      (STEP_CREATE_PAYMENT, false),
      (STEP_PERSIST_ORDER, false),
      (STEP_PUBLISH_ORDER_CREATED, false),
    ],
  );

  // Step 1: request shape
  p.on_root(STEP_VALIDATE_REQUEST, |ctx_data: ContextData<CreateOrderCtxData>| {
    Box::pin(async move {
      let validation = { ctx_data.read().request.validate() };
      validation?;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 2: order id, also sent to the gateway as the payment reference
  p.on_root(STEP_ALLOCATE_ORDER_ID, |ctx_data: ContextData<CreateOrderCtxData>| {
    Box::pin(async move {
      let order_id = Uuid::new_v4();
      ctx_data.write().order_id = Some(order_id);
      info!(%order_id, "Order id allocated.");
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 3: identity and catalog concurrently; the first failure drops the other lookup
  p.on_root(STEP_RESOLVE_BUYER_AND_PRODUCT, |ctx_data: ContextData<CreateOrderCtxData>| {
    Box::pin(async move {
      let (deps, caller, product_id) = {
        let guard = ctx_data.read();
        (guard.deps.clone(), guard.caller.clone(), guard.request.product_id)
      };

      let identity_lookup = resolve_buyer(&deps, &caller);
      let catalog_lookup = async {
        deps
          .gateway
          .get_product_by_id(product_id)
          .await
          .map_err(|e| match e {
            GatewayError::NotFound(_) => AppError::NotFound("Product not found".to_string()),
            other => AppError::from(other),
          })
      };

      let (buyer, product) = tokio::try_join!(identity_lookup, catalog_lookup)?;
      info!(
        product_id = product.id,
        product_price = product.price,
        buyer_id = buyer.as_ref().map(|u| u.id),
        "Buyer and product resolved."
      );

      {
        let mut guard = ctx_data.write();
        guard.buyer = buyer;
        guard.product = Some(product);
      }
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 4: fees from channel and catalog price
  p.on_root(STEP_COMPUTE_FEES, |ctx_data: ContextData<CreateOrderCtxData>| {
    Box::pin(async move {
      let (channel_code, price) = {
        let guard = ctx_data.read();
        (guard.request.payment_method.clone(), guard.product.as_ref().map(|p| p.price))
      };
      let price = price.ok_or_else(|| FlowError::missing_state(STEP_COMPUTE_FEES, "product"))?;

      let details = fees::compute_fee(&channel_code, price)?;
      info!(
        channel_code = %details.channel_code,
        service_charge = details.service_charge,
        total_amount = details.total_amount,
        "Fees computed."
      );
      ctx_data.write().fees = Some(details);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 5: upstream payment; at most once, never retried
  p.on_root(STEP_CREATE_PAYMENT, |ctx_data: ContextData<CreateOrderCtxData>| {
    Box::pin(async move {
      let (deps, request) = {
        let guard = ctx_data.read();
        let order_id = guard
          .order_id
          .ok_or_else(|| FlowError::missing_state(STEP_CREATE_PAYMENT, "order_id"))?;
        let fees = guard
          .fees
          .as_ref()
          .ok_or_else(|| FlowError::missing_state(STEP_CREATE_PAYMENT, "fees"))?;
        let request = CreatePaymentRequest {
          reference_id: order_id.to_string(),
          channel_code: fees.channel_code.clone(),
          amount: fees.total_amount,
          buyer_email: guard.request.buyer_email.clone(),
          buyer_mobile_number: guard.buyer.as_ref().and_then(User::mobile_number).map(str::to_string),
        };
        (guard.deps.clone(), request)
      };

      let payment = deps.gateway.create_payment(&request).await.map_err(|e| match e {
        GatewayError::InvalidArgument(m) => {
          warn!(reference_id = %request.reference_id, reason = %m, "Payment gateway rejected payment request.");
          AppError::UpstreamInvalidArgument(m)
        }
        other => {
          error!(reference_id = %request.reference_id, error = %other, "Payment creation failed.");
          AppError::UpstreamUnavailable(other.to_string())
        }
      })?;

      info!(
        payment_reference_id = %payment.external_payment_id,
        payment_status = %payment.status,
        "Payment created upstream."
      );
      ctx_data.write().payment = Some(payment);
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  // Step 6: one local transaction
  p.on_root(STEP_PERSIST_ORDER, |ctx_data: ContextData<CreateOrderCtxData>| {
    Box::pin(async move {
      let (deps, new_order, payment_reference_id) = {
        let guard = ctx_data.read();
        (
          guard.deps.clone(),
          new_order_from_context(&guard),
          guard.payment.as_ref().map(|p| p.external_payment_id.clone()),
        )
      };

      let result = match new_order {
        Ok(new_order) => deps.store.insert(new_order).await.map_err(AppError::from),
        Err(e) => Err(AppError::from(e)),
      };

      match result {
        Ok(order) => {
          info!(order_id = %order.id, "Order persisted.");
          ctx_data.write().order = Some(order);
          Ok::<_, AppError>(PipelineControl::Continue)
        }
        Err(e) => {
          error!(
            orphaned_payment_reference_id = payment_reference_id.as_deref().unwrap_or("<unknown>"),
            error = %e,
            "Payment was created upstream but the order could not be persisted."
          );
          Err(e)
        }
      }
    })
  });

  // Step 7: after commit; never fails the request
  p.on_root(STEP_PUBLISH_ORDER_CREATED, |ctx_data: ContextData<CreateOrderCtxData>| {
    Box::pin(async move {
      let (deps, order) = {
        let guard = ctx_data.read();
        (guard.deps.clone(), guard.order.clone())
      };
      let order = order.ok_or_else(|| FlowError::missing_state(STEP_PUBLISH_ORDER_CREATED, "order"))?;

      emit_best_effort(&deps.publisher, TOPIC_NEW_ORDER, &order, deps.publish_timeout).await;
      Ok::<_, AppError>(PipelineControl::Continue)
    })
  });

  p
}

/// Anonymous callers resolve to no buyer. A bearer credential must resolve to
/// a known user, otherwise the request is unauthorized.
async fn resolve_buyer(deps: &OrderDeps, caller: &CallerIdentity) -> Result<Option<User>, AppError> {
  let token = match caller {
    CallerIdentity::Anonymous => return Ok(None),
    CallerIdentity::Bearer(token) => token,
  };

  let user_id = deps
    .user_tokens
    .user_id(token)
    .ok_or_else(|| AppError::Unauthorized("Invalid or expired token".to_string()))?;

  match deps.gateway.get_user_by_id(user_id).await {
    Ok(Some(user)) => Ok(Some(user)),
    Ok(None) => {
      warn!(user_id, "Token subject does not match any user.");
      Err(AppError::Unauthorized("User not found".to_string()))
    }
    Err(e) => Err(AppError::UpstreamUnavailable(e.to_string())),
  }
}

fn new_order_from_context(ctx: &CreateOrderCtxData) -> Result<NewOrder, FlowError> {
  let missing = |what: &str| FlowError::missing_state(STEP_PERSIST_ORDER, what);
  let order_id = ctx.order_id.ok_or_else(|| missing("order_id"))?;
  let product = ctx.product.as_ref().ok_or_else(|| missing("product"))?;
  let fees = ctx.fees.as_ref().ok_or_else(|| missing("fees"))?;
  let payment = ctx.payment.as_ref().ok_or_else(|| missing("payment"))?;

  Ok(NewOrder {
    id: order_id,
    payment_reference_id: payment.external_payment_id.clone(),
    buyer_id: ctx.buyer.as_ref().map(|u| u.id),
    buyer_email: ctx.request.buyer_email.clone(),
    buyer_phone: ctx.buyer.as_ref().and_then(User::mobile_number).map(str::to_string),
    product_id: product.id,
    product_name: product.name.clone(),
    destination: ctx.request.destination.clone(),
    server_id: ctx
      .request
      .server_id
      .clone()
      .filter(|s| !s.trim().is_empty()),
    channel_code: fees.channel_code.clone(),
    total_product_amount: product.price,
    service_charge: fees.service_charge,
    total_amount: fees.total_amount,
    status: payment.status.clone(),
    failure_code: payment.failure_code.clone().filter(|c| !c.is_empty()),
  })
}
