// topup-order-service/src/gateway/http.rs

use crate::gateway::token_cache::ServiceTokenCache;
use crate::gateway::{GatewayError, ServiceGateway};
use crate::models::payment::ACTION_REDIRECT_CUSTOMER;
use crate::models::{CreatePaymentRequest, CreatedPayment, Envelope, PaymentSnapshot, Product, User};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};

const SIMULATION_TIMEOUT: Duration = Duration::from_secs(15);
const XENDIT_API_VERSION: &str = "2024-11-11";

#[derive(Debug, Clone)]
pub struct GatewayEndpoints {
  pub user_service_url: String,
  pub product_service_url: String,
  pub payment_service_url: String,
  pub xendit_api_url: String,
  pub xendit_api_key: String,
  pub ewallet_mock_callback_url: String,
}

#[derive(Debug, Deserialize)]
struct SimulationResponse {
  #[serde(default)]
  status: String,
}

/// `ServiceGateway` over HTTP. One `reqwest::Client` is shared by every call.
pub struct HttpServiceGateway {
  client: Client,
  endpoints: GatewayEndpoints,
  tokens: Arc<ServiceTokenCache>,
}

impl HttpServiceGateway {
  pub fn new(
    endpoints: GatewayEndpoints,
    tokens: Arc<ServiceTokenCache>,
    timeout: Duration,
  ) -> Result<Self, GatewayError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| GatewayError::Unavailable(format!("failed to build HTTP client: {}", e)))?;
    Ok(Self {
      client,
      endpoints,
      tokens,
    })
  }

  fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder, GatewayError> {
    let token = self.tokens.token()?;
    Ok(request.bearer_auth(token))
  }

  async fn send(&self, request: RequestBuilder, target: &str) -> Result<Response, GatewayError> {
    self.authorized(request)?.send().await.map_err(|e| {
      error!(target_service = target, error = %e, "Collaborator request failed.");
      GatewayError::Unavailable(format!("{} request failed: {}", target, e))
    })
  }

  async fn simulate_ewallet(&self, action_url: &str) -> Result<(), GatewayError> {
    let parsed = Url::parse(action_url)
      .map_err(|e| GatewayError::Unavailable(format!("invalid e-wallet action url: {}", e)))?;
    let token = parsed
      .query_pairs()
      .find(|(k, _)| k == "token")
      .map(|(_, v)| v.into_owned())
      .filter(|v| !v.is_empty())
      .ok_or_else(|| GatewayError::Unavailable("e-wallet payment token not found in action url".to_string()))?;

    let response = self
      .client
      .post(&self.endpoints.ewallet_mock_callback_url)
      .query(&[("token", token.as_str())])
      .timeout(SIMULATION_TIMEOUT)
      .send()
      .await
      .map_err(|e| GatewayError::Unavailable(format!("e-wallet simulation failed: {}", e)))?;

    if response.status() != StatusCode::OK {
      error!(status = response.status().as_u16(), "E-wallet simulation returned non-200.");
      return Err(GatewayError::Unavailable(format!(
        "e-wallet simulation returned {}",
        response.status()
      )));
    }

    let body: SimulationResponse = response
      .json()
      .await
      .map_err(|e| GatewayError::Unavailable(format!("undecodable e-wallet simulation response: {}", e)))?;
    if body.status == "SUCCEEDED" {
      Ok(())
    } else {
      Err(GatewayError::Rejected(
        "Payment failed. Please check callback for failure reason.".to_string(),
      ))
    }
  }

  async fn simulate_provider(&self, payment_request_id: &str, amount: i64) -> Result<(), GatewayError> {
    let url = format!(
      "{}/v3/payment_requests/{}/simulate",
      self.endpoints.xendit_api_url, payment_request_id
    );
    let response = self
      .client
      .post(&url)
      .basic_auth(&self.endpoints.xendit_api_key, Some(""))
      .header("api-version", XENDIT_API_VERSION)
      .json(&json!({ "amount": amount }))
      .timeout(SIMULATION_TIMEOUT)
      .send()
      .await
      .map_err(|e| GatewayError::Unavailable(format!("payment simulation failed: {}", e)))?;

    if response.status() != StatusCode::OK {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      error!(status = status.as_u16(), body = %body, "Payment simulation returned non-200.");
      return Err(GatewayError::Unavailable(format!("payment simulation returned {}", status)));
    }
    Ok(())
  }
}

/// Maps a collaborator response onto the gateway error taxonomy and unwraps
/// the envelope's `data`.
async fn decode_envelope<T: DeserializeOwned>(response: Response, target: &str) -> Result<T, GatewayError> {
  let status = response.status();
  let bytes = response
    .bytes()
    .await
    .map_err(|e| GatewayError::Unavailable(format!("{} body could not be read: {}", target, e)))?;
  let collaborator_message = || {
    serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
      .ok()
      .map(|env| env.message)
      .filter(|m| !m.is_empty())
      .unwrap_or_else(|| status.to_string())
  };

  match status {
    s if s.is_success() => {
      let envelope: Envelope<T> = serde_json::from_slice(&bytes)
        .map_err(|e| GatewayError::Unavailable(format!("{} response could not be decoded: {}", target, e)))?;
      envelope
        .data
        .ok_or_else(|| GatewayError::Unavailable(format!("{} response carried no data", target)))
    }
    StatusCode::NOT_FOUND => Err(GatewayError::NotFound(collaborator_message())),
    StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
      Err(GatewayError::InvalidArgument(collaborator_message()))
    }
    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
      error!(target_service = target, status = status.as_u16(), "Service token rejected by collaborator.");
      Err(GatewayError::Unavailable(format!("{} rejected service credentials", target)))
    }
    other => {
      warn!(target_service = target, status = other.as_u16(), "Collaborator returned an error status.");
      Err(GatewayError::Unavailable(format!("{} returned {}", target, other)))
    }
  }
}

#[async_trait]
impl ServiceGateway for HttpServiceGateway {
  #[instrument(name = "gateway::get_user_by_id", skip(self))]
  async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, GatewayError> {
    let url = format!("{}/api/users", self.endpoints.user_service_url);
    let request = self.client.get(&url).query(&[("id", id)]);
    let response = self.send(request, "user_service").await?;
    match decode_envelope::<User>(response, "user_service").await {
      Ok(user) => Ok(Some(user)),
      Err(GatewayError::NotFound(_)) => Ok(None),
      Err(e) => Err(e),
    }
  }

  #[instrument(name = "gateway::get_product_by_id", skip(self))]
  async fn get_product_by_id(&self, id: i64) -> Result<Product, GatewayError> {
    let url = format!("{}/api/products/{}", self.endpoints.product_service_url, id);
    let response = self.send(self.client.get(&url), "product_service").await?;
    decode_envelope(response, "product_service").await
  }

  #[instrument(
    name = "gateway::create_payment",
    skip(self, request),
    fields(reference_id = %request.reference_id, channel_code = %request.channel_code, amount = request.amount)
  )]
  async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatedPayment, GatewayError> {
    let url = format!("{}/api/payments", self.endpoints.payment_service_url);
    let response = self.send(self.client.post(&url).json(request), "payment_service").await?;
    let created: CreatedPayment = decode_envelope(response, "payment_service").await?;
    debug!(payment_id = %created.external_payment_id, status = %created.status, "Payment created.");
    Ok(created)
  }

  #[instrument(name = "gateway::get_payment_by_id", skip(self))]
  async fn get_payment_by_id(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
    let url = format!("{}/api/payments/{}", self.endpoints.payment_service_url, payment_id);
    let response = self.send(self.client.get(&url), "payment_service").await?;
    decode_envelope(response, "payment_service").await
  }

  #[instrument(name = "gateway::simulate_payment", skip(self, payment), fields(payment_id = %payment.payment_request_id))]
  async fn simulate_payment(&self, payment: &PaymentSnapshot) -> Result<(), GatewayError> {
    match payment.actions.first() {
      Some(action) if action.action_type == ACTION_REDIRECT_CUSTOMER => self.simulate_ewallet(&action.value).await,
      _ => {
        self
          .simulate_provider(&payment.payment_request_id, payment.request_amount)
          .await
      }
    }
  }
}
