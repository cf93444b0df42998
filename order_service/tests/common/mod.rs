// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use topup_order_service::config::AppConfig;
use topup_order_service::events::{EventPublisher, PublishError};
use topup_order_service::gateway::{GatewayError, ServiceGateway, UserTokenDecoder};
use topup_order_service::models::{
  CreateOrderRequest, CreatePaymentRequest, CreatedPayment, NewOrder, Order, OrderMessage, PaymentSnapshot, Product,
  User,
};
use topup_order_service::pipelines::contexts::{OrderDeps, WebhookSettings};
use topup_order_service::services::{OrderOrchestrator, WebhookReconciler};
use topup_order_service::state::AppState;
use topup_order_service::store::{InMemoryOrderStore, OrderStore, StoreError};
use tracing::Level;
use uuid::Uuid;

pub const USER_JWT_SECRET: &str = "test-user-secret";
pub const WEBHOOK_HEADER: &str = "x-callback-token";
pub const WEBHOOK_TOKEN: &str = "test-callback-token";

/// Scripted stand-in for the user, product and payment services.
#[derive(Default)]
pub struct FakeGateway {
  users: Mutex<HashMap<i64, User>>,
  user_error: Mutex<Option<GatewayError>>,
  user_delay: Mutex<Option<Duration>>,
  user_lookup_finished: AtomicBool,
  products: Mutex<HashMap<i64, Product>>,
  product_error: Mutex<Option<GatewayError>>,
  payment_error: Mutex<Option<GatewayError>>,
  payment_requests: Mutex<Vec<CreatePaymentRequest>>,
  snapshots: Mutex<HashMap<String, PaymentSnapshot>>,
  snapshot_error: Mutex<Option<GatewayError>>,
  simulation_error: Mutex<Option<GatewayError>>,
  simulated: Mutex<Vec<String>>,
}

impl FakeGateway {
  pub fn with_product(self, product: Product) -> Self {
    self.products.lock().insert(product.id, product);
    self
  }

  pub fn with_user(self, user: User) -> Self {
    self.users.lock().insert(user.id, user);
    self
  }

  pub fn fail_users(&self, err: GatewayError) {
    *self.user_error.lock() = Some(err);
  }

  pub fn delay_users(&self, delay: Duration) {
    *self.user_delay.lock() = Some(delay);
  }

  pub fn user_lookup_finished(&self) -> bool {
    self.user_lookup_finished.load(Ordering::SeqCst)
  }

  pub fn fail_products(&self, err: GatewayError) {
    *self.product_error.lock() = Some(err);
  }

  pub fn fail_payments(&self, err: GatewayError) {
    *self.payment_error.lock() = Some(err);
  }

  pub fn fail_snapshots(&self, err: GatewayError) {
    *self.snapshot_error.lock() = Some(err);
  }

  pub fn fail_simulation(&self, err: GatewayError) {
    *self.simulation_error.lock() = Some(err);
  }

  pub fn set_payment_status(&self, payment_id: &str, status: &str) {
    if let Some(snapshot) = self.snapshots.lock().get_mut(payment_id) {
      snapshot.status = status.to_string();
    }
  }

  pub fn payment_requests(&self) -> Vec<CreatePaymentRequest> {
    self.payment_requests.lock().clone()
  }

  pub fn simulated(&self) -> Vec<String> {
    self.simulated.lock().clone()
  }
}

#[async_trait]
impl ServiceGateway for FakeGateway {
  async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, GatewayError> {
    let delay = *self.user_delay.lock();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }
    self.user_lookup_finished.store(true, Ordering::SeqCst);
    if let Some(err) = self.user_error.lock().clone() {
      return Err(err);
    }
    Ok(self.users.lock().get(&id).cloned())
  }

  async fn get_product_by_id(&self, id: i64) -> Result<Product, GatewayError> {
    if let Some(err) = self.product_error.lock().clone() {
      return Err(err);
    }
    self
      .products
      .lock()
      .get(&id)
      .cloned()
      .ok_or_else(|| GatewayError::NotFound("product not found".to_string()))
  }

  async fn create_payment(&self, request: &CreatePaymentRequest) -> Result<CreatedPayment, GatewayError> {
    self.payment_requests.lock().push(request.clone());
    if let Some(err) = self.payment_error.lock().clone() {
      return Err(err);
    }
    let payment_id = format!("pr-{}", request.reference_id);
    self.snapshots.lock().insert(
      payment_id.clone(),
      PaymentSnapshot {
        payment_request_id: payment_id.clone(),
        request_amount: request.amount,
        channel_code: request.channel_code.clone(),
        channel_properties: json!({}),
        actions: Vec::new(),
        status: "PENDING".to_string(),
        failure_code: None,
        created: None,
        updated: None,
      },
    );
    Ok(CreatedPayment {
      external_payment_id: payment_id,
      status: "PENDING".to_string(),
      failure_code: None,
    })
  }

  async fn get_payment_by_id(&self, payment_id: &str) -> Result<PaymentSnapshot, GatewayError> {
    if let Some(err) = self.snapshot_error.lock().clone() {
      return Err(err);
    }
    self
      .snapshots
      .lock()
      .get(payment_id)
      .cloned()
      .ok_or_else(|| GatewayError::NotFound("payment not found".to_string()))
  }

  async fn simulate_payment(&self, payment: &PaymentSnapshot) -> Result<(), GatewayError> {
    if let Some(err) = self.simulation_error.lock().clone() {
      return Err(err);
    }
    self.simulated.lock().push(payment.payment_request_id.clone());
    Ok(())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedEvent {
  pub topic: String,
  pub key: String,
  pub payload: Vec<u8>,
}

impl PublishedEvent {
  pub fn message(&self) -> Option<OrderMessage> {
    serde_json::from_slice(&self.payload).ok()
  }
}

/// Keeps every emitted event in memory; can be switched to fail every emit.
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
  events: Mutex<Vec<PublishedEvent>>,
  failing: AtomicBool,
}

impl RecordingEventPublisher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set_failing(&self, failing: bool) {
    self.failing.store(failing, Ordering::SeqCst);
  }

  pub fn events(&self) -> Vec<PublishedEvent> {
    self.events.lock().clone()
  }

  pub fn topics(&self) -> Vec<String> {
    self.events.lock().iter().map(|e| e.topic.clone()).collect()
  }
}

#[async_trait]
impl EventPublisher for RecordingEventPublisher {
  async fn emit(&self, topic: &str, key: &str, payload: &[u8]) -> Result<(), PublishError> {
    if self.failing.load(Ordering::SeqCst) {
      return Err(PublishError::Bus("recording publisher set to fail".to_string()));
    }
    self.events.lock().push(PublishedEvent {
      topic: topic.to_string(),
      key: key.to_string(),
      payload: payload.to_vec(),
    });
    Ok(())
  }
}

/// A message bus that accepts the call and never answers.
pub struct HangingEventPublisher;

#[async_trait]
impl EventPublisher for HangingEventPublisher {
  async fn emit(&self, _topic: &str, _key: &str, _payload: &[u8]) -> Result<(), PublishError> {
    std::future::pending().await
  }
}

/// Rejects every insert; reads find nothing.
pub struct FailingOrderStore;

#[async_trait]
impl OrderStore for FailingOrderStore {
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
    Err(StoreError::NotInserted(order.id))
  }

  async fn find_by_id(&self, _id: Uuid) -> Result<Option<Order>, StoreError> {
    Ok(None)
  }

  async fn list(&self) -> Result<Vec<Order>, StoreError> {
    Ok(Vec::new())
  }

  async fn apply_terminal_status(
    &self,
    _payment_reference_id: &str,
    _status: &str,
    _failure_code: Option<&str>,
  ) -> Result<Option<Order>, StoreError> {
    Ok(None)
  }
}

pub fn order_deps(
  gateway: Arc<FakeGateway>,
  store: Arc<dyn OrderStore>,
  publisher: Arc<dyn EventPublisher>,
  publish_timeout: Duration,
) -> OrderDeps {
  OrderDeps {
    gateway,
    store,
    publisher,
    user_tokens: Arc::new(UserTokenDecoder::new(USER_JWT_SECRET)),
    publish_timeout,
  }
}

pub fn webhook_settings() -> WebhookSettings {
  WebhookSettings {
    header_name: WEBHOOK_HEADER.to_string(),
    token: WEBHOOK_TOKEN.to_string(),
  }
}

/// One fully wired service over fakes.
pub struct TestApp {
  pub gateway: Arc<FakeGateway>,
  pub store: Arc<InMemoryOrderStore>,
  pub publisher: Arc<RecordingEventPublisher>,
  pub deps: OrderDeps,
}

impl TestApp {
  pub fn new(gateway: FakeGateway) -> Self {
    setup_tracing();
    let gateway = Arc::new(gateway);
    let store = Arc::new(InMemoryOrderStore::new());
    let publisher = Arc::new(RecordingEventPublisher::new());
    let deps = order_deps(
      gateway.clone(),
      store.clone(),
      publisher.clone(),
      Duration::from_millis(200),
    );
    Self {
      gateway,
      store,
      publisher,
      deps,
    }
  }

  pub fn orchestrator(&self) -> OrderOrchestrator {
    OrderOrchestrator::new(self.deps.clone())
  }

  pub fn reconciler(&self) -> WebhookReconciler {
    WebhookReconciler::new(self.deps.clone(), webhook_settings())
  }

  pub fn state(&self, app_env: &str) -> AppState {
    let vars = HashMap::from([
      ("APP_ENV", app_env),
      ("ORDER_STORE", "memory"),
      ("USER_SERVICE_URL", "http://users.test"),
      ("PRODUCT_SERVICE_URL", "http://products.test"),
      ("PAYMENT_SERVICE_URL", "http://payments.test"),
      ("SERVICE_JWT_SECRET_KEY", "test-service-secret"),
      ("USER_JWT_SECRET_KEY", USER_JWT_SECRET),
      ("WEBHOOK_TOKEN", WEBHOOK_TOKEN),
    ]);
    let config = AppConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string())).expect("test config");
    AppState::from_parts(Arc::new(config), self.deps.clone())
  }
}

pub fn product(id: i64, price: i64) -> Product {
  Product {
    id,
    ref_id: format!("ref-{}", id),
    product_type_id: 1,
    name: format!("Diamonds x{}", id),
    code: format!("DM{}", id),
    description: String::new(),
    image_url: String::new(),
    price,
  }
}

pub fn user(id: i64, phone_number: Option<&str>) -> User {
  User {
    id,
    name: format!("user-{}", id),
    email: format!("user{}@example.com", id),
    phone_number: phone_number.map(str::to_string),
  }
}

pub fn create_request(product_id: i64, payment_method: &str) -> CreateOrderRequest {
  CreateOrderRequest {
    destination: "12345678".to_string(),
    server_id: Some("2001".to_string()),
    product_id,
    payment_method: payment_method.to_string(),
    buyer_email: "buyer@example.com".to_string(),
  }
}

/// HS256 user token the way the auth service issues them.
pub fn user_token(user_id: i64) -> String {
  let claims = json!({
    "sub": user_id.to_string(),
    "exp": chrono::Utc::now().timestamp() + 3600,
  });
  jsonwebtoken::encode(
    &Header::default(),
    &claims,
    &EncodingKey::from_secret(USER_JWT_SECRET.as_bytes()),
  )
  .expect("token encodes")
}

pub fn callback_body(payment_id: &str, order_id: &str, status: &str, failure_code: Option<&str>) -> Vec<u8> {
  let mut data = json!({
    "id": payment_id,
    "reference_id": order_id,
    "status": status,
  });
  if let Some(code) = failure_code {
    data["failure_code"] = json!(code);
  }
  serde_json::to_vec(&json!({ "data": data })).expect("callback encodes")
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
