// topup-order-service/src/store/memory.rs

use crate::models::{NewOrder, Order};
use crate::store::{OrderStore, StoreError};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

/// Map-backed store for tests and `ORDER_STORE=memory` runs.
#[derive(Default)]
pub struct InMemoryOrderStore {
  orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.orders.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.orders.read().is_empty()
  }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
    let mut orders = self.orders.write();
    if orders.contains_key(&order.id) {
      return Err(StoreError::Conflict(order.id.to_string()));
    }
    if orders
      .values()
      .any(|o| o.payment_reference_id == order.payment_reference_id)
    {
      return Err(StoreError::Conflict(order.payment_reference_id));
    }
    let stored = order.into_order(Utc::now());
    orders.insert(stored.id, stored.clone());
    Ok(stored)
  }

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
    Ok(self.orders.read().get(&id).cloned())
  }

  async fn list(&self) -> Result<Vec<Order>, StoreError> {
    let mut orders: Vec<Order> = self.orders.read().values().cloned().collect();
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
    Ok(orders)
  }

  async fn apply_terminal_status(
    &self,
    payment_reference_id: &str,
    status: &str,
    failure_code: Option<&str>,
  ) -> Result<Option<Order>, StoreError> {
    let mut orders = self.orders.write();
    let Some(order) = orders
      .values_mut()
      .find(|o| o.payment_reference_id == payment_reference_id)
    else {
      return Ok(None);
    };

    let failure_code = failure_code.map(str::to_string);
    if order.status != status || order.failure_code != failure_code {
      order.status = status.to_string();
      order.failure_code = failure_code;
      order.updated_at = Utc::now();
    }
    Ok(Some(order.clone()))
  }
}
