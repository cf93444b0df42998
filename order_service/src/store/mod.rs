// topup-order-service/src/store/mod.rs

//! Order persistence.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

use crate::models::{NewOrder, Order};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("insert of order {0} affected no rows")]
  NotInserted(Uuid),

  #[error("order {0} conflicts with an existing order")]
  Conflict(String),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
  /// Inserts in one transaction and returns the stored row.
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError>;

  async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

  /// Newest first.
  async fn list(&self) -> Result<Vec<Order>, StoreError>;

  /// Sets `status` and `failure_code` on the order with this payment reference
  /// and returns it re-read, or `None` if no order carries the reference.
  /// Reapplying identical values leaves the row untouched.
  async fn apply_terminal_status(
    &self,
    payment_reference_id: &str,
    status: &str,
    failure_code: Option<&str>,
  ) -> Result<Option<Order>, StoreError>;
}
