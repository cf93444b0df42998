// topup-order-service/src/store/postgres.rs

use crate::models::{NewOrder, Order};
use crate::store::{OrderStore, StoreError};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info, instrument};
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, payment_reference_id, buyer_id, buyer_email, buyer_phone, product_id, product_name, \
   destination, server_id, channel_code, total_product_amount, service_charge, total_amount, status, failure_code, \
   created_at, updated_at";

#[derive(Clone)]
pub struct PgOrderStore {
  pool: PgPool,
}

impl PgOrderStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(&self.pool).await
  }
}

#[async_trait]
impl OrderStore for PgOrderStore {
  #[instrument(name = "store::insert", skip(self, order), fields(order_id = %order.id))]
  async fn insert(&self, order: NewOrder) -> Result<Order, StoreError> {
    let mut tx = self.pool.begin().await?;

    let sql = format!(
      "INSERT INTO orders (id, payment_reference_id, buyer_id, buyer_email, buyer_phone, product_id, product_name, \
       destination, server_id, channel_code, total_product_amount, service_charge, total_amount, status, failure_code) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) RETURNING {}",
      ORDER_COLUMNS
    );
    let inserted: Option<Order> = sqlx::query_as(&sql)
      .bind(order.id)
      .bind(&order.payment_reference_id)
      .bind(order.buyer_id)
      .bind(&order.buyer_email)
      .bind(&order.buyer_phone)
      .bind(order.product_id)
      .bind(&order.product_name)
      .bind(&order.destination)
      .bind(&order.server_id)
      .bind(&order.channel_code)
      .bind(order.total_product_amount)
      .bind(order.service_charge)
      .bind(order.total_amount)
      .bind(&order.status)
      .bind(&order.failure_code)
      .fetch_optional(&mut *tx)
      .await
      .map_err(|e| {
        error!(error = %e, "Failed to insert order.");
        StoreError::Database(e)
      })?;

    let Some(inserted) = inserted else {
      return Err(StoreError::NotInserted(order.id));
    };
    tx.commit().await?;
    info!("Order row committed.");
    Ok(inserted)
  }

  #[instrument(name = "store::find_by_id", skip(self))]
  async fn find_by_id(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
    let mut tx = self.pool.begin().await?;
    let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
    let order: Option<Order> = sqlx::query_as(&sql).bind(id).fetch_optional(&mut *tx).await?;
    tx.commit().await?;
    Ok(order)
  }

  #[instrument(name = "store::list", skip(self))]
  async fn list(&self) -> Result<Vec<Order>, StoreError> {
    let mut tx = self.pool.begin().await?;
    let sql = format!("SELECT {} FROM orders ORDER BY created_at DESC, id", ORDER_COLUMNS);
    let orders: Vec<Order> = sqlx::query_as(&sql).fetch_all(&mut *tx).await?;
    tx.commit().await?;
    Ok(orders)
  }

  #[instrument(name = "store::apply_terminal_status", skip(self))]
  async fn apply_terminal_status(
    &self,
    payment_reference_id: &str,
    status: &str,
    failure_code: Option<&str>,
  ) -> Result<Option<Order>, StoreError> {
    let mut tx = self.pool.begin().await?;

    // Matched rows are returned even when nothing changes, so redelivery is
    // distinguishable from an unknown reference.
    let sql = format!(
      "UPDATE orders SET status = $2, failure_code = $3, \
       updated_at = CASE WHEN status IS DISTINCT FROM $2 OR failure_code IS DISTINCT FROM $3 \
       THEN now() ELSE updated_at END \
       WHERE payment_reference_id = $1 RETURNING {}",
      ORDER_COLUMNS
    );
    let updated: Option<Order> = sqlx::query_as(&sql)
      .bind(payment_reference_id)
      .bind(status)
      .bind(failure_code)
      .fetch_optional(&mut *tx)
      .await?;

    tx.commit().await?;
    Ok(updated)
  }
}
