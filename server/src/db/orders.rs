// commerce_server/src/db/orders.rs

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{error, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::order::{NewOrder, Order, OrderRow, OrderStatus};

pub(crate) const ORDER_COLUMNS: &str = "id, user_id, total, currency, status, items, created_at, updated_at";

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>> {
  rows.into_iter().map(Order::try_from).collect()
}

#[instrument(name = "db::orders::create", skip(pool, new))]
pub async fn create(pool: &PgPool, new: &NewOrder) -> Result<Order> {
  let row: OrderRow = sqlx::query_as(&format!(
    "INSERT INTO orders (user_id, total, currency, status, items) VALUES ($1, $2, $3, $4, $5) RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(&new.user_id)
  .bind(new.total)
  .bind(new.currency.as_deref().unwrap_or("USD"))
  .bind(new.status.unwrap_or_default().as_str())
  .bind(Json(&new.items))
  .fetch_one(pool)
  .await
  .map_err(|e| {
    error!("Failed to create order: {}", e);
    AppError::Sqlx(e)
  })?;
  Order::try_from(row)
}

#[instrument(name = "db::orders::get_by_id", skip(pool))]
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Order>> {
  let row: Option<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
      error!("Failed to fetch order {}: {}", id, e);
      AppError::Sqlx(e)
    })?;
  row.map(Order::try_from).transpose()
}

#[instrument(name = "db::orders::list_by_user", skip(pool))]
pub async fn list_by_user(pool: &PgPool, user_id: &str) -> Result<Vec<Order>> {
  let rows: Vec<OrderRow> = sqlx::query_as(&format!(
    "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
    ORDER_COLUMNS
  ))
  .bind(user_id)
  .fetch_all(pool)
  .await
  .map_err(|e| {
    error!("Failed to fetch orders for user: {}", e);
    AppError::Sqlx(e)
  })?;
  into_orders(rows)
}

#[instrument(name = "db::orders::update_status", skip(pool))]
pub async fn update_status(pool: &PgPool, id: Uuid, status: OrderStatus) -> Result<Option<Order>> {
  let row: Option<OrderRow> = sqlx::query_as(&format!(
    "UPDATE orders SET status = $1, updated_at = NOW() WHERE id = $2 RETURNING {}",
    ORDER_COLUMNS
  ))
  .bind(status.as_str())
  .bind(id)
  .fetch_optional(pool)
  .await
  .map_err(|e| {
    error!("Failed to update status of order {}: {}", id, e);
    AppError::Sqlx(e)
  })?;
  row.map(Order::try_from).transpose()
}

#[instrument(name = "db::orders::list_all", skip(pool))]
pub async fn list_all(pool: &PgPool) -> Result<Vec<Order>> {
  let rows: Vec<OrderRow> = sqlx::query_as(&format!("SELECT {} FROM orders ORDER BY created_at DESC", ORDER_COLUMNS))
    .fetch_all(pool)
    .await
    .map_err(|e| {
      error!("Failed to fetch orders: {}", e);
      AppError::Sqlx(e)
    })?;
  into_orders(rows)
}
