// commerce_server/src/models/order.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  #[default]
  Pending,
  Processing,
  Completed,
  Cancelled,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Completed => "completed",
      OrderStatus::Cancelled => "cancelled",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "processing" => Ok(OrderStatus::Processing),
      "completed" => Ok(OrderStatus::Completed),
      "cancelled" => Ok(OrderStatus::Cancelled),
      other => Err(AppError::Validation(format!(
        "Invalid order status '{}'. Expected one of: pending, processing, completed, cancelled",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub product_id: String,
  pub name: String,
  pub price: f64,
  pub quantity: i32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub user_id: Option<String>,
  pub total: f64,
  pub currency: String,
  pub status: OrderStatus,
  pub items: Vec<OrderItem>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// An `orders` row. `status` is stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub user_id: Option<String>,
  pub total: f64,
  pub currency: String,
  pub status: String,
  pub items: Json<Vec<OrderItem>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = AppError;

  fn try_from(row: OrderRow) -> Result<Self> {
    let status = row
      .status
      .parse::<OrderStatus>()
      .map_err(|_| AppError::Internal(format!("Order {} has unknown status '{}'", row.id, row.status)))?;
    Ok(Self {
      id: row.id,
      user_id: row.user_id,
      total: row.total,
      currency: row.currency,
      status,
      items: row.items.0,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
  #[serde(default)]
  pub user_id: Option<String>,
  pub total: f64,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub status: Option<OrderStatus>,
  pub items: Vec<OrderItem>,
}

impl NewOrder {
  pub fn validate(&self) -> Result<()> {
    if self.items.is_empty() {
      return Err(AppError::Validation("Order must contain at least one item".to_string()));
    }
    if !self.total.is_finite() || self.total < 0.0 {
      return Err(AppError::Validation("Order total must be a non-negative number".to_string()));
    }
    if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
      return Err(AppError::Validation(format!(
        "Item '{}' must have a positive quantity",
        item.name
      )));
    }
    Ok(())
  }
}

/// Body of `PATCH /api/orders/{id}/status`. The status is parsed by hand so an
/// unknown value is a validation error rather than a deserialization failure.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateOrderStatus {
  pub status: String,
}
