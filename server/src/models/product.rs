// commerce_server/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, Result};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_CATEGORY: &str = "Uncategorized";

/// A product as returned by the API. Nullable columns are already defaulted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: String,
  pub price: f64,
  pub currency: String,
  pub image: String,
  pub images: Vec<String>,
  pub category: String,
  pub in_stock: bool,
}

/// A `products` row.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price: f64,
  pub currency: String,
  pub image: Option<String>,
  pub images: Option<Vec<String>>,
  pub category: Option<String>,
  pub in_stock: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
  fn from(row: ProductRow) -> Self {
    Self {
      id: row.id,
      name: row.name,
      description: row.description.unwrap_or_default(),
      price: row.price,
      currency: row.currency,
      image: row.image.unwrap_or_default(),
      images: row.images.unwrap_or_default(),
      category: row
        .category
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
      in_stock: row.in_stock,
    }
  }
}

fn validate_price(price: f64) -> Result<()> {
  if !price.is_finite() || price < 0.0 {
    return Err(AppError::Validation("Price must be a non-negative number".to_string()));
  }
  Ok(())
}

/// Body of `POST /api/products`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
  pub name: String,
  #[serde(default)]
  pub description: Option<String>,
  pub price: f64,
  #[serde(default)]
  pub currency: Option<String>,
  #[serde(default)]
  pub image: Option<String>,
  #[serde(default)]
  pub images: Option<Vec<String>>,
  #[serde(default)]
  pub category: Option<String>,
  #[serde(default)]
  pub in_stock: Option<bool>,
}

impl NewProduct {
  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(AppError::Validation("Product name is required".to_string()));
    }
    validate_price(self.price)
  }

  pub fn currency_or_default(&self) -> &str {
    self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
  }
}

/// Body of `PUT /api/products/{id}`. Only present fields are written.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
  pub name: Option<String>,
  pub description: Option<String>,
  pub price: Option<f64>,
  pub currency: Option<String>,
  pub image: Option<String>,
  pub images: Option<Vec<String>>,
  pub category: Option<String>,
  pub in_stock: Option<bool>,
}

impl ProductPatch {
  pub fn is_empty(&self) -> bool {
    self.name.is_none()
      && self.description.is_none()
      && self.price.is_none()
      && self.currency.is_none()
      && self.image.is_none()
      && self.images.is_none()
      && self.category.is_none()
      && self.in_stock.is_none()
  }

  pub fn validate(&self) -> Result<()> {
    if let Some(name) = &self.name {
      if name.trim().is_empty() {
        return Err(AppError::Validation("Product name cannot be empty".to_string()));
      }
    }
    if let Some(price) = self.price {
      validate_price(price)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn row() -> ProductRow {
    ProductRow {
      id: Uuid::nil(),
      name: "Acme Cup".into(),
      description: None,
      price: 15.0,
      currency: "USD".into(),
      image: None,
      images: None,
      category: None,
      in_stock: true,
      created_at: Utc::now(),
      updated_at: Utc::now(),
    }
  }

  #[test]
  fn nullable_columns_get_defaults() {
    let product = Product::from(row());
    assert_eq!(product.description, "");
    assert_eq!(product.image, "");
    assert!(product.images.is_empty());
    assert_eq!(product.category, "Uncategorized");
  }

  #[test]
  fn product_serializes_camel_case() {
    let value = serde_json::to_value(Product::from(row())).unwrap();
    assert_eq!(value["inStock"], json!(true));
    assert!(value.get("in_stock").is_none());
    assert!(value.get("createdAt").is_none());
  }

  #[test]
  fn new_product_validation() {
    let mut body: NewProduct = serde_json::from_value(json!({"name": "Hoodie", "price": 45.0})).unwrap();
    assert!(body.validate().is_ok());
    assert_eq!(body.currency_or_default(), "USD");

    body.price = -1.0;
    assert!(matches!(body.validate(), Err(AppError::Validation(_))));

    body.price = 1.0;
    body.name = "   ".into();
    assert!(matches!(body.validate(), Err(AppError::Validation(_))));
  }

  #[test]
  fn patch_detects_empty_body() {
    let empty: ProductPatch = serde_json::from_value(json!({})).unwrap();
    assert!(empty.is_empty());
    let patch: ProductPatch = serde_json::from_value(json!({"inStock": false})).unwrap();
    assert!(!patch.is_empty());
    assert_eq!(patch.in_stock, Some(false));
  }
}
