// commerce_server/src/db/products.rs

use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::db::like_pattern;
use crate::errors::{AppError, Result};
use crate::models::product::{NewProduct, Product, ProductPatch, ProductRow};

pub(crate) const PRODUCT_COLUMNS: &str =
  "id, name, description, price, currency, image, images, category, in_stock, created_at, updated_at";

fn db_err(context: &'static str) -> impl Fn(sqlx::Error) -> AppError {
  move |e| {
    error!("{}: {}", context, e);
    AppError::Sqlx(e)
  }
}

#[instrument(name = "db::products::list_in_stock", skip(pool))]
pub async fn list_in_stock(pool: &PgPool) -> Result<Vec<Product>> {
  let rows: Vec<ProductRow> = sqlx::query_as(&format!(
    "SELECT {} FROM products WHERE in_stock = TRUE ORDER BY created_at DESC",
    PRODUCT_COLUMNS
  ))
  .fetch_all(pool)
  .await
  .map_err(db_err("Failed to fetch products"))?;
  Ok(rows.into_iter().map(Product::from).collect())
}

#[instrument(name = "db::products::get_by_id", skip(pool))]
pub async fn get_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Product>> {
  let row: Option<ProductRow> = sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(db_err("Failed to fetch product"))?;
  Ok(row.map(Product::from))
}

#[instrument(name = "db::products::create", skip(pool, new))]
pub async fn create(pool: &PgPool, new: &NewProduct) -> Result<Product> {
  let row: ProductRow = sqlx::query_as(&format!(
    "INSERT INTO products (name, description, price, currency, image, images, category, in_stock) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
    PRODUCT_COLUMNS
  ))
  .bind(new.name.trim())
  .bind(&new.description)
  .bind(new.price)
  .bind(new.currency_or_default())
  .bind(&new.image)
  .bind(&new.images)
  .bind(&new.category)
  .bind(new.in_stock.unwrap_or(true))
  .fetch_one(pool)
  .await
  .map_err(db_err("Failed to create product"))?;
  Ok(Product::from(row))
}

/// Builds `UPDATE products SET ... WHERE id = $n RETURNING ...` for the fields
/// present in `patch`. `patch` must not be empty.
pub(crate) fn build_update(id: Uuid, patch: &ProductPatch) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::<Postgres>::new("UPDATE products SET ");
  let mut set = qb.separated(", ");
  if let Some(name) = &patch.name {
    set.push("name = ").push_bind_unseparated(name.trim().to_string());
  }
  if let Some(description) = &patch.description {
    set.push("description = ").push_bind_unseparated(description.clone());
  }
  if let Some(price) = patch.price {
    set.push("price = ").push_bind_unseparated(price);
  }
  if let Some(currency) = &patch.currency {
    set.push("currency = ").push_bind_unseparated(currency.clone());
  }
  if let Some(image) = &patch.image {
    set.push("image = ").push_bind_unseparated(image.clone());
  }
  if let Some(images) = &patch.images {
    set.push("images = ").push_bind_unseparated(images.clone());
  }
  if let Some(category) = &patch.category {
    set.push("category = ").push_bind_unseparated(category.clone());
  }
  if let Some(in_stock) = patch.in_stock {
    set.push("in_stock = ").push_bind_unseparated(in_stock);
  }
  set.push("updated_at = NOW()");
  qb.push(" WHERE id = ").push_bind(id);
  qb.push(" RETURNING ").push(PRODUCT_COLUMNS);
  qb
}

/// Writes the fields present in `patch`. `None` when the product does not exist.
#[instrument(name = "db::products::update", skip(pool, patch))]
pub async fn update(pool: &PgPool, id: Uuid, patch: &ProductPatch) -> Result<Option<Product>> {
  if patch.is_empty() {
    return get_by_id(pool, id).await;
  }
  let row: Option<ProductRow> = build_update(id, patch)
    .build_query_as()
    .fetch_optional(pool)
    .await
    .map_err(db_err("Failed to update product"))?;
  Ok(row.map(Product::from))
}

/// Returns whether a row was deleted.
#[instrument(name = "db::products::delete", skip(pool))]
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool> {
  let result = sqlx::query("DELETE FROM products WHERE id = $1")
    .bind(id)
    .execute(pool)
    .await
    .map_err(db_err("Failed to delete product"))?;
  Ok(result.rows_affected() > 0)
}

#[instrument(name = "db::products::search", skip(pool))]
pub async fn search(pool: &PgPool, query: &str) -> Result<Vec<Product>> {
  let rows: Vec<ProductRow> = sqlx::query_as(&format!(
    "SELECT {} FROM products \
     WHERE in_stock = TRUE AND (name ILIKE $1 OR description ILIKE $1 OR category ILIKE $1) \
     ORDER BY created_at DESC",
    PRODUCT_COLUMNS
  ))
  .bind(like_pattern(query.trim()))
  .fetch_all(pool)
  .await
  .map_err(db_err("Failed to search products"))?;
  Ok(rows.into_iter().map(Product::from).collect())
}

#[instrument(name = "db::products::list_by_category", skip(pool))]
pub async fn list_by_category(pool: &PgPool, category: &str) -> Result<Vec<Product>> {
  let rows: Vec<ProductRow> = sqlx::query_as(&format!(
    "SELECT {} FROM products WHERE category = $1 AND in_stock = TRUE ORDER BY created_at DESC",
    PRODUCT_COLUMNS
  ))
  .bind(category)
  .fetch_all(pool)
  .await
  .map_err(db_err("Failed to fetch products by category"))?;
  Ok(rows.into_iter().map(Product::from).collect())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn update_sets_only_present_fields() {
    let patch = ProductPatch {
      name: Some("Acme Mug".into()),
      in_stock: Some(false),
      ..Default::default()
    };
    let qb = build_update(Uuid::nil(), &patch);
    let sql = qb.sql();
    assert!(sql.starts_with("UPDATE products SET name = $1, in_stock = $2, updated_at = NOW() WHERE id = $3"));
    assert!(!sql.contains("price ="));
    assert!(sql.ends_with(PRODUCT_COLUMNS));
  }

  #[test]
  fn update_numbers_binds_in_order() {
    let patch = ProductPatch {
      price: Some(9.5),
      currency: Some("EUR".into()),
      images: Some(vec!["a.png".into()]),
      ..Default::default()
    };
    let sql = build_update(Uuid::nil(), &patch).sql().to_string();
    assert!(sql.contains("price = $1, currency = $2, images = $3, updated_at = NOW() WHERE id = $4"));
  }
}
