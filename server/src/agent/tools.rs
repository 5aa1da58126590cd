// commerce_server/src/agent/tools.rs

//! Database lookups the agent can call. Every outcome, including bad
//! arguments and query failures, is reported back to the model as text.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::db::like_pattern;
use crate::db::orders::ORDER_COLUMNS;
use crate::db::products::PRODUCT_COLUMNS;
use crate::llm::ToolSpec;
use crate::models::order::OrderRow;
use crate::models::product::{ProductRow, DEFAULT_CATEGORY};

pub const SEARCH_PRODUCTS: &str = "search_products";
pub const SEARCH_ORDERS: &str = "search_orders";
pub const GET_PRODUCT_DETAILS: &str = "get_product_details";

const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 50;
const DESCRIPTION_PREVIEW_CHARS: usize = 100;

#[async_trait]
pub trait ToolBox: Send + Sync {
  fn specs(&self) -> Vec<ToolSpec>;

  /// Runs tool `name` with raw JSON `arguments` and returns its textual result.
  async fn call(&self, name: &str, arguments: &str) -> String;
}

fn default_limit() -> f64 {
  DEFAULT_LIMIT as f64
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchProductsArgs {
  pub search_term: Option<String>,
  pub category: Option<String>,
  pub min_price: Option<f64>,
  pub max_price: Option<f64>,
  pub in_stock: Option<bool>,
  #[serde(default = "default_limit")]
  pub limit: f64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SearchOrdersArgs {
  pub user_id: Option<String>,
  pub status: Option<String>,
  pub min_total: Option<f64>,
  pub max_total: Option<f64>,
  #[serde(default = "default_limit")]
  pub limit: f64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductDetailsArgs {
  pub product_id: String,
}

/// Models sometimes send an empty string for a call without arguments.
fn parse_args<T: serde::de::DeserializeOwned>(arguments: &str) -> Result<T, String> {
  let raw = if arguments.trim().is_empty() { "{}" } else { arguments };
  serde_json::from_str(raw).map_err(|e| format!("invalid arguments: {}", e))
}

/// Limits arrive as JSON numbers, so `5.0` and `5` mean the same thing.
fn clamp_limit(limit: f64) -> i64 {
  if !limit.is_finite() {
    return DEFAULT_LIMIT;
  }
  (limit.round() as i64).clamp(1, MAX_LIMIT)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

pub(crate) fn build_product_search(args: &SearchProductsArgs) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM products WHERE TRUE", PRODUCT_COLUMNS));
  if let Some(term) = non_blank(&args.search_term) {
    let pattern = like_pattern(term);
    qb.push(" AND (name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR description ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
  if let Some(category) = non_blank(&args.category) {
    qb.push(" AND category = ").push_bind(category.to_string());
  }
  if let Some(min) = args.min_price {
    qb.push(" AND price >= ").push_bind(min);
  }
  if let Some(max) = args.max_price {
    qb.push(" AND price <= ").push_bind(max);
  }
  if let Some(in_stock) = args.in_stock {
    qb.push(" AND in_stock = ").push_bind(in_stock);
  }
  qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(clamp_limit(args.limit));
  qb
}

pub(crate) fn build_order_search(args: &SearchOrdersArgs) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM orders WHERE TRUE", ORDER_COLUMNS));
  if let Some(user_id) = non_blank(&args.user_id) {
    qb.push(" AND user_id = ").push_bind(user_id.to_string());
  }
  if let Some(status) = non_blank(&args.status) {
    qb.push(" AND status = ").push_bind(status.to_lowercase());
  }
  if let Some(min) = args.min_total {
    qb.push(" AND total >= ").push_bind(min);
  }
  if let Some(max) = args.max_total {
    qb.push(" AND total <= ").push_bind(max);
  }
  qb.push(" ORDER BY created_at DESC LIMIT ").push_bind(clamp_limit(args.limit));
  qb
}

fn format_price(currency: &str, amount: f64) -> String {
  format!("{}{}", currency, amount)
}

fn category_or_default(category: &Option<String>) -> String {
  non_blank(category).unwrap_or(DEFAULT_CATEGORY).to_string()
}

fn description_preview(description: &Option<String>) -> String {
  match non_blank(description) {
    Some(text) => {
      let preview: String = text.chars().take(DESCRIPTION_PREVIEW_CHARS).collect();
      format!("{}...", preview)
    }
    None => "No description".to_string(),
  }
}

fn format_timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
  ts.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub(crate) fn product_summary(row: &ProductRow) -> Value {
  json!({
    "id": row.id,
    "name": row.name,
    "price": format_price(&row.currency, row.price),
    "category": category_or_default(&row.category),
    "inStock": row.in_stock,
    "description": description_preview(&row.description),
  })
}

pub(crate) fn order_summary(row: &OrderRow) -> Value {
  json!({
    "id": row.id,
    "userId": row.user_id,
    "total": format_price(&row.currency, row.total),
    "status": row.status,
    "itemCount": row.items.0.len(),
    "createdAt": format_timestamp(&row.created_at),
  })
}

pub(crate) fn product_details(row: &ProductRow) -> Value {
  let images = match &row.images {
    Some(images) if !images.is_empty() => images.clone(),
    _ => non_blank(&row.image).map(|i| vec![i.to_string()]).unwrap_or_default(),
  };
  json!({
    "id": row.id,
    "name": row.name,
    "description": row.description,
    "price": format_price(&row.currency, row.price),
    "category": category_or_default(&row.category),
    "inStock": row.in_stock,
    "images": images,
    "createdAt": format_timestamp(&row.created_at),
    "updatedAt": format_timestamp(&row.updated_at),
  })
}

fn pretty(value: &Value) -> String {
  serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

pub fn tool_specs() -> Vec<ToolSpec> {
  vec![
    ToolSpec {
      name: SEARCH_PRODUCTS.to_string(),
      description: "Search for products in the database by various criteria".to_string(),
      parameters: json!({
        "type": "object",
        "properties": {
          "searchTerm": {"type": "string", "description": "Search term to find in product names or descriptions"},
          "category": {"type": "string", "description": "Filter by product category"},
          "minPrice": {"type": "number", "description": "Minimum price filter"},
          "maxPrice": {"type": "number", "description": "Maximum price filter"},
          "inStock": {"type": "boolean", "description": "Filter by stock availability"},
          "limit": {"type": "number", "description": "Maximum number of results to return", "default": DEFAULT_LIMIT}
        }
      }),
    },
    ToolSpec {
      name: SEARCH_ORDERS.to_string(),
      description: "Search for orders in the database by various criteria".to_string(),
      parameters: json!({
        "type": "object",
        "properties": {
          "userId": {"type": "string", "description": "User ID to filter orders"},
          "status": {"type": "string", "description": "Order status to filter by"},
          "minTotal": {"type": "number", "description": "Minimum order total"},
          "maxTotal": {"type": "number", "description": "Maximum order total"},
          "limit": {"type": "number", "description": "Maximum number of results to return", "default": DEFAULT_LIMIT}
        }
      }),
    },
    ToolSpec {
      name: GET_PRODUCT_DETAILS.to_string(),
      description: "Get detailed information about a specific product by ID".to_string(),
      parameters: json!({
        "type": "object",
        "properties": {
          "productId": {"type": "string", "description": "The ID of the product to retrieve"}
        },
        "required": ["productId"]
      }),
    },
  ]
}

/// The storefront tools, backed by Postgres.
#[derive(Clone)]
pub struct CommerceTools {
  pool: PgPool,
}

impl CommerceTools {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "tool::search_products", skip(self))]
  async fn search_products(&self, args: SearchProductsArgs) -> String {
    let rows: Vec<ProductRow> = match build_product_search(&args).build_query_as().fetch_all(&self.pool).await {
      Ok(rows) => rows,
      Err(e) => {
        error!("Search error: {}", e);
        return format!("Error searching products: {}", e);
      }
    };
    info!(results = rows.len(), "Product search finished.");
    if rows.is_empty() {
      return "No products found matching your criteria.".to_string();
    }
    pretty(&Value::Array(rows.iter().map(product_summary).collect()))
  }

  #[instrument(name = "tool::search_orders", skip(self))]
  async fn search_orders(&self, args: SearchOrdersArgs) -> String {
    let rows: Vec<OrderRow> = match build_order_search(&args).build_query_as().fetch_all(&self.pool).await {
      Ok(rows) => rows,
      Err(e) => {
        error!("Search error: {}", e);
        return format!("Error searching orders: {}", e);
      }
    };
    info!(results = rows.len(), "Order search finished.");
    if rows.is_empty() {
      return "No orders found matching your criteria.".to_string();
    }
    pretty(&Value::Array(rows.iter().map(order_summary).collect()))
  }

  #[instrument(name = "tool::get_product_details", skip(self))]
  async fn get_product_details(&self, args: ProductDetailsArgs) -> String {
    let id = match Uuid::parse_str(args.product_id.trim()) {
      Ok(id) => id,
      Err(e) => return format!("Error fetching product: invalid product id '{}': {}", args.product_id, e),
    };
    let row: Option<ProductRow> = match sqlx::query_as(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await
    {
      Ok(row) => row,
      Err(e) => {
        error!("Error fetching product: {}", e);
        return format!("Error fetching product: {}", e);
      }
    };
    match row {
      Some(row) => pretty(&product_details(&row)),
      None => "Product not found.".to_string(),
    }
  }
}

#[async_trait]
impl ToolBox for CommerceTools {
  fn specs(&self) -> Vec<ToolSpec> {
    tool_specs()
  }

  async fn call(&self, name: &str, arguments: &str) -> String {
    match name {
      SEARCH_PRODUCTS => match parse_args::<SearchProductsArgs>(arguments) {
        Ok(args) => self.search_products(args).await,
        Err(e) => format!("Error searching products: {}", e),
      },
      SEARCH_ORDERS => match parse_args::<SearchOrdersArgs>(arguments) {
        Ok(args) => self.search_orders(args).await,
        Err(e) => format!("Error searching orders: {}", e),
      },
      GET_PRODUCT_DETAILS => match parse_args::<ProductDetailsArgs>(arguments) {
        Ok(args) => self.get_product_details(args).await,
        Err(e) => format!("Error fetching product: {}", e),
      },
      other => {
        warn!(tool = other, "Model requested an unknown tool.");
        format!("Error: unknown tool '{}'", other)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::{TimeZone, Utc};
  use sqlx::types::Json;

  fn product_row() -> ProductRow {
    ProductRow {
      id: Uuid::nil(),
      name: "Acme Hoodie".into(),
      description: Some("x".repeat(120)),
      price: 45.0,
      currency: "USD".into(),
      image: Some("hoodie.png".into()),
      images: None,
      category: None,
      in_stock: true,
      created_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
      updated_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
    }
  }

  #[test]
  fn args_default_limit_and_accept_empty_input() {
    let args: SearchProductsArgs = parse_args("").unwrap();
    assert_eq!(clamp_limit(args.limit), 10);
    let args: SearchOrdersArgs = parse_args(r#"{"userId":"u1","minTotal":5}"#).unwrap();
    assert_eq!(args.user_id.as_deref(), Some("u1"));
    assert_eq!(args.min_total, Some(5.0));
    assert_eq!(clamp_limit(args.limit), 10);
    assert!(parse_args::<ProductDetailsArgs>("{}").is_err());
  }

  #[test]
  fn fractional_limits_are_accepted_and_clamped() {
    let args: SearchProductsArgs = parse_args(r#"{"limit":5.0}"#).unwrap();
    assert_eq!(clamp_limit(args.limit), 5);
    let args: SearchOrdersArgs = parse_args(r#"{"limit":7}"#).unwrap();
    assert_eq!(clamp_limit(args.limit), 7);
    assert_eq!(clamp_limit(2.6), 3);
    assert_eq!(clamp_limit(0.0), 1);
    assert_eq!(clamp_limit(-4.0), 1);
    assert_eq!(clamp_limit(500.0), MAX_LIMIT);
    assert_eq!(clamp_limit(f64::NAN), DEFAULT_LIMIT);
  }

  #[test]
  fn product_search_sql_includes_only_given_filters() {
    let args = SearchProductsArgs {
      search_term: Some("cup".into()),
      max_price: Some(20.0),
      limit: 500.0,
      ..Default::default()
    };
    let qb = build_product_search(&args);
    let sql = qb.sql();
    assert!(sql.contains("(name ILIKE $1 OR description ILIKE $2)"));
    assert!(sql.contains("AND price <= $3"));
    assert!(!sql.contains("category ="));
    assert!(sql.ends_with("ORDER BY created_at DESC LIMIT $4"));
  }

  #[test]
  fn blank_filters_are_ignored() {
    let args = SearchOrdersArgs {
      user_id: Some("  ".into()),
      status: Some("Pending".into()),
      limit: 10.0,
      ..Default::default()
    };
    let qb = build_order_search(&args);
    let sql = qb.sql();
    assert!(!sql.contains("user_id ="));
    assert!(sql.contains("AND status = $1"));
  }

  #[test]
  fn product_summary_formats_price_and_truncates() {
    let summary = product_summary(&product_row());
    assert_eq!(summary["price"], "USD45");
    assert_eq!(summary["category"], "Uncategorized");
    let description = summary["description"].as_str().unwrap();
    assert_eq!(description.chars().count(), 103);
    assert!(description.ends_with("..."));
  }

  #[test]
  fn missing_description_reads_no_description() {
    let mut row = product_row();
    row.description = None;
    assert_eq!(product_summary(&row)["description"], "No description");
  }

  #[test]
  fn details_fall_back_to_main_image() {
    let details = product_details(&product_row());
    assert_eq!(details["images"], json!(["hoodie.png"]));
    assert_eq!(details["createdAt"], "2024-01-02 03:04:05 UTC");
  }

  #[test]
  fn order_summary_counts_items() {
    let row = OrderRow {
      id: Uuid::nil(),
      user_id: Some("u1".into()),
      total: 27.5,
      currency: "USD".into(),
      status: "pending".into(),
      items: Json(vec![]),
      created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
      updated_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
    };
    let summary = order_summary(&row);
    assert_eq!(summary["total"], "USD27.5");
    assert_eq!(summary["itemCount"], 0);
    assert_eq!(summary["userId"], "u1");
  }

  #[test]
  fn specs_cover_all_tools() {
    let names: Vec<String> = tool_specs().into_iter().map(|s| s.name).collect();
    assert_eq!(names, vec![SEARCH_PRODUCTS, SEARCH_ORDERS, GET_PRODUCT_DETAILS]);
  }
}
