// commerce_server/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::IntoParams;
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::product::{NewProduct, Product, ProductPatch};
use crate::state::AppState;

#[derive(Deserialize, Debug, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchProductsQuery {
  /// Substring matched against name, description and category.
  pub q: Option<String>,
}

fn product_not_found(id: Uuid) -> AppError {
  warn!("Product with ID {} not found.", id);
  AppError::NotFound(format!("Product with ID {} not found.", id))
}

#[utoipa::path(
  get,
  path = "/api/products",
  tag = "products",
  responses((status = 200, description = "In-stock products, newest first", body = [Product]))
)]
#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = db::products::list_in_stock(&app_state.db_pool).await?;
  info!("Successfully fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(products))
}

#[utoipa::path(
  get,
  path = "/api/products/search",
  tag = "products",
  params(SearchProductsQuery),
  responses(
    (status = 200, description = "Matching in-stock products", body = [Product]),
    (status = 400, description = "Missing search query")
  )
)]
#[instrument(name = "handler::search_products", skip(app_state, query))]
pub async fn search_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<SearchProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let term = query
    .q
    .as_deref()
    .map(str::trim)
    .filter(|q| !q.is_empty())
    .ok_or_else(|| AppError::Validation("Search query is required".to_string()))?;

  let products = db::products::search(&app_state.db_pool, term).await?;
  info!(term, found = products.len(), "Product search finished.");
  Ok(HttpResponse::Ok().json(products))
}

#[utoipa::path(
  get,
  path = "/api/products/category/{category}",
  tag = "products",
  params(("category" = String, Path, description = "Exact category name")),
  responses((status = 200, description = "In-stock products of the category", body = [Product]))
)]
#[instrument(name = "handler::products_by_category", skip(app_state, path), fields(category = %path.as_ref()))]
pub async fn list_by_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let category = path.into_inner();
  let products = db::products::list_by_category(&app_state.db_pool, &category).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[utoipa::path(
  get,
  path = "/api/products/{id}",
  tag = "products",
  params(("id" = Uuid, Path, description = "Product id")),
  responses(
    (status = 200, description = "The product", body = Product),
    (status = 404, description = "No such product")
  )
)]
#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  match db::products::get_by_id(&app_state.db_pool, id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(product)),
    None => Err(product_not_found(id)),
  }
}

#[utoipa::path(
  post,
  path = "/api/products",
  tag = "products",
  request_body = NewProduct,
  responses(
    (status = 201, description = "Created product", body = Product),
    (status = 400, description = "Blank name or negative price")
  )
)]
#[instrument(name = "handler::create_product", skip(app_state, body))]
pub async fn create_product_handler(
  app_state: web::Data<AppState>,
  body: web::Json<NewProduct>,
) -> Result<HttpResponse, AppError> {
  let new_product = body.into_inner();
  new_product.validate()?;
  let product = db::products::create(&app_state.db_pool, &new_product).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(HttpResponse::Created().json(product))
}

#[utoipa::path(
  put,
  path = "/api/products/{id}",
  tag = "products",
  params(("id" = Uuid, Path, description = "Product id")),
  request_body = ProductPatch,
  responses(
    (status = 200, description = "Updated product", body = Product),
    (status = 400, description = "Invalid field values"),
    (status = 404, description = "No such product")
  )
)]
#[instrument(name = "handler::update_product", skip(app_state, path, body), fields(product_id = %path.as_ref()))]
pub async fn update_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<ProductPatch>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  let patch = body.into_inner();
  patch.validate()?;
  match db::products::update(&app_state.db_pool, id, &patch).await? {
    Some(product) => {
      info!("Product {} updated.", id);
      Ok(HttpResponse::Ok().json(product))
    }
    None => Err(product_not_found(id)),
  }
}

#[utoipa::path(
  delete,
  path = "/api/products/{id}",
  tag = "products",
  params(("id" = Uuid, Path, description = "Product id")),
  responses(
    (status = 204, description = "Deleted"),
    (status = 404, description = "No such product")
  )
)]
#[instrument(name = "handler::delete_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn delete_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  if db::products::delete(&app_state.db_pool, id).await? {
    info!("Product {} deleted.", id);
    Ok(HttpResponse::NoContent().finish())
  } else {
    Err(product_not_found(id))
  }
}
