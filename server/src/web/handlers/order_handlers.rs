// commerce_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::order::{NewOrder, Order, OrderStatus, UpdateOrderStatus};
use crate::state::AppState;

fn order_not_found(id: Uuid) -> AppError {
  warn!("Order with ID {} not found.", id);
  AppError::NotFound(format!("Order with ID {} not found.", id))
}

#[utoipa::path(
  get,
  path = "/api/orders",
  tag = "orders",
  responses((status = 200, description = "All orders, newest first", body = [Order]))
)]
#[instrument(name = "handler::list_orders", skip(app_state))]
pub async fn list_orders_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = db::orders::list_all(&app_state.db_pool).await?;
  info!("Fetched {} orders.", orders.len());
  Ok(HttpResponse::Ok().json(orders))
}

#[utoipa::path(
  get,
  path = "/api/orders/{id}",
  tag = "orders",
  params(("id" = Uuid, Path, description = "Order id")),
  responses(
    (status = 200, description = "The order", body = Order),
    (status = 404, description = "No such order")
  )
)]
#[instrument(name = "handler::get_order", skip(app_state, path), fields(order_id = %path.as_ref()))]
pub async fn get_order_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  db::orders::get_by_id(&app_state.db_pool, id)
    .await?
    .map(|order| HttpResponse::Ok().json(order))
    .ok_or_else(|| order_not_found(id))
}

#[utoipa::path(
  get,
  path = "/api/orders/user/{user_id}",
  tag = "orders",
  params(("user_id" = String, Path, description = "Owner of the orders")),
  responses((status = 200, description = "The user's orders, newest first", body = [Order]))
)]
#[instrument(name = "handler::list_user_orders", skip(app_state, path), fields(user_id = %path.as_ref()))]
pub async fn list_user_orders_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let orders = db::orders::list_by_user(&app_state.db_pool, &path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[utoipa::path(
  post,
  path = "/api/orders",
  tag = "orders",
  request_body = NewOrder,
  responses(
    (status = 201, description = "Created order", body = Order),
    (status = 400, description = "Empty items, negative total or bad quantity")
  )
)]
#[instrument(name = "handler::create_order", skip(app_state, body))]
pub async fn create_order_handler(app_state: web::Data<AppState>, body: web::Json<NewOrder>) -> Result<HttpResponse, AppError> {
  let new_order = body.into_inner();
  new_order.validate()?;
  let order = db::orders::create(&app_state.db_pool, &new_order).await?;
  info!(order_id = %order.id, items = order.items.len(), "Order created.");
  Ok(HttpResponse::Created().json(order))
}

#[utoipa::path(
  patch,
  path = "/api/orders/{id}/status",
  tag = "orders",
  params(("id" = Uuid, Path, description = "Order id")),
  request_body = UpdateOrderStatus,
  responses(
    (status = 200, description = "Updated order", body = Order),
    (status = 400, description = "Unknown status"),
    (status = 404, description = "No such order")
  )
)]
#[instrument(name = "handler::update_order_status", skip(app_state, path, body), fields(order_id = %path.as_ref()))]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  body: web::Json<UpdateOrderStatus>,
) -> Result<HttpResponse, AppError> {
  let id = path.into_inner();
  let status: OrderStatus = body.status.parse()?;
  match db::orders::update_status(&app_state.db_pool, id, status).await? {
    Some(order) => {
      info!(%status, "Order {} status updated.", id);
      Ok(HttpResponse::Ok().json(order))
    }
    None => Err(order_not_found(id)),
  }
}
