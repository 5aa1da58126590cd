// commerce_server/src/web/edge.rs

//! The frontend edge hop: a thin passthrough from the browser to the backend
//! chat route, plus a connectivity probe.

use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse};
use futures_util::TryStreamExt;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::EdgeConfig;

const DEFAULT_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

#[derive(Clone)]
pub struct EdgeState {
  pub client: reqwest::Client,
  pub backend_url: String,
}

impl EdgeState {
  pub fn new(config: &EdgeConfig) -> reqwest::Result<Self> {
    let client = reqwest::Client::builder().connect_timeout(Duration::from_secs(10)).build()?;
    Ok(Self {
      client,
      backend_url: config.backend_url.clone(),
    })
  }
}

fn status_from(status: reqwest::StatusCode) -> StatusCode {
  StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY)
}

fn header_or(headers: &reqwest::header::HeaderMap, name: reqwest::header::HeaderName, default: &str) -> String {
  headers
    .get(name)
    .and_then(|v| v.to_str().ok())
    .unwrap_or(default)
    .to_string()
}

fn proxy_failure(message: impl std::fmt::Display) -> HttpResponse {
  HttpResponse::InternalServerError().json(json!({
    "error": "Failed to proxy chat request",
    "message": message.to_string(),
  }))
}

#[instrument(name = "edge::chat", skip(edge, body))]
pub async fn edge_chat_handler(edge: web::Data<EdgeState>, body: web::Bytes) -> HttpResponse {
  let payload: Value = match serde_json::from_slice(&body) {
    Ok(v) => v,
    Err(e) => {
      error!("Chat proxy received an unreadable body: {}", e);
      return proxy_failure(e);
    }
  };
  let messages = match payload.get("messages") {
    Some(Value::Array(messages)) => messages.clone(),
    _ => {
      warn!("Chat request without a messages array.");
      return HttpResponse::BadRequest().json(json!({ "error": "Messages array is required" }));
    }
  };
  info!(messages = messages.len(), "Forwarding chat request to backend.");

  let url = format!("{}/api/chat", edge.backend_url);
  let upstream = match edge.client.post(&url).json(&json!({ "messages": messages })).send().await {
    Ok(resp) => resp,
    Err(e) => {
      error!(%url, "Chat proxy transport failure: {}", e);
      return proxy_failure(e);
    }
  };

  let status = status_from(upstream.status());
  if !upstream.status().is_success() {
    let details = upstream.text().await.unwrap_or_default();
    warn!(%status, %details, "Backend rejected chat request.");
    return HttpResponse::build(status).json(json!({
      "error": "Failed to process chat request",
      "details": details,
    }));
  }

  let headers = upstream.headers();
  let content_type = header_or(headers, reqwest::header::CONTENT_TYPE, DEFAULT_CONTENT_TYPE);
  let cache_control = header_or(headers, reqwest::header::CACHE_CONTROL, "no-cache");
  let connection = header_or(headers, reqwest::header::CONNECTION, "keep-alive");

  info!("Streaming backend response to client.");
  let body = upstream.bytes_stream().inspect_err(|e| warn!("Backend stream broke: {}", e));
  HttpResponse::Ok()
    .insert_header(("Content-Type", content_type))
    .insert_header(("Cache-Control", cache_control))
    .insert_header(("Connection", connection))
    .insert_header(("X-Accel-Buffering", "no"))
    .streaming(body)
}

#[instrument(name = "edge::test_backend", skip(edge))]
pub async fn edge_test_backend_handler(edge: web::Data<EdgeState>) -> HttpResponse {
  let url = format!("{}/api/test", edge.backend_url);
  info!(%url, "Probing backend.");

  let response = match edge.client.get(&url).send().await {
    Ok(resp) => resp,
    Err(e) => {
      error!("Backend probe failed: {}", e);
      return HttpResponse::InternalServerError().json(json!({
        "error": "Failed to connect to backend",
        "backend_url": edge.backend_url,
        "message": e.to_string(),
      }));
    }
  };

  let status = response.status();
  if !status.is_success() {
    let details = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), %details, "Backend probe got an error status.");
    return HttpResponse::InternalServerError().json(json!({
      "error": "Backend not accessible",
      "status": status.as_u16(),
      "url": url,
      "details": details,
    }));
  }

  match response.json::<Value>().await {
    Ok(data) => HttpResponse::Ok().json(json!({
      "success": true,
      "backend_url": edge.backend_url,
      "backend_response": data,
    })),
    Err(e) => HttpResponse::InternalServerError().json(json!({
      "error": "Failed to connect to backend",
      "backend_url": edge.backend_url,
      "message": e.to_string(),
    })),
  }
}

pub fn configure_edge_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .route("/api/chat", web::post().to(edge_chat_handler))
    .route("/api/test-backend", web::get().to(edge_test_backend_handler));
}
