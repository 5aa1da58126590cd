// commerce_server/src/bin/chat_probe.rs

//! Sends one chat message and prints the streamed reply as it arrives.
//!
//! Usage: `chat_probe [--url http://localhost:3001/api/chat] <message>...`

use anyhow::{bail, Context};
use futures_util::TryStreamExt;
use serde_json::json;
use std::io::Write;

use commerce_server::relay::{read_chat_stream, ReaderUpdate};
use commerce_server::telemetry;

const DEFAULT_URL: &str = "http://localhost:3001/api/chat";

fn parse_args() -> anyhow::Result<(String, String)> {
  let mut url = DEFAULT_URL.to_string();
  let mut words = Vec::new();
  let mut args = std::env::args().skip(1);
  while let Some(arg) = args.next() {
    if arg == "--url" {
      url = args.next().context("--url needs a value")?;
    } else {
      words.push(arg);
    }
  }
  if words.is_empty() {
    bail!("usage: chat_probe [--url URL] <message>...");
  }
  Ok((url, words.join(" ")))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  telemetry::init_tracing();
  let (url, message) = parse_args()?;

  let response = reqwest::Client::new()
    .post(&url)
    .json(&json!({ "messages": [{ "role": "user", "content": message }] }))
    .send()
    .await
    .with_context(|| format!("POST {}", url))?;

  let status = response.status();
  if !status.is_success() {
    let body = response.text().await.unwrap_or_default();
    bail!("{} returned {}: {}", url, status, body);
  }

  let mut printed = 0usize;
  let stdout = std::io::stdout();
  let text = read_chat_stream(response.bytes_stream().map_err(anyhow::Error::from), |update| {
    if let ReaderUpdate::Text(accumulated) = update {
      let mut out = stdout.lock();
      let _ = out.write_all(accumulated[printed..].as_bytes());
      let _ = out.flush();
      printed = accumulated.len();
    }
  })
  .await?;

  if printed == 0 {
    println!("{}", text);
  } else {
    println!();
  }
  Ok(())
}
