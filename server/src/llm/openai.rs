// commerce_server/src/llm/openai.rs

//! OpenAI-compatible streaming chat completions client.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use super::{ChatModel, ChatRequest, CompletionEvent, CompletionStream, LlmError, LlmMessage, LlmRole};
use crate::config::AppConfig;
use crate::relay::{SseLineParser, Utf8Decoder};

pub struct OpenAiClient {
  client: Client,
  api_key: Option<String>,
  model: String,
  base_url: String,
}

impl OpenAiClient {
  pub fn new(api_key: Option<String>, model: impl Into<String>, base_url: impl Into<String>) -> Self {
    Self {
      client: Client::new(),
      api_key,
      model: model.into(),
      base_url: base_url.into().trim_end_matches('/').to_string(),
    }
  }

  pub fn from_config(config: &AppConfig) -> Self {
    Self::new(
      config.openai_api_key.clone(),
      config.openai_model.clone(),
      config.openai_base_url.clone(),
    )
  }
}

#[derive(Serialize)]
struct WireMessage<'a> {
  role: LlmRole,
  #[serde(skip_serializing_if = "Option::is_none")]
  content: Option<&'a str>,
  #[serde(skip_serializing_if = "Option::is_none")]
  tool_call_id: Option<&'a str>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  tool_calls: Vec<Value>,
}

impl<'a> From<&'a LlmMessage> for WireMessage<'a> {
  fn from(m: &'a LlmMessage) -> Self {
    let tool_calls: Vec<Value> = m
      .tool_calls
      .iter()
      .map(|tc| {
        json!({
          "id": tc.id,
          "type": "function",
          "function": { "name": tc.name, "arguments": tc.arguments },
        })
      })
      .collect();
    // Assistant turns that only call tools carry no content.
    let content = if !tool_calls.is_empty() && m.content.is_empty() {
      None
    } else {
      Some(m.content.as_str())
    };
    WireMessage {
      role: m.role,
      content,
      tool_call_id: m.tool_call_id.as_deref(),
      tool_calls,
    }
  }
}

pub(crate) fn request_body(model: &str, request: &ChatRequest) -> Value {
  let messages: Vec<WireMessage<'_>> = request.messages.iter().map(WireMessage::from).collect();
  let mut body = json!({
    "model": model,
    "messages": messages,
    "stream": true,
  });
  if let Some(temperature) = request.temperature {
    body["temperature"] = json!(temperature);
  }
  if !request.tools.is_empty() {
    let tools: Vec<Value> = request
      .tools
      .iter()
      .map(|t| {
        json!({
          "type": "function",
          "function": { "name": t.name, "description": t.description, "parameters": t.parameters },
        })
      })
      .collect();
    body["tools"] = Value::Array(tools);
  }
  body
}

#[derive(Deserialize, Debug)]
struct StreamChunk {
  #[serde(default)]
  choices: Vec<StreamChoice>,
  #[serde(default)]
  error: Option<ProviderError>,
}

#[derive(Deserialize, Debug)]
struct ProviderError {
  message: String,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
  #[serde(default)]
  delta: Option<StreamDelta>,
  #[serde(default)]
  finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
struct StreamDelta {
  #[serde(default)]
  content: Option<String>,
  #[serde(default)]
  tool_calls: Option<Vec<StreamToolCall>>,
}

#[derive(Deserialize, Debug)]
struct StreamToolCall {
  index: usize,
  #[serde(default)]
  id: Option<String>,
  #[serde(default)]
  function: Option<StreamFunction>,
}

#[derive(Deserialize, Debug)]
struct StreamFunction {
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  arguments: Option<String>,
}

/// Result of one `data:` payload.
enum PayloadOutcome {
  Events(Vec<CompletionEvent>),
  Done,
}

fn parse_payload(payload: &str) -> Result<PayloadOutcome, LlmError> {
  if payload.trim() == "[DONE]" {
    return Ok(PayloadOutcome::Done);
  }
  let chunk: StreamChunk = match serde_json::from_str(payload) {
    Ok(chunk) => chunk,
    Err(e) => {
      warn!(error = %e, "Skipping undecodable completion chunk.");
      return Ok(PayloadOutcome::Events(Vec::new()));
    }
  };
  if let Some(err) = chunk.error {
    return Err(LlmError::Provider(err.message));
  }

  let mut events = Vec::new();
  for choice in chunk.choices {
    let delta = choice.delta.unwrap_or_default();
    if let Some(content) = delta.content.filter(|c| !c.is_empty()) {
      events.push(CompletionEvent::TextDelta(content));
    }
    for tc in delta.tool_calls.unwrap_or_default() {
      let (name, arguments) = match tc.function {
        Some(f) => (f.name, f.arguments),
        None => (None, None),
      };
      events.push(CompletionEvent::ToolCallDelta {
        index: tc.index,
        id: tc.id,
        name,
        arguments,
      });
    }
    if let Some(reason) = choice.finish_reason {
      events.push(CompletionEvent::Finished { reason: Some(reason) });
    }
  }
  Ok(PayloadOutcome::Events(events))
}

/// Converts a batch of SSE payloads into stream items. The flag is set once
/// `[DONE]` or a provider error ends the stream; later payloads are dropped.
fn payload_events(payloads: Vec<String>) -> (Vec<Result<CompletionEvent, LlmError>>, bool) {
  let mut items = Vec::new();
  for payload in payloads {
    match parse_payload(&payload) {
      Ok(PayloadOutcome::Events(events)) => items.extend(events.into_iter().map(Ok)),
      Ok(PayloadOutcome::Done) => return (items, true),
      Err(e) => {
        items.push(Err(e));
        return (items, true);
      }
    }
  }
  (items, false)
}

/// Pulls `message` out of an OpenAI error body, falling back to the raw text.
fn error_message(body: &str) -> String {
  serde_json::from_str::<Value>(body)
    .ok()
    .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
    .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl ChatModel for OpenAiClient {
  fn model_name(&self) -> &str {
    &self.model
  }

  #[instrument(name = "OpenAiClient::stream", skip_all, fields(model = %self.model, messages = request.messages.len()))]
  async fn stream(&self, request: ChatRequest) -> Result<CompletionStream, LlmError> {
    let api_key = self.api_key.as_deref().ok_or(LlmError::MissingApiKey)?;
    let body = request_body(&self.model, &request);

    let response = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(api_key)
      .json(&body)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      warn!(status = status.as_u16(), "Model provider rejected request.");
      return Err(LlmError::Api {
        status: status.as_u16(),
        message: error_message(&text),
      });
    }
    debug!("Completion stream opened.");

    let mut bytes = response.bytes_stream();
    let stream = async_stream::stream! {
      let mut decoder = Utf8Decoder::new();
      let mut parser = SseLineParser::new();
      while let Some(chunk) = bytes.next().await {
        let chunk = match chunk {
          Ok(chunk) => chunk,
          Err(e) => {
            yield Err(LlmError::Http(e));
            return;
          }
        };
        let (items, stop) = payload_events(parser.push(&decoder.decode(&chunk)));
        for item in items {
          yield item;
        }
        if stop {
          return;
        }
      }
      let tail = decoder.finish();
      let mut rest = parser.push(&tail);
      rest.extend(parser.finish());
      let (items, _) = payload_events(rest);
      for item in items {
        yield item;
      }
    };
    Ok(Box::pin(stream))
  }
}
