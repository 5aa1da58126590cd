// commerce_server/src/relay/frame.rs

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A backend-to-browser event, encoded as `data: <json>\n\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StreamFrame {
  Delta { content: String },
  Done { content: String },
  Error { error: String },
}

impl StreamFrame {
  pub fn delta(content: impl Into<String>) -> Self {
    StreamFrame::Delta { content: content.into() }
  }

  pub fn done(content: impl Into<String>) -> Self {
    StreamFrame::Done { content: content.into() }
  }

  pub fn error(error: impl Into<String>) -> Self {
    StreamFrame::Error { error: error.into() }
  }

  pub fn is_terminal(&self) -> bool {
    !matches!(self, StreamFrame::Delta { .. })
  }

  pub fn to_sse(&self) -> Bytes {
    let json = serde_json::to_string(self)
      .unwrap_or_else(|_| r#"{"type":"error","error":"Failed to encode stream frame"}"#.to_string());
    Bytes::from(format!("data: {}\n\n", json))
  }

  pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
    serde_json::from_str(payload)
  }
}
