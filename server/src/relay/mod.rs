// commerce_server/src/relay/mod.rs

//! The streaming chat relay: SSE framing on the producing side and the
//! incremental decoder/parser/reader on the consuming side.

pub mod consumer;
pub mod frame;
pub mod producer;
pub mod sse;
pub mod utf8;

use thiserror::Error;

pub use consumer::{read_chat_stream, ChatStreamReader, ReaderState, ReaderUpdate};
pub use frame::StreamFrame;
pub use producer::{frame_stream, sse_response, NO_RESPONSE};
pub use sse::SseLineParser;
pub use utf8::Utf8Decoder;

#[derive(Debug, Error)]
pub enum RelayError {
  /// The producer sent an `error` frame.
  #[error("Stream reported an error: {0}")]
  Remote(String),

  #[error("Transport error while reading stream: {0}")]
  Transport(String),
}
