// commerce_server/src/relay/consumer.rs

//! Consuming side of the relay: turns raw body chunks back into text.

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::frame::StreamFrame;
use super::sse::SseLineParser;
use super::utf8::Utf8Decoder;
use super::RelayError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
  Idle,
  Streaming,
  Done,
  Failed,
}

/// What a chunk of input produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReaderUpdate {
  /// Accumulated text after a delta.
  Text(String),
  /// Final text. Emitted once, on a `done` frame or at end of input.
  Done(String),
  /// An `error` frame arrived. No further updates follow.
  Failed(String),
}

/// Reads a chat stream chunk by chunk.
#[derive(Debug)]
pub struct ChatStreamReader {
  state: ReaderState,
  decoder: Utf8Decoder,
  parser: SseLineParser,
  text: String,
}

impl Default for ChatStreamReader {
  fn default() -> Self {
    Self::new()
  }
}

impl ChatStreamReader {
  pub fn new() -> Self {
    Self {
      state: ReaderState::Idle,
      decoder: Utf8Decoder::new(),
      parser: SseLineParser::new(),
      text: String::new(),
    }
  }

  pub fn state(&self) -> ReaderState {
    self.state
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  fn is_finished(&self) -> bool {
    matches!(self.state, ReaderState::Done | ReaderState::Failed)
  }

  pub fn feed(&mut self, chunk: &[u8]) -> Vec<ReaderUpdate> {
    if self.is_finished() {
      return Vec::new();
    }
    self.state = ReaderState::Streaming;
    let decoded = self.decoder.decode(chunk);
    let payloads = self.parser.push(&decoded);
    self.apply(payloads)
  }

  /// Ends the input. Flushes the decoder and parser, then reports the final
  /// text if no terminal frame was seen.
  pub fn finish(&mut self) -> Vec<ReaderUpdate> {
    if self.is_finished() {
      return Vec::new();
    }
    let tail = self.decoder.finish();
    let mut payloads = self.parser.push(&tail);
    payloads.extend(self.parser.finish());
    let mut updates = self.apply(payloads);
    if !self.is_finished() {
      debug!("Stream ended without a done frame.");
      self.state = ReaderState::Done;
      updates.push(ReaderUpdate::Done(self.text.clone()));
    }
    updates
  }

  fn apply(&mut self, payloads: Vec<String>) -> Vec<ReaderUpdate> {
    let mut updates = Vec::new();
    for payload in payloads {
      if self.is_finished() {
        break;
      }
      let frame = match StreamFrame::parse(&payload) {
        Ok(frame) => frame,
        Err(e) => {
          warn!(error = %e, line = %payload, "Skipping unparseable stream line.");
          continue;
        }
      };
      match frame {
        StreamFrame::Delta { content } => {
          self.text.push_str(&content);
          updates.push(ReaderUpdate::Text(self.text.clone()));
        }
        StreamFrame::Done { content } => {
          if !content.is_empty() {
            self.text = content;
          }
          self.state = ReaderState::Done;
          updates.push(ReaderUpdate::Done(self.text.clone()));
        }
        StreamFrame::Error { error } => {
          self.state = ReaderState::Failed;
          updates.push(ReaderUpdate::Failed(error));
        }
      }
    }
    updates
  }
}

/// Drains `stream` through a `ChatStreamReader`, calling `on_update` for each
/// update. Returns the final text, or the error carried by an `error` frame.
pub async fn read_chat_stream<S, E>(stream: S, mut on_update: impl FnMut(&ReaderUpdate)) -> Result<String, RelayError>
where
  S: Stream<Item = Result<Bytes, E>>,
  E: std::fmt::Display,
{
  let mut reader = ChatStreamReader::new();
  let mut stream = std::pin::pin!(stream);
  let mut outcome: Option<Result<String, RelayError>> = None;

  let mut handle = |updates: Vec<ReaderUpdate>, outcome: &mut Option<Result<String, RelayError>>| {
    for update in &updates {
      on_update(update);
      match update {
        ReaderUpdate::Done(text) => *outcome = Some(Ok(text.clone())),
        ReaderUpdate::Failed(error) => *outcome = Some(Err(RelayError::Remote(error.clone()))),
        ReaderUpdate::Text(_) => {}
      }
    }
  };

  while let Some(chunk) = stream.next().await {
    let chunk = chunk.map_err(|e| RelayError::Transport(e.to_string()))?;
    handle(reader.feed(&chunk), &mut outcome);
    if outcome.is_some() {
      break;
    }
  }
  if outcome.is_none() {
    handle(reader.finish(), &mut outcome);
  }
  outcome.unwrap_or_else(|| Ok(reader.text().to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frames(frames: &[StreamFrame]) -> Vec<u8> {
    frames.iter().flat_map(|f| f.to_sse().to_vec()).collect()
  }

  #[test]
  fn accumulates_deltas_and_finishes_on_done() {
    let body = frames(&[StreamFrame::delta("Hel"), StreamFrame::delta("lo"), StreamFrame::done("Hello")]);
    let mut reader = ChatStreamReader::new();
    assert_eq!(reader.state(), ReaderState::Idle);

    let updates = reader.feed(&body);
    assert_eq!(
      updates,
      vec![
        ReaderUpdate::Text("Hel".into()),
        ReaderUpdate::Text("Hello".into()),
        ReaderUpdate::Done("Hello".into()),
      ]
    );
    assert_eq!(reader.state(), ReaderState::Done);
    assert!(reader.feed(&body).is_empty());
    assert!(reader.finish().is_empty());
  }

  #[test]
  fn survives_arbitrary_chunk_boundaries() {
    let body = frames(&[StreamFrame::delta("Café "), StreamFrame::delta("☕ ok"), StreamFrame::done("")]);
    for size in [1, 2, 3, 7, 13] {
      let mut reader = ChatStreamReader::new();
      let mut last = None;
      for chunk in body.chunks(size) {
        for update in reader.feed(chunk) {
          last = Some(update);
        }
      }
      assert_eq!(last, Some(ReaderUpdate::Done("Café ☕ ok".into())), "chunk size {}", size);
    }
  }

  #[test]
  fn error_frame_fails_reader() {
    let body = frames(&[StreamFrame::delta("partial"), StreamFrame::error("upstream died")]);
    let mut reader = ChatStreamReader::new();
    let updates = reader.feed(&body);
    assert_eq!(updates.last(), Some(&ReaderUpdate::Failed("upstream died".into())));
    assert_eq!(reader.state(), ReaderState::Failed);
    assert_eq!(reader.text(), "partial");
  }

  #[test]
  fn skips_garbage_lines() {
    let mut reader = ChatStreamReader::new();
    let updates = reader.feed(b"data: not json\n\ndata: {\"type\":\"delta\",\"content\":\"x\"}\n\n");
    assert_eq!(updates, vec![ReaderUpdate::Text("x".into())]);
  }

  #[test]
  fn finish_without_done_reports_accumulated_text() {
    let mut reader = ChatStreamReader::new();
    // Last frame lacks its trailing newlines.
    reader.feed(b"data: {\"type\":\"delta\",\"content\":\"a\"}\n\ndata: {\"type\":\"delta\",\"content\":\"b\"}");
    let updates = reader.finish();
    assert_eq!(updates, vec![ReaderUpdate::Text("ab".into()), ReaderUpdate::Done("ab".into())]);
  }

  #[tokio::test]
  async fn read_chat_stream_collects_final_text() {
    let body = frames(&[StreamFrame::delta("one "), StreamFrame::delta("two"), StreamFrame::done("one two")]);
    let chunks: Vec<Result<Bytes, std::io::Error>> = body.chunks(5).map(|c| Ok(Bytes::copy_from_slice(c))).collect();
    let mut seen = 0;
    let text = read_chat_stream(futures::stream::iter(chunks), |_| seen += 1).await.unwrap();
    assert_eq!(text, "one two");
    assert_eq!(seen, 3);
  }

  #[tokio::test]
  async fn read_chat_stream_surfaces_error_frame() {
    let body = frames(&[StreamFrame::error("nope")]);
    let chunks: Vec<Result<Bytes, std::io::Error>> = vec![Ok(Bytes::from(body))];
    let err = read_chat_stream(futures::stream::iter(chunks), |_| {}).await.unwrap_err();
    assert!(matches!(err, RelayError::Remote(m) if m == "nope"));
  }
}
