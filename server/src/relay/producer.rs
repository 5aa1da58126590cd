// commerce_server/src/relay/producer.rs

//! Producing side of the relay: agent events in, SSE frames out.

use actix_web::http::header;
use actix_web::HttpResponse;
use bytes::Bytes;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::frame::StreamFrame;
use crate::agent::AgentEvent;

pub const NO_RESPONSE: &str = "No response generated";

/// Converts agent events into encoded frames. Text deltas are forwarded as
/// they arrive and concatenated for the final `done` frame. The stream ends
/// after one terminal frame. Dropping it closes `events`, which the agent
/// observes as a disconnected client.
pub fn frame_stream(mut events: mpsc::Receiver<AgentEvent>) -> impl Stream<Item = Result<Bytes, actix_web::Error>> {
  async_stream::stream! {
    let mut full_text = String::new();
    let mut deltas = 0usize;
    loop {
      match events.recv().await {
        Some(AgentEvent::TextDelta(content)) => {
          if content.is_empty() {
            continue;
          }
          deltas += 1;
          full_text.push_str(&content);
          yield Ok::<_, actix_web::Error>(StreamFrame::delta(content).to_sse());
        }
        Some(AgentEvent::ToolStarted { name, arguments }) => {
          info!(tool = %name, %arguments, "Tool started.");
        }
        Some(AgentEvent::ToolFinished { name, output }) => {
          debug!(tool = %name, output_len = output.len(), "Tool finished.");
        }
        Some(AgentEvent::Completed { content }) => {
          let content = if !content.is_empty() {
            content
          } else if !full_text.is_empty() {
            full_text.clone()
          } else {
            NO_RESPONSE.to_string()
          };
          info!(deltas, content_len = content.len(), "Stream completed.");
          yield Ok::<_, actix_web::Error>(StreamFrame::done(content).to_sse());
          break;
        }
        Some(AgentEvent::Failed { error }) => {
          warn!(deltas, %error, "Stream failed after start.");
          yield Ok::<_, actix_web::Error>(StreamFrame::error(error).to_sse());
          break;
        }
        None => {
          warn!(deltas, "Agent task ended without a terminal event.");
          yield Ok::<_, actix_web::Error>(StreamFrame::error("Stream ended unexpectedly").to_sse());
          break;
        }
      }
    }
  }
}

/// Wraps a frame stream in an SSE response with buffering disabled.
pub fn sse_response<S>(frames: S) -> HttpResponse
where
  S: Stream<Item = Result<Bytes, actix_web::Error>> + 'static,
{
  HttpResponse::Ok()
    .insert_header((header::CONTENT_TYPE, "text/event-stream; charset=utf-8"))
    .insert_header((header::CACHE_CONTROL, "no-cache"))
    .insert_header((header::CONNECTION, "keep-alive"))
    .insert_header(("X-Accel-Buffering", "no"))
    .streaming(frames)
}

#[cfg(test)]
mod tests {
  use super::*;
  use futures::StreamExt;

  async fn collect(events: Vec<AgentEvent>, close_early: bool) -> Vec<StreamFrame> {
    let (tx, rx) = mpsc::channel(16);
    for event in events {
      tx.send(event).await.unwrap();
    }
    // The sender stays open unless the test closes it, so only a terminal event ends the stream.
    let open_sender = if close_early {
      drop(tx);
      None
    } else {
      Some(tx)
    };
    let encoded: Vec<Bytes> = frame_stream(rx).map(|b| b.unwrap()).collect().await;
    drop(open_sender);
    encoded
      .iter()
      .map(|b| {
        let text = std::str::from_utf8(b).unwrap();
        let json = text.strip_prefix("data: ").unwrap().strip_suffix("\n\n").unwrap();
        StreamFrame::parse(json).unwrap()
      })
      .collect()
  }

  #[tokio::test]
  async fn deltas_then_done_with_full_text() {
    let frames = collect(
      vec![
        AgentEvent::TextDelta("Hi ".into()),
        AgentEvent::ToolStarted {
          name: "search_products".into(),
          arguments: "{}".into(),
        },
        AgentEvent::ToolFinished {
          name: "search_products".into(),
          output: "[]".into(),
        },
        AgentEvent::TextDelta("there".into()),
        AgentEvent::Completed { content: String::new() },
      ],
      false,
    )
    .await;
    assert_eq!(
      frames,
      vec![StreamFrame::delta("Hi "), StreamFrame::delta("there"), StreamFrame::done("Hi there")]
    );
  }

  #[tokio::test]
  async fn empty_completion_reports_no_response() {
    let frames = collect(vec![AgentEvent::Completed { content: String::new() }], false).await;
    assert_eq!(frames, vec![StreamFrame::done(NO_RESPONSE)]);
  }

  #[tokio::test]
  async fn failure_becomes_single_error_frame() {
    let frames = collect(
      vec![
        AgentEvent::TextDelta("par".into()),
        AgentEvent::Failed { error: "model timed out".into() },
        AgentEvent::TextDelta("ignored".into()),
      ],
      false,
    )
    .await;
    assert_eq!(frames, vec![StreamFrame::delta("par"), StreamFrame::error("model timed out")]);
  }

  #[tokio::test]
  async fn closed_channel_without_terminal_event_is_error() {
    let frames = collect(vec![AgentEvent::TextDelta("a".into())], true).await;
    assert_eq!(frames, vec![StreamFrame::delta("a"), StreamFrame::error("Stream ended unexpectedly")]);
  }
}
