// commerce_server/src/relay/sse.rs

/// Line-oriented SSE parser. Feed decoded text with `push`; every complete
/// `data:` line yields its payload. Comments (`:`), blank lines and other
/// fields are skipped. `\r\n` line endings are accepted.
#[derive(Debug, Default)]
pub struct SseLineParser {
  buffer: String,
}

impl SseLineParser {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&mut self, text: &str) -> Vec<String> {
    self.buffer.push_str(text);
    let mut payloads = Vec::new();
    while let Some(pos) = self.buffer.find('\n') {
      let line: String = self.buffer.drain(..=pos).collect();
      if let Some(payload) = data_payload(&line) {
        payloads.push(payload);
      }
    }
    payloads
  }

  /// Treats any unterminated trailing text as a final line.
  pub fn finish(&mut self) -> Vec<String> {
    let line = std::mem::take(&mut self.buffer);
    data_payload(&line).into_iter().collect()
  }
}

fn data_payload(line: &str) -> Option<String> {
  let line = line.trim_end_matches(['\n', '\r']);
  let value = line.strip_prefix("data:")?;
  let value = value.strip_prefix(' ').unwrap_or(value);
  if value.is_empty() {
    None
  } else {
    Some(value.to_string())
  }
}
