// commerce_server/src/relay/utf8.rs

/// Incremental UTF-8 decoder. Bytes of a multi-byte character split across
/// chunks are held back until the rest arrives. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
  pending: Vec<u8>,
}

impl Utf8Decoder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Decodes as much of `pending + chunk` as forms complete characters.
  pub fn decode(&mut self, chunk: &[u8]) -> String {
    let mut input = std::mem::take(&mut self.pending);
    input.extend_from_slice(chunk);

    let mut out = String::with_capacity(input.len());
    let mut rest: &[u8] = &input;
    loop {
      match std::str::from_utf8(rest) {
        Ok(valid) => {
          out.push_str(valid);
          break;
        }
        Err(e) => {
          let (valid, after) = rest.split_at(e.valid_up_to());
          out.push_str(&String::from_utf8_lossy(valid));
          match e.error_len() {
            Some(bad) => {
              out.push(char::REPLACEMENT_CHARACTER);
              rest = &after[bad..];
            }
            None => {
              // Incomplete sequence at the end: wait for more bytes.
              self.pending = after.to_vec();
              break;
            }
          }
        }
      }
    }
    out
  }

  /// Flushes a trailing incomplete sequence as a single U+FFFD.
  pub fn finish(&mut self) -> String {
    if self.pending.is_empty() {
      String::new()
    } else {
      self.pending.clear();
      char::REPLACEMENT_CHARACTER.to_string()
    }
  }

  pub fn has_pending(&self) -> bool {
    !self.pending.is_empty()
  }
}
