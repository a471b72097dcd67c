//! Server-sent events decoding for streamed completions
//!
//! The decoder is fed raw body bytes in whatever pieces the transport
//! delivers and yields the JSON payload of every complete `data: ` line.
//! Lines are split on raw bytes so a multi-byte character straddling two
//! reads survives intact.

use serde_json::Value;

const DATA_PREFIX: &str = "data: ";
const DONE_SENTINEL: &str = "[DONE]";

/// Incremental SSE line decoder
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a piece of the body, returning every payload completed by it
    ///
    /// The trailing partial line is held back until a later piece ends it.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Value> {
        self.buffer.extend_from_slice(bytes);

        let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.buffer.drain(..=last_newline).collect();
        complete
            .split(|&b| b == b'\n')
            .filter_map(|line| self.decode_line(line))
            .collect()
    }

    /// Whether the end-of-stream sentinel has been seen
    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// End of input; any unterminated line is dropped
    pub fn finish(self) {
        if !self.buffer.is_empty() {
            tracing::debug!(bytes = self.buffer.len(), "discarding unterminated stream line");
        }
    }

    fn decode_line(&mut self, line: &[u8]) -> Option<Value> {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            return None;
        }

        let line = String::from_utf8_lossy(line);
        let payload = line.strip_prefix(DATA_PREFIX)?;

        if payload.trim() == DONE_SENTINEL {
            tracing::debug!("stream reported done");
            self.done = true;
            return None;
        }

        match serde_json::from_str(payload) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed stream line");
                None
            }
        }
    }
}
