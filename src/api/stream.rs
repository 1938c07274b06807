use crate::types::ServerEvent;
use anyhow::{anyhow, Context, Result};

/// Splits a streamed response body into newline-terminated records.
///
/// Bytes are buffered until a full record is available so multi-byte
/// characters and records split across network chunks are reassembled before
/// decoding.
#[derive(Default)]
pub struct StreamParser {
    buffer: Vec<u8>,
    start: usize,
}

impl StreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        if self.start > 0 && self.start == self.buffer.len() {
            self.buffer.clear();
            self.start = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete, non-blank record with its line terminator removed.
    pub fn next_record(&mut self) -> Result<Option<String>> {
        loop {
            let Some(offset) = self.buffer[self.start..].iter().position(|b| *b == b'\n') else {
                self.compact();
                return Ok(None);
            };
            let end = self.start + offset;
            let record = decode_line(&self.buffer[self.start..end])?;
            self.start = end + 1;
            if !record.trim().is_empty() {
                return Ok(Some(record));
            }
        }
    }

    /// Drains an unterminated trailing record once the body has ended.
    pub fn finish(&mut self) -> Result<Option<String>> {
        let rest = std::mem::take(&mut self.buffer);
        let start = std::mem::take(&mut self.start);
        let record = decode_line(&rest[start..])?;
        Ok(Some(record).filter(|record| !record.trim().is_empty()))
    }

    fn compact(&mut self) {
        if self.start > 0 {
            self.buffer.drain(..self.start);
            self.start = 0;
        }
    }
}

fn decode_line(bytes: &[u8]) -> Result<String> {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).context("stream record is not valid UTF-8")?;
    Ok(text.to_string())
}

/// Decodes one record into the assistant text it carries, if any.
///
/// Event-stream framing (`event:` lines, comments, `[DONE]`) and non-text
/// events carry nothing. A server `error` event or a malformed `data:` payload
/// is an error. Any other record is plain line-delimited text, trimmed.
pub fn decode_record(record: &str) -> Result<Option<String>> {
    if record.starts_with(':') || record.starts_with("event:") {
        return Ok(None);
    }

    let Some(data) = record.strip_prefix("data:") else {
        let text = record.trim();
        return Ok(Some(text.to_string()).filter(|text| !text.is_empty()));
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(None);
    }

    let event: ServerEvent = serde_json::from_str(data)
        .map_err(|error| anyhow!("invalid stream record: {error}: {data}"))?;
    match event {
        ServerEvent::ContentBlockDelta { delta, .. } if delta.delta_type == "text_delta" => {
            Ok(delta.text.filter(|text| !text.is_empty()))
        }
        ServerEvent::Error { error } => {
            if error.error_type.is_empty() {
                Err(anyhow!("API stream error: {}", error.message))
            } else {
                Err(anyhow!(
                    "API stream error ({}): {}",
                    error.error_type,
                    error.message
                ))
            }
        }
        _ => Ok(None),
    }
}
