use crate::errors::UpstreamError;

/// Payload token that ends an upstream stream.
pub(crate) const DONE_MARKER: &str = "[DONE]";

/// Largest unterminated line held between chunks.
pub(crate) const MAX_LINE_BYTES: usize = 1 << 20;

/// Splits a chunked byte stream into newline-delimited lines.
///
/// A line that is not terminated inside the current chunk is held until a
/// later chunk completes it, up to [`MAX_LINE_BYTES`].
#[derive(Default)]
pub(crate) struct LineDecoder {
    buf: Vec<u8>,
}

impl LineDecoder {
    /// Returns the lines completed by `chunk`.
    pub fn push_chunk(&mut self, chunk: &[u8]) -> Result<Vec<String>, UpstreamError> {
        let Some(last) = chunk.iter().rposition(|b| *b == b'\n') else {
            self.buf.extend_from_slice(chunk);
            self.check_tail()?;
            return Ok(Vec::new());
        };
        self.buf.extend_from_slice(&chunk[..last]);
        let complete = std::mem::replace(&mut self.buf, chunk[last + 1..].to_vec());
        self.check_tail()?;
        Ok(complete.split(|b| *b == b'\n').map(decode_line).collect())
    }

    fn check_tail(&mut self) -> Result<(), UpstreamError> {
        if self.buf.len() > MAX_LINE_BYTES {
            self.buf.clear();
            return Err(UpstreamError::protocol(format!(
                "stream line exceeds {MAX_LINE_BYTES} bytes"
            )));
        }
        Ok(())
    }

    /// Returns the unterminated tail, if any, and empties the buffer.
    pub fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.buf);
        Some(decode_line(&rest))
    }

    /// Discards buffered bytes.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches('\r')
        .to_string()
}

/// Meaning of one upstream line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Frame {
    /// Incremental content fragment.
    Delta(String),
    /// End-of-stream marker.
    Done,
    /// Upstream reported an error inside the stream.
    Failed(String),
    /// Comment, keep-alive, non-data field, unparseable payload or empty delta.
    Skip,
}

pub(crate) fn classify_line(line: &str) -> Frame {
    let Some(rest) = line.strip_prefix("data:") else {
        return Frame::Skip;
    };
    let token = rest.strip_prefix(' ').unwrap_or(rest);
    if token.trim() == DONE_MARKER {
        return Frame::Done;
    }
    let Ok(value) = serde_json::from_str::<serde_json::Value>(token) else {
        return Frame::Skip;
    };
    if let Some(error) = value.get("error") {
        let message = error
            .get("message")
            .and_then(|v| v.as_str())
            .or_else(|| error.as_str())
            .unwrap_or("upstream stream error");
        return Frame::Failed(message.to_string());
    }
    match first_choice(&value)
        .and_then(|choice| choice.get("delta"))
        .and_then(|delta| delta.get("content"))
        .and_then(|v| v.as_str())
    {
        Some(content) if !content.is_empty() => Frame::Delta(content.to_string()),
        _ => Frame::Skip,
    }
}

/// Reads `choices[0].message.content` from a non-streaming response.
pub(crate) fn extract_message_content(response: &serde_json::Value) -> Option<String> {
    first_choice(response)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(ToOwned::to_owned)
}

fn first_choice(value: &serde_json::Value) -> Option<&serde_json::Value> {
    value.get("choices")?.as_array()?.first()
}
