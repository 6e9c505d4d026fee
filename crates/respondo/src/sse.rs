// Server-Sent Events framing
//
// Frames on this wire look like:
//
//   event: response.output_text.delta
//   data: {"type":"response.output_text.delta","delta":"Hi"}
//   <blank line>
//
// The decoder is fed raw bytes in whatever chunks the transport produces;
// frame boundaries never align with read boundaries.

use std::collections::VecDeque;
use std::str::Utf8Error;

use tracing::warn;

/// One decoded SSE frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field, if the frame carried one
    pub event: Option<String>,
    /// All `data:` lines joined with `\n`
    pub data: String,
}

/// Incremental SSE frame decoder over a byte stream
///
/// Uses a VecDeque so partial reads accumulate without re-copying. Comment
/// lines (`:` prefix, used as keep-alives) are ignored; a frame containing
/// invalid UTF-8 is dropped with a diagnostic and decoding continues.
pub struct SseFrameBuffer {
    buffer: VecDeque<u8>,
    event: Option<String>,
    data_lines: Vec<String>,
    dropped: bool,
}

impl SseFrameBuffer {
    /// Create a new decoder with the given byte capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            event: None,
            data_lines: Vec::new(),
            dropped: false,
        }
    }

    /// Add bytes to the buffer
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend(bytes);
    }

    /// Extract the next complete frame, if one is buffered
    ///
    /// Returns None once every complete line in the buffer has been
    /// consumed; call `extend` with more bytes and try again.
    pub fn next_frame(&mut self) -> Option<SseFrame> {
        loop {
            let line = match self.next_line()? {
                Ok(line) => line,
                Err(e) => {
                    // Poisons the whole frame, not just this line
                    warn!(error = %e, "invalid UTF-8 in SSE frame");
                    self.dropped = true;
                    continue;
                }
            };

            if line.is_empty() {
                if self.dropped {
                    warn!("dropping malformed SSE frame");
                    self.reset_frame();
                    continue;
                }
                if self.event.is_none() && self.data_lines.is_empty() {
                    // Keep-alive comments or stray blank lines
                    continue;
                }
                let frame = SseFrame {
                    event: self.event.take(),
                    data: self.data_lines.join("\n"),
                };
                self.data_lines.clear();
                return Some(frame);
            }

            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, rest)) => (field, rest.strip_prefix(' ').unwrap_or(rest)),
                None => (line.as_str(), ""),
            };

            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data_lines.push(value.to_string()),
                // id and retry are legal SSE fields this wire never uses
                _ => {}
            }
        }
    }

    /// Next line (up to `\n`), with the trailing `\r\n` or `\n` removed
    fn next_line(&mut self) -> Option<Result<String, Utf8Error>> {
        let newline_pos = self.buffer.iter().position(|&b| b == b'\n')?;

        let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();

        match std::str::from_utf8(&line_bytes) {
            Ok(line_str) => Some(Ok(line_str.trim_end_matches(['\n', '\r']).to_string())),
            Err(e) => Some(Err(e)),
        }
    }

    fn reset_frame(&mut self) {
        self.event = None;
        self.data_lines.clear();
        self.dropped = false;
    }

    /// Current buffered byte count
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the byte buffer is empty
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_frame() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b"event: response.created\ndata: {\"a\":1}\n\n");

        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.event.as_deref(), Some("response.created"));
        assert_eq!(frame.data, "{\"a\":1}");
        assert!(buffer.next_frame().is_none());
    }

    #[test]
    fn test_frame_split_across_reads() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b"event: response.out");
        assert!(buffer.next_frame().is_none());

        buffer.extend(b"put_text.delta\ndata: {\"delta\":");
        assert!(buffer.next_frame().is_none());

        buffer.extend(b"\"Hi\"}\n\n");
        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.event.as_deref(), Some("response.output_text.delta"));
        assert_eq!(frame.data, "{\"delta\":\"Hi\"}");
    }

    #[test]
    fn test_byte_at_a_time() {
        let raw = b"event: e\ndata: d\n\nevent: e2\ndata: d2\n\n";
        let mut buffer = SseFrameBuffer::with_capacity(8);

        let mut frames = Vec::new();
        for &byte in raw.iter() {
            buffer.extend(&[byte]);
            while let Some(frame) = buffer.next_frame() {
                frames.push(frame);
            }
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, "d");
        assert_eq!(frames[1].data, "d2");
    }

    #[test]
    fn test_comment_keepalive_is_skipped() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b": OPENROUTER PROCESSING\n\ndata: real\n\n");

        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.data, "real");
        assert!(buffer.next_frame().is_none());
    }

    #[test]
    fn test_multiple_data_lines_join() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b"data: line1\ndata: line2\n\n");

        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.data, "line1\nline2");
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b"event: e\r\ndata: d\r\n\r\n");

        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.event.as_deref(), Some("e"));
        assert_eq!(frame.data, "d");
    }

    #[test]
    fn test_invalid_utf8_drops_frame_only() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b"data: \xff\xfe\n\ndata: after\n\n");

        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.data, "after");
    }

    #[test]
    fn test_data_without_event_field() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b"data: [DONE]\n\n");

        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.event, None);
        assert_eq!(frame.data, "[DONE]");
    }

    #[test]
    fn test_no_space_after_colon() {
        let mut buffer = SseFrameBuffer::with_capacity(256);

        buffer.extend(b"data:tight\n\n");

        let frame = buffer.next_frame().unwrap();
        assert_eq!(frame.data, "tight");
    }
}
