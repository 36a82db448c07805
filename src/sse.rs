//! Server-Sent Events (SSE) frame decoding.
//!
//! The chat backend streams a reply as blank-line separated frames:
//! ```text
//! data: Hello
//!
//! data: world
//!
//! data: [DONE]
//! ```
//!
//! Everything in this module is synchronous and free of I/O.
//! [`crate::stream::DeltaStream`] feeds it with the chunks it reads from the
//! HTTP body.

use itertools::Itertools;

/// Separator between two event frames.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Field prefix of the only lines that carry payload.
pub const DATA_PREFIX: &str = "data:";

/// Delta value the server sends to close the stream.
pub const DONE_MARKER: &str = "[DONE]";

/// Incremental UTF-8 decoder.
///
/// A chunk boundary can fall in the middle of a multi-byte character; the
/// incomplete tail is held back until the next chunk completes it. Invalid
/// sequences decode to U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode as much of `pending + chunk` as forms complete characters.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut start = 0;

        loop {
            match std::str::from_utf8(&bytes[start..]) {
                Ok(s) => {
                    out.push_str(s);
                    start = bytes.len();
                    break;
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&bytes[start..valid_end]));

                    match e.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Incomplete sequence at the end, wait for more bytes
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending = bytes[start..].to_vec();
        out
    }

    /// Flush at end of input. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }

    /// Number of bytes held back waiting for the rest of a character.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Turns raw body chunks into deltas.
///
/// `buffer` always holds the part of the stream that has not yet been
/// classified into a complete frame. Once the [`DONE_MARKER`] frame is seen
/// the decoder is finished and ignores any further input.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    utf8: Utf8Decoder,
    buffer: String,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the deltas of every frame it completes, in
    /// stream order.
    ///
    /// Frames without `data:` lines are skipped. Frames following the done
    /// marker are discarded.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        if self.done {
            return Vec::new();
        }

        let text = self.utf8.decode(chunk);
        self.buffer.push_str(&text);

        let mut deltas = Vec::new();
        let mut start = 0;

        while let Some(pos) = self.buffer[start..].find(FRAME_DELIMITER) {
            let delta = parse_frame(&self.buffer[start..start + pos]);
            start += pos + FRAME_DELIMITER.len();

            if is_done_marker(&delta) {
                self.done = true;
                break;
            }

            if !delta.is_empty() {
                deltas.push(delta);
            }
        }

        if self.done {
            self.buffer.clear();
        } else {
            self.buffer.drain(..start);
        }

        deltas
    }

    /// Whether the done marker has been seen.
    pub fn is_finished(&self) -> bool {
        self.done
    }

    /// Text received but not yet part of a complete frame.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Consume whatever is left at end of input and return it.
    ///
    /// An unterminated trailing frame never produces a delta; the remainder
    /// is returned only so the caller can report it.
    pub fn finish(&mut self) -> String {
        let tail = self.utf8.finish();
        self.buffer.push_str(&tail);
        std::mem::take(&mut self.buffer)
    }
}

/// Extract the delta of one event frame.
///
/// Keeps the `data:` lines, joins their values with a newline and trims the
/// result. A frame with no `data:` line yields an empty string.
///
/// # Example
/// ```
/// use chatmem::sse::parse_frame;
///
/// assert_eq!(parse_frame("event: message\ndata: first\ndata: second"), "first\nsecond");
/// assert_eq!(parse_frame(": keep-alive"), "");
/// ```
pub fn parse_frame(frame: &str) -> String {
    frame
        .split('\n')
        .filter_map(parse_sse_line)
        .join("\n")
        .trim()
        .to_string()
}

/// Parse an SSE line to extract the data portion.
///
/// Strips the `data:` prefix and at most one following space. Lines with any
/// other field name (or none) yield `None`.
///
/// # Example
/// ```
/// use chatmem::sse::parse_sse_line;
///
/// assert_eq!(parse_sse_line("data: hello"), Some("hello"));
/// assert_eq!(parse_sse_line("data:hello"), Some("hello"));
/// assert_eq!(parse_sse_line("id: 7"), None);
/// ```
pub fn parse_sse_line(line: &str) -> Option<&str> {
    let value = line.trim_end_matches('\r').strip_prefix(DATA_PREFIX)?;
    Some(value.strip_prefix(' ').unwrap_or(value))
}

/// Check if a delta is the end-of-stream marker.
///
/// # Example
/// ```
/// use chatmem::sse::is_done_marker;
///
/// assert!(is_done_marker("[DONE]"));
/// assert!(!is_done_marker(""));
/// assert!(!is_done_marker("[DONE] and more"));
/// ```
pub fn is_done_marker(data: &str) -> bool {
    data == DONE_MARKER
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_chunks(chunks: &[&[u8]]) -> Vec<String> {
        let mut decoder = FrameDecoder::new();
        chunks
            .iter()
            .flat_map(|chunk| decoder.feed(chunk))
            .collect()
    }

    #[test]
    fn test_parse_sse_line() {
        assert_eq!(parse_sse_line("data: hello"), Some("hello"));
        assert_eq!(parse_sse_line("data:hello"), Some("hello"));
        assert_eq!(parse_sse_line("data:  two spaces"), Some(" two spaces"));
        assert_eq!(parse_sse_line("data: crlf\r"), Some("crlf"));
        assert_eq!(parse_sse_line("data:"), Some(""));
        assert_eq!(parse_sse_line("event: message"), None);
        assert_eq!(parse_sse_line(": comment"), None);
        assert_eq!(parse_sse_line(" data: indented"), None);
        assert_eq!(parse_sse_line(""), None);
    }

    #[test]
    fn test_is_done_marker() {
        assert!(is_done_marker("[DONE]"));
        assert!(!is_done_marker(""));
        assert!(!is_done_marker("[done]"));
        assert!(!is_done_marker("data: [DONE]"));
    }

    #[test]
    fn test_parse_frame_joins_data_lines() {
        assert_eq!(parse_frame("data: line one\ndata: line two"), "line one\nline two");
        assert_eq!(parse_frame("id: 1\ndata:  padded  \nretry: 10"), "padded");
        assert_eq!(parse_frame("data:\ndata: after empty"), "after empty");
    }

    #[test]
    fn test_parse_frame_without_data_is_empty() {
        assert_eq!(parse_frame(""), "");
        assert_eq!(parse_frame(": ping"), "");
        assert_eq!(parse_frame("event: heartbeat\nid: 3"), "");
    }

    #[test]
    fn test_feed_single_chunk() {
        let deltas = decode_chunks(&[b"data: Hello\n\ndata: world\n\ndata: [DONE]\n\n"]);
        assert_eq!(deltas, vec!["Hello", "world"]);
    }

    #[test]
    fn test_feed_split_inside_line() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"data: He").is_empty());
        assert_eq!(decoder.buffered(), "data: He");
        assert_eq!(decoder.feed(b"llo\n\ndata: [DONE]\n\n"), vec!["Hello"]);
        assert!(decoder.is_finished());
    }

    #[test]
    fn test_buffer_keeps_unclassified_suffix() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(b"data: a\n\ndata: b\n"), vec!["a"]);
        assert_eq!(decoder.buffered(), "data: b\n");
        assert_eq!(decoder.feed(b"\n"), vec!["b"]);
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_extra_newline_stays_with_next_frame() {
        let mut decoder = FrameDecoder::new();
        assert_eq!(decoder.feed(b"data: a\n\n\ndata: b"), vec!["a"]);
        assert_eq!(decoder.buffered(), "\ndata: b");
    }

    #[test]
    fn test_done_marker_discards_following_frames() {
        let mut decoder = FrameDecoder::new();
        let deltas = decoder.feed(b"data: kept\n\ndata: [DONE]\n\ndata: dropped\n\n");
        assert_eq!(deltas, vec!["kept"]);
        assert!(decoder.is_finished());
        assert_eq!(decoder.buffered(), "");
        assert!(decoder.feed(b"data: late\n\n").is_empty());
    }

    #[test]
    fn test_frames_without_data_are_skipped() {
        let deltas = decode_chunks(&[b": keep-alive\n\nevent: ping\n\ndata: real\n\ndata:   \n\n"]);
        assert_eq!(deltas, vec!["real"]);
    }

    #[test]
    fn test_any_split_point_matches_single_chunk() {
        let input = "data: Grüße\n\n: comment\n\ndata: 你好\ndata: 世界 🌍\n\ndata: [DONE]\n\n";
        let bytes = input.as_bytes();
        let whole = decode_chunks(&[bytes]);
        assert_eq!(whole, vec!["Grüße", "你好\n世界 🌍"]);

        for i in 0..=bytes.len() {
            for j in i..=bytes.len() {
                let split = decode_chunks(&[&bytes[..i], &bytes[i..j], &bytes[j..]]);
                assert_eq!(split, whole, "split at {} and {}", i, j);
            }
        }
    }

    #[test]
    fn test_byte_by_byte_matches_single_chunk() {
        let input = "data: ünïcödé\n\ndata: 🦀 crab\n\n";
        let chunks: Vec<&[u8]> = input.as_bytes().chunks(1).collect();
        assert_eq!(decode_chunks(&chunks), vec!["ünïcödé", "🦀 crab"]);
    }

    #[test]
    fn test_utf8_decoder_holds_partial_sequence() {
        let crab = "🦀".as_bytes();
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&crab[..2]), "");
        assert_eq!(decoder.pending_len(), 2);
        assert_eq!(decoder.decode(&crab[2..]), "🦀");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_utf8_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"ok\xFFok"), "ok\u{FFFD}ok");
        assert_eq!(decoder.decode(&[0xE4, 0xBD]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_finish_returns_unterminated_remainder() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(b"data: never terminated").is_empty());
        assert_eq!(decoder.finish(), "data: never terminated");
        assert_eq!(decoder.buffered(), "");
    }
}
