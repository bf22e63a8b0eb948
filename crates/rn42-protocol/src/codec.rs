//! Line codec for command-mode replies.
//!
//! Replies are accumulated byte by byte as they are read from the link and cut
//! into lines at each line feed. A trailing carriage return is stripped, so
//! `"AOK\r\n"` decodes to `"AOK"`.

use bytes::{Buf, BytesMut};

use crate::error::{ProtocolError, ProtocolResult};
use crate::status::ReplyLine;

/// Default limit for a single unterminated reply line.
pub const MAX_REPLY_LENGTH: usize = 64;

/// A codec for reading reply lines.
#[derive(Debug)]
pub struct ReplyCodec {
    /// Buffer for accumulating incoming data.
    buffer: BytesMut,
    /// Longest unterminated line accepted.
    max_line: usize,
}

impl Default for ReplyCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyCodec {
    /// Create a codec with the default line limit.
    pub fn new() -> Self {
        Self::with_max_line(MAX_REPLY_LENGTH)
    }

    /// Create a codec with a custom line limit.
    pub fn with_max_line(max_line: usize) -> Self {
        ReplyCodec {
            buffer: BytesMut::with_capacity(max_line * 2),
            max_line,
        }
    }

    /// Add received data to the buffer.
    pub fn push(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Try to decode a complete line from the buffer.
    ///
    /// Returns `Ok(None)` when more data is needed. Empty lines are skipped.
    /// Fails once the buffer holds more than the line limit without a line
    /// feed; the overflowing bytes are dropped so the next call starts clean.
    pub fn decode_line(&mut self) -> ProtocolResult<Option<String>> {
        loop {
            let Some(end) = self.buffer.iter().position(|&b| b == b'\n') else {
                if self.buffer.len() > self.max_line {
                    let actual = self.buffer.len();
                    log::debug!("dropping {} bytes of unterminated reply", actual);
                    self.buffer.clear();
                    return Err(ProtocolError::ReplyTooLong {
                        max: self.max_line,
                        actual,
                    });
                }
                return Ok(None);
            };

            let mut line = self.buffer.split_to(end);
            self.buffer.advance(1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            if line.is_empty() {
                continue;
            }

            let text = String::from_utf8_lossy(&line).to_string();
            log::trace!("reply line: {:?}", text);
            return Ok(Some(text));
        }
    }

    /// Decode and classify the next complete line.
    pub fn decode_reply(&mut self) -> ProtocolResult<Option<ReplyLine>> {
        Ok(self.decode_line()?.map(|line| ReplyLine::parse(&line)))
    }

    /// Get the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Clear the buffer.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Get the current buffer contents as a string (for debugging).
    pub fn buffer_as_str(&self) -> String {
        String::from_utf8_lossy(&self.buffer).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::StatusToken;

    #[test]
    fn test_decode_token() {
        let mut codec = ReplyCodec::new();
        codec.push(b"CMD\r\n");

        assert_eq!(codec.decode_line().unwrap(), Some("CMD".to_string()));
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_partial_line() {
        let mut codec = ReplyCodec::new();
        codec.push(b"Reb");
        assert_eq!(codec.decode_line().unwrap(), None);

        codec.push(b"oot!\r");
        assert_eq!(codec.decode_line().unwrap(), None);

        codec.push(b"\n");
        assert_eq!(
            codec.decode_reply().unwrap(),
            Some(ReplyLine::Status(StatusToken::Reboot))
        );
    }

    #[test]
    fn test_multiple_lines() {
        let mut codec = ReplyCodec::new();
        codec.push(b"AOK\r\n\r\n0200\n");

        assert_eq!(codec.decode_line().unwrap(), Some("AOK".to_string()));
        assert_eq!(codec.decode_line().unwrap(), Some("0200".to_string()));
        assert_eq!(codec.decode_line().unwrap(), None);
    }

    #[test]
    fn test_overflow() {
        let mut codec = ReplyCodec::with_max_line(4);
        codec.push(b"ABCDEFG");

        assert_eq!(
            codec.decode_line(),
            Err(ProtocolError::ReplyTooLong { max: 4, actual: 7 })
        );
        assert_eq!(codec.buffered_len(), 0);
    }

    #[test]
    fn test_recovers_after_overflow() {
        let mut codec = ReplyCodec::with_max_line(4);
        codec.push(b"ABCDEFG");
        assert!(codec.decode_line().is_err());

        // Tail of the long line, then a real token
        codec.push(b"HI\r\nCMD\r\n");
        assert_eq!(codec.decode_line().unwrap(), Some("HI".to_string()));
        assert_eq!(
            codec.decode_reply().unwrap(),
            Some(ReplyLine::Status(StatusToken::Cmd))
        );
        assert_eq!(codec.decode_line().unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let mut codec = ReplyCodec::new();
        codec.push(b"junk");
        assert_eq!(codec.buffer_as_str(), "junk");
        codec.clear();
        assert_eq!(codec.buffered_len(), 0);
    }
}
