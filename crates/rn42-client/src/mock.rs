//! In-memory transport for tests.

use std::collections::VecDeque;
use std::io;

use crate::transport::Transport;

/// A transport that records every write and serves queued replies.
///
/// Replies are served in order regardless of what was written, so a test
/// queues the whole conversation up front.
#[derive(Debug, Default)]
pub struct MockTransport {
    written: Vec<u8>,
    incoming: VecDeque<u8>,
    reads: usize,
    fail_writes: bool,
}

impl MockTransport {
    /// Create an empty mock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock with replies already queued.
    pub fn with_replies(replies: &[&[u8]]) -> Self {
        let mut mock = Self::new();
        for reply in replies {
            mock.queue_reply(reply);
        }
        mock
    }

    /// Queue bytes for the client to read.
    pub fn queue_reply(&mut self, data: &[u8]) {
        self.incoming.extend(data);
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Take everything written so far.
    pub fn take_written(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.written)
    }

    /// Bytes still queued.
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// Number of `read_byte` calls, including empty polls.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Make every following write fail with `BrokenPipe`.
    pub fn fail_writes(&mut self) {
        self.fail_writes = true;
    }
}

impl Transport for MockTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link down"));
        }
        self.written.extend_from_slice(data);
        Ok(())
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.reads += 1;
        Ok(self.incoming.pop_front())
    }

    fn available(&mut self) -> io::Result<usize> {
        Ok(self.incoming.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_round_trip() {
        let mut mock = MockTransport::with_replies(&[b"CMD\r\n"]);
        mock.write_all(b"$$$").unwrap();

        assert_eq!(mock.written(), b"$$$");
        assert_eq!(mock.available().unwrap(), 5);
        assert_eq!(mock.read_byte().unwrap(), Some(b'C'));
        assert_eq!(mock.pending(), 4);
    }

    #[test]
    fn test_mock_empty_read() {
        let mut mock = MockTransport::new();
        assert_eq!(mock.read_byte().unwrap(), None);
        assert_eq!(mock.reads(), 1);
    }

    #[test]
    fn test_mock_write_failure() {
        let mut mock = MockTransport::new();
        mock.fail_writes();
        assert_eq!(
            mock.write_all(b"x").unwrap_err().kind(),
            io::ErrorKind::BrokenPipe
        );
    }
}
