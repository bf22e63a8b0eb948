//! Status tokens and reply line parsing.
//!
//! Replies from the module are CR-LF terminated lines. A handful of them are
//! fixed status tokens; anything else is a value (GET replies) or an
//! unsolicited status string.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};

/// Fixed status tokens sent by the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusToken {
    /// Command mode entered.
    Cmd,
    /// Command mode left.
    End,
    /// Set command accepted.
    Aok,
    /// Module is rebooting.
    Reboot,
    /// Set command rejected.
    Err,
    /// Command not recognized.
    Unknown,
    /// Connection attempt started.
    Trying,
}

impl StatusToken {
    /// The token as sent on the wire, including CR-LF.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            StatusToken::Cmd => STAT_CMD,
            StatusToken::End => STAT_END,
            StatusToken::Aok => STAT_ACK,
            StatusToken::Reboot => STAT_REBOOT,
            StatusToken::Err => STAT_ERR,
            StatusToken::Unknown => STAT_UNKNOWN,
            StatusToken::Trying => STAT_TRYING,
        }
    }

    /// The token text without the terminator.
    pub fn text(&self) -> &'static str {
        match self {
            StatusToken::Cmd => "CMD",
            StatusToken::End => "END",
            StatusToken::Aok => "AOK",
            StatusToken::Reboot => "Reboot!",
            StatusToken::Err => "ERR",
            StatusToken::Unknown => "?",
            StatusToken::Trying => "TRYING",
        }
    }

    /// Match a reply line (terminator already stripped) exactly.
    pub fn from_line(line: &str) -> Option<StatusToken> {
        match line {
            "CMD" => Some(StatusToken::Cmd),
            "END" => Some(StatusToken::End),
            "AOK" => Some(StatusToken::Aok),
            "Reboot!" => Some(StatusToken::Reboot),
            "ERR" => Some(StatusToken::Err),
            "?" => Some(StatusToken::Unknown),
            "TRYING" => Some(StatusToken::Trying),
            _ => None,
        }
    }

    /// Whether the token reports a rejected command.
    pub fn is_failure(&self) -> bool {
        matches!(self, StatusToken::Err | StatusToken::Unknown)
    }
}

impl std::fmt::Display for StatusToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.text())
    }
}

/// A parsed reply line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyLine {
    /// One of the fixed tokens.
    Status(StatusToken),
    /// A `/#`-prefixed status string (enabled with `SO,/#`).
    Event(String),
    /// Anything else, usually the value of a GET command.
    Value(String),
}

impl ReplyLine {
    /// Classify a reply line. The terminator must already be stripped.
    pub fn parse(line: &str) -> ReplyLine {
        if let Some(token) = StatusToken::from_line(line) {
            return ReplyLine::Status(token);
        }
        if let Some(event) = line.strip_prefix("/#") {
            return ReplyLine::Event(event.to_string());
        }
        ReplyLine::Value(line.to_string())
    }
}

/// Connection state parsed from the `GK` reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStatus {
    /// A remote host is connected.
    pub connected: bool,
}

impl ConnectionStatus {
    /// Parse a `GK` reply.
    ///
    /// Format: `<connected>,<authenticated>,<encrypted>` (e.g. `1,0,0`). Some
    /// firmware versions answer with the single digit only.
    pub fn parse(value: &str) -> ProtocolResult<ConnectionStatus> {
        let first = value.trim().split(',').next().unwrap_or("");
        match first {
            "1" => Ok(ConnectionStatus { connected: true }),
            "0" => Ok(ConnectionStatus { connected: false }),
            _ => Err(ProtocolError::InvalidReply(format!(
                "connection status: {:?}",
                value
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_bytes() {
        assert_eq!(StatusToken::Cmd.as_bytes(), b"CMD\r\n");
        assert_eq!(StatusToken::End.as_bytes(), b"END\r\n");
        assert_eq!(StatusToken::Aok.as_bytes(), b"AOK\r\n");
        assert_eq!(StatusToken::Reboot.as_bytes(), b"Reboot!\r\n");
    }

    #[test]
    fn test_token_text_matches_bytes() {
        for token in [
            StatusToken::Cmd,
            StatusToken::End,
            StatusToken::Aok,
            StatusToken::Reboot,
            StatusToken::Err,
            StatusToken::Unknown,
            StatusToken::Trying,
        ] {
            let bytes = token.as_bytes();
            assert_eq!(&bytes[..bytes.len() - 2], token.text().as_bytes());
            assert_eq!(StatusToken::from_line(token.text()), Some(token));
        }
    }

    #[test]
    fn test_parse_reply_line() {
        assert_eq!(ReplyLine::parse("AOK"), ReplyLine::Status(StatusToken::Aok));
        assert_eq!(ReplyLine::parse("/#CONNECT"), ReplyLine::Event("CONNECT".to_string()));
        assert_eq!(ReplyLine::parse("0200"), ReplyLine::Value("0200".to_string()));
        // Exact match only
        assert_eq!(ReplyLine::parse("AOKAY"), ReplyLine::Value("AOKAY".to_string()));
    }

    #[test]
    fn test_connection_status() {
        assert_eq!(ConnectionStatus::parse("1,0,0"), Ok(ConnectionStatus { connected: true }));
        assert_eq!(ConnectionStatus::parse("0,0,0"), Ok(ConnectionStatus { connected: false }));
        assert_eq!(ConnectionStatus::parse("1"), Ok(ConnectionStatus { connected: true }));
        assert!(ConnectionStatus::parse("x").is_err());
    }
}
