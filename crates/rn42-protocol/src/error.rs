//! Protocol error types.

use thiserror::Error;

/// Errors that can occur when building commands or reading replies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Device name rejected before it reached the module.
    #[error("invalid device name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// Character with no key mapping for typed text.
    #[error("no key mapping for character {0:?}")]
    UnmappableChar(char),

    /// HID profile code not in the known set.
    #[error("unknown HID profile: {0}")]
    UnknownProfile(String),

    /// Reply line exceeded the buffer limit.
    #[error("reply too long: max {max} bytes, got {actual}")]
    ReplyTooLong {
        /// Maximum allowed length.
        max: usize,
        /// Bytes buffered without a terminator.
        actual: usize,
    },

    /// Raw command text that cannot be sent as one line.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// Reply did not have the expected shape.
    #[error("invalid reply: {0}")]
    InvalidReply(String),
}

/// Result type alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
