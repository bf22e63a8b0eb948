//! Error types for the client.

use rn42_protocol::ProtocolError;
use thiserror::Error;

use crate::client::Mode;

/// Errors that can occur while driving the module.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The read budget ran out before the expected reply arrived.
    #[error("no {expected} reply from module (received {received:?})")]
    NoReply {
        /// What the client was waiting for.
        expected: String,
        /// Bytes received but not consumed as a reply.
        received: String,
    },

    /// The module answered with something other than the expected reply.
    #[error("expected {expected} from module, got {got:?}")]
    UnexpectedReply {
        /// Expected status token or value.
        expected: String,
        /// The line the module sent.
        got: String,
    },

    /// Operation not legal in the current mode.
    #[error("{operation} is not allowed in {mode:?} mode")]
    WrongMode {
        /// Operation that was refused.
        operation: &'static str,
        /// Mode the client was in.
        mode: Mode,
    },

    /// Invalid argument or malformed reply.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Transport failure.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),
}

impl ClientError {
    /// Whether the module was reachable but did not acknowledge.
    pub fn is_not_acknowledged(&self) -> bool {
        matches!(self, ClientError::NoReply { .. } | ClientError::UnexpectedReply { .. })
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;
