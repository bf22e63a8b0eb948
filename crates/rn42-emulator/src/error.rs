//! Emulator error types.

use thiserror::Error;

/// Errors raised by the emulated module.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EmulatorError {
    /// The serial link was unplugged with [`crate::Rn42Emulator::unplug`].
    #[error("serial link is down")]
    LinkDown,

    /// A command-mode line the module refused (`ERR` or `?`).
    #[error("rejected command {command:?}: {reason}")]
    Rejected {
        /// The command line without terminator.
        command: String,
        /// Why it was refused.
        reason: String,
    },
}

impl From<EmulatorError> for std::io::Error {
    fn from(err: EmulatorError) -> Self {
        let kind = match err {
            EmulatorError::LinkDown => std::io::ErrorKind::BrokenPipe,
            EmulatorError::Rejected { .. } => std::io::ErrorKind::InvalidInput,
        };
        std::io::Error::new(kind, err)
    }
}

/// Result type alias for emulator operations.
pub type EmulatorResult<T> = Result<T, EmulatorError>;
