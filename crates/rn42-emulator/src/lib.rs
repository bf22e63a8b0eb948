//! Software RN-42
//!
//! An in-process stand-in for the module that implements the client's
//! [`rn42_client::Transport`]. It answers command-mode lines with the
//! module's status tokens, keeps the settings those commands store, applies
//! them on reboot, and decodes data-mode HID raw reports into
//! [`EmulatorEvent`]s so tests can check what a host would have seen.
//!
//! ```rust
//! use rn42_client::{ClientConfig, Rn42Client};
//! use rn42_emulator::Rn42Emulator;
//! use rn42_protocol::{HidProfile, ProfileMode};
//!
//! let config = ClientConfig { reboot_settle_ms: 0, ..Default::default() };
//! let mut client = Rn42Client::with_config(Rn42Emulator::new(), config);
//! client.begin(ProfileMode::Hid, HidProfile::Mouse)?;
//!
//! let module = client.into_inner();
//! assert_eq!(module.active_settings().hid, HidProfile::Mouse);
//! # Ok::<(), rn42_client::ClientError>(())
//! ```

mod emulator;
mod error;

pub use emulator::*;
pub use error::*;
