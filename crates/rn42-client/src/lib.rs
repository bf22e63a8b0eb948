//! RN-42 Command Client
//!
//! Drives an RN-42 Bluetooth module over a byte-stream [`Transport`]: switches
//! between data and command mode, sends configuration commands and waits for
//! their acknowledgment, and writes HID raw reports for keyboard, mouse and
//! gamepad emulation.
//!
//! # Example
//!
//! ```rust
//! use rn42_client::{MockTransport, Rn42Client, ClientConfig};
//! use rn42_protocol::{HidProfile, Key, Modifiers, ProfileMode};
//!
//! let replies: &[&[u8]] = &[b"CMD\r\n", b"AOK\r\n", b"AOK\r\n", b"Reboot!\r\n"];
//! let config = ClientConfig { reboot_settle_ms: 0, ..Default::default() };
//! let mut client = Rn42Client::with_config(MockTransport::with_replies(replies), config);
//!
//! client.begin(ProfileMode::Hid, HidProfile::Keyboard)?;
//! client.keyboard_tap(Key::A, Modifiers::NONE)?;
//! # Ok::<(), rn42_client::ClientError>(())
//! ```

mod client;
mod config;
mod error;
pub mod metrics;
mod mock;
mod transport;

pub use client::*;
pub use config::*;
pub use error::*;
pub use mock::*;
pub use transport::*;
