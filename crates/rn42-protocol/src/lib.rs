//! RN-42 Bluetooth HID Protocol
//!
//! This crate provides types and utilities for talking to an RN-42 Bluetooth
//! module over its UART. The module has two modes and the protocol differs
//! between them:
//!
//! # Protocol Overview
//!
//! - **Command mode**: entered by writing `$$$` (no terminator). The module
//!   answers `CMD\r\n`, and every following line is an ASCII configuration
//!   command (`SH,0200\r\n`, `SN,name\r\n`, `R,1\r\n`, ...). Set commands are
//!   acknowledged with `AOK\r\n`, rejected with `ERR\r\n`, and unknown commands
//!   get `?\r\n`. `---\r\n` leaves command mode with `END\r\n`.
//! - **Data mode**: bytes are passed through to the Bluetooth link. In HID
//!   mode the module interprets *raw reports*: `0xFD`, a length byte, then the
//!   report payload.
//!
//! # Raw Report Layouts
//!
//! ```text
//! keyboard: FD 09 01 MM 00 K1 K2 K3 K4 K5 K6
//! mouse:    FD 05 02 BB XX YY WW
//! gamepad:  FD 06 B1 B2 X1 Y1 X2 Y2
//! ```
//!
//! # Example
//!
//! ```rust
//! use rn42_protocol::{Command, HidProfile, Key, KeyboardReport, Modifiers, StatusToken};
//!
//! let cmd = Command::SetHidProfile(HidProfile::Keyboard);
//! assert_eq!(cmd.encode(), b"SH,0200\r\n");
//! assert_eq!(cmd.acknowledgment(), Some(StatusToken::Aok));
//!
//! let mut report = KeyboardReport::default();
//! report.press(Key::A, Modifiers::LEFT_SHIFT);
//! assert_eq!(report.encode(), [0xFD, 0x09, 0x01, 0x02, 0x00, 0x04, 0, 0, 0, 0, 0]);
//! ```

mod codec;
mod commands;
mod constants;
mod error;
mod keys;
mod reports;
mod status;

pub use codec::*;
pub use commands::*;
pub use constants::*;
pub use error::*;
pub use keys::*;
pub use reports::*;
pub use status::*;
