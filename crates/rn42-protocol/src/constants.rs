//! Protocol constants
//!
//! Literal byte sequences exchanged with the RN-42. Every value here is sent or
//! matched byte-for-byte, so none of them may be reformatted.

// ============================================================================
// Mode Commands (host → module)
// ============================================================================

/// Enter command mode. Sent without a line terminator.
pub const MODE_COMMAND: &[u8] = b"$$$";
/// Leave command mode.
pub const MODE_EXIT_COMMAND: &[u8] = b"---\r\n";
/// Select the Serial Port Profile.
pub const MODE_SPP: &[u8] = b"S~,0\r\n";
/// Select the HID profile.
pub const MODE_HID: &[u8] = b"S~,6\r\n";
/// Reconnect automatically to the last paired host.
pub const MODE_AUTOCONNECT: &[u8] = b"SM,6\r\n";
/// Wait for a connection request (slave mode).
pub const MODE_MANUAL_CONNECT: &[u8] = b"SM,4\r\n";
/// Enable connect/disconnect status strings prefixed with `/#`.
pub const MODE_STATUS_STRING: &[u8] = b"SO,/#\r\n";

// ============================================================================
// Status Tokens (module → host)
// ============================================================================

/// Reply to `$$$`.
pub const STAT_CMD: &[u8] = b"CMD\r\n";
/// Reply to `---`.
pub const STAT_END: &[u8] = b"END\r\n";
/// Acknowledgment of a set command.
pub const STAT_ACK: &[u8] = b"AOK\r\n";
/// Reply to `R,1`.
pub const STAT_REBOOT: &[u8] = b"Reboot!\r\n";
/// A set command with an invalid argument.
pub const STAT_ERR: &[u8] = b"ERR\r\n";
/// An unrecognized command.
pub const STAT_UNKNOWN: &[u8] = b"?\r\n";
/// Reply to `C` while the module pages the remote host.
pub const STAT_TRYING: &[u8] = b"TRYING\r\n";

// ============================================================================
// GET Commands
// ============================================================================

/// Query the HID profile flags. Terminated with a bare line feed, which the
/// module accepts like CR-LF.
pub const GET_HID: &[u8] = b"GH\n";
/// Query the connection status (`1,0,0` when connected).
pub const GET_CONNECTION: &[u8] = b"GK\r\n";

// ============================================================================
// System Commands
// ============================================================================

/// Reboot the module.
pub const SYS_REBOOT: &[u8] = b"R,1\r\n";
/// Connect to the stored remote address.
pub const SYS_RECONNECT: &[u8] = b"C\r\n";
/// Rename prefix. The name and a CR-LF follow.
pub const SYS_CHANGE_NAME: &[u8] = b"SN,";

// ============================================================================
// Protocol Types
// ============================================================================

/// Switch the SPP link to the standard wireless protocol.
pub const SPP_PROTOCOL: &[u8] = b"AW\r\n";
/// Keyboard HID descriptor.
pub const HID_KEYBOARD: &[u8] = b"SH,0200\r\n";
/// Mouse HID descriptor.
pub const HID_MOUSE: &[u8] = b"SH,0220\r\n";
/// Gamepad HID descriptor.
pub const HID_GAMEPAD: &[u8] = b"SH,0210\r\n";
/// Joystick HID descriptor.
pub const HID_JOYSTICK: &[u8] = b"SH,0240\r\n";
/// Keyboard + mouse combo descriptor.
pub const HID_COMBO: &[u8] = b"SH,0230\r\n";

// ============================================================================
// Raw Reports
// ============================================================================

/// First byte of every HID raw report.
pub const RAW_REPORT_START: u8 = 0xFD;
/// Length byte of a keyboard report.
pub const KEYBOARD_REPORT_LEN: u8 = 0x09;
/// Descriptor byte of a keyboard report.
pub const KEYBOARD_DESCRIPTOR: u8 = 0x01;
/// Length byte of a mouse report.
pub const MOUSE_REPORT_LEN: u8 = 0x05;
/// Descriptor byte of a mouse report.
pub const MOUSE_DESCRIPTOR: u8 = 0x02;
/// Length byte of a gamepad/joystick report.
pub const GAMEPAD_REPORT_LEN: u8 = 0x06;

/// Maximum device name length accepted by `SN`.
pub const MAX_NAME_LEN: usize = 20;
/// Keys a boot keyboard report can hold at once.
pub const MAX_PRESSED_KEYS: usize = 6;
/// Line terminator used by command replies.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";
