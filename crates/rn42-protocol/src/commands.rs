//! Commands that can be sent to the module.
//!
//! Every command except [`Command::EnterCommandMode`] is only understood while
//! the module is in command mode.

use crate::constants::*;
use crate::error::{ProtocolError, ProtocolResult};
use crate::status::StatusToken;

/// Bluetooth profile selected with `S~`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileMode {
    /// Serial Port Profile (`S~,0`).
    Spp,
    /// Human Interface Device profile (`S~,6`).
    Hid,
}

impl ProfileMode {
    /// Parse from a profile name (`spp`, `hid`).
    pub fn from_str(s: &str) -> Option<ProfileMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spp" => Some(ProfileMode::Spp),
            "hid" => Some(ProfileMode::Hid),
            _ => None,
        }
    }
}

/// Connection behavior selected with `SM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectMode {
    /// Reconnect to the stored host on power-up (`SM,6`).
    Auto,
    /// Wait for the host to connect (`SM,4`).
    Manual,
}

impl ConnectMode {
    /// Parse from a mode name (`auto`, `manual`).
    pub fn from_str(s: &str) -> Option<ConnectMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" | "autoconnect" => Some(ConnectMode::Auto),
            "manual" => Some(ConnectMode::Manual),
            _ => None,
        }
    }
}

/// HID descriptor selected with `SH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HidProfile {
    Keyboard,
    Mouse,
    Gamepad,
    Joystick,
    /// Keyboard and mouse on one link.
    Combo,
}

impl HidProfile {
    /// All profiles.
    pub const ALL: [HidProfile; 5] = [
        HidProfile::Keyboard,
        HidProfile::Mouse,
        HidProfile::Gamepad,
        HidProfile::Joystick,
        HidProfile::Combo,
    ];

    /// The four hex digits of the `SH` flag word.
    pub fn code(&self) -> &'static str {
        match self {
            HidProfile::Keyboard => "0200",
            HidProfile::Mouse => "0220",
            HidProfile::Gamepad => "0210",
            HidProfile::Joystick => "0240",
            HidProfile::Combo => "0230",
        }
    }

    /// The full `SH` command line.
    pub fn command_bytes(&self) -> &'static [u8] {
        match self {
            HidProfile::Keyboard => HID_KEYBOARD,
            HidProfile::Mouse => HID_MOUSE,
            HidProfile::Gamepad => HID_GAMEPAD,
            HidProfile::Joystick => HID_JOYSTICK,
            HidProfile::Combo => HID_COMBO,
        }
    }

    /// Parse the flag word returned by `GH` (case-insensitive hex digits).
    pub fn from_code(code: &str) -> ProtocolResult<HidProfile> {
        let code = code.trim();
        HidProfile::ALL
            .into_iter()
            .find(|p| p.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| ProtocolError::UnknownProfile(code.to_string()))
    }

    /// Parse from a profile name (`keyboard`, `mouse`, ...).
    pub fn from_str(s: &str) -> Option<HidProfile> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyboard" => Some(HidProfile::Keyboard),
            "mouse" => Some(HidProfile::Mouse),
            "gamepad" => Some(HidProfile::Gamepad),
            "joystick" => Some(HidProfile::Joystick),
            "combo" => Some(HidProfile::Combo),
            _ => None,
        }
    }
}

/// What the module sends back after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// A fixed status token.
    Token(StatusToken),
    /// A single value line (GET commands).
    Value,
}

/// Commands understood by the RN-42.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ========== Mode Commands ==========
    /// Enter command mode (`$$$`).
    EnterCommandMode,

    /// Leave command mode (`---`).
    ExitCommandMode,

    /// Select SPP or HID (`S~`).
    SetMode(ProfileMode),

    /// Select the connection behavior (`SM`).
    SetConnectMode(ConnectMode),

    /// Enable `/#` connect status strings (`SO,/#`).
    StatusString,

    // ========== Protocol Types ==========
    /// Select the HID descriptor (`SH`).
    SetHidProfile(HidProfile),

    /// Standard wireless SPP protocol (`AW`).
    SppProtocol,

    // ========== GET Commands ==========
    /// Read the HID flag word (`GH`).
    GetHidProfile,

    /// Read the connection status (`GK`).
    GetConnectionStatus,

    // ========== System Commands ==========
    /// Reboot (`R,1`).
    Reboot,

    /// Connect to the stored remote address (`C`).
    Reconnect,

    /// Change the advertised name (`SN,<name>`).
    SetName {
        /// The new name.
        name: String,
    },

    // ========== Raw Command ==========
    /// A raw command line, sent as given plus CR-LF, acknowledged with `AOK`.
    Raw {
        /// The command text without terminator.
        command: String,
    },
}

impl Command {
    /// Build a rename command, checking the name first.
    pub fn set_name(name: &str) -> ProtocolResult<Command> {
        validate_name(name)?;
        Ok(Command::SetName { name: name.to_string() })
    }

    /// Encode the command as the exact bytes to write.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::EnterCommandMode => MODE_COMMAND.to_vec(),
            Command::ExitCommandMode => MODE_EXIT_COMMAND.to_vec(),
            Command::SetMode(ProfileMode::Spp) => MODE_SPP.to_vec(),
            Command::SetMode(ProfileMode::Hid) => MODE_HID.to_vec(),
            Command::SetConnectMode(ConnectMode::Auto) => MODE_AUTOCONNECT.to_vec(),
            Command::SetConnectMode(ConnectMode::Manual) => MODE_MANUAL_CONNECT.to_vec(),
            Command::StatusString => MODE_STATUS_STRING.to_vec(),
            Command::SetHidProfile(profile) => profile.command_bytes().to_vec(),
            Command::SppProtocol => SPP_PROTOCOL.to_vec(),
            Command::GetHidProfile => GET_HID.to_vec(),
            Command::GetConnectionStatus => GET_CONNECTION.to_vec(),
            Command::Reboot => SYS_REBOOT.to_vec(),
            Command::Reconnect => SYS_RECONNECT.to_vec(),
            Command::SetName { name } => {
                let mut buf = Vec::with_capacity(SYS_CHANGE_NAME.len() + name.len() + 2);
                buf.extend_from_slice(SYS_CHANGE_NAME);
                buf.extend_from_slice(name.as_bytes());
                buf.extend_from_slice(LINE_TERMINATOR);
                buf
            }
            Command::Raw { command } => {
                let mut buf = Vec::with_capacity(command.len() + 2);
                buf.extend_from_slice(command.as_bytes());
                buf.extend_from_slice(LINE_TERMINATOR);
                buf
            }
        }
    }

    /// The reply the module sends on success.
    pub fn reply(&self) -> Reply {
        match self {
            Command::EnterCommandMode => Reply::Token(StatusToken::Cmd),
            Command::ExitCommandMode => Reply::Token(StatusToken::End),
            Command::Reboot => Reply::Token(StatusToken::Reboot),
            Command::Reconnect => Reply::Token(StatusToken::Trying),
            Command::GetHidProfile | Command::GetConnectionStatus => Reply::Value,
            _ => Reply::Token(StatusToken::Aok),
        }
    }

    /// The acknowledgment token, for commands answered by a status token.
    pub fn acknowledgment(&self) -> Option<StatusToken> {
        match self.reply() {
            Reply::Token(token) => Some(token),
            Reply::Value => None,
        }
    }

    /// Short description for logs.
    pub fn describe(&self) -> String {
        String::from_utf8_lossy(&self.encode()).trim_end().to_string()
    }
}

/// Check a device name against what `SN` accepts.
pub fn validate_name(name: &str) -> ProtocolResult<()> {
    let reject = |reason| {
        Err(ProtocolError::InvalidName {
            name: name.to_string(),
            reason,
        })
    };

    if name.is_empty() {
        return reject("name is empty");
    }
    if name.len() > MAX_NAME_LEN {
        return reject("name is longer than 20 bytes");
    }
    if !name.is_ascii() {
        return reject("name must be ASCII");
    }
    if name.chars().any(|c| c.is_ascii_control()) {
        return reject("name contains a control character");
    }
    if name.contains(',') {
        return reject("name contains a comma");
    }
    Ok(())
}
