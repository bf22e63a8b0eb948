//! Client configuration and provisioning profiles.

use std::path::Path;
use std::time::Duration;

use rn42_protocol::{
    validate_name, ConnectMode, HidProfile, ProfileMode, ProtocolError, MAX_REPLY_LENGTH,
};
use serde::{Deserialize, Serialize};

use crate::error::ClientResult;

// ============================================================================
// Client Configuration
// ============================================================================

/// Tuning for reply reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Consecutive empty polls tolerated while waiting for a reply. With a
    /// serial transport each poll lasts one read timeout.
    pub idle_poll_budget: u32,
    /// Longest reply line accepted.
    pub max_reply_len: usize,
    /// Pause after a reboot before the module accepts data again.
    pub reboot_settle_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            idle_poll_budget: 20,
            max_reply_len: MAX_REPLY_LENGTH,
            reboot_settle_ms: 1000,
        }
    }
}

impl ClientConfig {
    /// Parse from YAML. Missing fields take their defaults.
    pub fn from_yaml(text: &str) -> ClientResult<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Settle delay as a `Duration`.
    pub fn reboot_settle(&self) -> Duration {
        Duration::from_millis(self.reboot_settle_ms)
    }
}

// ============================================================================
// Provisioning Profile
// ============================================================================

/// Profile mode as written in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSetting {
    Spp,
    Hid,
}

impl From<ModeSetting> for ProfileMode {
    fn from(mode: ModeSetting) -> Self {
        match mode {
            ModeSetting::Spp => ProfileMode::Spp,
            ModeSetting::Hid => ProfileMode::Hid,
        }
    }
}

/// HID profile as written in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HidSetting {
    Keyboard,
    Mouse,
    Gamepad,
    Joystick,
    Combo,
}

impl From<HidSetting> for HidProfile {
    fn from(hid: HidSetting) -> Self {
        match hid {
            HidSetting::Keyboard => HidProfile::Keyboard,
            HidSetting::Mouse => HidProfile::Mouse,
            HidSetting::Gamepad => HidProfile::Gamepad,
            HidSetting::Joystick => HidProfile::Joystick,
            HidSetting::Combo => HidProfile::Combo,
        }
    }
}

/// Connect mode as written in YAML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectSetting {
    Auto,
    Manual,
}

impl From<ConnectSetting> for ConnectMode {
    fn from(connect: ConnectSetting) -> Self {
        match connect {
            ConnectSetting::Auto => ConnectMode::Auto,
            ConnectSetting::Manual => ConnectMode::Manual,
        }
    }
}

/// Settings applied to a module in one command-mode session.
///
/// ```yaml
/// name: DeskKeyboard
/// mode: hid
/// hid: keyboard
/// connect: auto
/// status_string: true
/// commands:
///   - "SA,0"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionProfile {
    /// Advertised device name.
    pub name: Option<String>,
    /// Bluetooth profile.
    #[serde(default = "default_mode")]
    pub mode: ModeSetting,
    /// HID descriptor (HID mode only).
    pub hid: Option<HidSetting>,
    /// Connection behavior.
    pub connect: Option<ConnectSetting>,
    /// Enable `/#` connect status strings.
    #[serde(default)]
    pub status_string: bool,
    /// Extra raw commands, each acknowledged with `AOK`.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Reboot after applying so the settings take effect.
    #[serde(default = "default_reboot")]
    pub reboot: bool,
}

fn default_mode() -> ModeSetting {
    ModeSetting::Hid
}

fn default_reboot() -> bool {
    true
}

impl Default for ProvisionProfile {
    fn default() -> Self {
        ProvisionProfile {
            name: None,
            mode: default_mode(),
            hid: None,
            connect: None,
            status_string: false,
            commands: Vec::new(),
            reboot: default_reboot(),
        }
    }
}

impl ProvisionProfile {
    /// Parse from YAML and validate.
    pub fn from_yaml(text: &str) -> ClientResult<Self> {
        let profile: ProvisionProfile = serde_yaml::from_str(text)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// Check the name and raw commands before anything is sent.
    pub fn validate(&self) -> ClientResult<()> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        for command in &self.commands {
            if command.is_empty() || command.contains(['\r', '\n']) {
                return Err(ProtocolError::InvalidCommand(format!(
                    "raw command must be a single non-empty line: {:?}",
                    command
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Whether applying the profile would send anything besides the reboot.
    pub fn has_configuration(&self) -> bool {
        self.name.is_some()
            || self.hid.is_some()
            || self.connect.is_some()
            || self.status_string
            || !self.commands.is_empty()
    }
}
