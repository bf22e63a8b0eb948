//! The emulated module.

use std::collections::VecDeque;
use std::io;

use rn42_client::{Mode, Transport};
use rn42_protocol::{
    validate_name, ConnectMode, DataItem, HidProfile, HidReport, ProfileMode, ReportDecoder,
    StatusToken, MAX_REPLY_LENGTH,
};
use tracing::{debug, trace, warn};

use crate::error::{EmulatorError, EmulatorResult};

/// Name the module advertises before `SN` is used.
pub const DEFAULT_NAME: &str = "RN42-0000";

/// Bluetooth address reported in connect status strings.
pub const HOST_ADDRESS: &str = "0123456789AB";

/// Persistent module settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSettings {
    pub mode: ProfileMode,
    pub hid: HidProfile,
    pub connect: ConnectMode,
    pub name: String,
    /// Prefix for connect/disconnect status strings; empty when disabled.
    pub status_prefix: String,
    /// `AW` was issued.
    pub spp_protocol: bool,
    /// Set commands the emulator stores without interpreting (e.g. `SA,0`).
    pub extra: Vec<String>,
}

impl Default for ModuleSettings {
    fn default() -> Self {
        ModuleSettings {
            mode: ProfileMode::Spp,
            hid: HidProfile::Keyboard,
            connect: ConnectMode::Manual,
            name: DEFAULT_NAME.to_string(),
            status_prefix: String::new(),
            spp_protocol: false,
            extra: Vec::new(),
        }
    }
}

/// Something the module did or received in data mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorEvent {
    /// A raw report decoded in HID mode.
    Report(HidReport),
    /// A byte passed through to the host.
    Byte(u8),
    /// A `0xFD` frame that did not decode.
    Malformed(Vec<u8>),
    /// `R,1` was accepted.
    Rebooted,
    /// `C` was accepted.
    ConnectAttempt,
}

/// A software RN-42 behind the [`Transport`] trait.
///
/// Set commands change the stored settings immediately; the profile mode
/// only takes effect in data mode after a reboot, as on the real module.
#[derive(Debug)]
pub struct Rn42Emulator {
    mode: Mode,
    stored: ModuleSettings,
    active: ModuleSettings,
    connected: bool,

    // Link state
    outgoing: VecDeque<u8>,
    line: Vec<u8>,
    escape: usize,
    decoder: ReportDecoder,
    silent: bool,
    link_down: bool,

    // History
    events: Vec<EmulatorEvent>,
    commands: Vec<String>,
    rejected: Vec<EmulatorError>,
}

impl Default for Rn42Emulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Rn42Emulator {
    /// A module with factory settings, in data mode, not connected.
    pub fn new() -> Self {
        Self::with_settings(ModuleSettings::default())
    }

    /// A module that powered up with `settings`.
    pub fn with_settings(settings: ModuleSettings) -> Self {
        Rn42Emulator {
            mode: Mode::Data,
            active: settings.clone(),
            stored: settings,
            connected: false,
            outgoing: VecDeque::new(),
            line: Vec::new(),
            escape: 0,
            decoder: ReportDecoder::new(),
            silent: false,
            link_down: false,
            events: Vec::new(),
            commands: Vec::new(),
            rejected: Vec::new(),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Settings as stored by set commands.
    pub fn settings(&self) -> &ModuleSettings {
        &self.stored
    }

    /// Settings in effect since the last reboot.
    pub fn active_settings(&self) -> &ModuleSettings {
        &self.active
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Data-mode events in arrival order.
    pub fn events(&self) -> &[EmulatorEvent] {
        &self.events
    }

    /// Take the recorded events.
    pub fn take_events(&mut self) -> Vec<EmulatorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Decoded HID reports in arrival order.
    pub fn reports(&self) -> Vec<HidReport> {
        self.events
            .iter()
            .filter_map(|event| match event {
                EmulatorEvent::Report(report) => Some(*report),
                _ => None,
            })
            .collect()
    }

    /// Bytes passed through in data mode.
    pub fn passthrough(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|event| match event {
                EmulatorEvent::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Command-mode lines received, including `$$$` entries.
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Command lines answered with `ERR` or `?`.
    pub fn rejected(&self) -> &[EmulatorError] {
        &self.rejected
    }

    /// Fail with the first rejected command, if any.
    pub fn check_rejections(&self) -> EmulatorResult<()> {
        match self.rejected.first() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Fault and Host Control
    // ========================================================================

    /// Connect or disconnect the remote host. With status strings enabled a
    /// `CONNECT`/`DISCONNECT` line is sent in data mode.
    pub fn set_connected(&mut self, connected: bool) {
        if self.connected == connected {
            return;
        }
        self.connected = connected;
        debug!("Emulated host {}", if connected { "connected" } else { "disconnected" });

        if self.mode == Mode::Data && !self.active.status_prefix.is_empty() {
            let line = if connected {
                format!("{}CONNECT,{}", self.active.status_prefix, HOST_ADDRESS)
            } else {
                format!("{}DISCONNECT", self.active.status_prefix)
            };
            self.reply_line(&line);
        }
    }

    /// Stop replying; bytes are still consumed.
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    /// Make every following read and write fail.
    pub fn unplug(&mut self) {
        self.link_down = true;
    }

    /// Restore the link after [`Self::unplug`].
    pub fn plug(&mut self) {
        self.link_down = false;
    }

    /// Queue bytes as if the module sent them.
    pub fn inject(&mut self, data: &[u8]) {
        self.outgoing.extend(data);
    }

    // ========================================================================
    // Byte Handling
    // ========================================================================

    /// Process bytes written by the host.
    pub fn receive(&mut self, data: &[u8]) -> EmulatorResult<()> {
        self.ensure_link()?;
        for &byte in data {
            match self.mode {
                Mode::Data => self.receive_data(byte),
                Mode::Command => self.receive_command(byte),
            }
        }
        // The escape must arrive in one write
        if self.mode == Mode::Data {
            self.flush_escape();
        }
        Ok(())
    }

    fn ensure_link(&self) -> EmulatorResult<()> {
        if self.link_down {
            Err(EmulatorError::LinkDown)
        } else {
            Ok(())
        }
    }

    fn receive_data(&mut self, byte: u8) {
        // `$$$` only counts outside a report frame
        if self.decoder.buffered_len() == 0 && byte == b'$' {
            self.escape += 1;
            if self.escape == 3 {
                self.escape = 0;
                self.mode = Mode::Command;
                self.commands.push("$$$".to_string());
                debug!("Emulator entered command mode");
                self.reply(StatusToken::Cmd);
            }
            return;
        }

        self.flush_escape();
        self.push_data(&[byte]);
    }

    /// Release `$` bytes held back as a possible escape.
    fn flush_escape(&mut self) {
        if self.escape > 0 {
            let held = vec![b'$'; self.escape];
            self.escape = 0;
            self.push_data(&held);
        }
    }

    fn push_data(&mut self, data: &[u8]) {
        if self.active.mode != ProfileMode::Hid {
            self.events.extend(data.iter().map(|&b| EmulatorEvent::Byte(b)));
            return;
        }

        self.decoder.push(data);
        while let Some(item) = self.decoder.decode() {
            let event = match item {
                DataItem::Report(report) => {
                    trace!("Emulator decoded {} report", report.kind());
                    EmulatorEvent::Report(report)
                }
                DataItem::Byte(b) => EmulatorEvent::Byte(b),
                DataItem::Malformed(frame) => {
                    warn!("Emulator got malformed report {:02X?}", frame);
                    EmulatorEvent::Malformed(frame)
                }
            };
            self.events.push(event);
        }
    }

    fn receive_command(&mut self, byte: u8) {
        if byte != b'\n' {
            self.line.push(byte);
            return;
        }

        let mut line = std::mem::take(&mut self.line);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.is_empty() {
            return;
        }

        let text = String::from_utf8_lossy(&line).to_string();
        if line.len() > MAX_REPLY_LENGTH {
            self.reject(&text, StatusToken::Unknown, "line too long");
            return;
        }
        self.commands.push(text.clone());
        self.execute(&text);
    }

    fn execute(&mut self, line: &str) {
        trace!("Emulator command {:?}", line);
        let (name, arg) = match line.split_once(',') {
            Some((name, arg)) => (name, Some(arg)),
            None => (line, None),
        };

        match (name, arg) {
            ("---", None) => {
                self.mode = Mode::Data;
                debug!("Emulator left command mode");
                self.reply(StatusToken::End);
            }
            ("S~", Some(arg)) => match arg {
                "0" => self.store(|s| s.mode = ProfileMode::Spp),
                "6" => self.store(|s| s.mode = ProfileMode::Hid),
                _ => self.reject(line, StatusToken::Err, "unsupported profile"),
            },
            ("SM", Some(arg)) => match arg {
                "4" => self.store(|s| s.connect = ConnectMode::Manual),
                "6" => self.store(|s| s.connect = ConnectMode::Auto),
                _ => self.reject(line, StatusToken::Err, "unsupported connect mode"),
            },
            ("SH", Some(arg)) => match HidProfile::from_code(arg) {
                Ok(hid) => self.store(|s| s.hid = hid),
                Err(e) => self.reject(line, StatusToken::Err, &e.to_string()),
            },
            ("SN", Some(arg)) => match validate_name(arg) {
                Ok(()) => {
                    let name = arg.to_string();
                    self.store(|s| s.name = name)
                }
                Err(e) => self.reject(line, StatusToken::Err, &e.to_string()),
            },
            ("SO", Some(arg)) => {
                let prefix = arg.to_string();
                self.store(|s| s.status_prefix = prefix)
            }
            ("AW", None) => self.store(|s| s.spp_protocol = true),
            ("R", Some("1")) => self.reboot(),
            ("C", None) => {
                self.events.push(EmulatorEvent::ConnectAttempt);
                self.reply(StatusToken::Trying);
            }
            ("GK", None) => {
                let value = if self.connected { "1,0,0" } else { "0,0,0" };
                self.reply_line(value);
            }
            ("GH", None) => {
                let code = self.stored.hid.code();
                self.reply_line(code);
            }
            (name, Some(_)) if name.len() == 2 && name.starts_with('S') => {
                let setting = line.to_string();
                self.store(|s| s.extra.push(setting))
            }
            _ => self.reject(line, StatusToken::Unknown, "unknown command"),
        }
    }

    fn store(&mut self, apply: impl FnOnce(&mut ModuleSettings)) {
        apply(&mut self.stored);
        self.reply(StatusToken::Aok);
    }

    fn reject(&mut self, line: &str, token: StatusToken, reason: &str) {
        warn!("Emulator rejected {:?}: {}", line, reason);
        self.rejected.push(EmulatorError::Rejected {
            command: line.to_string(),
            reason: reason.to_string(),
        });
        self.reply(token);
    }

    fn reboot(&mut self) {
        self.reply(StatusToken::Reboot);
        self.active = self.stored.clone();
        self.mode = Mode::Data;
        self.escape = 0;
        self.decoder.clear();
        self.events.push(EmulatorEvent::Rebooted);
        debug!(
            "Emulator rebooted as {:?} ({:?}, {:?})",
            self.active.name, self.active.mode, self.active.hid
        );
    }

    fn reply(&mut self, token: StatusToken) {
        if !self.silent {
            self.outgoing.extend(token.as_bytes());
        }
    }

    fn reply_line(&mut self, line: &str) {
        if !self.silent {
            self.outgoing.extend(line.as_bytes());
            self.outgoing.extend(b"\r\n");
        }
    }
}

impl Transport for Rn42Emulator {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        Ok(self.receive(data)?)
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.ensure_link()?;
        Ok(self.outgoing.pop_front())
    }

    fn available(&mut self) -> io::Result<usize> {
        self.ensure_link()?;
        Ok(self.outgoing.len())
    }
}
