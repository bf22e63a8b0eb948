//! The RN-42 command client.
//!
//! The client tracks which mode the module is in. Configuration commands are
//! only written in command mode and HID reports only in data mode; anything
//! else is refused before a byte reaches the link.

use rn42_protocol::{
    char_to_key, Command, ConnectMode, ConnectionStatus, GamepadButtons, GamepadReport, HidProfile,
    HidReport, Key, KeyboardReport, Modifiers, MouseButtons, MouseReport, ProfileMode, ProtocolError,
    Reply, ReplyCodec, ReplyLine, StatusToken,
};
use tracing::{debug, trace, warn};

use crate::config::{ClientConfig, ProvisionProfile};
use crate::error::{ClientError, ClientResult};
use crate::metrics::metric_defs;
use crate::transport::Transport;

/// Operating mode of the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Bytes are passed through to the Bluetooth link.
    #[default]
    Data,
    /// Bytes are configuration commands.
    Command,
}

/// A client for one RN-42 module.
///
/// The client owns (or mutably borrows, via `&mut T`) the transport for its
/// whole life. It assumes the module is in data mode when created, which is
/// the module's power-up state.
pub struct Rn42Client<T: Transport> {
    transport: T,
    config: ClientConfig,
    mode: Mode,
    codec: ReplyCodec,

    // HID state, so each report describes everything that is held
    keyboard: KeyboardReport,
    mouse_buttons: MouseButtons,
    gamepad: GamepadReport,
}

impl<T: Transport> Rn42Client<T> {
    /// Create a client with the default configuration.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ClientConfig::default())
    }

    /// Create a client with a custom configuration.
    pub fn with_config(transport: T, config: ClientConfig) -> Self {
        Rn42Client {
            transport,
            codec: ReplyCodec::with_max_line(config.max_reply_len),
            config,
            mode: Mode::Data,
            keyboard: KeyboardReport::default(),
            mouse_buttons: MouseButtons::NONE,
            gamepad: GamepadReport::default(),
        }
    }

    /// Current mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Get the configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Borrow the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Give the transport back.
    pub fn into_inner(self) -> T {
        self.transport
    }

    // ========================================================================
    // Mode Transitions
    // ========================================================================

    /// Enter command mode (`$$$` → `CMD`).
    pub fn enter_command_mode(&mut self) -> ClientResult<()> {
        self.require_mode(Mode::Data, "enter_command_mode")?;
        self.transact(&Command::EnterCommandMode, StatusToken::Cmd)?;
        self.mode = Mode::Command;
        debug!("RN-42 entered command mode");
        Ok(())
    }

    /// Leave command mode (`---` → `END`).
    pub fn exit_command_mode(&mut self) -> ClientResult<()> {
        self.require_mode(Mode::Command, "exit_command_mode")?;
        self.transact(&Command::ExitCommandMode, StatusToken::End)?;
        self.mode = Mode::Data;
        debug!("RN-42 left command mode");
        Ok(())
    }

    /// Reboot the module (`R,1` → `Reboot!`). The module comes back in data
    /// mode; the client waits the configured settle time before returning.
    pub fn reboot(&mut self) -> ClientResult<()> {
        self.require_mode(Mode::Command, "reboot")?;
        self.transact(&Command::Reboot, StatusToken::Reboot)?;
        self.mode = Mode::Data;
        self.codec.clear();
        self.reset_hid_state();

        let settle = self.config.reboot_settle();
        if !settle.is_zero() {
            debug!("Waiting {:?} for RN-42 reboot", settle);
            std::thread::sleep(settle);
        }
        Ok(())
    }

    // ========================================================================
    // Commands
    // ========================================================================

    /// Send one command and wait for its reply.
    ///
    /// Writes exactly the command's bytes. Mode commands and reboot update the
    /// tracked mode; every other command requires command mode. GET commands
    /// have their value read and discarded; use [`Self::query`] to keep it.
    pub fn send_command(&mut self, command: &Command) -> ClientResult<()> {
        match command {
            Command::EnterCommandMode => self.enter_command_mode(),
            Command::ExitCommandMode => self.exit_command_mode(),
            Command::Reboot => self.reboot(),
            _ => {
                self.require_mode(Mode::Command, "send_command")?;
                match command.reply() {
                    Reply::Token(token) => self.transact(command, token),
                    Reply::Value => self.query(command).map(|_| ()),
                }
            }
        }
    }

    /// Send a GET command and return the value line.
    pub fn query(&mut self, command: &Command) -> ClientResult<String> {
        self.require_mode(Mode::Command, "query")?;
        self.write_command(command)?;
        let result = self.await_value();
        self.record_outcome(command, &result);
        result
    }

    /// Send one command inside its own command-mode session: enter, send,
    /// exit. When the client is already in command mode the command is just
    /// sent.
    pub fn configure(&mut self, command: &Command) -> ClientResult<()> {
        self.with_command_mode(|client| client.send_command(command))
    }

    /// Select the Bluetooth profile and, in HID mode, the HID descriptor,
    /// then reboot so the module applies them.
    pub fn begin(&mut self, mode: ProfileMode, hid: HidProfile) -> ClientResult<()> {
        debug!("Configuring RN-42 for {:?} ({:?})", mode, hid);
        self.with_command_mode(|client| {
            client.send_command(&Command::SetMode(mode))?;
            if mode == ProfileMode::Hid {
                client.send_command(&Command::SetHidProfile(hid))?;
            }
            client.reboot()
        })
    }

    /// Change the advertised name (`SN,<name>`).
    pub fn change_name(&mut self, name: &str) -> ClientResult<()> {
        let command = Command::set_name(name)?;
        self.configure(&command)
    }

    /// Select automatic or manual connection.
    pub fn set_connect_mode(&mut self, mode: ConnectMode) -> ClientResult<()> {
        self.configure(&Command::SetConnectMode(mode))
    }

    /// Enable `/#` connect/disconnect status strings.
    pub fn enable_status_string(&mut self) -> ClientResult<()> {
        self.configure(&Command::StatusString)
    }

    /// Ask the module to connect to its stored host (`C` → `TRYING`).
    pub fn reconnect(&mut self) -> ClientResult<()> {
        self.with_command_mode(|client| client.transact(&Command::Reconnect, StatusToken::Trying))
    }

    /// Whether a host is connected (`GK`).
    pub fn connected(&mut self) -> ClientResult<bool> {
        let value = self.with_command_mode(|client| client.query(&Command::GetConnectionStatus))?;
        Ok(ConnectionStatus::parse(&value)?.connected)
    }

    /// Read the HID descriptor currently configured (`GH`).
    pub fn hid_profile(&mut self) -> ClientResult<HidProfile> {
        let value = self.with_command_mode(|client| client.query(&Command::GetHidProfile))?;
        Ok(HidProfile::from_code(&value)?)
    }

    /// Apply a provisioning profile in one command-mode session.
    pub fn provision(&mut self, profile: &ProvisionProfile) -> ClientResult<()> {
        profile.validate()?;
        debug!(
            "Provisioning RN-42 (name={:?}, mode={:?}, hid={:?}, {} raw commands)",
            profile.name,
            profile.mode,
            profile.hid,
            profile.commands.len()
        );

        self.with_command_mode(|client| {
            let mode = ProfileMode::from(profile.mode);
            client.send_command(&Command::SetMode(mode))?;
            match profile.hid {
                Some(hid) if mode == ProfileMode::Hid => {
                    client.send_command(&Command::SetHidProfile(hid.into()))?;
                }
                Some(hid) => warn!("Ignoring HID profile {:?} in SPP mode", hid),
                None => {}
            }
            if let Some(connect) = profile.connect {
                client.send_command(&Command::SetConnectMode(connect.into()))?;
            }
            if profile.status_string {
                client.send_command(&Command::StatusString)?;
            }
            if let Some(name) = &profile.name {
                client.send_command(&Command::set_name(name)?)?;
            }
            for raw in &profile.commands {
                client.send_command(&Command::Raw { command: raw.clone() })?;
            }
            if profile.reboot {
                client.reboot()?;
            }
            Ok(())
        })
    }

    // ========================================================================
    // Raw Sends
    // ========================================================================

    /// Write raw bytes. Allowed in either mode.
    pub fn send_bytes(&mut self, data: &[u8]) -> ClientResult<()> {
        self.write(data)
    }

    /// Write one byte.
    pub fn send_byte(&mut self, value: u8) -> ClientResult<()> {
        self.write(&[value])
    }

    /// Write a character as UTF-8 (one byte for ASCII).
    pub fn send_char(&mut self, value: char) -> ClientResult<()> {
        let mut buf = [0u8; 4];
        self.write(value.encode_utf8(&mut buf).as_bytes())
    }

    /// Write a 16-bit integer, little-endian.
    pub fn send_int(&mut self, value: i16) -> ClientResult<()> {
        self.write(&value.to_le_bytes())
    }

    /// Write a 32-bit integer, little-endian.
    pub fn send_long(&mut self, value: i32) -> ClientResult<()> {
        self.write(&value.to_le_bytes())
    }

    /// Write an IEEE-754 single, little-endian.
    pub fn send_float(&mut self, value: f32) -> ClientResult<()> {
        self.write(&value.to_le_bytes())
    }

    /// Write a string's bytes without terminator.
    pub fn send_string(&mut self, value: &str) -> ClientResult<()> {
        self.write(value.as_bytes())
    }

    /// Bytes waiting on the transport.
    pub fn available(&mut self) -> ClientResult<usize> {
        Ok(self.transport.available()?)
    }

    /// Read one byte from the transport, if one arrives in time.
    pub fn read_raw(&mut self) -> ClientResult<Option<u8>> {
        Ok(self.transport.read_byte()?)
    }

    // ========================================================================
    // Keyboard
    // ========================================================================

    /// Press `key` and set `modifiers`. Keys already held stay held.
    pub fn keyboard_press(&mut self, key: Key, modifiers: Modifiers) -> ClientResult<()> {
        self.require_mode(Mode::Data, "keyboard_press")?;
        if !self.keyboard.press(key, modifiers) {
            warn!("Keyboard report full, {} not pressed", key);
        }
        let report = self.keyboard;
        self.send_report(HidReport::Keyboard(report))
    }

    /// Release `key`. Modifiers are released with the last held key.
    pub fn keyboard_release(&mut self, key: Key) -> ClientResult<()> {
        self.require_mode(Mode::Data, "keyboard_release")?;
        self.keyboard.release(key);
        if self.keyboard.pressed().next().is_none() {
            self.keyboard.modifiers = Modifiers::NONE;
        }
        let report = self.keyboard;
        self.send_report(HidReport::Keyboard(report))
    }

    /// Release every key and modifier (all-zero report).
    pub fn keyboard_release_all(&mut self) -> ClientResult<()> {
        self.require_mode(Mode::Data, "keyboard_release_all")?;
        self.keyboard = KeyboardReport::default();
        self.send_report(HidReport::Keyboard(KeyboardReport::default()))
    }

    /// Press and release a key with modifiers.
    pub fn keyboard_tap(&mut self, key: Key, modifiers: Modifiers) -> ClientResult<()> {
        self.keyboard_press(key, modifiers)?;
        self.keyboard_release_all()
    }

    /// Type `message` one character at a time, each as a press followed by a
    /// release. The whole message is checked first; nothing is written if
    /// any character has no key mapping.
    pub fn keyboard_print(&mut self, message: &str) -> ClientResult<()> {
        self.require_mode(Mode::Data, "keyboard_print")?;
        let strokes = message
            .chars()
            .map(|c| char_to_key(c).ok_or(ProtocolError::UnmappableChar(c)))
            .collect::<Result<Vec<_>, _>>()?;

        trace!("Typing {} characters", strokes.len());
        for (key, modifiers) in strokes {
            self.send_report(HidReport::Keyboard(KeyboardReport::single(key, modifiers)))?;
            self.send_report(HidReport::Keyboard(KeyboardReport::default()))?;
        }
        self.keyboard = KeyboardReport::default();
        Ok(())
    }

    // ========================================================================
    // Mouse
    // ========================================================================

    /// Move by (`dx`, `dy`) with the held buttons.
    pub fn mouse_move(&mut self, dx: i8, dy: i8) -> ClientResult<()> {
        self.send_mouse(dx, dy, 0, "mouse_move")
    }

    /// Move by an arbitrary distance, split into steps of at most 127.
    pub fn mouse_move_by(&mut self, dx: i32, dy: i32) -> ClientResult<()> {
        self.require_mode(Mode::Data, "mouse_move_by")?;
        let (mut rest_x, mut rest_y) = (dx, dy);
        while rest_x != 0 || rest_y != 0 {
            let step_x = rest_x.clamp(-127, 127);
            let step_y = rest_y.clamp(-127, 127);
            self.send_mouse(step_x as i8, step_y as i8, 0, "mouse_move_by")?;
            rest_x -= step_x;
            rest_y -= step_y;
        }
        Ok(())
    }

    /// Scroll the wheel.
    pub fn mouse_wheel(&mut self, delta: i8) -> ClientResult<()> {
        self.send_mouse(0, 0, delta, "mouse_wheel")
    }

    /// Press `buttons` in addition to any already held.
    pub fn mouse_press(&mut self, buttons: MouseButtons) -> ClientResult<()> {
        self.require_mode(Mode::Data, "mouse_press")?;
        self.mouse_buttons |= buttons;
        self.send_mouse(0, 0, 0, "mouse_press")
    }

    /// Release `buttons`.
    pub fn mouse_release(&mut self, buttons: MouseButtons) -> ClientResult<()> {
        self.require_mode(Mode::Data, "mouse_release")?;
        self.mouse_buttons.remove(buttons);
        self.send_mouse(0, 0, 0, "mouse_release")
    }

    /// Press and release `buttons`.
    pub fn mouse_click(&mut self, buttons: MouseButtons) -> ClientResult<()> {
        self.mouse_press(buttons)?;
        self.mouse_release(buttons)
    }

    /// Release every button (all-zero report).
    pub fn mouse_release_all(&mut self) -> ClientResult<()> {
        self.require_mode(Mode::Data, "mouse_release_all")?;
        self.mouse_buttons = MouseButtons::NONE;
        self.send_mouse(0, 0, 0, "mouse_release_all")
    }

    fn send_mouse(&mut self, dx: i8, dy: i8, wheel: i8, operation: &'static str) -> ClientResult<()> {
        self.require_mode(Mode::Data, operation)?;
        let report = MouseReport {
            buttons: self.mouse_buttons,
            dx,
            dy,
            wheel,
        };
        self.send_report(HidReport::Mouse(report))
    }

    // ========================================================================
    // Gamepad / Joystick
    // ========================================================================

    /// Set both button banks. Stick positions are kept.
    pub fn gamepad_press(&mut self, first: GamepadButtons, second: GamepadButtons) -> ClientResult<()> {
        self.require_mode(Mode::Data, "gamepad_press")?;
        self.gamepad.first = first;
        self.gamepad.second = second;
        let report = self.gamepad;
        self.send_report(HidReport::Gamepad(report))
    }

    /// Set both stick positions. Buttons are kept.
    pub fn gamepad_move(&mut self, x1: i8, y1: i8, x2: i8, y2: i8) -> ClientResult<()> {
        self.require_mode(Mode::Data, "gamepad_move")?;
        self.gamepad.x1 = x1;
        self.gamepad.y1 = y1;
        self.gamepad.x2 = x2;
        self.gamepad.y2 = y2;
        let report = self.gamepad;
        self.send_report(HidReport::Gamepad(report))
    }

    /// Release every button and center both sticks.
    pub fn gamepad_release_all(&mut self) -> ClientResult<()> {
        self.require_mode(Mode::Data, "gamepad_release_all")?;
        self.gamepad = GamepadReport::default();
        self.send_report(HidReport::Gamepad(GamepadReport::default()))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn require_mode(&self, expected: Mode, operation: &'static str) -> ClientResult<()> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(ClientError::WrongMode {
                operation,
                mode: self.mode,
            })
        }
    }

    /// Run `f` in command mode, entering and leaving it around the call when
    /// the client starts in data mode. On failure the client still tries to
    /// leave command mode and reports the first error.
    fn with_command_mode<R>(
        &mut self,
        f: impl FnOnce(&mut Self) -> ClientResult<R>,
    ) -> ClientResult<R> {
        let entered = self.mode == Mode::Data;
        if entered {
            self.enter_command_mode()?;
        }

        let result = f(self);

        if entered && self.mode == Mode::Command {
            match &result {
                Ok(_) => self.exit_command_mode()?,
                Err(e) => {
                    if let Err(exit_err) = self.exit_command_mode() {
                        warn!("Failed to leave command mode after error ({}): {}", e, exit_err);
                    }
                }
            }
        }
        result
    }

    fn reset_hid_state(&mut self) {
        self.keyboard = KeyboardReport::default();
        self.mouse_buttons = MouseButtons::NONE;
        self.gamepad = GamepadReport::default();
    }

    fn write(&mut self, data: &[u8]) -> ClientResult<()> {
        self.transport.write_all(data)?;
        self.transport.flush()?;
        metrics::counter!(metric_defs::TX_BYTES.name).increment(data.len() as u64);
        Ok(())
    }

    fn write_command(&mut self, command: &Command) -> ClientResult<()> {
        let label = command.describe();
        trace!("Sending command '{}'", label);
        self.write(&command.encode())?;
        metrics::counter!(metric_defs::COMMANDS_SENT.name, "command" => label).increment(1);
        Ok(())
    }

    fn send_report(&mut self, report: HidReport) -> ClientResult<()> {
        trace!("Sending {} report {:?}", report.kind(), report);
        self.write(&report.encode())?;
        metrics::counter!(metric_defs::HID_REPORTS.name, "kind" => report.kind()).increment(1);
        Ok(())
    }

    /// Write a command and wait for `expected`.
    fn transact(&mut self, command: &Command, expected: StatusToken) -> ClientResult<()> {
        self.write_command(command)?;
        let result = self.await_token(expected);
        self.record_outcome(command, &result);
        result
    }

    fn record_outcome<R>(&self, command: &Command, result: &ClientResult<R>) {
        let label = command.describe();
        match result {
            Ok(_) => {
                metrics::counter!(metric_defs::COMMANDS_ACKED.name, "command" => label).increment(1);
            }
            Err(e) => {
                let reason = match e {
                    ClientError::NoReply { .. } => "no_reply",
                    ClientError::UnexpectedReply { .. } => "unexpected_reply",
                    ClientError::Protocol(_) => "protocol",
                    _ => "io",
                };
                warn!("Command '{}' failed: {}", label, e);
                metrics::counter!(
                    metric_defs::COMMANDS_FAILED.name,
                    "command" => label,
                    "reason" => reason
                )
                .increment(1);
            }
        }
    }

    /// Read until `expected` arrives, a failure token arrives, or the idle
    /// budget runs out. Value lines and `/#` status strings are skipped.
    fn await_token(&mut self, expected: StatusToken) -> ClientResult<()> {
        self.await_reply(&expected.to_string(), |line| match line {
            ReplyLine::Status(token) if token == expected => Some(Ok(())),
            ReplyLine::Status(token) => Some(Err(token.text().to_string())),
            ReplyLine::Event(_) | ReplyLine::Value(_) => None,
        })
    }

    /// Read the next value line. A status token in its place is a failure.
    fn await_value(&mut self) -> ClientResult<String> {
        self.await_reply("value", |line| match line {
            ReplyLine::Value(value) => Some(Ok(value)),
            ReplyLine::Status(token) => Some(Err(token.text().to_string())),
            ReplyLine::Event(_) => None,
        })
    }

    /// Core read loop. `accept` maps a reply line to `Some(Ok)` (done),
    /// `Some(Err(got))` (wrong reply) or `None` (skip and keep reading).
    fn await_reply<R>(
        &mut self,
        expected: &str,
        mut accept: impl FnMut(ReplyLine) -> Option<Result<R, String>>,
    ) -> ClientResult<R> {
        let mut idle = IdleCounter::new(self.config.idle_poll_budget);
        loop {
            while let Some(line) = self.decode_reply()? {
                match accept(line.clone()) {
                    Some(Ok(value)) => return Ok(value),
                    Some(Err(got)) => {
                        return Err(ClientError::UnexpectedReply {
                            expected: expected.to_string(),
                            got,
                        })
                    }
                    None => trace!("Skipping reply line {:?} while waiting for {}", line, expected),
                }
            }

            match self.transport.read_byte()? {
                Some(byte) => {
                    self.codec.push(&[byte]);
                    idle.reset();
                }
                None => {
                    if idle.exhausted_after_poll() {
                        let received = self.codec.buffer_as_str();
                        self.codec.clear();
                        return Err(ClientError::NoReply {
                            expected: expected.to_string(),
                            received,
                        });
                    }
                }
            }
        }
    }

    /// Next reply line. A codec error also drops whatever was buffered.
    fn decode_reply(&mut self) -> ClientResult<Option<ReplyLine>> {
        self.codec.decode_reply().map_err(|e| {
            warn!("Discarding reply buffer: {}", e);
            self.codec.clear();
            ClientError::from(e)
        })
    }
}

/// Consecutive empty polls against a budget.
#[derive(Debug)]
struct IdleCounter {
    polls: u32,
    budget: u32,
}

impl IdleCounter {
    fn new(budget: u32) -> Self {
        IdleCounter { polls: 0, budget }
    }

    fn reset(&mut self) {
        self.polls = 0;
    }

    /// Count one empty poll; true once the budget is exceeded.
    fn exhausted_after_poll(&mut self) -> bool {
        self.polls = self.polls.saturating_add(1);
        self.polls > self.budget
    }
}
