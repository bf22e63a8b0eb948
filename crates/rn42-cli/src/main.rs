//! `rn42`: configure and drive an RN-42 module from the command line.
//!
//! ```text
//! rn42 --port /dev/ttyUSB0 setup --mode hid --hid keyboard
//! rn42 --port /dev/ttyUSB0 type "hello world"
//! rn42 --emulate -vv provision desk.yaml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use rn42_client::{
    ClientConfig, ClientError, ProvisionProfile, Rn42Client, SerialTransport, Transport,
    DEFAULT_BAUD_RATE,
};
use rn42_emulator::{EmulatorEvent, ModuleSettings, Rn42Emulator};
use rn42_protocol::{
    Command, ConnectMode, GamepadButtons, HidProfile, Key, Modifiers, MouseButtons, ProfileMode,
};
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("serial port error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Usage(String),
}

type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serial port the module is attached to.
    #[arg(short, long)]
    port: Option<String>,

    /// UART baud rate.
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Per-read timeout in milliseconds.
    #[arg(long, default_value_t = 50)]
    timeout_ms: u64,

    /// Talk to a software module instead of a serial port.
    #[arg(long, conflicts_with = "port")]
    emulate: bool,

    /// Client configuration file (YAML).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More logging (-v info, -vv debug, -vvv trace). Overrides RUST_LOG.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// List serial ports.
    Ports,

    /// Select the Bluetooth profile and reboot.
    Setup {
        #[arg(long, default_value = "hid", value_parser = parse_mode)]
        mode: ProfileMode,
        #[arg(long, default_value = "keyboard", value_parser = parse_hid)]
        hid: HidProfile,
    },

    /// Change the advertised name.
    Name { name: String },

    /// Select automatic or manual connection.
    ConnectMode {
        #[arg(value_parser = parse_connect)]
        mode: ConnectMode,
    },

    /// Ask the module to connect to its stored host.
    Reconnect,

    /// Show connection state and HID profile.
    Status,

    /// Type text as keystrokes.
    Type { text: String },

    /// Tap one key, optionally with modifiers.
    Key {
        #[arg(value_parser = parse_key)]
        key: Key,
        /// Modifier to hold (ctrl, shift, alt, gui, rctrl, ...). Repeatable.
        #[arg(short, long = "mod", value_parser = parse_modifier)]
        modifiers: Vec<Modifiers>,
    },

    /// Move, scroll or click the mouse.
    Mouse {
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        dx: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        dy: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        wheel: i8,
        /// Button to click after moving (left, right, middle).
        #[arg(long, value_parser = parse_button)]
        click: Option<MouseButtons>,
    },

    /// Send one gamepad report, then release everything.
    Gamepad {
        /// Buttons of the first bank (0-7). Repeatable.
        #[arg(long)]
        press: Vec<u8>,
        /// Buttons of the second bank (0-7). Repeatable.
        #[arg(long)]
        second: Vec<u8>,
        /// Stick positions: X1 Y1 X2 Y2.
        #[arg(long, num_args = 4, allow_hyphen_values = true)]
        sticks: Option<Vec<i8>>,
        /// Keep the report held instead of releasing.
        #[arg(long)]
        hold: bool,
    },

    /// Apply a provisioning profile (YAML).
    Provision { profile: PathBuf },

    /// Send a raw command line in its own command-mode session.
    Raw { command: String },
}

fn parse_mode(s: &str) -> Result<ProfileMode, String> {
    ProfileMode::from_str(s).ok_or_else(|| format!("unknown mode '{}' (spp, hid)", s))
}

fn parse_hid(s: &str) -> Result<HidProfile, String> {
    HidProfile::from_str(s)
        .ok_or_else(|| format!("unknown HID profile '{}' (keyboard, mouse, gamepad, joystick, combo)", s))
}

fn parse_connect(s: &str) -> Result<ConnectMode, String> {
    ConnectMode::from_str(s).ok_or_else(|| format!("unknown connect mode '{}' (auto, manual)", s))
}

fn parse_key(s: &str) -> Result<Key, String> {
    Key::from_name(s).ok_or_else(|| format!("unknown key '{}'", s))
}

fn parse_modifier(s: &str) -> Result<Modifiers, String> {
    Modifiers::from_name(s).ok_or_else(|| format!("unknown modifier '{}'", s))
}

fn parse_button(s: &str) -> Result<MouseButtons, String> {
    MouseButtons::from_name(s).ok_or_else(|| format!("unknown mouse button '{}'", s))
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    rn42_client::metrics::describe_metrics();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Cmd::Ports = cli.command {
        for port in SerialTransport::available_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };

    if cli.emulate {
        let settings = ModuleSettings {
            mode: ProfileMode::Hid,
            ..Default::default()
        };
        let mut client = Rn42Client::with_config(Rn42Emulator::with_settings(settings), config);
        execute(&mut client, &cli.command)?;
        report_emulator(client.transport());
        return Ok(());
    }

    let port = cli
        .port
        .as_deref()
        .ok_or_else(|| CliError::Usage("no serial port given (use --port or --emulate)".to_string()))?;
    let transport = SerialTransport::open(port, cli.baud, Duration::from_millis(cli.timeout_ms))?;
    let mut client = Rn42Client::with_config(transport, config);
    execute(&mut client, &cli.command)
}

fn execute<T: Transport>(client: &mut Rn42Client<T>, command: &Cmd) -> CliResult<()> {
    debug!("Running {:?}", command);
    match command {
        Cmd::Ports => {}
        Cmd::Setup { mode, hid } => {
            client.begin(*mode, *hid)?;
            info!("Module configured for {:?}/{:?}", mode, hid);
        }
        Cmd::Name { name } => client.change_name(name)?,
        Cmd::ConnectMode { mode } => client.set_connect_mode(*mode)?,
        Cmd::Reconnect => client.reconnect()?,
        Cmd::Status => {
            let connected = client.connected()?;
            let hid = client.hid_profile()?;
            println!("connected: {}", if connected { "yes" } else { "no" });
            println!("hid profile: {:?} ({})", hid, hid.code());
        }
        Cmd::Type { text } => client.keyboard_print(text)?,
        Cmd::Key { key, modifiers } => {
            let held = modifiers
                .iter()
                .fold(Modifiers::NONE, |acc, m| acc | *m);
            client.keyboard_tap(*key, held)?;
        }
        Cmd::Mouse { dx, dy, wheel, click } => {
            if *dx != 0 || *dy != 0 {
                client.mouse_move_by(*dx, *dy)?;
            }
            if *wheel != 0 {
                client.mouse_wheel(*wheel)?;
            }
            if let Some(buttons) = click {
                client.mouse_click(*buttons)?;
            }
        }
        Cmd::Gamepad {
            press,
            second,
            sticks,
            hold,
        } => {
            let first = gamepad_bank(press)?;
            let second = gamepad_bank(second)?;
            client.gamepad_press(first, second)?;
            if let Some(&[x1, y1, x2, y2]) = sticks.as_deref() {
                client.gamepad_move(x1, y1, x2, y2)?;
            }
            if !hold {
                client.gamepad_release_all()?;
            }
        }
        Cmd::Provision { profile } => {
            let profile = ProvisionProfile::load(profile)?;
            if !profile.has_configuration() {
                info!("Profile only reboots the module");
            }
            client.provision(&profile)?;
        }
        Cmd::Raw { command } => {
            if command.contains(['\r', '\n']) || command.is_empty() {
                return Err(CliError::Usage("raw command must be a single line".to_string()));
            }
            client.configure(&Command::Raw {
                command: command.clone(),
            })?;
        }
    }
    Ok(())
}

fn gamepad_bank(indices: &[u8]) -> CliResult<GamepadButtons> {
    indices.iter().try_fold(GamepadButtons::NONE, |acc, &i| {
        GamepadButtons::button(i)
            .map(|b| acc | b)
            .ok_or_else(|| CliError::Usage(format!("gamepad button {} out of range (0-7)", i)))
    })
}

fn report_emulator(module: &Rn42Emulator) {
    let settings = module.settings();
    println!(
        "emulated module: name={} mode={:?} hid={:?} connect={:?}",
        settings.name, settings.mode, settings.hid, settings.connect
    );
    for event in module.events() {
        match event {
            EmulatorEvent::Report(report) => println!("  report {:?}", report),
            EmulatorEvent::Byte(b) => println!("  byte 0x{:02X}", b),
            EmulatorEvent::Malformed(frame) => println!("  malformed {:02X?}", frame),
            EmulatorEvent::Rebooted => println!("  rebooted"),
            EmulatorEvent::ConnectAttempt => println!("  connect attempt"),
        }
    }
    for rejected in module.rejected() {
        println!("  {}", rejected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emulated(args: &[&str]) -> (CliResult<()>, Rn42Emulator) {
        let cli = Cli::try_parse_from(args).unwrap();
        let config = ClientConfig {
            idle_poll_budget: 2,
            reboot_settle_ms: 0,
            ..Default::default()
        };
        let settings = ModuleSettings {
            mode: ProfileMode::Hid,
            ..Default::default()
        };
        let mut client = Rn42Client::with_config(Rn42Emulator::with_settings(settings), config);
        let result = execute(&mut client, &cli.command);
        (result, client.into_inner())
    }

    #[test]
    fn test_parse_setup() {
        let cli = Cli::try_parse_from(["rn42", "--emulate", "setup", "--mode", "spp"]).unwrap();
        assert!(cli.emulate);
        assert!(matches!(
            cli.command,
            Cmd::Setup {
                mode: ProfileMode::Spp,
                hid: HidProfile::Keyboard
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unknown_key() {
        assert!(Cli::try_parse_from(["rn42", "--emulate", "key", "NOT_A_KEY"]).is_err());
    }

    #[test]
    fn test_port_conflicts_with_emulate() {
        assert!(Cli::try_parse_from(["rn42", "--emulate", "--port", "COM3", "status"]).is_err());
    }

    #[test]
    fn test_setup_command() {
        let (result, module) = emulated(&["rn42", "setup", "--hid", "mouse"]);
        result.unwrap();
        assert_eq!(module.active_settings().hid, HidProfile::Mouse);
    }

    #[test]
    fn test_key_with_modifiers() {
        let (result, module) = emulated(&["rn42", "key", "DELETE", "--mod", "ctrl", "--mod", "alt"]);
        result.unwrap();

        let reports = module.reports();
        assert_eq!(reports.len(), 2);
        match reports[0] {
            rn42_protocol::HidReport::Keyboard(k) => {
                assert_eq!(k.modifiers, Modifiers::LEFT_CTRL | Modifiers::LEFT_ALT);
                assert_eq!(k.keys[0], Key::DELETE);
            }
            other => panic!("unexpected report {:?}", other),
        }
    }

    #[test]
    fn test_mouse_negative_move() {
        let (result, module) = emulated(&["rn42", "mouse", "--dx", "-20", "--click", "left"]);
        result.unwrap();
        assert_eq!(module.reports().len(), 3);
    }

    #[test]
    fn test_gamepad_bank_range() {
        assert_eq!(
            gamepad_bank(&[0, 7]).unwrap(),
            GamepadButtons::BTN0 | GamepadButtons::BTN7
        );
        assert!(matches!(gamepad_bank(&[8]), Err(CliError::Usage(_))));
    }

    #[test]
    fn test_raw_error_reply() {
        let (result, _) = emulated(&["rn42", "raw", "S~,9"]);
        assert!(matches!(
            result,
            Err(CliError::Client(ClientError::UnexpectedReply { .. }))
        ));
    }
}
