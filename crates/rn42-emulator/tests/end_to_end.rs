//! End-to-end tests: the client driving the emulated module.

use rn42_client::{ClientConfig, ClientError, Mode, ProvisionProfile, Rn42Client};
use rn42_emulator::{EmulatorEvent, ModuleSettings, Rn42Emulator};
use rn42_protocol::{
    char_to_key, ConnectMode, GamepadButtons, GamepadReport, HidProfile, HidReport, Key,
    KeyboardReport, Modifiers, MouseButtons, MouseReport, ProfileMode,
};

fn test_config() -> ClientConfig {
    ClientConfig {
        idle_poll_budget: 3,
        reboot_settle_ms: 0,
        ..Default::default()
    }
}

fn hid_client(hid: HidProfile) -> Rn42Client<Rn42Emulator> {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client
        .begin(ProfileMode::Hid, hid)
        .expect("begin should succeed against the emulator");
    client.transport_mut().take_events();
    client
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_begin_configures_module() {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client.begin(ProfileMode::Hid, HidProfile::Combo).unwrap();

    assert_eq!(client.mode(), Mode::Data);
    let module = client.transport();
    assert_eq!(module.mode(), Mode::Data);
    assert_eq!(module.active_settings().mode, ProfileMode::Hid);
    assert_eq!(module.active_settings().hid, HidProfile::Combo);
    assert_eq!(
        module.commands(),
        &["$$$", "S~,6", "SH,0230", "R,1"].map(String::from)
    );
    assert!(module.check_rejections().is_ok());
}

#[test]
fn test_name_and_connect_mode() {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client.change_name("DeskKeyboard").unwrap();
    client.set_connect_mode(ConnectMode::Auto).unwrap();
    client.enable_status_string().unwrap();

    let settings = client.transport().settings();
    assert_eq!(settings.name, "DeskKeyboard");
    assert_eq!(settings.connect, ConnectMode::Auto);
    assert_eq!(settings.status_prefix, "/#");
    assert_eq!(client.mode(), Mode::Data);
}

#[test]
fn test_queries() {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    assert!(!client.connected().unwrap());

    client.transport_mut().set_connected(true);
    assert!(client.connected().unwrap());

    client
        .configure(&rn42_protocol::Command::SetHidProfile(HidProfile::Joystick))
        .unwrap();
    assert_eq!(client.hid_profile().unwrap(), HidProfile::Joystick);
}

#[test]
fn test_reconnect() {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client.reconnect().unwrap();
    assert!(client
        .transport()
        .events()
        .contains(&EmulatorEvent::ConnectAttempt));
}

#[test]
fn test_provision_profile() {
    let yaml = r#"
name: Arcade
hid: gamepad
connect: manual
status_string: true
commands:
  - "SA,0"
"#;
    let profile = ProvisionProfile::from_yaml(yaml).unwrap();
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client.provision(&profile).unwrap();

    let module = client.transport();
    let active = module.active_settings();
    assert_eq!(active.name, "Arcade");
    assert_eq!(active.mode, ProfileMode::Hid);
    assert_eq!(active.hid, HidProfile::Gamepad);
    assert_eq!(active.connect, ConnectMode::Manual);
    assert_eq!(active.extra, vec!["SA,0".to_string()]);
    assert_eq!(module.mode(), Mode::Data);
    assert_eq!(client.mode(), Mode::Data);
}

#[test]
fn test_provision_without_reboot_leaves_command_mode() {
    let profile = ProvisionProfile {
        name: Some("NoReboot".to_string()),
        reboot: false,
        ..Default::default()
    };
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client.provision(&profile).unwrap();

    let module = client.transport();
    assert_eq!(module.settings().name, "NoReboot");
    // Stored but not applied
    assert_eq!(module.active_settings().mode, ProfileMode::Spp);
    assert_eq!(module.commands().last().map(String::as_str), Some("---"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_rejected_command_restores_data_mode() {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    let err = client
        .configure(&rn42_protocol::Command::Raw {
            command: "S~,9".to_string(),
        })
        .unwrap_err();

    assert!(matches!(err, ClientError::UnexpectedReply { ref got, .. } if got == "ERR"));
    assert_eq!(client.mode(), Mode::Data);
    assert_eq!(client.transport().mode(), Mode::Data);
    assert_eq!(client.transport().rejected().len(), 1);
}

#[test]
fn test_silent_module_times_out() {
    let mut module = Rn42Emulator::new();
    module.set_silent(true);
    let mut client = Rn42Client::with_config(module, test_config());

    let err = client.begin(ProfileMode::Hid, HidProfile::Keyboard).unwrap_err();
    assert!(matches!(err, ClientError::NoReply { .. }));
    assert_eq!(client.mode(), Mode::Data);
}

#[test]
fn test_unplugged_link() {
    let mut module = Rn42Emulator::new();
    module.unplug();
    let mut client = Rn42Client::with_config(module, test_config());

    assert!(matches!(client.enter_command_mode(), Err(ClientError::Io(_))));
    assert!(matches!(client.send_byte(b'x'), Err(ClientError::Io(_))));
}

#[test]
fn test_status_string_during_command_is_skipped() {
    let settings = ModuleSettings {
        status_prefix: "/#".to_string(),
        ..Default::default()
    };
    let mut client = Rn42Client::with_config(Rn42Emulator::with_settings(settings), test_config());
    client.transport_mut().set_connected(true);

    // The CONNECT line is queued ahead of CMD
    client.change_name("Late").unwrap();
    assert_eq!(client.transport().settings().name, "Late");
}

// ============================================================================
// HID Reports
// ============================================================================

#[test]
fn test_keyboard_reports_decode() {
    let mut client = hid_client(HidProfile::Keyboard);
    client
        .keyboard_press(Key::A, Modifiers::LEFT_CTRL | Modifiers::LEFT_ALT)
        .unwrap();
    client.keyboard_press(Key::DELETE, Modifiers::LEFT_CTRL | Modifiers::LEFT_ALT).unwrap();
    client.keyboard_release_all().unwrap();

    let mods = Modifiers::LEFT_CTRL | Modifiers::LEFT_ALT;
    let mut both = KeyboardReport::single(Key::A, mods);
    both.press(Key::DELETE, mods);

    assert_eq!(
        client.transport().reports(),
        vec![
            HidReport::Keyboard(KeyboardReport::single(Key::A, mods)),
            HidReport::Keyboard(both),
            HidReport::Keyboard(KeyboardReport::default()),
        ]
    );
}

#[test]
fn test_keyboard_print_decodes_to_text() {
    let mut client = hid_client(HidProfile::Keyboard);
    let message = "Hello, World! 42\n";
    client.keyboard_print(message).unwrap();

    let reports = client.transport().reports();
    assert_eq!(reports.len(), message.len() * 2);

    for (c, pair) in message.chars().zip(reports.chunks(2)) {
        let (key, modifiers) = char_to_key(c).unwrap();
        assert_eq!(pair[0], HidReport::Keyboard(KeyboardReport::single(key, modifiers)));
        assert_eq!(pair[1], HidReport::Keyboard(KeyboardReport::default()));
    }
    assert!(client.transport().passthrough().is_empty());
}

#[test]
fn test_mouse_reports_decode() {
    let mut client = hid_client(HidProfile::Mouse);
    client.mouse_press(MouseButtons::LEFT).unwrap();
    client.mouse_move(-128, 127).unwrap();
    client.mouse_release_all().unwrap();
    client.mouse_wheel(-1).unwrap();

    let held = MouseReport {
        buttons: MouseButtons::LEFT,
        ..Default::default()
    };
    assert_eq!(
        client.transport().reports(),
        vec![
            HidReport::Mouse(held),
            HidReport::Mouse(MouseReport {
                dx: -128,
                dy: 127,
                ..held
            }),
            HidReport::Mouse(MouseReport::default()),
            HidReport::Mouse(MouseReport {
                wheel: -1,
                ..Default::default()
            }),
        ]
    );
}

#[test]
fn test_mouse_move_by_total_distance() {
    let mut client = hid_client(HidProfile::Mouse);
    client.mouse_move_by(-1000, 555).unwrap();

    let (total_x, total_y) = client
        .transport()
        .reports()
        .iter()
        .fold((0i32, 0i32), |(x, y), report| match report {
            HidReport::Mouse(m) => (x + m.dx as i32, y + m.dy as i32),
            _ => panic!("unexpected report {:?}", report),
        });
    assert_eq!((total_x, total_y), (-1000, 555));
}

#[test]
fn test_gamepad_reports_decode() {
    let mut client = hid_client(HidProfile::Gamepad);
    let first = GamepadButtons::BTN0 | GamepadButtons::BTN7;
    client.gamepad_press(first, GamepadButtons::NONE).unwrap();
    client.gamepad_move(-100, 100, 0, -1).unwrap();
    client.gamepad_release_all().unwrap();

    let pressed = GamepadReport {
        first,
        ..Default::default()
    };
    assert_eq!(
        client.transport().reports(),
        vec![
            HidReport::Gamepad(pressed),
            HidReport::Gamepad(GamepadReport {
                x1: -100,
                y1: 100,
                x2: 0,
                y2: -1,
                ..pressed
            }),
            HidReport::Gamepad(GamepadReport::default()),
        ]
    );
}

#[test]
fn test_raw_text_passes_through() {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client.send_string("hello").unwrap();
    client.send_char('!').unwrap();
    assert_eq!(client.transport().passthrough(), b"hello!");
}

#[test]
fn test_trailing_dollar_passes_through() {
    let mut client = Rn42Client::with_config(Rn42Emulator::new(), test_config());
    client.send_string("cost $").unwrap();
    assert_eq!(client.transport().passthrough(), b"cost $");
    assert_eq!(client.transport().mode(), Mode::Data);

    // A real escape still works afterwards
    client.change_name("Till").unwrap();
    assert_eq!(client.transport().settings().name, "Till");
}

#[test]
fn test_reports_after_reconfigure() {
    let mut client = hid_client(HidProfile::Keyboard);
    client.keyboard_tap(Key::ENTER, Modifiers::NONE).unwrap();

    // A second session in the middle of typing must not disturb decoding
    client.change_name("Typist").unwrap();
    client.keyboard_tap(Key::ESC, Modifiers::NONE).unwrap();

    let taps: Vec<Key> = client
        .transport()
        .reports()
        .into_iter()
        .filter_map(|r| match r {
            HidReport::Keyboard(k) => k.pressed().next(),
            _ => None,
        })
        .collect();
    assert_eq!(taps, vec![Key::ENTER, Key::ESC]);
}
