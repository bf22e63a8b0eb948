//! Integration tests for the client against scripted replies.

use rn42_client::{ClientConfig, ClientError, MockTransport, Mode, Rn42Client};
use rn42_protocol::{
    Command, ConnectMode, HidProfile, ProfileMode, Reply, StatusToken,
};

fn config() -> ClientConfig {
    ClientConfig {
        idle_poll_budget: 4,
        reboot_settle_ms: 0,
        ..Default::default()
    }
}

/// A client already in command mode with `replies` queued after `CMD`.
fn command_mode_client(replies: &[&[u8]]) -> Rn42Client<MockTransport> {
    let mut mock = MockTransport::with_replies(&[b"CMD\r\n"]);
    for reply in replies {
        mock.queue_reply(reply);
    }
    let mut client = Rn42Client::with_config(mock, config());
    client.enter_command_mode().expect("CMD is queued");
    client.transport_mut().take_written();
    client
}

fn all_commands() -> Vec<Command> {
    let mut commands = vec![
        Command::SetMode(ProfileMode::Spp),
        Command::SetMode(ProfileMode::Hid),
        Command::SetConnectMode(ConnectMode::Auto),
        Command::SetConnectMode(ConnectMode::Manual),
        Command::StatusString,
        Command::SppProtocol,
        Command::GetHidProfile,
        Command::GetConnectionStatus,
        Command::Reconnect,
        Command::Reboot,
        Command::set_name("Foo").unwrap(),
        Command::Raw {
            command: "SA,0".to_string(),
        },
    ];
    commands.extend(HidProfile::ALL.into_iter().map(Command::SetHidProfile));
    commands
}

fn success_reply(command: &Command) -> &'static [u8] {
    match command.reply() {
        Reply::Token(token) => token.as_bytes(),
        Reply::Value => b"0200\r\n",
    }
}

#[test]
fn test_every_command_writes_exact_bytes() {
    for command in all_commands() {
        let mut client = command_mode_client(&[success_reply(&command)]);
        client
            .send_command(&command)
            .unwrap_or_else(|e| panic!("{} failed: {}", command.describe(), e));
        assert_eq!(
            client.transport().written(),
            command.encode().as_slice(),
            "bytes for {}",
            command.describe()
        );
    }
}

#[test]
fn test_every_acknowledged_command_fails_on_err() {
    for command in all_commands() {
        if command.acknowledgment().is_none() {
            continue;
        }
        let mut client = command_mode_client(&[StatusToken::Err.as_bytes()]);
        let err = client.send_command(&command).unwrap_err();
        assert!(
            matches!(err, ClientError::UnexpectedReply { .. }),
            "{}: {:?}",
            command.describe(),
            err
        );
    }
}

#[test]
fn test_begin_depends_on_acknowledgments() {
    let complete: [&[u8]; 4] = [b"CMD\r\n", b"AOK\r\n", b"AOK\r\n", b"Reboot!\r\n"];

    // Every prefix of the conversation short of the full one fails
    for cut in 0..complete.len() {
        let mut client = Rn42Client::with_config(MockTransport::with_replies(&complete[..cut]), config());
        assert!(
            client.begin(ProfileMode::Hid, HidProfile::Gamepad).is_err(),
            "succeeded with only {} replies",
            cut
        );
    }

    let mut client = Rn42Client::with_config(MockTransport::with_replies(&complete), config());
    client.begin(ProfileMode::Hid, HidProfile::Gamepad).unwrap();
    assert_eq!(client.mode(), Mode::Data);
    assert_eq!(
        client.transport().written(),
        b"$$$S~,6\r\nSH,0210\r\nR,1\r\n".as_slice()
    );
}

#[test]
fn test_replies_split_across_reads() {
    let mut client = Rn42Client::with_config(
        MockTransport::with_replies(&[b"C", b"M", b"D\r", b"\n"]),
        config(),
    );
    client.enter_command_mode().unwrap();
    assert_eq!(client.mode(), Mode::Command);
}

#[test]
fn test_oversized_reply_is_protocol_error() {
    let noise = [b'x'; 100];
    let mut client = Rn42Client::with_config(
        MockTransport::with_replies(&[&noise, b"\r\nCMD\r\n"]),
        config(),
    );
    assert!(matches!(
        client.enter_command_mode(),
        Err(ClientError::Protocol(_))
    ));
    assert_eq!(client.mode(), Mode::Data);

    // The rest of the long line is skipped and the next CMD is read
    client.enter_command_mode().unwrap();
    assert_eq!(client.mode(), Mode::Command);
    assert_eq!(client.transport().pending(), 0);
}

#[test]
fn test_oversized_reply_during_configure_returns_to_data_mode() {
    let noise = [b'x'; 100];
    let mut client = Rn42Client::with_config(
        MockTransport::with_replies(&[b"CMD\r\n", &noise, b"\r\nEND\r\n"]),
        config(),
    );

    let err = client
        .configure(&Command::SetConnectMode(ConnectMode::Auto))
        .unwrap_err();
    assert!(matches!(err, ClientError::Protocol(_)));
    assert_eq!(client.mode(), Mode::Data);
    assert_eq!(client.transport().written(), b"$$$SM,6\r\n---\r\n".as_slice());

    // Later sessions work normally
    client.transport_mut().queue_reply(b"CMD\r\nAOK\r\nEND\r\n");
    client.set_connect_mode(ConnectMode::Manual).unwrap();
    assert_eq!(client.mode(), Mode::Data);
}

#[test]
fn test_value_query_rejects_token() {
    let mut client = command_mode_client(&[b"?\r\n"]);
    let err = client.query(&Command::GetConnectionStatus).unwrap_err();
    assert!(matches!(
        err,
        ClientError::UnexpectedReply { ref expected, ref got } if expected == "value" && got == "?"
    ));
}

#[test]
fn test_config_from_yaml_drives_budget() {
    let config = ClientConfig::from_yaml("idle_poll_budget: 0\nreboot_settle_ms: 0\n").unwrap();
    let mut client = Rn42Client::with_config(MockTransport::new(), config);
    assert!(client.enter_command_mode().is_err());
    assert_eq!(client.transport().reads(), 1);
}
