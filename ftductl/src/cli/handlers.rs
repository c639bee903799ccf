//! Command execution handlers

use anyhow::{Context, Result};
use ftduino_core::{FtduinoError, OutputLevel, Port, PortKind};
use ftduino_hardware::{Command, DeviceBus, Discovery, FtDuino, SerialTransport};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::config::CliConfig;
use crate::format::{
    format_config, format_device_info, format_devices, format_flag, format_readings,
    format_reply, format_success, DeviceInfo, Reading,
};

use super::commands::*;

/// Interval between `motor_counter_active` polls for `motor steps --wait`
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Pick the device path: explicit path, else identifier lookup, else first found
pub fn select_device_path<B: DeviceBus>(
    discovery: &Discovery<B>,
    config: &CliConfig,
) -> Result<String> {
    if let Some(device) = &config.device {
        return Ok(device.clone());
    }

    if let Some(identifier) = &config.identifier {
        debug!("Looking up ftDuino '{}'", identifier);
        return discovery
            .find_by_identifier(identifier)?
            .ok_or_else(|| FtduinoError::IdentifierNotFound(identifier.clone()).into());
    }

    Ok(discovery.auto_select()?)
}

/// Open the board selected by the configuration
pub fn connect(config: &CliConfig) -> Result<FtDuino> {
    let path = select_device_path(&Discovery::with_link(config.link), config)?;
    let ftd = FtDuino::open_with(&path, &config.link)
        .with_context(|| format!("Cannot connect to ftDuino at {}", path))?;
    Ok(ftd.with_protocol(config.protocol))
}

/// Handle list command
pub fn handle_list<B: DeviceBus>(discovery: &Discovery<B>, format: &OutputFormat) -> Result<()> {
    let devices: Vec<_> = discovery.enumerate()?.collect();
    println!("{}", format_devices(&devices, format)?);
    Ok(())
}

/// Handle find command
pub fn handle_find<B: DeviceBus>(
    discovery: &Discovery<B>,
    identifier: &str,
    format: &OutputFormat,
) -> Result<()> {
    let path = discovery
        .find_by_identifier(identifier)?
        .ok_or_else(|| FtduinoError::IdentifierNotFound(identifier.to_string()))?;

    match format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "identifier": identifier,
                "path": path
            });
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Table => println!("{}", path),
    }

    Ok(())
}

/// Handle commands that talk to a board
pub fn handle_device<T: SerialTransport>(
    ftd: &mut FtDuino<T>,
    command: DeviceCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        DeviceCommands::Info => {
            let info = DeviceInfo {
                path: ftd.transport().port_path().map(str::to_string),
                identifier: ftd.device_identity_get()?,
                version: ftd.device_protocol_version_get()?,
                protocol: ftd.protocol(),
            };
            println!("{}", format_device_info(&info, format)?);
        }
        DeviceCommands::Exec { verb, args } => {
            let command = args.iter().fold(Command::new(verb), |cmd, arg| cmd.arg(arg));
            let reply = ftd.execute(&command)?;
            println!(
                "{}",
                format_reply(&command.to_string(), reply.as_deref(), format)?
            );
        }
        DeviceCommands::Led { state } => {
            ftd.led_set(state.into())?;
            println!(
                "{}",
                format_success(&format!(
                    "LED switched {}",
                    if state == Switch::On { "on" } else { "off" }
                ))
            );
        }
        DeviceCommands::Output { port, state, pwm } => {
            let (level, name) = match state {
                OutputState::On => (OutputLevel::High, "on"),
                OutputState::High => (OutputLevel::High, "high"),
                OutputState::Off => (OutputLevel::Off, "off"),
                OutputState::Low => (OutputLevel::Low, "low"),
            };
            ftd.output_set(port, level, pwm)?;
            println!("{}", format_success(&format!("Set {} {}", port, name)));
        }
        DeviceCommands::Input { command } => handle_input(ftd, command, format)?,
        DeviceCommands::Counter { command } => handle_counter(ftd, command, format)?,
        DeviceCommands::Motor { command } => handle_motor(ftd, command, format)?,
        DeviceCommands::Ultrasonic { command } => match command {
            UltrasonicCommands::Get => {
                let distance = ftd.ultrasonic_get()?;
                match format {
                    OutputFormat::Json => {
                        let response = serde_json::json!({ "distance": distance });
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    }
                    OutputFormat::Table if distance < 0 => {
                        println!("Ultrasonic sensor: disabled");
                    }
                    OutputFormat::Table => println!("Distance: {} cm", distance),
                }
            }
            UltrasonicCommands::Enable => {
                ftd.ultrasonic_enable(true)?;
                println!("{}", format_success("Ultrasonic sensor enabled"));
            }
            UltrasonicCommands::Disable => {
                ftd.ultrasonic_enable(false)?;
                println!("{}", format_success("Ultrasonic sensor disabled"));
            }
        },
        DeviceCommands::Id { command } => match command {
            IdCommands::Get => {
                let identifier = ftd.device_identity_get()?;
                match format {
                    OutputFormat::Json => {
                        let response = serde_json::json!({ "identifier": identifier });
                        println!("{}", serde_json::to_string_pretty(&response)?);
                    }
                    OutputFormat::Table => {
                        println!("{}", identifier.as_deref().unwrap_or("(none)"));
                    }
                }
            }
            IdCommands::Set { identifier } => {
                ftd.device_identity_set(&identifier)?;
                println!(
                    "{}",
                    format_success(&format!("Identifier set to: {}", identifier))
                );
            }
        },
    }

    Ok(())
}

/// Read one port, or every port of `kind` when none is given
fn read_ports<T: SerialTransport>(
    ftd: &mut FtDuino<T>,
    kind: PortKind,
    port: Option<Port>,
    read: fn(&mut FtDuino<T>, Port) -> ftduino_core::Result<i32>,
) -> Result<Vec<Reading>> {
    let ports: Vec<Port> = match port {
        Some(port) => vec![port.expect_kind(kind)?],
        None => Port::all(kind).collect(),
    };

    ports
        .into_iter()
        .map(|port| -> Result<Reading> {
            let value = read(ftd, port)?;
            Ok(Reading { port, value })
        })
        .collect()
}

/// Handle input commands
fn handle_input<T: SerialTransport>(
    ftd: &mut FtDuino<T>,
    command: InputCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        InputCommands::Get { port } => {
            let readings = read_ports(ftd, PortKind::Input, port, FtDuino::<T>::input_get)?;
            println!("{}", format_readings("Inputs:", &readings, format)?);
        }
        InputCommands::Mode { port, mode } => {
            ftd.input_set_mode(port, mode)?;
            println!("{}", format_success(&format!("Set {} mode to {}", port, mode)));
        }
    }

    Ok(())
}

/// Handle counter commands
fn handle_counter<T: SerialTransport>(
    ftd: &mut FtDuino<T>,
    command: CounterCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        CounterCommands::Get { port } => {
            let readings = read_ports(ftd, PortKind::Counter, port, FtDuino::<T>::counter_get)?;
            println!("{}", format_readings("Counters:", &readings, format)?);
        }
        CounterCommands::Clear { port } => {
            ftd.counter_clear(port)?;
            println!("{}", format_success(&format!("Cleared counter {}", port)));
        }
        CounterCommands::State { port } => {
            let state = ftd.counter_get_state(port)?;
            println!("{}", format_flag(&port.to_string(), state, format)?);
        }
        CounterCommands::Mode { port, mode } => {
            ftd.counter_set_mode(port, mode)?;
            println!("{}", format_success(&format!("Set {} mode to {}", port, mode)));
        }
    }

    Ok(())
}

/// Handle motor commands
fn handle_motor<T: SerialTransport>(
    ftd: &mut FtDuino<T>,
    command: MotorCommands,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        MotorCommands::Set {
            port,
            direction,
            pwm,
        } => {
            ftd.motor_set(port, direction, pwm)?;
            println!(
                "{}",
                format_success(&format!("Motor {} set to {}", port, direction))
            );
        }
        MotorCommands::Steps {
            port,
            direction,
            steps,
            pwm,
            wait,
        } => {
            ftd.motor_run(port, direction, pwm, Some(steps))?;
            if wait {
                while ftd.motor_counter_active(port)? {
                    std::thread::sleep(WAIT_POLL_INTERVAL);
                }
            }
            println!(
                "{}",
                format_success(&format!(
                    "Motor {} {} for {} steps{}",
                    port,
                    direction,
                    steps,
                    if wait { ", done" } else { "" }
                ))
            );
        }
        MotorCommands::Active { port } => {
            let active = ftd.motor_counter_active(port)?;
            println!("{}", format_flag(&port.to_string(), active, format)?);
        }
        MotorCommands::Brake { port, state } => {
            ftd.motor_counter_set_brake(port, state.into())?;
            println!(
                "{}",
                format_success(&format!(
                    "Motor {} will {} at the end of a counted run",
                    port,
                    if state == Switch::On { "brake" } else { "coast" }
                ))
            );
        }
    }

    Ok(())
}

/// Handle config commands
pub fn handle_config(
    command: ConfigCommands,
    current_config: &CliConfig,
    path: &Path,
    format: &OutputFormat,
) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            println!("{}", format_config(current_config, path, format)?);
        }
        ConfigCommands::Set { key, value } => {
            // Edits the file, not the merged view
            let mut config = CliConfig::load_from(path)?;
            config.set(&key, &value)?;
            config.save_to(path)?;
            println!("{}", format_success(&format!("Set {} = {}", key, value)));
        }
        ConfigCommands::Reset => {
            CliConfig::default().save_to(path)?;
            println!("{}", format_success("Configuration reset to defaults"));
        }
    }

    Ok(())
}

/// Generate shell completion script
pub fn generate_completion(shell: clap_complete::Shell) {
    use clap::CommandFactory;
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use ftduino_core::{CounterMode, InputMode, MotorDirection, ProtocolRevision};
    use ftduino_hardware::mock::{MockBus, MockTransport};

    const TABLE: OutputFormat = OutputFormat::Table;

    fn run(mock: MockTransport, command: DeviceCommands) -> (Result<()>, Vec<String>) {
        let mut ftd = FtDuino::with_transport(mock);
        let result = handle_device(&mut ftd, command, &TABLE);
        (result, ftd.transport().written().to_vec())
    }

    #[test]
    fn test_select_device_prefers_explicit_path() {
        let discovery = Discovery::new(MockBus::new().with_device("/dev/ttyACM0", Some("a")));
        let config = CliConfig {
            device: Some("COM9".to_string()),
            identifier: Some("a".to_string()),
            ..CliConfig::default()
        };

        assert_eq!(select_device_path(&discovery, &config).unwrap(), "COM9");
        assert_eq!(discovery.bus().scan_count(), 0);
    }

    #[test]
    fn test_select_device_by_identifier() {
        let discovery = Discovery::new(
            MockBus::new()
                .with_device("/dev/ttyACM0", Some("a"))
                .with_device("/dev/ttyACM1", Some("b")),
        );
        let config = CliConfig {
            identifier: Some("b".to_string()),
            ..CliConfig::default()
        };

        assert_eq!(select_device_path(&discovery, &config).unwrap(), "/dev/ttyACM1");

        let missing = CliConfig {
            identifier: Some("c".to_string()),
            ..CliConfig::default()
        };
        let err = select_device_path(&discovery, &missing).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FtduinoError>(),
            Some(FtduinoError::IdentifierNotFound(_))
        ));
    }

    #[test]
    fn test_select_device_auto() {
        let discovery = Discovery::new(MockBus::new().with_device("/dev/ttyACM2", None));
        assert_eq!(
            select_device_path(&discovery, &CliConfig::default()).unwrap(),
            "/dev/ttyACM2"
        );

        let empty = Discovery::new(MockBus::new());
        let err = select_device_path(&empty, &CliConfig::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FtduinoError>(),
            Some(FtduinoError::NoDeviceFound)
        ));
    }

    #[test]
    fn test_handle_list_and_find() {
        let discovery = Discovery::new(
            MockBus::new()
                .with_device("/dev/ttyACM0", Some("Pitje Puck"))
                .with_busy_device("/dev/ttyACM1"),
        );

        handle_list(&discovery, &TABLE).unwrap();
        handle_find(&discovery, "Pitje Puck", &OutputFormat::Json).unwrap();
        assert!(handle_find(&discovery, "nobody", &TABLE).is_err());
    }

    #[test]
    fn test_info() {
        let mut mock = MockTransport::with_path("COM9");
        mock.queue_line("Pitje Puck").queue_line("0.9.1");

        let (result, written) = run(mock, DeviceCommands::Info);

        result.unwrap();
        assert_eq!(written, ["ftduino_id_get\n", "ftduino_direct_get_version\n"]);
    }

    #[test]
    fn test_exec() {
        let mut mock = MockTransport::new();
        mock.queue_line("512");

        let (result, written) = run(
            mock,
            DeviceCommands::Exec {
                verb: "input_get".to_string(),
                args: vec!["I4".to_string()],
            },
        );

        result.unwrap();
        assert_eq!(written, ["input_get I4\n"]);
    }

    #[test]
    fn test_led_and_output() {
        let (result, written) = run(MockTransport::new(), DeviceCommands::Led { state: Switch::On });
        result.unwrap();
        assert_eq!(written, ["led_set 1\n"]);

        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Output {
                port: Port::O5,
                state: OutputState::On,
                pwm: None,
            },
        );
        result.unwrap();
        assert_eq!(written, ["output_set O5 1 512\n"]);

        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Output {
                port: Port::O5,
                state: OutputState::Low,
                pwm: Some(128),
            },
        );
        result.unwrap();
        assert_eq!(written, ["output_set O5 2 128\n"]);
    }

    #[test]
    fn test_output_rejects_wrong_port() {
        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Output {
                port: Port::M1,
                state: OutputState::On,
                pwm: None,
            },
        );

        assert!(result.is_err());
        assert!(written.is_empty());
    }

    #[test]
    fn test_input_get_all_ports() {
        let mut mock = MockTransport::new();
        mock.reply_to_all(b"0\r\n");

        let (result, written) = run(
            mock,
            DeviceCommands::Input {
                command: InputCommands::Get { port: None },
            },
        );

        result.unwrap();
        assert_eq!(written.len(), 8);
        assert_eq!(written[0], "input_get I1\n");
        assert_eq!(written[7], "input_get I8\n");
    }

    #[test]
    fn test_input_get_single_port_checks_kind() {
        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Input {
                command: InputCommands::Get {
                    port: Some(Port::C1),
                },
            },
        );

        assert!(result.is_err());
        assert!(written.is_empty());
    }

    #[test]
    fn test_input_mode() {
        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Input {
                command: InputCommands::Mode {
                    port: Port::I2,
                    mode: InputMode::Resistance,
                },
            },
        );

        result.unwrap();
        assert_eq!(written, ["input_set_mode I2 resistance\n"]);
    }

    #[test]
    fn test_counter_commands() {
        let mut mock = MockTransport::new();
        mock.queue_line("99");
        let (result, written) = run(
            mock,
            DeviceCommands::Counter {
                command: CounterCommands::Get {
                    port: Some(Port::C2),
                },
            },
        );
        result.unwrap();
        assert_eq!(written, ["counter_get C2\n"]);

        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Counter {
                command: CounterCommands::Mode {
                    port: Port::C2,
                    mode: CounterMode::Falling,
                },
            },
        );
        result.unwrap();
        assert_eq!(written, ["counter_set_mode C2 falling\n"]);
    }

    #[test]
    fn test_motor_steps_with_wait_polls_until_done() {
        let mut mock = MockTransport::new();
        mock.queue_reply(b"\n")
            .queue_line("1")
            .queue_line("1")
            .queue_line("0");

        let (result, written) = run(
            mock,
            DeviceCommands::Motor {
                command: MotorCommands::Steps {
                    port: Port::M1,
                    direction: MotorDirection::Left,
                    steps: 38,
                    pwm: None,
                    wait: true,
                },
            },
        );

        result.unwrap();
        assert_eq!(
            written,
            [
                "motor_counter M1 left 512 38\n",
                "motor_counter_active M1\n",
                "motor_counter_active M1\n",
                "motor_counter_active M1\n"
            ]
        );
    }

    #[test]
    fn test_motor_set_respects_protocol_revision() {
        let mut ftd =
            FtDuino::with_transport(MockTransport::new()).with_protocol(ProtocolRevision::Legacy);

        let result = handle_device(
            &mut ftd,
            DeviceCommands::Motor {
                command: MotorCommands::Set {
                    port: Port::M1,
                    direction: MotorDirection::Off,
                    pwm: None,
                },
            },
            &TABLE,
        );

        assert!(result.is_err());
        assert!(ftd.transport().written().is_empty());
    }

    #[test]
    fn test_motor_brake_and_ultrasonic() {
        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Motor {
                command: MotorCommands::Brake {
                    port: Port::M4,
                    state: Switch::Off,
                },
            },
        );
        result.unwrap();
        assert_eq!(written, ["motor_counter_set_brake M4 false\n"]);

        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Ultrasonic {
                command: UltrasonicCommands::Enable,
            },
        );
        result.unwrap();
        assert_eq!(written, ["ultrasonic_enable true\n"]);
    }

    #[test]
    fn test_id_set() {
        let (result, written) = run(
            MockTransport::new(),
            DeviceCommands::Id {
                command: IdCommands::Set {
                    identifier: "Pitje Puck".to_string(),
                },
            },
        );

        result.unwrap();
        assert_eq!(written, ["ftduino_id_set Pitje Puck\n"]);
    }

    #[test]
    fn test_handle_config_set_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.toml");
        let current = CliConfig::default();

        handle_config(
            ConfigCommands::Set {
                key: "device".to_string(),
                value: "COM9".to_string(),
            },
            &current,
            &path,
            &TABLE,
        )
        .unwrap();
        assert_eq!(
            CliConfig::load_from(&path).unwrap().device.as_deref(),
            Some("COM9")
        );

        assert!(handle_config(
            ConfigCommands::Set {
                key: "output_format".to_string(),
                value: "xml".to_string(),
            },
            &current,
            &path,
            &TABLE,
        )
        .is_err());

        handle_config(ConfigCommands::Reset, &current, &path, &TABLE).unwrap();
        assert_eq!(CliConfig::load_from(&path).unwrap(), CliConfig::default());
    }
}
