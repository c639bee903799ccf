//! Line command protocol
//!
//! One command line out, one reply line back. A command is a verb followed by
//! space-separated arguments and a `\n`. The reply is a single line; a bare
//! `\n` (or nothing at all before the timeout) means the device has no value
//! to report.

use crate::serial_driver::SerialTransport;
use ftduino_core::{FtduinoError, Result};
use std::fmt;
use tracing::debug;

/// Command verbs understood by the direct-control sketch
pub mod verb {
    pub const OUTPUT_SET: &str = "output_set";
    pub const INPUT_GET: &str = "input_get";
    pub const INPUT_SET_MODE: &str = "input_set_mode";
    pub const COUNTER_SET_MODE: &str = "counter_set_mode";
    pub const COUNTER_GET: &str = "counter_get";
    pub const COUNTER_CLEAR: &str = "counter_clear";
    pub const COUNTER_GET_STATE: &str = "counter_get_state";
    pub const ULTRASONIC_GET: &str = "ultrasonic_get";
    pub const ULTRASONIC_ENABLE: &str = "ultrasonic_enable";
    pub const MOTOR_SET: &str = "motor_set";
    pub const MOTOR_COUNTER: &str = "motor_counter";
    pub const MOTOR_COUNTER_ACTIVE: &str = "motor_counter_active";
    pub const MOTOR_COUNTER_SET_BRAKE: &str = "motor_counter_set_brake";
    pub const LED_SET: &str = "led_set";
    pub const ID_GET: &str = "ftduino_id_get";
    pub const ID_SET: &str = "ftduino_id_set";
    pub const VERSION_GET: &str = "ftduino_direct_get_version";
}

/// A single protocol command: verb plus ordered arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: String,
    args: Vec<String>,
}

impl Command {
    /// Start a command with the given verb
    pub fn new(verb: impl Into<String>) -> Self {
        Self {
            verb: verb.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument
    pub fn arg(mut self, arg: impl fmt::Display) -> Self {
        self.args.push(arg.to_string());
        self
    }

    /// Split a raw command line such as `"input_get I1"` into verb and arguments
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let verb = parts
            .next()
            .ok_or_else(|| FtduinoError::invalid("Empty command line"))?;
        Ok(parts.fold(Command::new(verb), |cmd, arg| cmd.arg(arg)))
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The line sent on the wire, terminator included
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }

    /// Reject anything that would break line framing
    fn validate(&self) -> Result<()> {
        if self.verb.is_empty() || self.verb.chars().any(char::is_whitespace) {
            return Err(FtduinoError::invalid(format!(
                "Invalid command verb {:?}",
                self.verb
            )));
        }
        if let Some(arg) = self.args.iter().find(|a| a.contains(['\r', '\n'])) {
            return Err(FtduinoError::invalid(format!(
                "Argument {:?} contains a line terminator",
                arg
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.verb)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Decode one raw reply line
///
/// - nothing (read timed out empty) or a bare `\n` → `None`
/// - otherwise the trailing `\r\n` or `\n` is stripped; `"\r\n"` is therefore
///   an explicit empty string
/// - a line cut short by the timeout is returned as-is
pub fn decode_reply(raw: &[u8]) -> Result<Option<String>> {
    if raw.is_empty() || raw == b"\n" {
        return Ok(None);
    }

    let body = raw
        .strip_suffix(b"\r\n")
        .or_else(|| raw.strip_suffix(b"\n"))
        .unwrap_or(raw);

    String::from_utf8(body.to_vec())
        .map(Some)
        .map_err(|e| FtduinoError::Protocol(format!("Reply is not valid UTF-8: {}", e)))
}

/// Run one command/reply exchange
///
/// Buffers are reset first so a late reply to an earlier, timed-out command is
/// never taken for this command's reply.
pub fn execute<T: SerialTransport + ?Sized>(
    transport: &mut T,
    command: &Command,
) -> Result<Option<String>> {
    command.validate()?;
    let line = command.to_line();

    transport.reset_buffers()?;
    debug!("TX: {:?}", line);
    transport.write(line.as_bytes())?;

    let raw = transport.read_line()?;
    debug!("RX: {:?}", String::from_utf8_lossy(&raw));

    decode_reply(&raw)
}

/// Interpret a reply as an integer
pub fn parse_int(command: &Command, reply: Option<String>) -> Result<i32> {
    let text = reply.ok_or_else(|| {
        FtduinoError::Protocol(format!("No reply to '{}'", command))
    })?;

    text.trim().parse::<i32>().map_err(|_| {
        FtduinoError::Protocol(format!("Non-numeric reply {:?} to '{}'", text, command))
    })
}

/// Interpret a reply as a flag: exactly `"1"` is true, anything else false
pub fn parse_flag(reply: Option<&str>) -> bool {
    reply == Some("1")
}
