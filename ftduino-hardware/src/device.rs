//! ftDuino device API
//!
//! Typed, validated access to every board capability on top of the line
//! protocol. Arguments are checked before a command is formatted; nothing
//! invalid is ever written to the port.

use crate::discovery::Discovery;
use crate::protocol::{self, verb, Command};
use crate::serial_driver::{SerialDriver, SerialTransport};
use ftduino_core::{
    validate_pwm, CounterMode, FtduinoError, InputMode, LinkSettings, MotorDirection,
    OutputLevel, OutputValue, Port, PortKind, ProtocolRevision, Result, MAX_PWM, MIN_PWM,
};
use tracing::{debug, info};

/// Connection to one ftDuino
///
/// Generic over the transport type, allowing real hardware (`SerialDriver`)
/// or mock transports for testing. Commands take `&mut self`, so at most one
/// exchange is in flight per connection. The port is closed when the value is
/// dropped or [`FtDuino::close`] is called.
pub struct FtDuino<T: SerialTransport = SerialDriver> {
    transport: T,
    protocol: ProtocolRevision,
}

impl FtDuino<SerialDriver> {
    /// Open the ftDuino at `path` with default link settings
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(path, &LinkSettings::default())
    }

    /// Open the ftDuino at `path`
    pub fn open_with(path: &str, link: &LinkSettings) -> Result<Self> {
        let driver = SerialDriver::open(path, link)?;
        info!("Connected to ftDuino at {}", path);
        Ok(Self::with_transport(driver))
    }

    /// Open the first ftDuino found by a scan
    ///
    /// # Errors
    ///
    /// Returns `NoDeviceFound` if no board is attached
    pub fn auto(link: &LinkSettings) -> Result<Self> {
        let path = Discovery::with_link(*link).auto_select()?;
        Self::open_with(&path, link)
    }

    /// Open the ftDuino whose stored identifier equals `name`
    ///
    /// # Errors
    ///
    /// Returns `IdentifierNotFound` if no attached board reports `name`
    pub fn open_by_identifier(name: &str, link: &LinkSettings) -> Result<Self> {
        let path = Discovery::with_link(*link)
            .find_by_identifier(name)?
            .ok_or_else(|| FtduinoError::IdentifierNotFound(name.to_string()))?;
        Self::open_with(&path, link)
    }

    /// Open `path` if given, otherwise the first ftDuino found
    pub fn connect(path: Option<&str>, link: &LinkSettings) -> Result<Self> {
        match path {
            Some(path) => Self::open_with(path, link),
            None => Self::auto(link),
        }
    }
}

impl<T: SerialTransport> FtDuino<T> {
    /// Wrap an already open transport
    ///
    /// This is primarily useful for testing with mock transports.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            protocol: ProtocolRevision::default(),
        }
    }

    /// Select the protocol revision used to validate motor directions
    pub fn with_protocol(mut self, protocol: ProtocolRevision) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn protocol(&self) -> ProtocolRevision {
        self.protocol
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Close the connection
    pub fn close(self) {
        if let Some(path) = self.transport.port_path() {
            debug!("Closing connection to {}", path);
        }
    }

    /// Low-level access: send any command and return its raw reply
    ///
    /// `None` means the board answered with an empty line or not at all.
    pub fn execute(&mut self, command: &Command) -> Result<Option<String>> {
        protocol::execute(&mut self.transport, command)
    }

    /// Low-level access with a raw command line, e.g. `"input_get I1"`
    pub fn execute_line(&mut self, line: &str) -> Result<Option<String>> {
        let command = Command::parse(line)?;
        self.execute(&command)
    }

    fn query_int(&mut self, command: Command) -> Result<i32> {
        let reply = self.execute(&command)?;
        protocol::parse_int(&command, reply)
    }

    fn query_flag(&mut self, command: Command) -> Result<bool> {
        let reply = self.execute(&command)?;
        Ok(protocol::parse_flag(reply.as_deref()))
    }

    /// Send a command whose reply carries no value
    fn send(&mut self, command: Command) -> Result<()> {
        self.execute(&command).map(|_| ())
    }

    // --- Outputs ---

    /// Drive an output port
    ///
    /// Without an explicit `pwm`, HIGH uses the maximum and OFF/LOW the minimum.
    pub fn output_set(&mut self, port: Port, level: OutputLevel, pwm: Option<u32>) -> Result<()> {
        let port = port.expect_kind(PortKind::Output)?;
        let pwm = match pwm {
            Some(pwm) => validate_pwm(pwm)?,
            None => level.default_pwm(),
        };
        self.send(
            Command::new(verb::OUTPUT_SET)
                .arg(port)
                .arg(level.code())
                .arg(pwm),
        )
    }

    /// Drive an output port from a switch or level/PWM value
    pub fn output_write(&mut self, port: Port, value: OutputValue) -> Result<()> {
        let (level, pwm) = value.resolve()?;
        self.output_set(port, level, pwm)
    }

    // --- Inputs ---

    /// Read an input port
    pub fn input_get(&mut self, port: Port) -> Result<i32> {
        let port = port.expect_kind(PortKind::Input)?;
        self.query_int(Command::new(verb::INPUT_GET).arg(port))
    }

    /// Set the measurement mode of an input port
    pub fn input_set_mode(&mut self, port: Port, mode: InputMode) -> Result<()> {
        let port = port.expect_kind(PortKind::Input)?;
        self.send(Command::new(verb::INPUT_SET_MODE).arg(port).arg(mode))
    }

    // --- Counters ---

    /// Select which edges a counter counts
    pub fn counter_set_mode(&mut self, port: Port, mode: CounterMode) -> Result<()> {
        let port = port.expect_kind(PortKind::Counter)?;
        self.send(Command::new(verb::COUNTER_SET_MODE).arg(port).arg(mode))
    }

    /// Current counter value
    pub fn counter_get(&mut self, port: Port) -> Result<i32> {
        let port = port.expect_kind(PortKind::Counter)?;
        self.query_int(Command::new(verb::COUNTER_GET).arg(port))
    }

    /// Reset a counter to zero
    pub fn counter_clear(&mut self, port: Port) -> Result<()> {
        let port = port.expect_kind(PortKind::Counter)?;
        self.send(Command::new(verb::COUNTER_CLEAR).arg(port))
    }

    /// Logic state of the counter input
    pub fn counter_get_state(&mut self, port: Port) -> Result<bool> {
        let port = port.expect_kind(PortKind::Counter)?;
        self.query_flag(Command::new(verb::COUNTER_GET_STATE).arg(port))
    }

    // --- Ultrasonic sensor ---

    /// Distance reported by the ultrasonic sensor, `-1` while disabled
    pub fn ultrasonic_get(&mut self) -> Result<i32> {
        self.query_int(Command::new(verb::ULTRASONIC_GET))
    }

    /// Enable or disable the ultrasonic sensor
    pub fn ultrasonic_enable(&mut self, enable: bool) -> Result<()> {
        self.send(Command::new(verb::ULTRASONIC_ENABLE).arg(enable))
    }

    // --- Motors ---

    /// Drive a motor; without an explicit `pwm` the maximum is used
    pub fn motor_set(
        &mut self,
        port: Port,
        direction: MotorDirection,
        pwm: Option<u32>,
    ) -> Result<()> {
        let port = port.expect_kind(PortKind::Motor)?;
        let direction = direction.validate(self.protocol)?;
        let pwm = validate_pwm(pwm.unwrap_or(MAX_PWM))?;
        self.send(
            Command::new(verb::MOTOR_SET)
                .arg(port)
                .arg(direction)
                .arg(pwm),
        )
    }

    /// Run a motor until its counter reaches `count`
    ///
    /// The board stops the motor on its own; this returns as soon as the
    /// command is sent. Use [`FtDuino::motor_counter_active`] to poll.
    pub fn motor_counter(
        &mut self,
        port: Port,
        direction: MotorDirection,
        pwm: u32,
        count: u32,
    ) -> Result<()> {
        let port = port.expect_kind(PortKind::Motor)?;
        let direction = direction.validate(self.protocol)?;
        let pwm = validate_pwm(pwm)?;
        self.send(
            Command::new(verb::MOTOR_COUNTER)
                .arg(port)
                .arg(direction)
                .arg(pwm)
                .arg(count),
        )
    }

    /// Whether a stop-on-count run is still armed for the motor
    pub fn motor_counter_active(&mut self, port: Port) -> Result<bool> {
        let port = port.expect_kind(PortKind::Motor)?;
        self.query_flag(Command::new(verb::MOTOR_COUNTER_ACTIVE).arg(port))
    }

    /// Stop with an active brake (`true`) or let the motor coast (`false`)
    /// when the count is reached
    pub fn motor_counter_set_brake(&mut self, port: Port, enable: bool) -> Result<()> {
        let port = port.expect_kind(PortKind::Motor)?;
        self.send(
            Command::new(verb::MOTOR_COUNTER_SET_BRAKE)
                .arg(port)
                .arg(enable),
        )
    }

    /// Run a motor, optionally for a number of counter steps
    ///
    /// `pwm` defaults to the maximum, or to the minimum for `off`. With
    /// `steps` the run goes through `motor_counter`, otherwise `motor_set`.
    pub fn motor_run(
        &mut self,
        port: Port,
        direction: MotorDirection,
        pwm: Option<u32>,
        steps: Option<u32>,
    ) -> Result<()> {
        let pwm = pwm.unwrap_or(match direction {
            MotorDirection::Off => MIN_PWM,
            _ => MAX_PWM,
        });
        match steps {
            Some(steps) => self.motor_counter(port, direction, pwm, steps),
            None => self.motor_set(port, direction, Some(pwm)),
        }
    }

    // --- LED ---

    /// Switch the onboard LED
    pub fn led_set(&mut self, on: bool) -> Result<()> {
        self.send(Command::new(verb::LED_SET).arg(u8::from(on)))
    }

    // --- Identification ---

    /// Identifier stored on the board
    pub fn device_identity_get(&mut self) -> Result<Option<String>> {
        self.execute(&Command::new(verb::ID_GET))
    }

    /// Store a new identifier on the board
    pub fn device_identity_set(&mut self, identifier: &str) -> Result<()> {
        if identifier.trim().is_empty() {
            return Err(FtduinoError::invalid("Identifier must not be empty"));
        }
        if identifier.contains(['\r', '\n']) {
            return Err(FtduinoError::invalid(
                "Identifier must not contain line terminators",
            ));
        }
        self.send(Command::new(verb::ID_SET).arg(identifier))
    }

    /// Version string of the direct-control sketch
    pub fn device_protocol_version_get(&mut self) -> Result<Option<String>> {
        self.execute(&Command::new(verb::VERSION_GET))
    }
}
