//! Port identifiers and mode enumerations
//!
//! Every value that ends up on the wire is validated here, so an invalid
//! argument is rejected before a command line is ever formatted.

use crate::board::{BoardConfig, DefaultBoard, MAX_PWM};
use crate::config::ProtocolRevision;
use crate::error::{FtduinoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of physical connector on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    /// Universal input I1..I8
    Input,
    /// Output O1..O8
    Output,
    /// Counter input C1..C4
    Counter,
    /// Motor channel M1..M4
    Motor,
}

impl PortKind {
    /// All port kinds, in board order
    pub const ALL: [PortKind; 4] = [
        PortKind::Input,
        PortKind::Output,
        PortKind::Counter,
        PortKind::Motor,
    ];

    /// Letter used in the port token
    pub fn prefix(&self) -> char {
        match self {
            PortKind::Input => 'I',
            PortKind::Output => 'O',
            PortKind::Counter => 'C',
            PortKind::Motor => 'M',
        }
    }

    /// Number of ports of this kind on the board
    pub fn count(&self) -> usize {
        match self {
            PortKind::Input => DefaultBoard::INPUT_COUNT,
            PortKind::Output => DefaultBoard::OUTPUT_COUNT,
            PortKind::Counter => DefaultBoard::COUNTER_COUNT,
            PortKind::Motor => DefaultBoard::MOTOR_COUNT,
        }
    }

    fn from_prefix(c: char) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.prefix() == c.to_ascii_uppercase())
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PortKind::Input => "input",
            PortKind::Output => "output",
            PortKind::Counter => "counter",
            PortKind::Motor => "motor",
        };
        f.write_str(name)
    }
}

/// A named port such as `I1`, `O3`, `C2` or `M4`
///
/// The set is fixed by the board; [`Port::new`] and [`FromStr`] reject anything
/// outside it. Parsing is case-insensitive and the wire form is uppercase.
///
/// ```
/// use ftduino_core::{Port, PortKind};
///
/// let port: Port = "o3".parse().unwrap();
/// assert_eq!(port, Port::O3);
/// assert_eq!(port.kind(), PortKind::Output);
/// assert_eq!(port.to_string(), "O3");
/// assert!("I9".parse::<Port>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Port {
    kind: PortKind,
    number: u8,
}

impl Port {
    pub const I1: Port = Port::unchecked(PortKind::Input, 1);
    pub const I2: Port = Port::unchecked(PortKind::Input, 2);
    pub const I3: Port = Port::unchecked(PortKind::Input, 3);
    pub const I4: Port = Port::unchecked(PortKind::Input, 4);
    pub const I5: Port = Port::unchecked(PortKind::Input, 5);
    pub const I6: Port = Port::unchecked(PortKind::Input, 6);
    pub const I7: Port = Port::unchecked(PortKind::Input, 7);
    pub const I8: Port = Port::unchecked(PortKind::Input, 8);

    pub const O1: Port = Port::unchecked(PortKind::Output, 1);
    pub const O2: Port = Port::unchecked(PortKind::Output, 2);
    pub const O3: Port = Port::unchecked(PortKind::Output, 3);
    pub const O4: Port = Port::unchecked(PortKind::Output, 4);
    pub const O5: Port = Port::unchecked(PortKind::Output, 5);
    pub const O6: Port = Port::unchecked(PortKind::Output, 6);
    pub const O7: Port = Port::unchecked(PortKind::Output, 7);
    pub const O8: Port = Port::unchecked(PortKind::Output, 8);

    pub const C1: Port = Port::unchecked(PortKind::Counter, 1);
    pub const C2: Port = Port::unchecked(PortKind::Counter, 2);
    pub const C3: Port = Port::unchecked(PortKind::Counter, 3);
    pub const C4: Port = Port::unchecked(PortKind::Counter, 4);

    pub const M1: Port = Port::unchecked(PortKind::Motor, 1);
    pub const M2: Port = Port::unchecked(PortKind::Motor, 2);
    pub const M3: Port = Port::unchecked(PortKind::Motor, 3);
    pub const M4: Port = Port::unchecked(PortKind::Motor, 4);

    const fn unchecked(kind: PortKind, number: u8) -> Self {
        Self { kind, number }
    }

    /// Create a port, validating the number against the board's port count
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `number` is 0 or above the count for `kind`
    pub fn new(kind: PortKind, number: u8) -> Result<Self> {
        if number == 0 || number as usize > kind.count() {
            return Err(FtduinoError::invalid(format!(
                "Invalid {} port number {} (must be 1-{})",
                kind,
                number,
                kind.count()
            )));
        }
        Ok(Self { kind, number })
    }

    /// Port kind
    pub fn kind(&self) -> PortKind {
        self.kind
    }

    /// 1-based port number
    pub fn number(&self) -> u8 {
        self.number
    }

    /// Ensure this port is of the kind an operation expects
    pub fn expect_kind(self, kind: PortKind) -> Result<Self> {
        if self.kind != kind {
            return Err(FtduinoError::invalid(format!(
                "Port {} is not a{} {} port",
                self,
                if kind == PortKind::Input { "n" } else { "" },
                kind
            )));
        }
        Ok(self)
    }

    /// All ports of a given kind, in order
    pub fn all(kind: PortKind) -> impl Iterator<Item = Port> {
        (1..=kind.count() as u8).map(move |number| Port { kind, number })
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), self.number)
    }
}

impl FromStr for Port {
    type Err = FtduinoError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        let mut chars = token.chars();
        let kind = chars.next().and_then(PortKind::from_prefix);
        let number = chars.as_str().parse::<u8>().ok();

        match (kind, number) {
            (Some(kind), Some(number)) => Port::new(kind, number),
            _ => Err(FtduinoError::invalid(format!(
                "Invalid port '{}'. Use I1-I8, O1-O8, C1-C4 or M1-M4",
                s
            ))),
        }
    }
}

impl TryFrom<String> for Port {
    type Error = FtduinoError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Port> for String {
    fn from(port: Port) -> Self {
        port.to_string()
    }
}

/// Declares a closed set of wire tokens with case-insensitive parsing.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $token:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every member of the set, in protocol order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Token sent on the wire
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $token ),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = FtduinoError;

            fn from_str(s: &str) -> Result<Self> {
                match s.trim().to_lowercase().as_str() {
                    $( $token => Ok($name::$variant), )+
                    _ => Err(FtduinoError::invalid(format!(
                        "Invalid {} \"{}\". Use one of: {}",
                        $what,
                        s,
                        [$($token),+].join(", ")
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Measurement mode of a universal input
    InputMode, "input mode" {
        /// Digital switch against ground
        Switch => "switch",
        /// Resistance in ohms
        Resistance => "resistance",
        /// Voltage in millivolts
        Voltage => "voltage",
    }
}

wire_enum! {
    /// Which signal edges a counter input counts
    CounterMode, "counter mode" {
        None => "none",
        Rising => "rising",
        Falling => "falling",
        Any => "any",
    }
}

wire_enum! {
    /// Motor direction
    MotorDirection, "motor direction" {
        Off => "off",
        Left => "left",
        Right => "right",
        /// Both outputs driven low, stopping the motor actively
        Brake => "brake",
    }
}

impl MotorDirection {
    /// Whether this direction may be sent under the given protocol revision
    pub fn is_supported_by(&self, revision: ProtocolRevision) -> bool {
        match revision {
            ProtocolRevision::Current => true,
            ProtocolRevision::Legacy => *self != MotorDirection::Off,
        }
    }

    /// Reject directions the protocol revision does not know
    pub fn validate(self, revision: ProtocolRevision) -> Result<Self> {
        if !self.is_supported_by(revision) {
            return Err(FtduinoError::invalid(format!(
                "Motor direction \"{}\" is not supported by the {} protocol",
                self, revision
            )));
        }
        Ok(self)
    }
}

/// Level an output is driven to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputLevel {
    /// Output floating (0)
    Off,
    /// Output switched to supply (1)
    High,
    /// Output switched to ground (2)
    Low,
}

impl OutputLevel {
    /// Numeric mode sent on the wire
    pub fn code(&self) -> u8 {
        match self {
            OutputLevel::Off => 0,
            OutputLevel::High => 1,
            OutputLevel::Low => 2,
        }
    }

    /// PWM used when the caller does not give one: MAX for HIGH, MIN otherwise
    pub fn default_pwm(&self) -> u32 {
        match self {
            OutputLevel::High => DefaultBoard::MAX_PWM,
            OutputLevel::Off | OutputLevel::Low => DefaultBoard::MIN_PWM,
        }
    }
}

impl TryFrom<u8> for OutputLevel {
    type Error = FtduinoError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(OutputLevel::Off),
            1 => Ok(OutputLevel::High),
            2 => Ok(OutputLevel::Low),
            _ => Err(FtduinoError::invalid(format!(
                "Invalid mode \"{}\". Use 0, 1 or 2.",
                value
            ))),
        }
    }
}

impl FromStr for OutputLevel {
    type Err = FtduinoError;

    /// Accepts the names `off`, `high`, `low` or the codes `0`, `1`, `2`
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" | "0" => Ok(OutputLevel::Off),
            "high" | "1" => Ok(OutputLevel::High),
            "low" | "2" => Ok(OutputLevel::Low),
            _ => Err(FtduinoError::invalid(format!(
                "Invalid output level \"{}\". Use off, high or low (0, 1, 2)",
                s
            ))),
        }
    }
}

impl fmt::Display for OutputLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Value assigned to an output port
///
/// `Switch(true)` drives the output HIGH at full PWM, `Switch(false)` turns it
/// off. `Leveled` gives the level and PWM explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputValue {
    Switch(bool),
    Leveled(OutputLevel, u32),
}

impl OutputValue {
    /// Level and optional explicit PWM for `output_set`
    pub fn resolve(self) -> Result<(OutputLevel, Option<u32>)> {
        match self {
            OutputValue::Switch(true) => Ok((OutputLevel::High, None)),
            OutputValue::Switch(false) => Ok((OutputLevel::Off, None)),
            OutputValue::Leveled(level, pwm) => Ok((level, Some(validate_pwm(pwm)?))),
        }
    }
}

impl From<bool> for OutputValue {
    fn from(on: bool) -> Self {
        OutputValue::Switch(on)
    }
}

impl From<OutputLevel> for OutputValue {
    fn from(level: OutputLevel) -> Self {
        OutputValue::Leveled(level, level.default_pwm())
    }
}

impl From<(OutputLevel, u32)> for OutputValue {
    fn from((level, pwm): (OutputLevel, u32)) -> Self {
        OutputValue::Leveled(level, pwm)
    }
}

/// Check a PWM value against the board range
pub fn validate_pwm(pwm: u32) -> Result<u32> {
    if pwm > MAX_PWM {
        return Err(FtduinoError::invalid(format!(
            "PWM must be 0-{}, got {}",
            MAX_PWM, pwm
        )));
    }
    Ok(pwm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_parse_case_insensitive() {
        assert_eq!("i1".parse::<Port>().unwrap(), Port::I1);
        assert_eq!("O8".parse::<Port>().unwrap(), Port::O8);
        assert_eq!(" c4 ".parse::<Port>().unwrap(), Port::C4);
        assert_eq!("m2".parse::<Port>().unwrap(), Port::M2);
    }

    #[test]
    fn test_port_parse_rejects_outside_set() {
        for bad in ["I0", "I9", "O9", "C5", "M5", "X1", "", "I", "11", "I-1", "I1x"] {
            let err = bad.parse::<Port>().unwrap_err();
            assert!(
                matches!(err, FtduinoError::InvalidArgument(_)),
                "expected InvalidArgument for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_port_all_counts() {
        assert_eq!(Port::all(PortKind::Input).count(), 8);
        assert_eq!(Port::all(PortKind::Output).count(), 8);
        assert_eq!(Port::all(PortKind::Counter).count(), 4);
        assert_eq!(Port::all(PortKind::Motor).count(), 4);

        let names: Vec<String> = Port::all(PortKind::Counter).map(|p| p.to_string()).collect();
        assert_eq!(names, ["C1", "C2", "C3", "C4"]);
    }

    #[test]
    fn test_port_expect_kind() {
        assert!(Port::I3.expect_kind(PortKind::Input).is_ok());

        let err = Port::O3.expect_kind(PortKind::Input).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Port O3 is not an input port");

        let err = Port::I3.expect_kind(PortKind::Motor).unwrap_err();
        assert_eq!(err.to_string(), "Invalid argument: Port I3 is not a motor port");
    }

    #[test]
    fn test_port_serde_as_token() {
        let json = serde_json::to_string(&Port::M3).unwrap();
        assert_eq!(json, "\"M3\"");
        let parsed: Port = serde_json::from_str("\"i7\"").unwrap();
        assert_eq!(parsed, Port::I7);
        assert!(serde_json::from_str::<Port>("\"Q1\"").is_err());
    }

    #[test]
    fn test_input_mode_parse() {
        assert_eq!("SWITCH".parse::<InputMode>().unwrap(), InputMode::Switch);
        assert_eq!("Resistance".parse::<InputMode>().unwrap(), InputMode::Resistance);
        assert_eq!("voltage".parse::<InputMode>().unwrap(), InputMode::Voltage);

        let err = "illegal".parse::<InputMode>().unwrap_err();
        assert!(matches!(err, FtduinoError::InvalidArgument(_)));
        assert!(err.to_string().contains("switch, resistance, voltage"));
    }

    #[test]
    fn test_counter_mode_parse() {
        for (token, mode) in [
            ("none", CounterMode::None),
            ("RISING", CounterMode::Rising),
            ("falling", CounterMode::Falling),
            ("Any", CounterMode::Any),
        ] {
            assert_eq!(token.parse::<CounterMode>().unwrap(), mode);
        }
        assert!("both".parse::<CounterMode>().is_err());
    }

    #[test]
    fn test_motor_direction_revisions() {
        assert!(MotorDirection::Off.is_supported_by(ProtocolRevision::Current));
        assert!(!MotorDirection::Off.is_supported_by(ProtocolRevision::Legacy));

        for dir in [MotorDirection::Left, MotorDirection::Right, MotorDirection::Brake] {
            assert!(dir.is_supported_by(ProtocolRevision::Legacy));
            assert!(dir.validate(ProtocolRevision::Legacy).is_ok());
        }

        let err = MotorDirection::Off.validate(ProtocolRevision::Legacy).unwrap_err();
        assert!(matches!(err, FtduinoError::InvalidArgument(_)));
    }

    #[test]
    fn test_wire_tokens() {
        assert_eq!(MotorDirection::Brake.as_str(), "brake");
        assert_eq!(CounterMode::Any.to_string(), "any");
        assert_eq!(InputMode::ALL.len(), 3);
        assert_eq!(MotorDirection::ALL.len(), 4);
    }

    #[test]
    fn test_output_level_codes() {
        assert_eq!(OutputLevel::Off.code(), 0);
        assert_eq!(OutputLevel::High.code(), 1);
        assert_eq!(OutputLevel::Low.code(), 2);

        assert_eq!(OutputLevel::try_from(1).unwrap(), OutputLevel::High);
        assert!(matches!(
            OutputLevel::try_from(3),
            Err(FtduinoError::InvalidArgument(_))
        ));

        assert_eq!("HIGH".parse::<OutputLevel>().unwrap(), OutputLevel::High);
        assert_eq!("2".parse::<OutputLevel>().unwrap(), OutputLevel::Low);
        assert!("on".parse::<OutputLevel>().is_err());
    }

    #[test]
    fn test_output_level_default_pwm() {
        assert_eq!(OutputLevel::High.default_pwm(), 512);
        assert_eq!(OutputLevel::Off.default_pwm(), 0);
        assert_eq!(OutputLevel::Low.default_pwm(), 0);
    }

    #[test]
    fn test_output_value_resolve() {
        assert_eq!(
            OutputValue::from(true).resolve().unwrap(),
            (OutputLevel::High, None)
        );
        assert_eq!(
            OutputValue::from(false).resolve().unwrap(),
            (OutputLevel::Off, None)
        );
        assert_eq!(
            OutputValue::from((OutputLevel::Low, 100)).resolve().unwrap(),
            (OutputLevel::Low, Some(100))
        );
        assert_eq!(
            OutputValue::from(OutputLevel::High).resolve().unwrap(),
            (OutputLevel::High, Some(512))
        );
        assert!(matches!(
            OutputValue::Leveled(OutputLevel::High, 513).resolve(),
            Err(FtduinoError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_pwm_bounds() {
        assert_eq!(validate_pwm(0).unwrap(), 0);
        assert_eq!(validate_pwm(512).unwrap(), 512);
        assert!(validate_pwm(513).is_err());
    }
}
