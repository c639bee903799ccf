//! CLI command and subcommand definitions

use clap::{Parser, Subcommand, ValueEnum};
use ftduino_core::{CounterMode, InputMode, MotorDirection, Port};
use std::path::PathBuf;

pub use crate::format::OutputFormat;

/// ftDuino CLI
#[derive(Parser, Debug)]
#[command(name = "ftductl")]
#[command(version, about = "ftDuino command-line client", long_about = None)]
pub struct Cli {
    /// Serial device path, e.g. /dev/ttyACM0 or COM9 (overrides config file)
    #[arg(short, long, global = true)]
    pub device: Option<String>,

    /// Connect to the board with this identifier (ignored when --device is given)
    #[arg(short = 'i', long = "id", global = true)]
    pub identifier: Option<String>,

    /// Output format (overrides config file)
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose logging (overrides config file)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Don't load config file
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Config file path (default: ~/.config/ftduino/cli.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Use the legacy firmware protocol, which has no "off" motor direction
    #[arg(long, global = true)]
    pub legacy_motor: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List attached ftDuino boards and their identifiers
    List,

    /// Print the device path of the board with the given identifier
    Find {
        /// Identifier to look for (exact match)
        identifier: String,
    },

    /// Show or manage CLI configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completion for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },

    #[command(flatten)]
    Device(DeviceCommands),
}

/// Commands that need a connection to a board
#[derive(Subcommand, Debug)]
pub enum DeviceCommands {
    /// Show port, identifier and firmware version of the board
    Info,

    /// Send a raw protocol command and print the reply
    Exec {
        /// Command verb, e.g. input_get
        verb: String,

        /// Command arguments
        args: Vec<String>,
    },

    /// Switch the onboard LED
    Led {
        #[arg(value_enum)]
        state: Switch,
    },

    /// Drive an output port (O1-O8)
    Output {
        /// Output port
        port: Port,

        /// Output state
        #[arg(value_enum)]
        state: OutputState,

        /// PWM value (0-512); defaults to 512 for on/high and 0 otherwise
        #[arg(short, long)]
        pwm: Option<u32>,
    },

    /// Input port commands (I1-I8)
    Input {
        #[command(subcommand)]
        command: InputCommands,
    },

    /// Counter commands (C1-C4)
    Counter {
        #[command(subcommand)]
        command: CounterCommands,
    },

    /// Motor commands (M1-M4)
    Motor {
        #[command(subcommand)]
        command: MotorCommands,
    },

    /// Ultrasonic distance sensor commands
    Ultrasonic {
        #[command(subcommand)]
        command: UltrasonicCommands,
    },

    /// Board identifier commands
    Id {
        #[command(subcommand)]
        command: IdCommands,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(switch: Switch) -> Self {
        switch == Switch::On
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputState {
    /// Switched to supply, same as high
    On,
    /// Floating
    Off,
    /// Switched to supply
    High,
    /// Switched to ground
    Low,
}

#[derive(Subcommand, Debug)]
pub enum InputCommands {
    /// Read one input, or all inputs when no port is given
    Get {
        /// Input port
        port: Option<Port>,
    },

    /// Set the measurement mode of an input
    Mode {
        /// Input port
        port: Port,

        /// switch, resistance or voltage
        mode: InputMode,
    },
}

#[derive(Subcommand, Debug)]
pub enum CounterCommands {
    /// Read one counter, or all counters when no port is given
    Get {
        /// Counter port
        port: Option<Port>,
    },

    /// Reset a counter to zero
    Clear {
        /// Counter port
        port: Port,
    },

    /// Read the logic level of a counter input
    State {
        /// Counter port
        port: Port,
    },

    /// Select which edges a counter counts
    Mode {
        /// Counter port
        port: Port,

        /// none, rising, falling or any
        mode: CounterMode,
    },
}

#[derive(Subcommand, Debug)]
pub enum MotorCommands {
    /// Drive a motor
    Set {
        /// Motor port
        port: Port,

        /// off, left, right or brake
        direction: MotorDirection,

        /// PWM value (0-512, default 512)
        #[arg(short, long)]
        pwm: Option<u32>,
    },

    /// Run a motor until its counter reaches the given number of steps
    Steps {
        /// Motor port
        port: Port,

        /// off, left, right or brake
        direction: MotorDirection,

        /// Number of counter steps
        steps: u32,

        /// PWM value (0-512, default 512)
        #[arg(short, long)]
        pwm: Option<u32>,

        /// Wait until the board reports the run as finished
        #[arg(short, long)]
        wait: bool,
    },

    /// Check whether a stop-on-count run is still active
    Active {
        /// Motor port
        port: Port,
    },

    /// Brake (on) or coast (off) when a stop-on-count run ends
    Brake {
        /// Motor port
        port: Port,

        #[arg(value_enum)]
        state: Switch,
    },
}

#[derive(Subcommand, Debug)]
pub enum UltrasonicCommands {
    /// Read the measured distance (-1 while disabled)
    Get,

    /// Enable the sensor
    Enable,

    /// Disable the sensor
    Disable,
}

#[derive(Subcommand, Debug)]
pub enum IdCommands {
    /// Show the identifier stored on the board
    Get,

    /// Store a new identifier on the board
    Set {
        /// New identifier
        identifier: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Reset configuration to defaults
    Reset,
}
