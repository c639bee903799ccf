//! ftduino-hardware
//!
//! Everything that talks to the board: the serial transport, the line command
//! protocol, the typed device API and USB discovery. The CLI crate builds on
//! top of this.
//!
//! Public API:
//! - `device::FtDuino`: validated access to outputs, inputs, counters, motors and more
//! - `discovery::Discovery`: finds attached boards and their identifiers
//! - `protocol::Command` / `protocol::execute`: raw command/reply exchange
//! - `serial_driver::SerialDriver`: blocking serial I/O
//! - `mock::MockTransport`: scripted transport for tests without hardware

pub mod device;
pub mod discovery;
pub mod mock;
mod ports;
pub mod protocol;
pub mod serial_driver;

pub use device::FtDuino;
pub use discovery::{DeviceBus, DiscoveredDevice, Discovery, SystemBus};
pub use protocol::{execute, Command};
pub use serial_driver::{SerialDriver, SerialTransport};
