//! ftDuino Core Library
//!
//! Shared types, board definitions and settings for the ftDuino client.
//! This crate performs no I/O; the serial protocol lives in `ftduino-hardware`.

pub mod board;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use board::*;
pub use config::{default_config_path, LinkSettings, ProtocolRevision};
pub use error::*;
pub use types::*;
