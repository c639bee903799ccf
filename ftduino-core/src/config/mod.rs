//! Configuration types shared by the library and the CLI
//!
//! - [`LinkSettings`]: serial link parameters (baud, timeout, settle delay)
//! - [`ProtocolRevision`]: which motor direction set the firmware accepts
//! - [`default_config_path`]: where the CLI looks for its TOML file

mod link;
mod paths;

pub use link::{LinkSettings, ProtocolRevision};
pub use paths::default_config_path;
