//! ftDuino CLI Library
//!
//! Command definitions, handlers, configuration and output formatting for the
//! `ftductl` binary. Device access itself lives in `ftduino-hardware`.

// Internal CLI implementation - not part of public API
#[doc(hidden)]
pub mod cli;

/// Configuration types for the CLI tool.
pub mod config;

// Internal formatting functions - not part of public API
#[doc(hidden)]
pub mod format;
