//! Serial link and protocol settings

use crate::board::{BoardConfig, DefaultBoard};
use crate::error::FtduinoError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Serial link parameters
///
/// Defaults match the direct-control sketch: 115200 baud, 100 ms read/write
/// timeout and a 250 ms pause after opening so the board can finish its
/// reset-on-open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkSettings {
    /// Serial communication baud rate
    pub baud_rate: u32,
    /// Read/write timeout in milliseconds
    pub timeout_ms: u64,
    /// Delay after opening the port, in milliseconds
    pub settle_ms: u64,
}

impl LinkSettings {
    /// Read/write timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Delay after opening the port
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

impl Default for LinkSettings {
    fn default() -> Self {
        Self {
            baud_rate: DefaultBoard::BAUD_RATE,
            timeout_ms: DefaultBoard::DEFAULT_TIMEOUT_MS,
            settle_ms: DefaultBoard::SETTLE_MS,
        }
    }
}

/// Firmware protocol revision
///
/// Two sketch revisions disagree on motor directions: the current one accepts
/// `off` as a direction for `motor_set`/`motor_counter`, the legacy one only
/// knows `left`, `right` and `brake`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolRevision {
    /// Motor directions: off, left, right, brake
    #[default]
    Current,
    /// Motor directions: left, right, brake
    Legacy,
}

impl fmt::Display for ProtocolRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolRevision::Current => f.write_str("current"),
            ProtocolRevision::Legacy => f.write_str("legacy"),
        }
    }
}

impl FromStr for ProtocolRevision {
    type Err = FtduinoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "current" => Ok(ProtocolRevision::Current),
            "legacy" => Ok(ProtocolRevision::Legacy),
            _ => Err(FtduinoError::invalid(format!(
                "Unknown protocol revision: '{}'. Valid options: current, legacy",
                s
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_defaults() {
        let link = LinkSettings::default();
        assert_eq!(link.baud_rate, 115200);
        assert_eq!(link.timeout(), Duration::from_millis(100));
        assert_eq!(link.settle_delay(), Duration::from_millis(250));
    }

    #[test]
    fn test_link_partial_toml_uses_defaults() {
        let link: LinkSettings = toml::from_str("timeout_ms = 500").unwrap();
        assert_eq!(link.timeout_ms, 500);
        assert_eq!(link.baud_rate, 115200);
        assert_eq!(link.settle_ms, 250);
    }

    #[test]
    fn test_protocol_revision_parse() {
        assert_eq!(
            "Legacy".parse::<ProtocolRevision>().unwrap(),
            ProtocolRevision::Legacy
        );
        assert_eq!(
            "current".parse::<ProtocolRevision>().unwrap(),
            ProtocolRevision::Current
        );
        assert!("v3".parse::<ProtocolRevision>().is_err());
        assert_eq!(ProtocolRevision::default(), ProtocolRevision::Current);
    }
}
