//! CLI configuration management
//!
//! Handles loading and saving CLI-specific configuration.

use anyhow::{Context, Result};
use ftduino_core::{LinkSettings, ProtocolRevision};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest accepted serial timeout
pub const MAX_TIMEOUT_MS: u64 = 10_000;

/// CLI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliConfig {
    /// Serial device to use instead of auto-selection
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,

    /// Board identifier to look up when no device is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Default output format
    pub output_format: String,

    /// Enable verbose logging by default
    pub verbose: bool,

    /// Firmware protocol revision
    pub protocol: ProtocolRevision,

    /// Serial link parameters
    pub link: LinkSettings,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            device: None,
            identifier: None,
            output_format: "table".to_string(),
            verbose: false,
            protocol: ProtocolRevision::default(),
            link: LinkSettings::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from `path`, or defaults if it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read CLI config file {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse CLI config file {}", path.display()))
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize CLI config")?;

        std::fs::write(path, content).context("Failed to write CLI config file")?;

        Ok(())
    }

    /// Change one setting by key, as used by `config set`
    ///
    /// An empty value clears `device` and `identifier`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "device" => self.device = non_empty(value),
            "identifier" | "id" => self.identifier = non_empty(value),
            "output_format" | "format" => {
                ConfigBuilder::validate_output_format(value)?;
                self.output_format = value.to_string();
            }
            "verbose" => self.verbose = parse_bool(value),
            "protocol" => self.protocol = value.parse()?,
            "timeout_ms" | "timeout" => {
                let timeout = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid timeout value. Must be a number"))?;
                ConfigBuilder::validate_timeout(timeout)?;
                self.link.timeout_ms = timeout;
            }
            "baud_rate" => {
                self.link.baud_rate = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid baud rate. Must be a number"))?;
            }
            "settle_ms" => {
                self.link.settle_ms = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("Invalid settle delay. Must be a number"))?;
            }
            _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
        Ok(())
    }

    /// Create a new builder for constructing configuration
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_bool(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

/// Builder for CLI configuration with validation and priority chain support
///
/// Layers are applied in call order, each one overriding what came before:
/// 1. Defaults
/// 2. Config file
/// 3. Environment variables
/// 4. CLI arguments
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    base: Option<CliConfig>,
    device: Option<String>,
    identifier: Option<String>,
    output_format: Option<String>,
    verbose: Option<bool>,
    protocol: Option<ProtocolRevision>,
    timeout_ms: Option<u64>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the serial device path
    pub fn with_device(mut self, device: impl Into<String>) -> Result<Self> {
        let device = device.into();
        if device.trim().is_empty() {
            return Err(anyhow::anyhow!("Device path cannot be empty"));
        }
        self.device = Some(device);
        Ok(self)
    }

    /// Set the board identifier to connect to
    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Result<Self> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(anyhow::anyhow!("Identifier cannot be empty"));
        }
        self.identifier = Some(identifier);
        Ok(self)
    }

    /// Set output format (with validation)
    pub fn with_output_format(mut self, format: impl Into<String>) -> Result<Self> {
        let format = format.into();
        Self::validate_output_format(&format)?;
        self.output_format = Some(format);
        Ok(self)
    }

    /// Set verbose flag
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Set firmware protocol revision
    pub fn with_protocol(mut self, protocol: ProtocolRevision) -> Self {
        self.protocol = Some(protocol);
        self
    }

    /// Set serial timeout in milliseconds (with validation)
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Result<Self> {
        Self::validate_timeout(timeout_ms)?;
        self.timeout_ms = Some(timeout_ms);
        Ok(self)
    }

    /// Load configuration from file
    ///
    /// `None` skips the file layer entirely. A missing file leaves the
    /// defaults in place; a malformed one is an error. Values set on the
    /// builder always take precedence over the file.
    pub fn with_config_file(self, path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(self);
        };

        let config = CliConfig::load_from(path)?;
        Ok(Self {
            base: Some(config),
            ..self
        })
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(device) = std::env::var("FTDUINO_DEVICE") {
            if !device.trim().is_empty() {
                self.device = Some(device);
            }
        }

        if let Ok(identifier) = std::env::var("FTDUINO_ID") {
            if !identifier.trim().is_empty() {
                self.identifier = Some(identifier);
            }
        }

        if let Ok(format) = std::env::var("FTDUINO_FORMAT") {
            if Self::validate_output_format(&format).is_ok() {
                self.output_format = Some(format);
            }
        }

        if let Ok(verbose) = std::env::var("FTDUINO_VERBOSE") {
            self.verbose = Some(parse_bool(&verbose));
        }

        if let Ok(timeout) = std::env::var("FTDUINO_TIMEOUT_MS") {
            if let Ok(timeout) = timeout.parse() {
                if Self::validate_timeout(timeout).is_ok() {
                    self.timeout_ms = Some(timeout);
                }
            }
        }

        self
    }

    /// Build the final configuration with validation
    pub fn build(self) -> Result<CliConfig> {
        let base = self.base.unwrap_or_default();

        let output_format = self.output_format.unwrap_or(base.output_format);
        let mut link = base.link;
        if let Some(timeout_ms) = self.timeout_ms {
            link.timeout_ms = timeout_ms;
        }

        // Validate final values
        Self::validate_output_format(&output_format)?;
        Self::validate_timeout(link.timeout_ms)?;

        Ok(CliConfig {
            device: self.device.or(base.device),
            identifier: self.identifier.or(base.identifier),
            output_format,
            verbose: self.verbose.unwrap_or(base.verbose),
            protocol: self.protocol.unwrap_or(base.protocol),
            link,
        })
    }

    /// Validate output format
    fn validate_output_format(format: &str) -> Result<()> {
        match format {
            "table" | "json" => Ok(()),
            _ => Err(anyhow::anyhow!(
                "Invalid output format '{}'. Must be 'table' or 'json'",
                format
            )),
        }
    }

    /// Validate serial timeout
    fn validate_timeout(timeout_ms: u64) -> Result<()> {
        if timeout_ms == 0 {
            return Err(anyhow::anyhow!("Timeout must be greater than 0"));
        }

        if timeout_ms > MAX_TIMEOUT_MS {
            return Err(anyhow::anyhow!(
                "Timeout must be less than or equal to {} ms",
                MAX_TIMEOUT_MS
            ));
        }

        Ok(())
    }
}
