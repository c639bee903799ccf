//! Output formatting utilities for the CLI
//!
//! Provides table and JSON formatting with colors.

use anyhow::Result;
use colored::*;
use ftduino_core::{Port, ProtocolRevision};
use ftduino_hardware::DiscoveredDevice;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

use crate::config::CliConfig;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty table output
    Table,
    /// JSON output
    Json,
}

impl OutputFormat {
    /// Format named by a validated config value; anything but `json` is a table
    pub fn from_config(value: &str) -> Self {
        match value {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Table,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::Json => "json",
        }
    }
}

/// Identity and firmware of a connected board
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub path: Option<String>,
    pub identifier: Option<String>,
    pub version: Option<String>,
    pub protocol: ProtocolRevision,
}

/// One port value
#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub port: Port,
    pub value: i32,
}

fn or_none(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "(none)".dimmed().to_string(),
    }
}

/// Format discovered devices
pub fn format_devices(devices: &[DiscoveredDevice], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = devices
                .iter()
                .map(|d| {
                    serde_json::json!({
                        "path": d.path,
                        "board": d.revision.name(),
                        "usb_id": d.revision.to_string(),
                        "identifier": d.identifier,
                    })
                })
                .collect();
            Ok(serde_json::to_string_pretty(&entries)?)
        }
        OutputFormat::Table => {
            if devices.is_empty() {
                return Ok("No ftDuino found.".yellow().to_string());
            }

            #[derive(Tabled)]
            struct DeviceRow {
                #[tabled(rename = "Path")]
                path: String,
                #[tabled(rename = "Board")]
                board: String,
                #[tabled(rename = "USB ID")]
                usb_id: String,
                #[tabled(rename = "Identifier")]
                identifier: String,
            }

            let rows: Vec<DeviceRow> = devices
                .iter()
                .map(|d| DeviceRow {
                    path: d.path.cyan().to_string(),
                    board: d.revision.name().to_string(),
                    usb_id: d.revision.to_string(),
                    identifier: match d.identifier.as_deref() {
                        Some(id) if !id.is_empty() => id.green().to_string(),
                        other => or_none(other),
                    },
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", "Attached Devices:".bold(), table))
        }
    }
}

/// Format board information
pub fn format_device_info(info: &DeviceInfo, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(info)?),
        OutputFormat::Table => {
            let mut output = String::new();
            output.push_str(&"ftDuino Information".bold().to_string());
            output.push('\n');
            output.push_str(&format!("Port: {}", or_none(info.path.as_deref()).cyan()));
            output.push('\n');
            output.push_str(&format!(
                "Identifier: {}",
                or_none(info.identifier.as_deref()).green()
            ));
            output.push('\n');
            output.push_str(&format!(
                "Firmware: {}",
                or_none(info.version.as_deref()).cyan()
            ));
            output.push('\n');
            output.push_str(&format!("Protocol: {}", info.protocol.to_string().yellow()));
            Ok(output)
        }
    }
}

/// Format port readings
pub fn format_readings(title: &str, readings: &[Reading], format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => match readings {
            [single] => Ok(serde_json::to_string_pretty(single)?),
            _ => Ok(serde_json::to_string_pretty(readings)?),
        },
        OutputFormat::Table => {
            if let [single] = readings {
                return Ok(format!("{}: {}", single.port, single.value.to_string().cyan()));
            }

            #[derive(Tabled)]
            struct ReadingRow {
                #[tabled(rename = "Port")]
                port: String,
                #[tabled(rename = "Value")]
                value: String,
            }

            let rows: Vec<ReadingRow> = readings
                .iter()
                .map(|r| ReadingRow {
                    port: r.port.to_string(),
                    value: r.value.to_string().cyan().to_string(),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            Ok(format!("{}\n{}", title.bold(), table))
        }
    }
}

/// Format a named boolean state, e.g. a counter input level
pub fn format_flag(label: &str, value: bool, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "name": label,
            "value": value,
        }))?),
        OutputFormat::Table => Ok(format!(
            "{}: {}",
            label,
            if value { "Yes".green() } else { "No".red() }
        )),
    }
}

/// Format the reply to a raw command
pub fn format_reply(command: &str, reply: Option<&str>, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&serde_json::json!({
            "command": command,
            "reply": reply,
        }))?),
        OutputFormat::Table => Ok(match reply {
            Some(reply) => reply.to_string(),
            None => "(no reply)".dimmed().to_string(),
        }),
    }
}

/// Format CLI configuration
pub fn format_config(config: &CliConfig, path: &Path, format: &OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(config)?),
        OutputFormat::Table => {
            let rows = [
                ("Config File", path.display().to_string()),
                ("Device", or_none(config.device.as_deref())),
                ("Identifier", or_none(config.identifier.as_deref())),
                ("Output Format", config.output_format.clone()),
                ("Verbose", config.verbose.to_string()),
                ("Protocol", config.protocol.to_string()),
                ("Baud Rate", config.link.baud_rate.to_string()),
                ("Timeout", format!("{}ms", config.link.timeout_ms)),
                ("Settle Delay", format!("{}ms", config.link.settle_ms)),
            ];

            let mut output = String::new();
            output.push_str(&"CLI Configuration:".bold().to_string());
            output.push('\n');
            output.push_str(&format!("{:<20} Value\n", "Setting"));
            output.push_str(&"-".repeat(40));
            for (name, value) in rows {
                output.push('\n');
                output.push_str(&format!("{:<20} {}", name, value));
            }
            Ok(output)
        }
    }
}

/// Format success message
pub fn format_success(message: &str) -> String {
    format!("{} {}", "✓".green().bold(), message)
}
