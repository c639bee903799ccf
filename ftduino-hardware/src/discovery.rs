//! Device discovery
//!
//! Scans the host's serial ports for ftDuino USB identities, asks each match
//! for its identifier and yields `(path, identifier)` results. Every scan
//! opens its own short-lived connection per device; nothing is shared with an
//! already open [`FtDuino`](crate::FtDuino).

use crate::protocol::{self, verb, Command};
use crate::serial_driver::{SerialDriver, SerialTransport};
use ftduino_core::{BoardRevision, FtduinoError, LinkSettings, Result};
use tracing::{debug, error, warn};

/// A serial port whose USB VID/PID matches a known board revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: String,
    pub revision: BoardRevision,
}

/// Result of probing one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredDevice {
    /// Serial device path
    pub path: String,
    /// USB identity the port was matched by
    pub revision: BoardRevision,
    /// Identifier reported by the board; `None` if it did not answer
    pub identifier: Option<String>,
}

/// Source of candidate ports and connections to them
pub trait DeviceBus {
    /// Transport returned by [`DeviceBus::open`]
    type Transport: SerialTransport;

    /// List candidate ports, filtered by USB identity
    fn candidates(&self) -> Result<Vec<Candidate>>;

    /// Open a connection to a candidate
    fn open(&self, path: &str) -> Result<Self::Transport>;
}

/// The host's serial ports
#[derive(Debug, Clone, Default)]
pub struct SystemBus {
    link: LinkSettings,
}

impl SystemBus {
    pub fn new(link: LinkSettings) -> Self {
        Self { link }
    }
}

impl DeviceBus for SystemBus {
    type Transport = SerialDriver;

    fn candidates(&self) -> Result<Vec<Candidate>> {
        let ports = serialport::available_ports().map_err(|e| {
            error!("Failed to enumerate serial ports: {}", e);
            FtduinoError::Connection(format!("Failed to enumerate ports: {}", e))
        })?;

        let mut candidates = Vec::new();
        for port in ports {
            debug!("Checking port: {}", port.port_name);

            if let serialport::SerialPortType::UsbPort(info) = &port.port_type {
                debug!("  USB Device - VID:{:04X} PID:{:04X}", info.vid, info.pid);

                if let Some(revision) = BoardRevision::from_usb_ids(info.vid, info.pid) {
                    debug!("Found {} at: {}", revision.name(), port.port_name);
                    candidates.push(Candidate {
                        path: port.port_name,
                        revision,
                    });
                }
            }
        }

        Ok(candidates)
    }

    fn open(&self, path: &str) -> Result<SerialDriver> {
        SerialDriver::open(path, &self.link)
    }
}

/// Device discovery over a [`DeviceBus`]
#[derive(Debug, Clone, Default)]
pub struct Discovery<B: DeviceBus = SystemBus> {
    bus: B,
}

impl Discovery<SystemBus> {
    /// Discovery over the host's serial ports with default link settings
    pub fn system() -> Self {
        Self::new(SystemBus::default())
    }

    /// Discovery over the host's serial ports with the given link settings
    pub fn with_link(link: LinkSettings) -> Self {
        Self::new(SystemBus::new(link))
    }
}

impl<B: DeviceBus> Discovery<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Scan for devices
    ///
    /// The candidate list is taken now; each candidate is opened and asked for
    /// its identifier only when the iterator reaches it. Calling this again
    /// starts a fresh scan.
    pub fn enumerate(&self) -> Result<Devices<'_, B>> {
        let candidates = self.bus.candidates()?;
        debug!("{} candidate device(s)", candidates.len());
        Ok(Devices {
            bus: &self.bus,
            pending: candidates.into_iter(),
        })
    }

    /// Path of the first device whose identifier equals `name` exactly
    pub fn find_by_identifier(&self, name: &str) -> Result<Option<String>> {
        let found = self
            .enumerate()?
            .find(|device| device.identifier.as_deref() == Some(name))
            .map(|device| device.path);

        if found.is_none() {
            debug!("No device with identifier '{}'", name);
        }
        Ok(found)
    }

    /// Path of the first device found
    ///
    /// # Errors
    ///
    /// Returns `NoDeviceFound` if the scan yields nothing
    pub fn auto_select(&self) -> Result<String> {
        self.enumerate()?
            .next()
            .map(|device| device.path)
            .ok_or(FtduinoError::NoDeviceFound)
    }
}

/// Lazy sequence of probed devices, see [`Discovery::enumerate`]
pub struct Devices<'a, B: DeviceBus> {
    bus: &'a B,
    pending: std::vec::IntoIter<Candidate>,
}

impl<B: DeviceBus> Iterator for Devices<'_, B> {
    type Item = DiscoveredDevice;

    fn next(&mut self) -> Option<DiscoveredDevice> {
        let candidate = self.pending.next()?;
        let identifier = probe_identifier(self.bus, &candidate.path);
        Some(DiscoveredDevice {
            path: candidate.path,
            revision: candidate.revision,
            identifier,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.pending.size_hint()
    }
}

/// Ask one device for its identifier over a private connection
///
/// The connection is dropped, and the port closed, before returning.
fn probe_identifier<B: DeviceBus>(bus: &B, path: &str) -> Option<String> {
    let mut transport = match bus.open(path) {
        Ok(transport) => transport,
        Err(e) => {
            warn!("Skipping identifier probe on {}: {}", path, e);
            return None;
        }
    };

    match protocol::execute(&mut transport, &Command::new(verb::ID_GET)) {
        Ok(Some(id)) => {
            debug!("{} identifies as '{}'", path, id);
            Some(id)
        }
        Ok(None) => {
            warn!("{} did not report an identifier", path);
            None
        }
        Err(e) => {
            warn!("Identifier probe on {} failed: {}", path, e);
            None
        }
    }
}
