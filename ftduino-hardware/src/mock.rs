//! Simulated transport and device bus
//!
//! `MockTransport` plays back scripted reply lines and records every line
//! written to it, so the device API and discovery can be exercised without a
//! board attached. `MockBus` offers a fixed set of such transports to
//! [`Discovery`](crate::discovery::Discovery).

use crate::discovery::{Candidate, DeviceBus};
use crate::serial_driver::SerialTransport;
use ftduino_core::{BoardRevision, FtduinoError, Result};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

/// Scripted serial transport
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    path: Option<String>,
    replies: VecDeque<Vec<u8>>,
    default_reply: Option<Vec<u8>>,
    written: Vec<String>,
    resets: usize,
    fail_writes: bool,
}

impl MockTransport {
    /// Transport that answers every read with a timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Transport reporting the given port path
    pub fn with_path(path: &str) -> Self {
        Self {
            path: Some(path.to_string()),
            ..Self::default()
        }
    }

    /// Queue raw reply bytes for the next read
    pub fn queue_reply(&mut self, raw: &[u8]) -> &mut Self {
        self.replies.push_back(raw.to_vec());
        self
    }

    /// Queue a reply line as the sketch sends it, terminated by `\r\n`
    pub fn queue_line(&mut self, line: &str) -> &mut Self {
        self.queue_reply(format!("{}\r\n", line).as_bytes())
    }

    /// Reply used once the queue is empty
    pub fn reply_to_all(&mut self, raw: &[u8]) -> &mut Self {
        self.default_reply = Some(raw.to_vec());
        self
    }

    /// Make every subsequent write fail
    pub fn fail_writes(&mut self) -> &mut Self {
        self.fail_writes = true;
        self
    }

    /// Lines written so far, terminators included
    pub fn written(&self) -> &[String] {
        &self.written
    }

    /// Number of buffer resets performed
    pub fn reset_count(&self) -> usize {
        self.resets
    }
}

impl SerialTransport for MockTransport {
    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(FtduinoError::Connection("Write failed: broken pipe".to_string()));
        }
        self.written.push(String::from_utf8_lossy(bytes).into_owned());
        Ok(())
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        Ok(self
            .replies
            .pop_front()
            .or_else(|| self.default_reply.clone())
            .unwrap_or_default())
    }

    fn reset_buffers(&mut self) -> Result<()> {
        self.resets += 1;
        Ok(())
    }

    fn port_path(&self) -> Option<&str> {
        self.path.as_deref()
    }
}

/// Device bus backed by scripted transports
///
/// A candidate registered without a transport fails to open, like a port held
/// by another process.
#[derive(Debug, Default)]
pub struct MockBus {
    devices: Vec<(Candidate, Option<MockTransport>)>,
    scans: Cell<usize>,
    opened: RefCell<Vec<String>>,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a device answering `ftduino_id_get` with `identifier`
    ///
    /// `None` makes the device stay silent.
    pub fn with_device(mut self, path: &str, identifier: Option<&str>) -> Self {
        let mut transport = MockTransport::with_path(path);
        if let Some(id) = identifier {
            transport.queue_line(id);
        }
        self.devices.push((
            Candidate {
                path: path.to_string(),
                revision: BoardRevision::Ftduino,
            },
            Some(transport),
        ));
        self
    }

    /// Register a candidate whose port cannot be opened
    pub fn with_busy_device(mut self, path: &str) -> Self {
        self.devices.push((
            Candidate {
                path: path.to_string(),
                revision: BoardRevision::Virgin,
            },
            None,
        ));
        self
    }

    /// Number of times the candidate list was requested
    pub fn scan_count(&self) -> usize {
        self.scans.get()
    }

    /// Paths opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }
}

impl DeviceBus for MockBus {
    type Transport = MockTransport;

    fn candidates(&self) -> Result<Vec<Candidate>> {
        self.scans.set(self.scans.get() + 1);
        Ok(self.devices.iter().map(|(c, _)| c.clone()).collect())
    }

    fn open(&self, path: &str) -> Result<MockTransport> {
        self.opened.borrow_mut().push(path.to_string());
        self.devices
            .iter()
            .find(|(c, _)| c.path == path)
            .and_then(|(_, transport)| transport.clone())
            .ok_or_else(|| {
                FtduinoError::Connection(format!("Failed to open serial port {}: busy", path))
            })
    }
}
