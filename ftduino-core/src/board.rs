//! Board definitions
//!
//! The ftDuino is an ATmega32u4 board exposing a USB-CDC serial port. Two USB
//! identities exist in the field: the regular firmware identity and the
//! "virgin" identity of a board that has not been flashed since manufacture.
//! Both speak the same line protocol once the direct-control sketch runs.
//!
//! Actual serial I/O is in the `ftduino-hardware` crate. This module only
//! contains board specifications.

/// Hardware board configuration trait
///
/// # Example
///
/// ```
/// use ftduino_core::board::{BoardConfig, Ftduino};
///
/// const INPUTS: usize = Ftduino::INPUT_COUNT;
/// const NAME: &str = Ftduino::NAME;
/// ```
pub trait BoardConfig: Send + Sync + 'static {
    /// Human-readable board name
    const NAME: &'static str;

    /// Number of universal inputs (I1..)
    const INPUT_COUNT: usize;

    /// Number of outputs (O1..)
    const OUTPUT_COUNT: usize;

    /// Number of counter inputs (C1..)
    const COUNTER_COUNT: usize;

    /// Number of motor channels (M1..), each driving an output pair
    const MOTOR_COUNT: usize;

    /// Serial communication baud rate
    const BAUD_RATE: u32;

    /// Read/write timeout in milliseconds
    const DEFAULT_TIMEOUT_MS: u64;

    /// Delay after opening the port before the first command
    const SETTLE_MS: u64;

    /// Maximum PWM value accepted by outputs and motors
    const MAX_PWM: u32;

    /// Minimum PWM value
    const MIN_PWM: u32;
}

/// The ftDuino board running the direct-control sketch
pub struct Ftduino;

impl BoardConfig for Ftduino {
    const NAME: &'static str = "ftDuino";
    const INPUT_COUNT: usize = 8;
    const OUTPUT_COUNT: usize = 8;
    const COUNTER_COUNT: usize = 4;
    const MOTOR_COUNT: usize = 4;
    const BAUD_RATE: u32 = 115200;
    const DEFAULT_TIMEOUT_MS: u64 = 100;
    const SETTLE_MS: u64 = 250;
    // The sketch documents 62 as its ceiling but accepts up to 512.
    const MAX_PWM: u32 = 512;
    const MIN_PWM: u32 = 0;
}

/// Default board type used throughout the codebase
pub type DefaultBoard = Ftduino;

/// Maximum PWM value of the default board
pub const MAX_PWM: u32 = DefaultBoard::MAX_PWM;

/// Minimum PWM value of the default board
pub const MIN_PWM: u32 = DefaultBoard::MIN_PWM;

/// USB vendor ID shared by both board revisions
pub const FTDUINO_USB_VID: u16 = 0x1C40;

/// USB identity of an ftDuino as seen during device enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardRevision {
    /// Board running user firmware (PID 0x0538)
    Ftduino,
    /// Factory-fresh board (PID 0x0537)
    Virgin,
}

impl BoardRevision {
    /// All revisions accepted by discovery
    pub const ALL: [BoardRevision; 2] = [BoardRevision::Ftduino, BoardRevision::Virgin];

    /// Get human-readable revision name
    pub fn name(&self) -> &'static str {
        match self {
            BoardRevision::Ftduino => "ftDuino",
            BoardRevision::Virgin => "ftDuino (virgin)",
        }
    }

    /// Get USB VID for this revision
    pub fn usb_vid(&self) -> u16 {
        FTDUINO_USB_VID
    }

    /// Get USB PID for this revision
    pub fn usb_pid(&self) -> u16 {
        match self {
            BoardRevision::Ftduino => 0x0538,
            BoardRevision::Virgin => 0x0537,
        }
    }

    /// Match a USB VID/PID pair against the known revisions
    ///
    /// ```
    /// use ftduino_core::BoardRevision;
    ///
    /// assert_eq!(
    ///     BoardRevision::from_usb_ids(0x1C40, 0x0538),
    ///     Some(BoardRevision::Ftduino)
    /// );
    /// assert_eq!(BoardRevision::from_usb_ids(0x2E8A, 0x000A), None);
    /// ```
    pub fn from_usb_ids(vid: u16, pid: u16) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rev| rev.usb_vid() == vid && rev.usb_pid() == pid)
    }
}

impl std::fmt::Display for BoardRevision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04x}:{:04x}", self.usb_vid(), self.usb_pid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ftduino_config() {
        assert_eq!(Ftduino::NAME, "ftDuino");
        assert_eq!(Ftduino::INPUT_COUNT, 8);
        assert_eq!(Ftduino::OUTPUT_COUNT, 8);
        assert_eq!(Ftduino::COUNTER_COUNT, 4);
        assert_eq!(Ftduino::MOTOR_COUNT, 4);
        assert_eq!(Ftduino::BAUD_RATE, 115200);
        assert_eq!(Ftduino::DEFAULT_TIMEOUT_MS, 100);
        assert_eq!(Ftduino::SETTLE_MS, 250);
        assert_eq!(MAX_PWM, 512);
        assert_eq!(MIN_PWM, 0);
    }

    #[test]
    fn test_revision_usb_ids() {
        assert_eq!(BoardRevision::Ftduino.usb_vid(), 0x1C40);
        assert_eq!(BoardRevision::Ftduino.usb_pid(), 0x0538);
        assert_eq!(BoardRevision::Virgin.usb_vid(), 0x1C40);
        assert_eq!(BoardRevision::Virgin.usb_pid(), 0x0537);
    }

    #[test]
    fn test_revision_from_usb_ids() {
        assert_eq!(
            BoardRevision::from_usb_ids(0x1C40, 0x0537),
            Some(BoardRevision::Virgin)
        );
        assert_eq!(
            BoardRevision::from_usb_ids(0x1C40, 0x0538),
            Some(BoardRevision::Ftduino)
        );
        assert_eq!(BoardRevision::from_usb_ids(0x1C40, 0x0539), None);
        assert_eq!(BoardRevision::from_usb_ids(0x2341, 0x0538), None);
    }

    #[test]
    fn test_revision_display_is_vid_pid() {
        assert_eq!(BoardRevision::Ftduino.to_string(), "1c40:0538");
        assert_eq!(BoardRevision::Virgin.to_string(), "1c40:0537");
    }
}
