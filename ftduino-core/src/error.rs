//! Error types for the ftDuino client

use thiserror::Error;

/// Core error type for ftDuino operations
#[derive(Error, Debug)]
pub enum FtduinoError {
    /// Client-side validation failure, raised before any I/O
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Auto-discovery found no candidate device
    #[error("No ftDuino found")]
    NoDeviceFound,

    /// No connected device carries the requested identifier
    #[error("No ftDuino with identifier '{0}' found")]
    IdentifierNotFound(String),

    /// Reply absent or not parseable as the expected type
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serial port could not be opened, written or enumerated
    #[error("Connection error: {0}")]
    Connection(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FtduinoError {
    /// Shorthand for an [`FtduinoError::InvalidArgument`]
    pub fn invalid(msg: impl Into<String>) -> Self {
        FtduinoError::InvalidArgument(msg.into())
    }
}

/// Result type alias for ftDuino operations
pub type Result<T> = std::result::Result<T, FtduinoError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: FtduinoError = io_err.into();

        match err {
            FtduinoError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = FtduinoError::invalid("Invalid mode \"x\"");
        assert_eq!(format!("{}", err), "Invalid argument: Invalid mode \"x\"");

        let err = FtduinoError::NoDeviceFound;
        assert_eq!(format!("{}", err), "No ftDuino found");

        let err = FtduinoError::IdentifierNotFound("Pitje Puck".to_string());
        assert_eq!(
            format!("{}", err),
            "No ftDuino with identifier 'Pitje Puck' found"
        );

        let err = FtduinoError::Protocol("no reply to input_get".to_string());
        assert_eq!(format!("{}", err), "Protocol error: no reply to input_get");

        let err = FtduinoError::Connection("port busy".to_string());
        assert_eq!(format!("{}", err), "Connection error: port busy");
    }
}
