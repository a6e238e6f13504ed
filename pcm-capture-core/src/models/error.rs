use thiserror::Error;

/// Errors that can occur while configuring or running a capture.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("device not available")]
    DeviceNotAvailable,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("hardware fault: {0}")]
    HardwareFault(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("unknown error: {0}")]
    Unknown(String),
}
