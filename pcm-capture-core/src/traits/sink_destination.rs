use crate::models::error::CaptureError;

/// One place captured bytes are delivered to.
///
/// Writes are all-or-nothing from the caller's point of view: an
/// implementation retries short writes internally and only returns once
/// the whole payload is flushed or an unrecoverable error occurred.
pub trait SinkDestination: Send {
    /// Deliver `data` in full.
    fn write(&mut self, data: &[u8]) -> Result<(), CaptureError>;

    /// Human-readable name used in log messages.
    fn describe(&self) -> String;

    /// Payload bytes delivered by this destination since it was opened.
    fn bytes_written(&self) -> u64;
}
