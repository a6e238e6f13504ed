use std::time::Duration;

use crate::models::audio_models::{DeviceInfo, NegotiatedParams};
use crate::models::error::CaptureError;

/// Non-success result of a single `read_frames` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// No frames are available right now; wait and retry.
    WouldBlock,
    /// The hardware buffer overran; `prepare` the device and retry.
    Overrun,
    /// Any other failure. The run cannot continue.
    Fatal(String),
}

/// Interface for hardware capture devices.
///
/// Implemented by:
/// - `AlsaCaptureDevice` (Linux, `pcm-capture-alsa`)
///
/// Opening happens in the implementation's constructor and closing on
/// drop. While a run is active the device is used only from the capture
/// thread.
pub trait PcmDevice: Send + 'static {
    /// Apply the requested hardware/software parameters and report what the
    /// device actually accepted.
    fn negotiate(&mut self) -> Result<NegotiatedParams, CaptureError>;

    /// Read up to `frames` interleaved frames into `buffer`.
    ///
    /// `buffer` is at least `frames * bytes_per_frame` bytes long. Returns the
    /// number of frames read, which may be fewer than requested.
    fn read_frames(&mut self, buffer: &mut [u8], frames: usize) -> Result<usize, ReadError>;

    /// Block until the device has data or `timeout` elapses.
    fn wait_ready(&mut self, timeout: Duration);

    /// Bring the device back to a runnable state after an overrun.
    fn prepare(&mut self) -> Result<(), CaptureError>;

    /// Information about the device backing this implementation.
    fn device_info(&self) -> DeviceInfo;
}
