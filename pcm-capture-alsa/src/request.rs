//! Hardware parameter request planning.
//!
//! Kept free of alsa-lib so the rules can be tested on any host.

use pcm_capture_core::models::config::DeviceConfiguration;
use pcm_capture_core::traits::pcm_device::ReadError;

const EAGAIN: i32 = 11;
const EPIPE: i32 = 32;
const ESTRPIPE: i32 = 86;

/// How the period length is requested from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRequest {
    TimeUs(u32),
    Frames(usize),
}

/// How the ring buffer length is requested from the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRequest {
    TimeUs(u32),
    Frames(usize),
}

/// Resolve the configured buffer and period into driver requests.
///
/// Time takes precedence over frames. With neither period time nor period
/// frames configured, the period is a quarter of the buffer.
pub fn plan_requests(config: &DeviceConfiguration) -> Result<(BufferRequest, PeriodRequest), String> {
    let buffer = if config.buffer_time_us > 0 {
        BufferRequest::TimeUs(config.buffer_time_us)
    } else if config.buffer_frames > 0 {
        BufferRequest::Frames(config.buffer_frames)
    } else {
        return Err("either buffer time or buffer frames must be set".into());
    };

    let period = if config.period_time_us > 0 {
        PeriodRequest::TimeUs(config.period_time_us)
    } else if config.period_frames > 0 {
        PeriodRequest::Frames(config.period_frames)
    } else {
        match buffer {
            BufferRequest::TimeUs(us) => PeriodRequest::TimeUs((us / 4).max(1)),
            BufferRequest::Frames(frames) => PeriodRequest::Frames((frames / 4).max(1)),
        }
    };

    Ok((buffer, period))
}

/// Start threshold clamped to `[1, buffer_frames]`.
pub fn start_threshold(requested: usize, buffer_frames: usize) -> usize {
    requested.clamp(1, buffer_frames.max(1))
}

/// Period length in microseconds for `period_frames` at `rate`.
pub fn period_time_us(period_frames: usize, rate: u32) -> u32 {
    if rate == 0 {
        return 0;
    }
    let us = period_frames as u64 * 1_000_000 / rate as u64;
    us.min(u32::MAX as u64) as u32
}

/// Classify a failed read by its errno. alsa-lib reports negative codes.
pub fn classify_read_error(errno: i32, message: String) -> ReadError {
    match errno.abs() {
        EAGAIN => ReadError::WouldBlock,
        EPIPE | ESTRPIPE => ReadError::Overrun,
        _ => ReadError::Fatal(message),
    }
}
