use std::path::PathBuf;
use std::time::Duration;

use super::audio_models::SampleFormat;

/// Parameters requested from the capture device before negotiation.
///
/// The device may adjust rate, buffer and period; the session only trusts
/// the values returned by `PcmDevice::negotiate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfiguration {
    /// Backend device name (for ALSA e.g. `default` or `hw:1,0`).
    pub device_name: String,

    /// Requested sample format (default: S16_LE).
    pub format: SampleFormat,

    /// Requested channel count (default: 2).
    pub channels: u16,

    /// Requested sample rate in Hz (default: 48000).
    pub sample_rate: u32,

    /// Requested hardware buffer length in frames. Ignored when
    /// `buffer_time_us` is set.
    pub buffer_frames: usize,

    /// Requested hardware buffer length in microseconds (0 = use frames).
    pub buffer_time_us: u32,

    /// Requested period length in frames. Ignored when `period_time_us` is set.
    pub period_frames: usize,

    /// Requested period length in microseconds (0 = use frames).
    pub period_time_us: u32,

    /// Frames that must be available before the hardware starts.
    pub start_threshold: usize,

    /// Depth of the session ring buffer, in periods.
    pub ring_periods: usize,
}

impl DeviceConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.device_name.trim().is_empty() {
            return Err("device name must not be empty".into());
        }
        if self.channels == 0 {
            return Err("channel count must be positive".into());
        }
        if self.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if self.ring_periods == 0 {
            return Err("ring buffer must hold at least one period".into());
        }
        Ok(())
    }
}

impl Default for DeviceConfiguration {
    fn default() -> Self {
        Self {
            device_name: "default".into(),
            format: SampleFormat::S16Le,
            channels: 2,
            sample_rate: 48000,
            buffer_frames: 24064,
            buffer_time_us: 0,
            period_frames: 0,
            period_time_us: 125_333,
            start_threshold: 1,
            ring_periods: 4,
        }
    }
}

/// Where captured bytes go and how existing files are treated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkConfiguration {
    /// Headerless PCM output file.
    pub raw_path: Option<PathBuf>,

    /// RIFF/WAVE output file.
    pub wav_path: Option<PathBuf>,

    /// Copy every payload to standard output.
    pub stream_to_stdout: bool,

    /// Remove files that already exist instead of appending to them.
    pub overwrite_existing: bool,
}

impl SinkConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        for path in [&self.raw_path, &self.wav_path].into_iter().flatten() {
            if path.as_os_str().is_empty() {
                return Err("output path must not be empty".into());
            }
        }
        if let (Some(raw), Some(wav)) = (&self.raw_path, &self.wav_path) {
            if raw == wav {
                return Err(format!(
                    "raw and wav outputs point at the same file: {}",
                    raw.display()
                ));
            }
        }
        Ok(())
    }

    /// Whether no destination is configured at all.
    pub fn is_empty(&self) -> bool {
        self.raw_path.is_none() && self.wav_path.is_none() && !self.stream_to_stdout
    }
}

/// Stopping condition for a capture run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureTarget {
    /// Run until `stop` is requested or the hardware fails.
    Unbounded,
    /// Run for (at least) this long, rounded to whole periods.
    Duration(Duration),
    /// Run until this many frames have been captured.
    Samples(u64),
}
