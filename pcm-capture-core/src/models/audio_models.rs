use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// PCM sample encoding as negotiated with the hardware.
///
/// Names follow the ALSA spelling (`S16_LE`, `S24_3LE`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    #[serde(rename = "S8")]
    S8,
    #[serde(rename = "U8")]
    U8,
    #[serde(rename = "S16_LE")]
    S16Le,
    #[serde(rename = "S16_BE")]
    S16Be,
    /// 24-bit samples in the low bytes of a 32-bit container.
    #[serde(rename = "S24_LE")]
    S24Le,
    /// Packed 3-byte 24-bit samples.
    #[serde(rename = "S24_3LE")]
    S24Packed3Le,
    #[serde(rename = "S32_LE")]
    S32Le,
    #[serde(rename = "FLOAT_LE")]
    F32Le,
}

impl SampleFormat {
    /// Bits one sample occupies in the interleaved buffer.
    pub fn physical_width_bits(self) -> u32 {
        match self {
            Self::S8 | Self::U8 => 8,
            Self::S16Le | Self::S16Be => 16,
            Self::S24Packed3Le => 24,
            Self::S24Le | Self::S32Le | Self::F32Le => 32,
        }
    }

    /// Bytes one sample of a single channel occupies.
    pub fn bytes_per_sample(self) -> usize {
        (self.physical_width_bits() / 8) as usize
    }

    /// Bytes of one interleaved frame (`channels` samples).
    ///
    /// Returns `None` when the channel count is zero.
    pub fn bytes_per_frame(self, channels: u16) -> Option<usize> {
        if channels == 0 {
            return None;
        }
        Some(self.bytes_per_sample() * channels as usize)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::S8 => "S8",
            Self::U8 => "U8",
            Self::S16Le => "S16_LE",
            Self::S16Be => "S16_BE",
            Self::S24Le => "S24_LE",
            Self::S24Packed3Le => "S24_3LE",
            Self::S32Le => "S32_LE",
            Self::F32Le => "FLOAT_LE",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "_").as_str() {
            "S8" => Ok(Self::S8),
            "U8" => Ok(Self::U8),
            "S16_LE" | "S16" => Ok(Self::S16Le),
            "S16_BE" => Ok(Self::S16Be),
            "S24_LE" => Ok(Self::S24Le),
            "S24_3LE" => Ok(Self::S24Packed3Le),
            "S32_LE" | "S32" => Ok(Self::S32Le),
            "FLOAT_LE" | "F32_LE" | "F32" => Ok(Self::F32Le),
            other => Err(format!("unknown sample format: {}", other)),
        }
    }
}

/// Stream parameters the hardware actually accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedParams {
    pub format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
    pub period_frames: usize,
    pub period_time_us: u32,
    pub buffer_frames: usize,
}

/// Identity of the device backing a `PcmDevice`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub description: String,
}

/// Counters for debugging capture runs. Reset at every `start`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureDiagnostics {
    pub periods_read: u64,
    pub bytes_read: u64,
    pub bytes_written: u64,
    pub overruns_recovered: u64,
    pub transient_waits: u64,
}
