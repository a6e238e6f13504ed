use std::time::Duration;

use super::audio_models::NegotiatedParams;
use super::config::CaptureTarget;
use super::error::CaptureError;

/// Period geometry derived once from the negotiated hardware parameters.
///
/// `bytes_per_frame` is the sample width multiplied by the channel count,
/// i.e. the number of bytes one read of one frame produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodTimingInfo {
    pub period_frames: usize,
    pub period_bytes: usize,
    pub period_time_us: u32,
    pub bytes_per_frame: usize,
}

impl PeriodTimingInfo {
    /// Compute period timing, rejecting any zero-valued dimension.
    pub fn from_negotiated(params: &NegotiatedParams) -> Result<Self, CaptureError> {
        if params.period_time_us == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "negotiated period time is zero".into(),
            ));
        }
        if params.period_frames == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "negotiated period size is zero".into(),
            ));
        }
        let bytes_per_frame = params
            .format
            .bytes_per_frame(params.channels)
            .ok_or_else(|| {
                CaptureError::UnsupportedFormat(format!(
                    "cannot resolve frame size for {} with {} channels",
                    params.format, params.channels
                ))
            })?;

        Ok(Self {
            period_frames: params.period_frames,
            period_bytes: params.period_frames * bytes_per_frame,
            period_time_us: params.period_time_us,
            bytes_per_frame,
        })
    }

    /// Number of whole periods covering `duration`, rounded up so a run
    /// never stops short of the requested length.
    pub fn periods_for_duration(&self, duration: Duration) -> u64 {
        let periods = duration.as_micros().div_ceil(self.period_time_us as u128);
        periods.min(u64::MAX as u128) as u64
    }

    /// Byte target for a duration-bounded run.
    pub fn bytes_for_duration(&self, duration: Duration) -> u64 {
        self.periods_for_duration(duration)
            .saturating_mul(self.period_frames as u64)
            .saturating_mul(self.bytes_per_frame as u64)
    }

    /// Byte target for a run bounded by a frame count, rounded up to an
    /// even number of bytes.
    pub fn bytes_for_samples(&self, samples: u64) -> u64 {
        let bytes = samples.saturating_mul(self.bytes_per_frame as u64);
        if bytes == u64::MAX {
            bytes - bytes % 2
        } else {
            bytes + bytes % 2
        }
    }

    /// Normalize a capture target to a byte count. `None` means unbounded.
    pub fn target_bytes(&self, target: &CaptureTarget) -> Result<Option<u64>, CaptureError> {
        let bytes = match target {
            CaptureTarget::Unbounded => return Ok(None),
            CaptureTarget::Duration(duration) => self.bytes_for_duration(*duration),
            CaptureTarget::Samples(samples) => self.bytes_for_samples(*samples),
        };
        if bytes == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "capture target resolves to zero bytes".into(),
            ));
        }
        Ok(Some(bytes))
    }

    /// Wall-clock length of `bytes` of captured audio.
    pub fn duration_of(&self, bytes: u64) -> Duration {
        let frames = bytes / self.bytes_per_frame as u64;
        let micros = frames as u128 * self.period_time_us as u128 / self.period_frames as u128;
        Duration::from_micros(micros.min(u64::MAX as u128) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::audio_models::SampleFormat;

    fn params(format: SampleFormat, channels: u16, period_frames: usize, period_time_us: u32) -> NegotiatedParams {
        NegotiatedParams {
            format,
            channels,
            sample_rate: 48000,
            period_frames,
            period_time_us,
            buffer_frames: period_frames * 4,
        }
    }

    #[test]
    fn derives_period_bytes() {
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 2, 6016, 125_333)).unwrap();
        assert_eq!(timing.bytes_per_frame, 4);
        assert_eq!(timing.period_bytes, 6016 * 4);
    }

    #[test]
    fn rejects_zero_period_time() {
        let err = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 2, 1024, 0)).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }

    #[test]
    fn rejects_zero_period_size() {
        let err = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 2, 0, 125_333)).unwrap_err();
        assert!(matches!(err, CaptureError::ConfigurationFailed(_)));
    }

    #[test]
    fn rejects_unresolvable_frame_size() {
        let err = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 0, 1024, 125_333)).unwrap_err();
        assert!(matches!(err, CaptureError::UnsupportedFormat(_)));
    }

    #[test]
    fn one_second_at_125ms_periods() {
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 1, 1024, 125_333)).unwrap();
        // 1_000_000 / 125_333 = 7.978..., rounded up to 8
        assert_eq!(timing.periods_for_duration(Duration::from_millis(1000)), 8);
        assert_eq!(timing.bytes_for_duration(Duration::from_millis(1000)), 8 * 1024 * 2);
    }

    #[test]
    fn duration_rounds_up_small_fractions() {
        // 1_000_000 / 300_000 = 3.33...: three periods would only cover 900 ms
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 1, 1024, 300_000)).unwrap();
        let requested = Duration::from_millis(1000);
        assert_eq!(timing.periods_for_duration(requested), 4);

        let bytes = timing.bytes_for_duration(requested);
        assert_eq!(bytes, 4 * 1024 * 2);
        assert!(timing.duration_of(bytes) >= requested);
    }

    #[test]
    fn exact_multiple_is_not_rounded_up() {
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 1, 1024, 250_000)).unwrap();
        assert_eq!(timing.periods_for_duration(Duration::from_millis(1000)), 4);
    }

    #[test]
    fn short_duration_still_reads_one_period() {
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 1, 1024, 125_333)).unwrap();
        assert_eq!(timing.periods_for_duration(Duration::from_millis(10)), 1);
        assert_eq!(timing.periods_for_duration(Duration::ZERO), 0);
    }

    #[test]
    fn sample_targets_are_even() {
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::U8, 1, 1024, 125_333)).unwrap();
        assert_eq!(timing.bytes_for_samples(3), 4);
        assert_eq!(timing.bytes_for_samples(4), 4);
    }

    #[test]
    fn target_normalization() {
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 2, 1024, 125_333)).unwrap();
        assert_eq!(timing.target_bytes(&CaptureTarget::Unbounded), Ok(None));
        assert_eq!(timing.target_bytes(&CaptureTarget::Samples(16384)), Ok(Some(16384 * 4)));
        assert!(timing.target_bytes(&CaptureTarget::Samples(0)).is_err());
        assert!(timing.target_bytes(&CaptureTarget::Duration(Duration::ZERO)).is_err());
    }

    #[test]
    fn duration_of_one_period() {
        let timing = PeriodTimingInfo::from_negotiated(&params(SampleFormat::S16Le, 2, 1024, 125_333)).unwrap();
        assert_eq!(timing.duration_of(timing.period_bytes as u64), Duration::from_micros(125_333));
    }
}
