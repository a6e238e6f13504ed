//! ALSA capture device.
//!
//! Opens a PCM in blocking capture mode and reads interleaved frames as raw
//! bytes, in whatever sample format was negotiated.

use std::time::Duration;

use alsa::pcm::{Access, Format, Frames, HwParams, PCM};
use alsa::{Direction, ValueOr};

use pcm_capture_core::models::audio_models::{DeviceInfo, NegotiatedParams, SampleFormat};
use pcm_capture_core::models::config::DeviceConfiguration;
use pcm_capture_core::models::error::CaptureError;
use pcm_capture_core::traits::pcm_device::{PcmDevice, ReadError};

use crate::request::{self, BufferRequest, PeriodRequest};

/// Blocking ALSA capture device.
pub struct AlsaCaptureDevice {
    pcm: PCM,
    config: DeviceConfiguration,
    bytes_per_frame: usize,
}

impl AlsaCaptureDevice {
    /// Open `config.device_name` for capture. Parameters are applied later
    /// by `negotiate`.
    pub fn open(config: &DeviceConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let pcm = PCM::new(&config.device_name, Direction::Capture, false).map_err(|e| {
            log::error!("Failed to open ALSA device '{}': {}", config.device_name, e);
            CaptureError::DeviceNotAvailable
        })?;

        log::debug!("Opened ALSA capture device '{}'", config.device_name);
        Ok(Self {
            pcm,
            config: config.clone(),
            bytes_per_frame: 0,
        })
    }

    fn apply_hw_params(&self, format: Format) -> Result<(), CaptureError> {
        let (buffer_request, period_request) =
            request::plan_requests(&self.config).map_err(CaptureError::ConfigurationFailed)?;

        let hwp = HwParams::any(&self.pcm).map_err(hw_error("query hardware parameters"))?;
        hwp.set_access(Access::RWInterleaved)
            .map_err(hw_error("set interleaved access"))?;
        hwp.set_format(format).map_err(|e| {
            CaptureError::UnsupportedFormat(format!(
                "{} rejected by '{}': {}",
                self.config.format, self.config.device_name, e
            ))
        })?;
        hwp.set_channels(u32::from(self.config.channels))
            .map_err(hw_error("set channel count"))?;

        let rate = hwp
            .set_rate_near(self.config.sample_rate, ValueOr::Nearest)
            .map_err(hw_error("set sample rate"))?;
        if rate != self.config.sample_rate {
            log::warn!(
                "Requested {} Hz, device '{}' uses {} Hz",
                self.config.sample_rate,
                self.config.device_name,
                rate
            );
        }

        match period_request {
            PeriodRequest::TimeUs(us) => {
                hwp.set_period_time_near(us, ValueOr::Nearest)
                    .map_err(hw_error("set period time"))?;
            }
            PeriodRequest::Frames(frames) => {
                hwp.set_period_size_near(frames as Frames, ValueOr::Nearest)
                    .map_err(hw_error("set period size"))?;
            }
        }
        match buffer_request {
            BufferRequest::TimeUs(us) => {
                hwp.set_buffer_time_near(us, ValueOr::Nearest)
                    .map_err(hw_error("set buffer time"))?;
            }
            BufferRequest::Frames(frames) => {
                hwp.set_buffer_size_near(frames as Frames)
                    .map_err(hw_error("set buffer size"))?;
            }
        }

        self.pcm.hw_params(&hwp).map_err(hw_error("apply hardware parameters"))
    }

    fn apply_sw_params(&self, period_frames: usize, buffer_frames: usize) -> Result<(), CaptureError> {
        let swp = self
            .pcm
            .sw_params_current()
            .map_err(hw_error("query software parameters"))?;
        swp.set_avail_min(period_frames as Frames)
            .map_err(hw_error("set avail_min"))?;
        let threshold = request::start_threshold(self.config.start_threshold, buffer_frames);
        swp.set_start_threshold(threshold as Frames)
            .map_err(hw_error("set start threshold"))?;
        self.pcm.sw_params(&swp).map_err(hw_error("apply software parameters"))
    }
}

impl PcmDevice for AlsaCaptureDevice {
    fn negotiate(&mut self) -> Result<NegotiatedParams, CaptureError> {
        self.apply_hw_params(alsa_format(self.config.format))?;

        let (rate, channels, period_frames, buffer_frames) = {
            let current = self
                .pcm
                .hw_params_current()
                .map_err(hw_error("read back hardware parameters"))?;
            (
                current.get_rate().map_err(hw_error("read sample rate"))?,
                current.get_channels().map_err(hw_error("read channel count"))?,
                current.get_period_size().map_err(hw_error("read period size"))?,
                current.get_buffer_size().map_err(hw_error("read buffer size"))?,
            )
        };
        let period_frames = usize::try_from(period_frames).unwrap_or(0);
        let buffer_frames = usize::try_from(buffer_frames).unwrap_or(0);

        if period_frames == buffer_frames {
            return Err(CaptureError::ConfigurationFailed(format!(
                "can't use period equal to buffer size ({} == {})",
                period_frames, buffer_frames
            )));
        }

        self.apply_sw_params(period_frames, buffer_frames)?;
        self.pcm.prepare().map_err(hw_error("prepare device"))?;

        let channels = u16::try_from(channels)
            .map_err(|_| CaptureError::ConfigurationFailed(format!("{} channels out of range", channels)))?;
        self.bytes_per_frame = self.config.format.bytes_per_frame(channels).unwrap_or(0);

        let params = NegotiatedParams {
            format: self.config.format,
            channels,
            sample_rate: rate,
            period_frames,
            period_time_us: request::period_time_us(period_frames, rate),
            buffer_frames,
        };
        log::debug!("ALSA negotiated {:?}", params);
        Ok(params)
    }

    fn read_frames(&mut self, buffer: &mut [u8], frames: usize) -> Result<usize, ReadError> {
        let len = frames * self.bytes_per_frame;
        if len == 0 || buffer.len() < len {
            return Err(ReadError::Fatal(format!(
                "read of {} frames into {} byte buffer",
                frames,
                buffer.len()
            )));
        }

        let io = self.pcm.io_bytes();
        io.readi(&mut buffer[..len])
            .map_err(|e| request::classify_read_error(e.errno(), e.to_string()))
    }

    fn wait_ready(&mut self, timeout: Duration) {
        let millis = timeout.as_millis().min(u32::MAX as u128) as u32;
        if let Err(e) = self.pcm.wait(Some(millis)) {
            log::debug!("ALSA wait failed: {}", e);
        }
    }

    fn prepare(&mut self) -> Result<(), CaptureError> {
        self.pcm
            .prepare()
            .map_err(|e| CaptureError::HardwareFault(format!("prepare failed: {}", e)))
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: self.config.device_name.clone(),
            description: "ALSA PCM capture".into(),
        }
    }
}

/// ALSA format for a sample format.
pub fn alsa_format(format: SampleFormat) -> Format {
    match format {
        SampleFormat::S8 => Format::S8,
        SampleFormat::U8 => Format::U8,
        SampleFormat::S16Le => Format::S16LE,
        SampleFormat::S16Be => Format::S16BE,
        SampleFormat::S24Le => Format::S24LE,
        SampleFormat::S24Packed3Le => Format::S243LE,
        SampleFormat::S32Le => Format::S32LE,
        SampleFormat::F32Le => Format::FloatLE,
    }
}

fn hw_error(action: &'static str) -> impl Fn(alsa::Error) -> CaptureError {
    move |e| CaptureError::ConfigurationFailed(format!("failed to {}: {}", action, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_map_to_alsa() {
        assert_eq!(alsa_format(SampleFormat::S16Le), Format::S16LE);
        assert_eq!(alsa_format(SampleFormat::S24Packed3Le), Format::S243LE);
        assert_eq!(alsa_format(SampleFormat::F32Le), Format::FloatLE);
    }

    #[test]
    fn opening_missing_device_fails() {
        let config = DeviceConfiguration {
            device_name: "hw:99,99".into(),
            ..Default::default()
        };
        assert!(matches!(
            AlsaCaptureDevice::open(&config),
            Err(CaptureError::DeviceNotAvailable)
        ));
    }
}
