use std::time::Duration;

use crate::models::error::CaptureError;
use crate::traits::pcm_device::{PcmDevice, ReadError};

/// How long to wait for the device between retries of an empty or short read.
pub const READY_TIMEOUT: Duration = Duration::from_millis(50);

/// Bookkeeping for one completed period read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodRead {
    pub frames: usize,
    pub overruns_recovered: u64,
    pub transient_waits: u64,
}

/// Fill `buffer` with exactly `frames` frames from `device`.
///
/// Short and empty reads wait for the device and continue at the offset
/// already filled. Overruns re-prepare the device and retry the remaining
/// frames. Any other read error aborts with `HardwareFault`.
pub fn read_period<D: PcmDevice + ?Sized>(
    device: &mut D,
    buffer: &mut [u8],
    frames: usize,
    bytes_per_frame: usize,
) -> Result<PeriodRead, CaptureError> {
    let period_bytes = frames * bytes_per_frame;
    if buffer.len() < period_bytes {
        return Err(CaptureError::ConfigurationFailed(format!(
            "working buffer holds {} bytes, period needs {}",
            buffer.len(),
            period_bytes
        )));
    }

    let mut read = PeriodRead::default();
    while read.frames < frames {
        let offset = read.frames * bytes_per_frame;
        let remaining = frames - read.frames;

        match device.read_frames(&mut buffer[offset..period_bytes], remaining) {
            Ok(count) => {
                read.frames += count.min(remaining);
                if read.frames < frames {
                    read.transient_waits += 1;
                    device.wait_ready(READY_TIMEOUT);
                }
            }
            Err(ReadError::WouldBlock) => {
                read.transient_waits += 1;
                device.wait_ready(READY_TIMEOUT);
            }
            Err(ReadError::Overrun) => {
                log::warn!(
                    "Capture overrun with {} of {} frames read, re-preparing device",
                    read.frames,
                    frames
                );
                device.prepare().map_err(|e| {
                    CaptureError::HardwareFault(format!("recovery after overrun failed: {}", e))
                })?;
                read.overruns_recovered += 1;
            }
            Err(ReadError::Fatal(reason)) => {
                log::error!("Capture read failed: {}", reason);
                return Err(CaptureError::HardwareFault(reason));
            }
        }
    }

    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::mocks::{MockPcmDevice, MockStep};

    #[test]
    fn full_read_in_one_call() {
        let mut device = MockPcmDevice::new(4, 1);
        let mut buffer = vec![0u8; 8];

        let read = read_period(&mut device, &mut buffer, 4, 2).unwrap();

        assert_eq!(read.frames, 4);
        assert_eq!(read.transient_waits, 0);
        assert_eq!(buffer, MockPcmDevice::expected_stream(0, 8));
    }

    #[test]
    fn short_reads_append_at_offset() {
        let mut device = MockPcmDevice::new(4, 1).with_script(vec![MockStep::Frames(1), MockStep::Frames(2)]);
        let mut buffer = vec![0u8; 8];

        let read = read_period(&mut device, &mut buffer, 4, 2).unwrap();

        assert_eq!(read.frames, 4);
        assert_eq!(read.transient_waits, 2);
        assert_eq!(buffer, MockPcmDevice::expected_stream(0, 8));
        assert_eq!(device.stats().reads, 3);
    }

    #[test]
    fn would_block_waits_then_retries() {
        let mut device = MockPcmDevice::new(4, 1).with_script(vec![MockStep::WouldBlock, MockStep::WouldBlock]);
        let mut buffer = vec![0u8; 8];

        let read = read_period(&mut device, &mut buffer, 4, 2).unwrap();

        assert_eq!(read.frames, 4);
        assert_eq!(read.transient_waits, 2);
        assert_eq!(device.stats().waits, 2);
    }

    #[test]
    fn overrun_prepares_and_continues() {
        let mut device =
            MockPcmDevice::new(4, 1).with_script(vec![MockStep::Frames(2), MockStep::Overrun]);
        let mut buffer = vec![0u8; 8];

        let read = read_period(&mut device, &mut buffer, 4, 2).unwrap();

        assert_eq!(read.frames, 4);
        assert_eq!(read.overruns_recovered, 1);
        assert_eq!(device.stats().prepares, 1);
        assert_eq!(buffer, MockPcmDevice::expected_stream(0, 8));
    }

    #[test]
    fn fatal_aborts() {
        let mut device = MockPcmDevice::new(4, 1).with_script(vec![MockStep::Fatal]);
        let mut buffer = vec![0u8; 8];

        let err = read_period(&mut device, &mut buffer, 4, 2).unwrap_err();
        assert!(matches!(err, CaptureError::HardwareFault(_)));
    }

    #[test]
    fn failed_prepare_is_fatal() {
        let mut device = MockPcmDevice::new(4, 1)
            .with_script(vec![MockStep::Overrun])
            .failing_prepare();
        let mut buffer = vec![0u8; 8];

        let err = read_period(&mut device, &mut buffer, 4, 2).unwrap_err();
        assert!(matches!(err, CaptureError::HardwareFault(_)));
    }

    #[test]
    fn undersized_buffer_rejected() {
        let mut device = MockPcmDevice::new(4, 1);
        let mut buffer = vec![0u8; 7];
        assert!(read_period(&mut device, &mut buffer, 4, 2).is_err());
        assert_eq!(device.stats().reads, 0);
    }
}
