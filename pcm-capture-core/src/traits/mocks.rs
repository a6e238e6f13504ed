//! Mock implementations for testing

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::audio_models::{DeviceInfo, NegotiatedParams, SampleFormat};
use crate::models::error::CaptureError;
use crate::traits::pcm_device::{PcmDevice, ReadError};

/// One scripted response of `MockPcmDevice::read_frames`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockStep {
    /// Deliver at most this many frames.
    Frames(usize),
    WouldBlock,
    Overrun,
    Fatal,
}

/// Call counters, shared so tests can inspect a device owned by a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockStats {
    pub negotiations: u64,
    pub reads: u64,
    pub waits: u64,
    pub prepares: u64,
}

/// Scripted S16_LE capture device.
///
/// Produces a deterministic byte stream (`expected_stream`) independent of
/// how reads are split. Once the script runs out every read is a full read.
pub struct MockPcmDevice {
    params: NegotiatedParams,
    script: VecDeque<MockStep>,
    position: u64,
    stats: Arc<Mutex<MockStats>>,
    fail_prepare: bool,
    negotiate_error: Option<CaptureError>,
    read_delay: Option<Duration>,
}

impl MockPcmDevice {
    pub fn new(period_frames: usize, channels: u16) -> Self {
        Self {
            params: NegotiatedParams {
                format: SampleFormat::S16Le,
                channels,
                sample_rate: 48000,
                period_frames,
                period_time_us: 1000,
                buffer_frames: period_frames * 4,
            },
            script: VecDeque::new(),
            position: 0,
            stats: Arc::new(Mutex::new(MockStats::default())),
            fail_prepare: false,
            negotiate_error: None,
            read_delay: None,
        }
    }

    pub fn with_script(mut self, steps: Vec<MockStep>) -> Self {
        self.script = steps.into();
        self
    }

    pub fn with_params(mut self, params: NegotiatedParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = Some(delay);
        self
    }

    pub fn failing_prepare(mut self) -> Self {
        self.fail_prepare = true;
        self
    }

    pub fn failing_negotiation(mut self, error: CaptureError) -> Self {
        self.negotiate_error = Some(error);
        self
    }

    pub fn stats(&self) -> MockStats {
        self.stats.lock().clone()
    }

    pub fn stats_handle(&self) -> Arc<Mutex<MockStats>> {
        Arc::clone(&self.stats)
    }

    /// Bytes `[start, start + len)` of the stream the device produces.
    pub fn expected_stream(start: u64, len: usize) -> Vec<u8> {
        (start..start + len as u64).map(|i| (i % 251) as u8).collect()
    }

    fn bytes_per_frame(&self) -> usize {
        self.params.format.bytes_per_sample() * self.params.channels as usize
    }

    fn deliver(&mut self, buffer: &mut [u8], frames: usize) -> usize {
        let len = frames * self.bytes_per_frame();
        let chunk = Self::expected_stream(self.position, len);
        buffer[..len].copy_from_slice(&chunk);
        self.position += len as u64;
        frames
    }
}

impl PcmDevice for MockPcmDevice {
    fn negotiate(&mut self) -> Result<NegotiatedParams, CaptureError> {
        self.stats.lock().negotiations += 1;
        match self.negotiate_error.clone() {
            Some(err) => Err(err),
            None => Ok(self.params),
        }
    }

    fn read_frames(&mut self, buffer: &mut [u8], frames: usize) -> Result<usize, ReadError> {
        self.stats.lock().reads += 1;
        if let Some(delay) = self.read_delay {
            thread::sleep(delay);
        }
        match self.script.pop_front() {
            None => Ok(self.deliver(buffer, frames)),
            Some(MockStep::Frames(n)) => Ok(self.deliver(buffer, n.min(frames))),
            Some(MockStep::WouldBlock) => Err(ReadError::WouldBlock),
            Some(MockStep::Overrun) => Err(ReadError::Overrun),
            Some(MockStep::Fatal) => Err(ReadError::Fatal("device disconnected".into())),
        }
    }

    fn wait_ready(&mut self, _timeout: Duration) {
        self.stats.lock().waits += 1;
    }

    fn prepare(&mut self) -> Result<(), CaptureError> {
        self.stats.lock().prepares += 1;
        if self.fail_prepare {
            return Err(CaptureError::DeviceNotAvailable);
        }
        Ok(())
    }

    fn device_info(&self) -> DeviceInfo {
        DeviceInfo {
            name: "mock".into(),
            description: "Scripted test device".into(),
        }
    }
}

/// In-memory stream destination whose contents outlive the writer.
#[derive(Clone, Default)]
pub struct SharedBuffer(pub Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> Vec<u8> {
        self.0.lock().clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Writer that accepts a few bytes per call, then fails after `limit` bytes.
pub struct TrickleWriter {
    pub accepted: Vec<u8>,
    pub per_call: usize,
    pub limit: usize,
}

impl Write for TrickleWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.accepted.len() >= self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader went away"));
        }
        let n = buf.len().min(self.per_call).min(self.limit - self.accepted.len());
        self.accepted.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
