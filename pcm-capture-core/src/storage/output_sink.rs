use crate::models::audio_models::NegotiatedParams;
use crate::models::config::SinkConfiguration;
use crate::models::error::CaptureError;
use crate::processing::wav_format::WavLayout;
use crate::storage::raw_writer::RawFileWriter;
use crate::storage::stream_writer::StreamWriter;
use crate::storage::wav_writer::WavFileWriter;
use crate::traits::sink_destination::SinkDestination;

/// Fans each captured payload out to every configured destination.
///
/// Destinations are opened once by `init` and written in a fixed order:
/// wav, raw, stream, then any destinations added with `with_destination`.
/// A failing destination fails the whole `write`; destinations earlier in
/// the order keep what they already received.
pub struct OutputSink {
    config: SinkConfiguration,
    destinations: Vec<Box<dyn SinkDestination>>,
    extra: Vec<Box<dyn SinkDestination>>,
    initialized: bool,
}

impl OutputSink {
    pub fn new(config: SinkConfiguration) -> Self {
        Self {
            config,
            destinations: Vec::new(),
            extra: Vec::new(),
            initialized: false,
        }
    }

    /// Add a destination that is not described by `SinkConfiguration`.
    pub fn with_destination(mut self, destination: Box<dyn SinkDestination>) -> Self {
        self.extra.push(destination);
        self
    }

    /// Open every destination for the negotiated stream.
    ///
    /// Calling `init` again after success is a no-op.
    pub fn init(&mut self, params: &NegotiatedParams) -> Result<(), CaptureError> {
        if self.initialized {
            log::debug!("Output sink already initialized");
            return Ok(());
        }

        self.config.validate().map_err(CaptureError::ConfigurationFailed)?;

        let mut destinations: Vec<Box<dyn SinkDestination>> = Vec::new();
        let overwrite = self.config.overwrite_existing;

        if let Some(ref path) = self.config.wav_path {
            let layout = WavLayout::for_stream(params.format, params.channels, params.sample_rate)?;
            destinations.push(Box::new(WavFileWriter::open(path.clone(), &layout, overwrite)?));
        }
        if let Some(ref path) = self.config.raw_path {
            destinations.push(Box::new(RawFileWriter::open(path.clone(), overwrite)?));
        }
        if self.config.stream_to_stdout {
            destinations.push(Box::new(StreamWriter::stdout()));
        }
        destinations.append(&mut self.extra);

        if destinations.is_empty() {
            log::warn!("No output destination configured; captured audio will be discarded");
        }
        for destination in &destinations {
            log::debug!("Output destination ready: {}", destination.describe());
        }

        self.destinations = destinations;
        self.initialized = true;
        Ok(())
    }

    /// Deliver `data` to every destination, in order.
    pub fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if !self.initialized {
            return Err(CaptureError::InvalidState("output sink is not initialized".into()));
        }
        for destination in self.destinations.iter_mut() {
            if let Err(e) = destination.write(data) {
                log::error!(
                    "Failed to write {} bytes to {}: {}",
                    data.len(),
                    destination.describe(),
                    e
                );
                return Err(e);
            }
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn destination_count(&self) -> usize {
        self.destinations.len()
    }

    /// `(description, payload bytes)` for each open destination.
    pub fn destination_totals(&self) -> Vec<(String, u64)> {
        self.destinations
            .iter()
            .map(|d| (d.describe(), d.bytes_written()))
            .collect()
    }
}
