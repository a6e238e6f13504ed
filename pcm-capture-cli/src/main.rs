//! pcm-record
//!
//! Records period-sized blocks from an ALSA capture device into raw PCM,
//! WAV, and/or standard output.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use pcm_capture_core::{
    CaptureError, CaptureSession, CaptureTarget, DeviceConfiguration, PcmDevice, SampleFormat, SinkConfiguration,
};

#[derive(Parser, Debug)]
#[command(name = "pcm-record")]
#[command(version)]
#[command(about = "Period-based PCM capture recorder", long_about = None)]
struct Cli {
    /// Capture device name
    #[arg(short = 'D', long, default_value = "default")]
    device: String,

    /// Write headerless PCM to this file
    #[arg(long, value_name = "PATH")]
    raw: Option<PathBuf>,

    /// Write a WAV file (16-bit mono or stereo only)
    #[arg(long, value_name = "PATH")]
    wav: Option<PathBuf>,

    /// Stream captured PCM to standard output
    #[arg(long)]
    stdout: bool,

    /// Replace existing output files instead of appending
    #[arg(long)]
    overwrite: bool,

    /// Stop after this many milliseconds (0 = until interrupted)
    #[arg(short = 'd', long, value_name = "MS")]
    duration_ms: Option<u64>,

    /// Stop after this many frames; takes priority over --duration-ms
    #[arg(short = 's', long, value_name = "FRAMES")]
    samples: Option<u64>,

    /// Sample format (S8, U8, S16_LE, S16_BE, S24_LE, S24_3LE, S32_LE, FLOAT_LE)
    #[arg(short = 'f', long, default_value = "S16_LE")]
    format: SampleFormat,

    /// Channel count
    #[arg(short = 'c', long, default_value_t = 2)]
    channels: u16,

    /// Sample rate in Hz
    #[arg(short = 'r', long, default_value_t = 48000)]
    rate: u32,

    /// Period length in microseconds
    #[arg(long, value_name = "US")]
    period_time: Option<u32>,

    /// Period length in frames (used when --period-time is not given)
    #[arg(long, value_name = "FRAMES")]
    period_size: Option<usize>,

    /// Hardware buffer length in microseconds
    #[arg(long, value_name = "US")]
    buffer_time: Option<u32>,

    /// Hardware buffer length in frames (used when --buffer-time is not given)
    #[arg(long, value_name = "FRAMES")]
    buffer_size: Option<usize>,

    /// Frames available before the hardware starts
    #[arg(long, value_name = "FRAMES")]
    start_threshold: Option<usize>,

    /// Periods of recent audio kept in memory
    #[arg(long, default_value_t = 4)]
    ring_periods: usize,

    /// Write a JSON metadata sidecar next to the output file
    #[arg(long)]
    metadata: bool,

    /// List capture devices and exit
    #[arg(short = 'l', long)]
    list_devices: bool,

    /// Increase verbosity
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn device_config(&self) -> DeviceConfiguration {
        let defaults = DeviceConfiguration::default();
        let period_requested = self.period_time.is_some() || self.period_size.is_some();
        let buffer_requested = self.buffer_time.is_some() || self.buffer_size.is_some();

        DeviceConfiguration {
            device_name: self.device.clone(),
            format: self.format,
            channels: self.channels,
            sample_rate: self.rate,
            buffer_frames: if buffer_requested {
                self.buffer_size.unwrap_or(0)
            } else {
                defaults.buffer_frames
            },
            buffer_time_us: self.buffer_time.unwrap_or(0),
            period_frames: self.period_size.unwrap_or(0),
            period_time_us: if period_requested {
                self.period_time.unwrap_or(0)
            } else {
                defaults.period_time_us
            },
            start_threshold: self.start_threshold.unwrap_or(defaults.start_threshold),
            ring_periods: self.ring_periods,
        }
    }

    fn sink_config(&self) -> SinkConfiguration {
        SinkConfiguration {
            raw_path: self.raw.clone(),
            wav_path: self.wav.clone(),
            stream_to_stdout: self.stdout,
            overwrite_existing: self.overwrite,
        }
    }

    fn target(&self) -> CaptureTarget {
        match (self.samples, self.duration_ms) {
            (Some(samples), _) if samples > 0 => CaptureTarget::Samples(samples),
            (_, Some(ms)) if ms > 0 => CaptureTarget::Duration(Duration::from_millis(ms)),
            _ => CaptureTarget::Unbounded,
        }
    }

    /// File the metadata sidecar describes: the WAV output, else the raw one.
    fn primary_output(&self) -> Option<&PathBuf> {
        self.wav.as_ref().or(self.raw.as_ref())
    }
}

/// Start a run. An interrupt that arrived before the run existed is
/// re-applied, since `start` clears any earlier stop request.
fn start_run<D: PcmDevice>(
    session: &mut CaptureSession<D>,
    target: CaptureTarget,
    interrupted: &AtomicBool,
) -> Result<(), CaptureError> {
    session.start(target)?;
    if interrupted.load(Ordering::SeqCst) {
        log::info!("Interrupted before capture started, stopping");
        session.stop();
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match record::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("pcm-record: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(target_os = "linux")]
mod record {
    use std::process::ExitCode;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use pcm_capture_alsa::{AlsaCaptureDevice, DeviceEnumerator};
    use pcm_capture_core::storage::metadata;
    use pcm_capture_core::{CaptureError, CaptureSession, OutputSink, RecordingMetadata};

    use super::{start_run, Cli};

    pub fn run(cli: &Cli) -> Result<ExitCode, CaptureError> {
        if cli.list_devices {
            for device in DeviceEnumerator::list_capture_devices()? {
                println!("{}\t{}", device.name, device.description);
            }
            return Ok(ExitCode::SUCCESS);
        }

        let device_config = cli.device_config();
        let sink_config = cli.sink_config();
        if sink_config.is_empty() {
            log::warn!("No --raw, --wav or --stdout given; audio will only be counted");
        }

        let device = AlsaCaptureDevice::open(&device_config)?;
        let mut session =
            CaptureSession::new(device, OutputSink::new(sink_config)).with_ring_periods(device_config.ring_periods);
        session.init()?;

        let stop = session.stop_handle();
        let interrupted = Arc::new(AtomicBool::new(false));
        let handler_flag = Arc::clone(&interrupted);
        ctrlc::set_handler(move || {
            log::info!("Received Ctrl+C, stopping capture");
            handler_flag.store(true, Ordering::SeqCst);
            stop.stop();
        })
        .map_err(|e| CaptureError::Unknown(format!("failed to install Ctrl+C handler: {}", e)))?;

        start_run(&mut session, cli.target(), &interrupted)?;

        let summary = session.wait()?;
        log::info!(
            "Captured {:.3}s, {} bytes written ({:?})",
            summary.captured.as_secs_f64(),
            summary.diagnostics.bytes_written,
            summary.outcome
        );
        for (destination, bytes) in session.destination_totals().unwrap_or_default() {
            log::info!("  {}: {} bytes", destination, bytes);
        }

        if cli.metadata {
            write_sidecar(cli, &session, &summary)?;
        }

        if summary.outcome.is_failure() {
            return Ok(ExitCode::FAILURE);
        }
        Ok(ExitCode::SUCCESS)
    }

    fn write_sidecar(
        cli: &Cli,
        session: &CaptureSession<AlsaCaptureDevice>,
        summary: &pcm_capture_core::RunSummary,
    ) -> Result<(), CaptureError> {
        let Some(path) = cli.primary_output() else {
            log::warn!("--metadata needs --wav or --raw; skipping sidecar");
            return Ok(());
        };
        let Some(params) = session.negotiated_params() else {
            return Err(CaptureError::InvalidState("session was never initialized".into()));
        };

        let checksum = metadata::sha256_file(path)?;
        let record = RecordingMetadata::new(
            summary,
            &path.display().to_string(),
            &checksum,
            params.format,
            params.channels,
            params.sample_rate,
        );
        let sidecar = metadata::write_metadata(&record, path)?;
        log::info!("Metadata written to {}", sidecar.display());
        Ok(())
    }
}

#[cfg(not(target_os = "linux"))]
mod record {
    use std::process::ExitCode;

    use pcm_capture_core::CaptureError;

    use super::Cli;

    pub fn run(_cli: &Cli) -> Result<ExitCode, CaptureError> {
        Err(CaptureError::DeviceNotAvailable)
    }
}
