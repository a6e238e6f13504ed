use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use crate::models::audio_models::{CaptureDiagnostics, DeviceInfo, NegotiatedParams};
use crate::models::config::CaptureTarget;
use crate::models::error::CaptureError;
use crate::models::recording_result::RunSummary;
use crate::models::state::{CaptureState, RunOutcome};
use crate::models::timing::PeriodTimingInfo;
use crate::processing::period_reader;
use crate::processing::ring_buffer::RingBuffer;
use crate::storage::output_sink::OutputSink;
use crate::traits::capture_observer::CaptureObserver;
use crate::traits::pcm_device::PcmDevice;

/// Default depth of the session ring buffer, in periods.
pub const DEFAULT_RING_PERIODS: usize = 4;

/// Flags and counters shared between the caller and the capture thread.
struct LoopShared {
    stop_requested: AtomicBool,
    finished: AtomicBool,
    diagnostics: Mutex<CaptureDiagnostics>,
    outcome: Mutex<Option<RunOutcome>>,
}

impl LoopShared {
    fn new() -> Self {
        Self {
            stop_requested: AtomicBool::new(false),
            finished: AtomicBool::new(false),
            diagnostics: Mutex::new(CaptureDiagnostics::default()),
            outcome: Mutex::new(None),
        }
    }

    fn reset(&self) {
        self.stop_requested.store(false, Ordering::SeqCst);
        self.finished.store(false, Ordering::SeqCst);
        *self.diagnostics.lock() = CaptureDiagnostics::default();
        *self.outcome.lock() = None;
    }
}

/// Cloneable handle that requests a cooperative stop of the running capture.
///
/// Usable from any thread, including signal handlers set up with `ctrlc`.
#[derive(Clone)]
pub struct StopHandle {
    shared: Arc<LoopShared>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.shared.stop_requested.load(Ordering::SeqCst)
    }
}

/// Device and sink. Locked by the capture thread for the whole run.
struct CaptureWorker<D: PcmDevice> {
    device: D,
    sink: OutputSink,
}

/// Everything the capture thread needs besides the worker.
struct LoopContext {
    shared: Arc<LoopShared>,
    ring: Arc<RingBuffer>,
    timing: PeriodTimingInfo,
    target_bytes: Option<u64>,
    observer: Option<Arc<dyn CaptureObserver>>,
}

/// Sets the finished flag when dropped, so every exit path of the capture
/// thread (including a panic) marks the run finished.
struct FinishGuard<'a>(&'a LoopShared);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        let mut outcome = self.0.outcome.lock();
        if outcome.is_none() {
            *outcome = Some(RunOutcome::HardwareFault);
        }
        drop(outcome);
        self.0.finished.store(true, Ordering::SeqCst);
    }
}

/// Period-driven capture session.
///
/// Generic over the capture backend via the `PcmDevice` trait. Owns the
/// device and the output sink, and runs one background capture loop at a
/// time:
/// ```text
/// [PcmDevice] → read_period → [working buffer] ─┬→ [RingBuffer] (recent audio)
///                                               └→ [OutputSink] → wav / raw / stream
/// ```
pub struct CaptureSession<D: PcmDevice> {
    worker: Arc<Mutex<CaptureWorker<D>>>,
    device_info: DeviceInfo,
    ring_periods: usize,
    state: CaptureState,
    params: Option<NegotiatedParams>,
    timing: Option<PeriodTimingInfo>,
    ring: Option<Arc<RingBuffer>>,
    target_bytes: Option<u64>,
    shared: Arc<LoopShared>,
    observer: Option<Arc<dyn CaptureObserver>>,
    loop_handle: Option<thread::JoinHandle<()>>,
}

impl<D: PcmDevice> CaptureSession<D> {
    pub fn new(device: D, sink: OutputSink) -> Self {
        let device_info = device.device_info();
        Self {
            worker: Arc::new(Mutex::new(CaptureWorker { device, sink })),
            device_info,
            ring_periods: DEFAULT_RING_PERIODS,
            state: CaptureState::Uninitialized,
            params: None,
            timing: None,
            ring: None,
            target_bytes: None,
            shared: Arc::new(LoopShared::new()),
            observer: None,
            loop_handle: None,
        }
    }

    /// Ring buffer depth in periods. Takes effect at `init`.
    pub fn with_ring_periods(mut self, periods: usize) -> Self {
        self.ring_periods = periods;
        self
    }

    pub fn set_observer(&mut self, observer: Arc<dyn CaptureObserver>) {
        self.observer = Some(observer);
    }

    /// Current session state. A run whose loop has exited reads as
    /// `Finished` even before `wait` joins it.
    pub fn state(&self) -> CaptureState {
        match self.state {
            CaptureState::Running if self.has_finished() => {
                CaptureState::Finished(self.shared.outcome.lock().unwrap_or(RunOutcome::Stopped))
            }
            state => state,
        }
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn negotiated_params(&self) -> Option<NegotiatedParams> {
        self.params
    }

    pub fn timing(&self) -> Option<PeriodTimingInfo> {
        self.timing
    }

    /// Byte target of the current or last run; `None` when unbounded.
    pub fn target_bytes(&self) -> Option<u64> {
        self.target_bytes
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        self.shared.diagnostics.lock().clone()
    }

    pub fn last_outcome(&self) -> Option<RunOutcome> {
        *self.shared.outcome.lock()
    }

    /// The most recent audio, oldest byte first. Empty before `init`.
    pub fn recent_audio(&self) -> Vec<u8> {
        self.ring.as_ref().map(|r| r.snapshot()).unwrap_or_default()
    }

    pub fn ring_buffer(&self) -> Option<Arc<RingBuffer>> {
        self.ring.clone()
    }

    /// `(description, payload bytes)` per output destination. `None` while
    /// a run holds the sink.
    pub fn destination_totals(&self) -> Option<Vec<(String, u64)>> {
        self.worker.try_lock().map(|worker| worker.sink.destination_totals())
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Negotiate with the device and open every output destination.
    /// Transitions: uninitialized → initialized.
    pub fn init(&mut self) -> Result<(), CaptureError> {
        if self.state != CaptureState::Uninitialized {
            return Err(CaptureError::InvalidState(
                "can only initialize an uninitialized session".into(),
            ));
        }
        if self.ring_periods == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "ring buffer must hold at least one period".into(),
            ));
        }

        let (params, timing) = {
            let mut worker = self.worker.lock();
            let params = worker.device.negotiate()?;
            let timing = PeriodTimingInfo::from_negotiated(&params)?;
            worker.sink.init(&params)?;
            (params, timing)
        };

        let ring_capacity = timing
            .period_bytes
            .checked_mul(self.ring_periods)
            .ok_or_else(|| CaptureError::ConfigurationFailed("ring buffer size overflows".into()))?;
        self.ring = Some(Arc::new(RingBuffer::new(ring_capacity)?));

        log::info!(
            "Capture initialized on {}: {} x{} @ {} Hz, period {} frames ({} us, {} bytes)",
            self.device_info.name,
            params.format,
            params.channels,
            params.sample_rate,
            timing.period_frames,
            timing.period_time_us,
            timing.period_bytes
        );

        self.params = Some(params);
        self.timing = Some(timing);
        self.set_state(CaptureState::Initialized);
        Ok(())
    }

    /// Start a capture run in the background and return immediately.
    /// Transitions: initialized/finished → running.
    pub fn start(&mut self, target: CaptureTarget) -> Result<(), CaptureError> {
        if self.loop_handle.is_some() {
            if !self.has_finished() {
                log::warn!("Start rejected: previous capture run is still active");
                return Err(CaptureError::InvalidState(
                    "previous capture run is still active".into(),
                ));
            }
            self.join_loop()?;
        }

        if !self.state.can_start() {
            return Err(CaptureError::InvalidState(
                "can only start an initialized or finished session".into(),
            ));
        }

        let (timing, ring) = match (self.timing, &self.ring) {
            (Some(timing), Some(ring)) => (timing, Arc::clone(ring)),
            _ => return Err(CaptureError::InvalidState("session is not initialized".into())),
        };
        let target_bytes = timing.target_bytes(&target)?;

        self.shared.reset();
        ring.reset();

        let context = LoopContext {
            shared: Arc::clone(&self.shared),
            ring,
            timing,
            target_bytes,
            observer: self.observer.clone(),
        };
        let worker = Arc::clone(&self.worker);

        // Announce Running before the loop can announce Finished
        let previous = self.state;
        self.target_bytes = target_bytes;
        self.set_state(CaptureState::Running);

        let spawned = thread::Builder::new()
            .name("pcm-capture".into())
            .spawn(move || {
                let mut worker = worker.lock();
                Self::run_capture_loop(&mut worker, &context);
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.set_state(previous);
                return Err(CaptureError::Unknown(format!("failed to spawn capture thread: {}", e)));
            }
        };

        match target_bytes {
            Some(bytes) => log::info!("Capture started, target {} bytes ({:?})", bytes, target),
            None => log::info!("Capture started, unbounded"),
        }

        self.loop_handle = Some(handle);
        Ok(())
    }

    /// Request a cooperative stop. Never blocks; the loop exits after the
    /// period it is currently reading.
    pub fn stop(&self) {
        if self.state.is_running() {
            log::debug!("Stop requested");
        }
        self.shared.stop_requested.store(true, Ordering::SeqCst);
    }

    /// Same as `stop`: in-flight hardware reads are never interrupted.
    pub fn force_stop(&self) {
        log::warn!("Forced stop requested; waiting for the current period to complete");
        self.stop();
    }

    /// Lock-free check whether the capture loop of the last run has exited.
    pub fn has_finished(&self) -> bool {
        self.shared.finished.load(Ordering::SeqCst)
    }

    /// Block until the current run's loop exits and return its summary.
    pub fn wait(&mut self) -> Result<RunSummary, CaptureError> {
        if self.loop_handle.is_none() {
            return Err(CaptureError::InvalidState("no capture run to wait for".into()));
        }
        self.join_loop()?;
        Ok(self.summary())
    }

    /// Summary of the current or last run.
    pub fn summary(&self) -> RunSummary {
        let diagnostics = self.diagnostics();
        let captured = self
            .timing
            .map(|t| t.duration_of(diagnostics.bytes_read))
            .unwrap_or_default();
        RunSummary {
            outcome: self.last_outcome().unwrap_or(RunOutcome::Stopped),
            target_bytes: self.target_bytes,
            captured,
            diagnostics,
        }
    }

    // --- Internal helpers ---

    fn set_state(&mut self, new_state: CaptureState) {
        self.state = new_state;
        if let Some(ref observer) = self.observer {
            observer.on_state_changed(&new_state);
        }
    }

    fn join_loop(&mut self) -> Result<(), CaptureError> {
        let Some(handle) = self.loop_handle.take() else {
            return Ok(());
        };
        let joined = handle.join();
        let outcome = self.last_outcome().unwrap_or(RunOutcome::HardwareFault);
        self.state = CaptureState::Finished(outcome);
        joined.map_err(|_| CaptureError::Unknown("capture thread panicked".into()))
    }

    /// The capture loop. Runs on the `pcm-capture` thread.
    fn run_capture_loop(worker: &mut CaptureWorker<D>, ctx: &LoopContext) {
        let _finish = FinishGuard(&ctx.shared);
        let timing = ctx.timing;
        let mut buffer = vec![0u8; timing.period_bytes];
        let mut bytes_read: u64 = 0;

        let outcome = loop {
            if ctx.target_bytes.is_some_and(|target| bytes_read >= target) {
                break RunOutcome::TargetReached;
            }
            if ctx.shared.stop_requested.load(Ordering::SeqCst) {
                break RunOutcome::Stopped;
            }

            let read = match period_reader::read_period(
                &mut worker.device,
                &mut buffer,
                timing.period_frames,
                timing.bytes_per_frame,
            ) {
                Ok(read) => read,
                Err(e) => {
                    Self::report_error(ctx, &e);
                    break RunOutcome::HardwareFault;
                }
            };

            let payload = &buffer[..read.frames * timing.bytes_per_frame];
            ctx.ring.append(payload);
            bytes_read += payload.len() as u64;
            {
                let mut diag = ctx.shared.diagnostics.lock();
                diag.periods_read += 1;
                diag.bytes_read += payload.len() as u64;
                diag.overruns_recovered += read.overruns_recovered;
                diag.transient_waits += read.transient_waits;
            }

            if let Err(e) = worker.sink.write(payload) {
                Self::report_error(ctx, &e);
                break RunOutcome::SinkFailed;
            }
            ctx.shared.diagnostics.lock().bytes_written += payload.len() as u64;

            if let Some(ref observer) = ctx.observer {
                observer.on_period_written(payload.len());
            }
        };

        *ctx.shared.outcome.lock() = Some(outcome);
        let diagnostics = ctx.shared.diagnostics.lock().clone();
        log::info!(
            "Capture finished ({:?}): {} periods, {} bytes written, {} overruns recovered",
            outcome,
            diagnostics.periods_read,
            diagnostics.bytes_written,
            diagnostics.overruns_recovered
        );

        let summary = RunSummary {
            outcome,
            target_bytes: ctx.target_bytes,
            captured: timing.duration_of(diagnostics.bytes_read),
            diagnostics,
        };

        // Observer sees the end of the run before has_finished() turns true
        if let Some(ref observer) = ctx.observer {
            observer.on_state_changed(&CaptureState::Finished(outcome));
            observer.on_run_finished(&summary);
        }
        drop(_finish);
    }

    fn report_error(ctx: &LoopContext, error: &CaptureError) {
        log::error!("Capture run aborted: {}", error);
        if let Some(ref observer) = ctx.observer {
            observer.on_error(error);
        }
    }
}

impl<D: PcmDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.shared.stop_requested.store(true, Ordering::SeqCst);
        if let Some(handle) = self.loop_handle.take() {
            let _ = handle.join();
        }
    }
}
