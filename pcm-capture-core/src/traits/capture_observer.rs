use crate::models::error::CaptureError;
use crate::models::recording_result::RunSummary;
use crate::models::state::CaptureState;

/// Event observer for capture session notifications.
///
/// `on_state_changed` for `Initialized`/`Running` is called from the caller's
/// thread; everything else is called from the capture thread. Keep
/// implementations short, they delay the next period read.
pub trait CaptureObserver: Send + Sync {
    /// Called when the session state changes.
    fn on_state_changed(&self, state: &CaptureState);

    /// Called after each period has been written to every destination.
    fn on_period_written(&self, _bytes: usize) {}

    /// Called when a run fails on a hardware or destination error.
    fn on_error(&self, error: &CaptureError);

    /// Called once per run, before `has_finished` reports the run as over.
    fn on_run_finished(&self, summary: &RunSummary);
}
