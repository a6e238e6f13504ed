use serde::{Deserialize, Serialize};

/// Why a capture run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The byte target was reached.
    TargetReached,
    /// `stop` was requested before the target (if any) was reached.
    Stopped,
    /// The device reported an unrecoverable read error.
    HardwareFault,
    /// A destination write failed.
    SinkFailed,
}

impl RunOutcome {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::HardwareFault | Self::SinkFailed)
    }
}

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// uninitialized → initialized → running → finished
///                                  ↑          │
///                                  └──────────┘  (restart)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Uninitialized,
    Initialized,
    Running,
    Finished(RunOutcome),
}

impl CaptureState {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// Whether `start` is allowed from this state.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Initialized | Self::Finished(_))
    }
}
