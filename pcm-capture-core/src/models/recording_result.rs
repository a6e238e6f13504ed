use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::audio_models::{CaptureDiagnostics, SampleFormat};
use super::state::RunOutcome;

/// Result returned when a capture run has been joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub outcome: RunOutcome,
    /// Byte target of the run, `None` for unbounded runs.
    pub target_bytes: Option<u64>,
    /// Audio length represented by the bytes read.
    pub captured: Duration,
    pub diagnostics: CaptureDiagnostics,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar written next to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub created_at: String,
    pub file_path: String,
    pub checksum: String,
    pub outcome: RunOutcome,
    pub format: SampleFormat,
    pub channels: u16,
    pub sample_rate: u32,
    pub bytes_written: u64,
    pub duration_secs: f64,
    pub overruns_recovered: u64,
}

impl RecordingMetadata {
    pub fn new(
        summary: &RunSummary,
        file_path: &str,
        checksum: &str,
        format: SampleFormat,
        channels: u16,
        sample_rate: u32,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            outcome: summary.outcome,
            format,
            channels,
            sample_rate,
            bytes_written: summary.diagnostics.bytes_written,
            duration_secs: summary.captured.as_secs_f64(),
            overruns_recovered: summary.diagnostics.overruns_recovered,
        }
    }
}
