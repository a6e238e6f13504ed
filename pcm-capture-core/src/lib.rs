//! # pcm-capture-core
//!
//! Platform-agnostic, period-based PCM capture core library.
//!
//! Provides period timing, ring buffering, overrun-tolerant period reads,
//! raw/WAV/stream output, and session orchestration. Hardware backends
//! (ALSA on Linux) implement the `PcmDevice` trait and plug into the
//! generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! pcm-capture-core (this crate)
//! ├── traits/       ← PcmDevice, SinkDestination, CaptureObserver
//! ├── models/       ← CaptureError, CaptureState, configurations, PeriodTimingInfo
//! ├── processing/   ← RingBuffer, period reader, WAV header generation
//! ├── session/      ← CaptureSession (generic orchestrator)
//! └── storage/      ← OutputSink, raw/WAV/stream writers, metadata
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::audio_models::{CaptureDiagnostics, DeviceInfo, NegotiatedParams, SampleFormat};
pub use models::config::{CaptureTarget, DeviceConfiguration, SinkConfiguration};
pub use models::error::CaptureError;
pub use models::recording_result::{RecordingMetadata, RunSummary};
pub use models::state::{CaptureState, RunOutcome};
pub use models::timing::PeriodTimingInfo;
pub use processing::ring_buffer::RingBuffer;
pub use session::capture::{CaptureSession, StopHandle};
pub use storage::output_sink::OutputSink;
pub use traits::capture_observer::CaptureObserver;
pub use traits::pcm_device::{PcmDevice, ReadError};
pub use traits::sink_destination::SinkDestination;
