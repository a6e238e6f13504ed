//! # pcm-capture-alsa
//!
//! Linux ALSA backend for pcm-capture.
//!
//! Provides:
//! - `AlsaCaptureDevice` — blocking interleaved capture from an ALSA PCM
//! - `DeviceEnumerator` — capture device listing via ALSA name hints
//! - `request` — hardware parameter request planning and errno mapping
//!
//! ## Platform Requirements
//! - Linux with alsa-lib (`libasound2-dev` / `alsa-lib-devel`) for linking
//!
//! ## Usage
//! ```ignore
//! use pcm_capture_alsa::AlsaCaptureDevice;
//! use pcm_capture_core::{CaptureSession, DeviceConfiguration, OutputSink, SinkConfiguration};
//!
//! let device = AlsaCaptureDevice::open(&DeviceConfiguration::default()).unwrap();
//! let mut session = CaptureSession::new(device, OutputSink::new(SinkConfiguration::default()));
//! ```

pub mod request;

#[cfg(target_os = "linux")]
pub mod alsa_capture;
#[cfg(target_os = "linux")]
pub mod device_enumerator;

#[cfg(target_os = "linux")]
pub use alsa_capture::AlsaCaptureDevice;
#[cfg(target_os = "linux")]
pub use device_enumerator::DeviceEnumerator;
