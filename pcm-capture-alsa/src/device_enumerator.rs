//! ALSA capture device enumeration via PCM name hints.

use std::ffi::CStr;

use alsa::device_name::HintIter;
use alsa::Direction;

use pcm_capture_core::models::audio_models::DeviceInfo;
use pcm_capture_core::models::error::CaptureError;

/// Lists PCM devices usable for capture.
pub struct DeviceEnumerator;

impl DeviceEnumerator {
    /// Capture-capable PCM names with their first description line.
    pub fn list_capture_devices() -> Result<Vec<DeviceInfo>, CaptureError> {
        let iface = CStr::from_bytes_with_nul(b"pcm\0")
            .map_err(|e| CaptureError::Unknown(format!("invalid interface name: {}", e)))?;
        let hints = HintIter::new(None, iface)
            .map_err(|e| CaptureError::Unknown(format!("failed to enumerate devices: {}", e)))?;

        let mut devices = Vec::new();
        for hint in hints {
            // Hints without a direction support both
            if hint.direction == Some(Direction::Playback) {
                continue;
            }
            let Some(name) = hint.name else {
                continue;
            };
            if name == "null" {
                continue;
            }
            let description = hint
                .desc
                .as_deref()
                .and_then(|d| d.lines().next())
                .unwrap_or("")
                .to_string();
            devices.push(DeviceInfo { name, description });
        }

        Ok(devices)
    }
}
