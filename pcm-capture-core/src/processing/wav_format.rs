//! WAV file format utilities.
//!
//! Generates the standard 44-byte RIFF header and computes the two size
//! fields that are patched as the file grows.

use crate::models::audio_models::SampleFormat;
use crate::models::error::CaptureError;

/// Size of the standard WAV RIFF header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Offset of the RIFF chunk size (file length - 8).
pub const CHUNK_SIZE_OFFSET: u64 = 4;

/// Offset of the data sub-chunk size (file length - 44).
pub const DATA_SIZE_OFFSET: u64 = 40;

/// Header fields derived from the negotiated stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavLayout {
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavLayout {
    /// Build the header layout for a negotiated stream.
    ///
    /// Only 16-bit little-endian mono and stereo are supported; the
    /// block-align and bit-depth mapping has not been validated for any
    /// other combination.
    pub fn for_stream(format: SampleFormat, channels: u16, sample_rate: u32) -> Result<Self, CaptureError> {
        if format != SampleFormat::S16Le {
            return Err(CaptureError::UnsupportedFormat(format!(
                "wav output supports S16_LE only, negotiated {}",
                format
            )));
        }
        if !(1..=2).contains(&channels) {
            return Err(CaptureError::UnsupportedFormat(format!(
                "wav output supports mono or stereo only, negotiated {} channels",
                channels
            )));
        }
        let bytes_per_frame = format.bytes_per_sample() as u32 * channels as u32;
        let byte_rate = sample_rate.checked_mul(bytes_per_frame).ok_or_else(|| {
            CaptureError::UnsupportedFormat(format!("sample rate {} too large for wav", sample_rate))
        })?;

        Ok(Self {
            channels,
            sample_rate,
            byte_rate,
            block_align: if channels > 1 { 4 } else { 2 },
            bits_per_sample: 16,
        })
    }
}

/// Generate a 44-byte WAV RIFF header.
///
/// Layout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    file size - 8
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate
/// [32-33]  block_align
/// [34-35]  bits_per_sample
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
pub fn generate_wav_header(layout: &WavLayout, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let chunk_size = 36u32.saturating_add(data_size);

    let mut header = [0u8; WAV_HEADER_SIZE];

    // RIFF chunk descriptor
    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    // fmt sub-chunk
    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&layout.channels.to_le_bytes());
    header[24..28].copy_from_slice(&layout.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&layout.byte_rate.to_le_bytes());
    header[32..34].copy_from_slice(&layout.block_align.to_le_bytes());
    header[34..36].copy_from_slice(&layout.bits_per_sample.to_le_bytes());

    // data sub-chunk
    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Chunk-size and data-size fields for a file of `file_len` bytes.
pub fn size_fields(file_len: u64) -> Result<(u32, u32), CaptureError> {
    if file_len < WAV_HEADER_SIZE as u64 {
        return Err(CaptureError::StorageError(format!(
            "wav file is {} bytes, shorter than its header",
            file_len
        )));
    }
    let to_u32 = |value: u64| {
        u32::try_from(value)
            .map_err(|_| CaptureError::StorageError("wav file exceeds 4 GiB".into()))
    };
    Ok((to_u32(file_len - 8)?, to_u32(file_len - WAV_HEADER_SIZE as u64)?))
}

/// Read the (chunk size, data size) pair back out of a header.
pub fn read_sizes(header: &[u8]) -> (u32, u32) {
    let chunk = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    let data = u32::from_le_bytes([header[40], header[41], header[42], header[43]]);
    (chunk, data)
}
