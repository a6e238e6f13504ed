use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::processing::wav_format::{self, WavLayout, CHUNK_SIZE_OFFSET, DATA_SIZE_OFFSET};
use crate::traits::sink_destination::SinkDestination;

/// Streaming WAV file writer.
///
/// ## File Format
///
/// ```text
/// [44-byte WAV header]
/// [raw PCM data...]
/// ```
///
/// The header is only written when this writer created the file (it did
/// not exist, was empty, or was removed because overwrite was requested).
/// After every payload write the RIFF chunk size and data size are patched
/// from the current file length, so the file is valid at every period
/// boundary. A pre-existing file opened without overwrite is only appended
/// to; its header is never touched.
pub struct WavFileWriter {
    file_path: PathBuf,
    file: File,
    newly_created: bool,
    payload_bytes: u64,
}

impl WavFileWriter {
    /// Open (or create) `file_path` and write the initial header if the file
    /// is new.
    pub fn open(file_path: PathBuf, layout: &WavLayout, overwrite: bool) -> Result<Self, CaptureError> {
        let existing_len = fs::metadata(&file_path).map(|m| m.len()).ok();

        if existing_len.is_some() && overwrite {
            fs::remove_file(&file_path).map_err(|e| {
                CaptureError::StorageError(format!(
                    "cannot remove existing {}: {}",
                    file_path.display(),
                    e
                ))
            })?;
        }
        let newly_created = overwrite || existing_len.unwrap_or(0) == 0;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(&file_path)
            .map_err(|e| {
                CaptureError::StorageError(format!("failed to open {}: {}", file_path.display(), e))
            })?;

        if newly_created {
            let header = wav_format::generate_wav_header(layout, 0);
            file.write_all(&header)
                .map_err(|e| CaptureError::StorageError(format!("failed creating wav header: {}", e)))?;
            log::debug!(
                "Created {} ({} ch, {} Hz)",
                file_path.display(),
                layout.channels,
                layout.sample_rate
            );
        } else {
            log::info!(
                "Appending to existing {}; header left untouched",
                file_path.display()
            );
        }

        Ok(Self {
            file_path,
            file,
            newly_created,
            payload_bytes: 0,
        })
    }

    /// Whether this writer created the file and therefore owns its header.
    pub fn is_newly_created(&self) -> bool {
        self.newly_created
    }

    /// Path of the output file.
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    fn storage_err(&self, what: &str, e: std::io::Error) -> CaptureError {
        CaptureError::StorageError(format!("{} {}: {}", what, self.file_path.display(), e))
    }

    /// Rewrite the chunk and data size fields from the current file length.
    fn patch_header(&mut self) -> Result<(), CaptureError> {
        let file_len = self
            .file
            .seek(SeekFrom::End(0))
            .map_err(|e| self.storage_err("failed to size", e))?;
        let (chunk_size, data_size) = wav_format::size_fields(file_len)?;

        self.file
            .seek(SeekFrom::Start(CHUNK_SIZE_OFFSET))
            .and_then(|_| self.file.write_all(&chunk_size.to_le_bytes()))
            .map_err(|e| self.storage_err("failed patching chunk size in", e))?;
        self.file
            .seek(SeekFrom::Start(DATA_SIZE_OFFSET))
            .and_then(|_| self.file.write_all(&data_size.to_le_bytes()))
            .map_err(|e| self.storage_err("failed patching data size in", e))?;
        Ok(())
    }
}

impl SinkDestination for WavFileWriter {
    fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        if data.is_empty() {
            return Ok(());
        }

        self.file
            .seek(SeekFrom::End(0))
            .and_then(|_| self.file.write_all(data))
            .map_err(|e| self.storage_err("failed to write", e))?;
        self.payload_bytes += data.len() as u64;

        if self.newly_created {
            self.patch_header()?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("wav:{}", self.file_path.display())
    }

    fn bytes_written(&self) -> u64 {
        self.payload_bytes
    }
}
