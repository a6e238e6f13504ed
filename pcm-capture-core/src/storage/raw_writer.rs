use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::traits::sink_destination::SinkDestination;

/// Headerless PCM file writer.
///
/// Opens in append mode, or truncates when overwrite is requested.
pub struct RawFileWriter {
    file_path: PathBuf,
    file: File,
    bytes_written: u64,
}

impl RawFileWriter {
    pub fn open(file_path: PathBuf, overwrite: bool) -> Result<Self, CaptureError> {
        let mut options = OpenOptions::new();
        options.create(true);
        if overwrite {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }

        let file = options.open(&file_path).map_err(|e| {
            CaptureError::StorageError(format!("failed to open {}: {}", file_path.display(), e))
        })?;

        Ok(Self {
            file_path,
            file,
            bytes_written: 0,
        })
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }
}

impl SinkDestination for RawFileWriter {
    fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        // write_all retries short writes until the payload is flushed
        self.file.write_all(data).map_err(|e| {
            CaptureError::StorageError(format!("failed to write {}: {}", self.file_path.display(), e))
        })?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("raw:{}", self.file_path.display())
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn writes_bytes_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.raw");

        let mut writer = RawFileWriter::open(path.clone(), false).unwrap();
        writer.write(&[1, 2, 3]).unwrap();
        writer.write(&[4, 5]).unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3, 4, 5]);
        assert_eq!(writer.bytes_written(), 5);
    }

    #[test]
    fn appends_to_existing_without_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.raw");
        fs::write(&path, [7, 7]).unwrap();

        let mut writer = RawFileWriter::open(path.clone(), false).unwrap();
        writer.write(&[1]).unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![7, 7, 1]);
    }

    #[test]
    fn truncates_existing_with_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capture.raw");
        fs::write(&path, [7, 7, 7, 7]).unwrap();

        let mut writer = RawFileWriter::open(path.clone(), true).unwrap();
        writer.write(&[1]).unwrap();

        assert_eq!(fs::read(&path).unwrap(), vec![1]);
    }
}
