use std::io::{self, Write};

use crate::models::error::CaptureError;
use crate::traits::sink_destination::SinkDestination;

/// Live stream destination, standard output unless told otherwise.
pub struct StreamWriter {
    label: String,
    inner: Box<dyn Write + Send>,
    bytes_written: u64,
}

impl StreamWriter {
    pub fn new(label: impl Into<String>, inner: Box<dyn Write + Send>) -> Self {
        Self {
            label: label.into(),
            inner,
            bytes_written: 0,
        }
    }

    pub fn stdout() -> Self {
        Self::new("stdout", Box::new(io::stdout()))
    }
}

impl SinkDestination for StreamWriter {
    fn write(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        self.inner
            .write_all(data)
            .and_then(|_| self.inner.flush())
            .map_err(|e| CaptureError::StorageError(format!("write to {} failed: {}", self.label, e)))?;
        self.bytes_written += data.len() as u64;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("stream:{}", self.label)
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::mocks::{SharedBuffer, TrickleWriter};

    #[test]
    fn forwards_bytes() {
        let buffer = SharedBuffer::default();
        let mut writer = StreamWriter::new("test", Box::new(buffer.clone()));

        writer.write(&[1, 2, 3]).unwrap();
        writer.write(&[4]).unwrap();

        assert_eq!(buffer.contents(), vec![1, 2, 3, 4]);
        assert_eq!(writer.bytes_written(), 4);
    }

    #[test]
    fn short_writes_are_retried() {
        let mut writer = StreamWriter::new(
            "trickle",
            Box::new(TrickleWriter {
                accepted: Vec::new(),
                per_call: 3,
                limit: usize::MAX,
            }),
        );
        writer.write(&[0u8; 10]).unwrap();
        assert_eq!(writer.bytes_written(), 10);
    }

    #[test]
    fn write_error_fails_the_call() {
        let mut writer = StreamWriter::new(
            "closed",
            Box::new(TrickleWriter {
                accepted: Vec::new(),
                per_call: 4,
                limit: 6,
            }),
        );
        let err = writer.write(&[0u8; 10]).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
        assert_eq!(writer.bytes_written(), 0);
    }
}
