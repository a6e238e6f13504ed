use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::models::error::CaptureError;

#[derive(Debug)]
struct RingState {
    storage: Vec<u8>,
    cursor: usize,
    len: usize,
}

/// Thread-safe fixed-capacity circular byte buffer.
///
/// Holds the most recent `capacity` bytes appended to it. Overflow
/// behavior: the oldest bytes are overwritten. All methods take the same
/// internal lock, so readers see the buffer either before or after an
/// append, never in between.
#[derive(Debug)]
pub struct RingBuffer {
    state: Mutex<RingState>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Result<Self, CaptureError> {
        if capacity == 0 {
            return Err(CaptureError::ConfigurationFailed(
                "ring buffer capacity must be positive".into(),
            ));
        }
        let mut storage = Vec::new();
        storage.try_reserve_exact(capacity).map_err(|e| {
            CaptureError::ConfigurationFailed(format!(
                "could not allocate {} byte ring buffer: {}",
                capacity, e
            ))
        })?;
        storage.resize(capacity, 0);

        Ok(Self {
            state: Mutex::new(RingState {
                storage,
                cursor: 0,
                len: 0,
            }),
            capacity,
        })
    }

    /// Append bytes at the write cursor.
    ///
    /// If `data` is at least `capacity` long, only its last `capacity`
    /// bytes are kept and the cursor returns to 0.
    pub fn append(&self, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        let mut state = self.state.lock();
        let capacity = self.capacity;

        if data.len() >= capacity {
            state
                .storage
                .copy_from_slice(&data[data.len() - capacity..]);
            state.cursor = 0;
            state.len = capacity;
            return;
        }

        let cursor = state.cursor;
        let tail_room = capacity - cursor;
        if data.len() <= tail_room {
            state.storage[cursor..cursor + data.len()].copy_from_slice(data);
        } else {
            // Rollover: fill to the end, continue at offset 0
            let (head, rest) = data.split_at(tail_room);
            state.storage[cursor..].copy_from_slice(head);
            state.storage[..rest.len()].copy_from_slice(rest);
        }

        state.cursor = (cursor + data.len()) % capacity;
        state.len = (state.len + data.len()).min(capacity);
    }

    /// Locked view of the whole backing storage, in storage order.
    ///
    /// This is not a snapshot: hold it briefly, appends block until it is
    /// dropped. Bytes past `len()` are not yet valid when the buffer is not
    /// full.
    pub fn get(&self) -> MappedMutexGuard<'_, [u8]> {
        MutexGuard::map(self.state.lock(), |state| state.storage.as_mut_slice())
    }

    /// Copy of the valid bytes, oldest first.
    pub fn snapshot(&self) -> Vec<u8> {
        let state = self.state.lock();
        if state.len < self.capacity {
            return state.storage[..state.len].to_vec();
        }
        let mut out = Vec::with_capacity(self.capacity);
        out.extend_from_slice(&state.storage[state.cursor..]);
        out.extend_from_slice(&state.storage[..state.cursor]);
        out
    }

    /// Whether the buffer holds `capacity` valid bytes.
    pub fn full(&self) -> bool {
        self.state.lock().len == self.capacity
    }

    /// Number of valid bytes.
    pub fn len(&self) -> usize {
        self.state.lock().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset the next append starts at.
    pub fn cursor(&self) -> usize {
        self.state.lock().cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reset to empty. Storage contents are left in place.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.cursor = 0;
        state.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn zero_capacity_rejected() {
        assert!(RingBuffer::new(0).is_err());
    }

    #[test]
    fn appends_land_at_written_offsets() {
        let buf = RingBuffer::new(8).unwrap();
        buf.append(&[1, 2, 3]);
        buf.append(&[4, 5]);

        assert_eq!(buf.len(), 5);
        assert_eq!(buf.cursor(), 5);
        assert!(!buf.full());
        assert_eq!(&buf.get()[..5], &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn full_exactly_at_capacity() {
        let buf = RingBuffer::new(6).unwrap();
        buf.append(&[1, 2, 3]);
        assert!(!buf.full());
        buf.append(&[4, 5]);
        assert!(!buf.full());
        buf.append(&[6]);
        assert!(buf.full());
        assert_eq!(buf.cursor(), 0);
        assert_eq!(&*buf.get(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn rollover_evicts_oldest() {
        let buf = RingBuffer::new(4).unwrap();
        buf.append(&[1, 2, 3, 4]);
        buf.append(&[5, 6]);

        assert!(buf.full());
        assert_eq!(buf.cursor(), 2);
        assert_eq!(&*buf.get(), &[5, 6, 3, 4]);
        assert_eq!(buf.snapshot(), vec![3, 4, 5, 6]);
    }

    #[test]
    fn rollover_from_partial_fill() {
        let buf = RingBuffer::new(5).unwrap();
        buf.append(&[1, 2, 3]);
        buf.append(&[4, 5, 6, 7]); // crosses the end

        assert!(buf.full());
        assert_eq!(buf.cursor(), 2);
        assert_eq!(&*buf.get(), &[6, 7, 3, 4, 5]);
        assert_eq!(buf.snapshot(), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn oversized_append_keeps_tail() {
        let buf = RingBuffer::new(3).unwrap();
        buf.append(&[9]);
        buf.append(&[1, 2, 3, 4, 5]);

        assert!(buf.full());
        assert_eq!(buf.cursor(), 0);
        assert_eq!(&*buf.get(), &[3, 4, 5]);
    }

    #[test]
    fn append_of_exact_capacity_resets_cursor() {
        let buf = RingBuffer::new(3).unwrap();
        buf.append(&[7]);
        buf.append(&[1, 2, 3]);
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.snapshot(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_append_is_noop() {
        let buf = RingBuffer::new(4).unwrap();
        buf.append(&[]);
        assert!(buf.is_empty());
        assert!(buf.snapshot().is_empty());
    }

    #[test]
    fn reset_clears_size() {
        let buf = RingBuffer::new(4).unwrap();
        buf.append(&[1, 2, 3, 4, 5]);
        buf.reset();
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn concurrent_readers_never_see_torn_appends() {
        // Every append writes a run of one repeated byte the size of the
        // buffer, so any consistent view is uniform.
        let buf = Arc::new(RingBuffer::new(64).unwrap());
        let writer = {
            let buf = Arc::clone(&buf);
            thread::spawn(move || {
                for i in 0..500u32 {
                    buf.append(&[(i % 251) as u8; 64]);
                }
            })
        };

        for _ in 0..500 {
            let view = buf.get();
            let first = view[0];
            assert!(view.iter().all(|&b| b == first));
        }
        writer.join().unwrap();
    }
}
