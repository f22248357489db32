use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{Result, TransportError};

/// Default ring capacity: 256 KiB.
pub const DEFAULT_RING_CAPACITY: usize = 256 * 1024;

/// Fixed-capacity circular byte queue shared between a transport and the tick loop.
///
/// The internal mutex is the only lock in the engine. Producers call
/// [`RingBuffer::append`]; the consumer takes a [`RingGuard`] with
/// [`RingBuffer::lock`] and drains a whole batch while holding it.
/// Capacity never grows: an append that does not fit is rejected whole.
#[derive(Debug)]
pub struct RingBuffer {
    capacity: usize,
    state: Mutex<RingState>,
}

#[derive(Debug)]
struct RingState {
    buf: Box<[u8]>,
    read: u64,
    write: u64,
}

impl RingBuffer {
    /// Create a ring with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RING_CAPACITY)
    }

    /// Create a ring holding at most `capacity` unread bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            state: Mutex::new(RingState {
                buf: vec![0u8; capacity].into_boxed_slice(),
                read: 0,
                write: 0,
            }),
        }
    }

    /// Maximum number of unread bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append a chunk at the write cursor.
    ///
    /// Empty chunks are ignored. Returns [`TransportError::BufferFull`]
    /// without writing anything if the chunk does not fit.
    pub fn append(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let mut state = self.lock_state();
        let available = self.capacity - state.len();
        if data.len() > available {
            return Err(TransportError::BufferFull {
                needed: data.len(),
                available,
            });
        }

        let start = (state.write % self.capacity as u64) as usize;
        let first = data.len().min(self.capacity - start);
        state.buf[start..start + first].copy_from_slice(&data[..first]);
        state.buf[..data.len() - first].copy_from_slice(&data[first..]);
        state.write += data.len() as u64;
        Ok(())
    }

    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.lock_state().len()
    }

    /// True when no unread bytes remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the ring for a batch of peeks and dequeues.
    pub fn lock(&self) -> RingGuard<'_> {
        RingGuard {
            capacity: self.capacity,
            state: self.lock_state(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, RingState> {
        // A panicking producer cannot leave the cursors half-updated.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl RingState {
    fn len(&self) -> usize {
        (self.write - self.read) as usize
    }
}

/// Exclusive view of a locked [`RingBuffer`].
pub struct RingGuard<'a> {
    capacity: usize,
    state: MutexGuard<'a, RingState>,
}

impl RingGuard<'_> {
    /// Number of unread bytes.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// True when no unread bytes remain.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Free space left for producers.
    pub fn available(&self) -> usize {
        self.capacity - self.len()
    }

    /// Byte at `offset` from the read cursor, without consuming it.
    pub fn peek(&self, offset: usize) -> Option<u8> {
        if offset >= self.len() {
            return None;
        }
        let index = ((self.state.read + offset as u64) % self.capacity as u64) as usize;
        Some(self.state.buf[index])
    }

    /// Move up to `dst.len()` bytes out of the ring. Returns the count copied.
    pub fn dequeue_into(&mut self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.len());
        if count == 0 {
            return 0;
        }

        let start = (self.state.read % self.capacity as u64) as usize;
        let first = count.min(self.capacity - start);
        dst[..first].copy_from_slice(&self.state.buf[start..start + first]);
        dst[first..count].copy_from_slice(&self.state.buf[..count - first]);
        self.state.read += count as u64;
        count
    }

    /// Drop up to `count` unread bytes. Returns the count dropped.
    pub fn discard(&mut self, count: usize) -> usize {
        let count = count.min(self.len());
        self.state.read += count as u64;
        count
    }

    /// Drop everything unread.
    pub fn clear(&mut self) {
        self.state.read = self.state.write;
    }

    /// Total bytes ever consumed.
    pub fn read_cursor(&self) -> u64 {
        self.state.read
    }

    /// Total bytes ever appended.
    pub fn write_cursor(&self) -> u64 {
        self.state.write
    }
}
