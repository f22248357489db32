/// Default scratch capacity: 64 KiB.
pub const DEFAULT_SCRATCH_CAPACITY: usize = 64 * 1024;

/// Reusable buffer a whole frame is dequeued into before decoding.
///
/// Grows by doubling when a frame does not fit and never shrinks.
#[derive(Debug)]
pub struct ScratchBuffer {
    buf: Vec<u8>,
}

impl ScratchBuffer {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SCRATCH_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity.max(1)],
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Double the buffer until `len` bytes fit. Returns true if it grew.
    pub fn ensure(&mut self, len: usize) -> bool {
        let mut grew = false;
        while len > self.buf.len() {
            let old_size = self.buf.len();
            let new_size = old_size * 2;
            tracing::warn!(
                old_size,
                new_size,
                frame_len = len,
                "scratch buffer resize"
            );
            self.buf.resize(new_size, 0);
            grew = true;
        }
        grew
    }

    /// First `len` bytes, growing first if needed.
    pub fn frame_mut(&mut self, len: usize) -> &mut [u8] {
        self.ensure(len);
        &mut self.buf[..len]
    }

    pub fn frame(&self, len: usize) -> &[u8] {
        &self.buf[..len.min(self.buf.len())]
    }
}

impl Default for ScratchBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_requested_capacity() {
        assert_eq!(ScratchBuffer::new().capacity(), DEFAULT_SCRATCH_CAPACITY);
        assert_eq!(ScratchBuffer::with_capacity(0).capacity(), 1);
    }

    #[test]
    fn doubles_until_frame_fits() {
        let mut scratch = ScratchBuffer::with_capacity(16);
        assert!(!scratch.ensure(16));
        assert!(scratch.ensure(17));
        assert_eq!(scratch.capacity(), 32);
        assert!(scratch.ensure(100));
        assert_eq!(scratch.capacity(), 128);
    }

    #[test]
    fn frame_mut_is_exact_length() {
        let mut scratch = ScratchBuffer::with_capacity(4);
        let frame = scratch.frame_mut(10);
        assert_eq!(frame.len(), 10);
        frame[9] = 7;
        assert_eq!(scratch.frame(10)[9], 7);
    }
}
