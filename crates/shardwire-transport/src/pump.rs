use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use crate::error::{Result, TransportError};
use crate::ring::RingBuffer;

const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Configuration for moving bytes from a stream into a [`RingBuffer`].
#[derive(Debug, Clone)]
pub struct PumpConfig {
    /// Bytes read from the source per call. Clamped to the ring capacity.
    pub chunk_size: usize,
    /// Sleep between retries while the ring is full.
    pub full_backoff: Duration,
    /// Give up after the ring stays full this long. `None` waits forever.
    pub max_stall: Option<Duration>,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            full_backoff: Duration::from_millis(1),
            max_stall: None,
        }
    }
}

impl PumpConfig {
    fn effective_chunk(&self, ring: &RingBuffer) -> usize {
        self.chunk_size.clamp(1, ring.capacity())
    }
}

/// Copy `source` into `ring` until EOF (blocking).
///
/// Returns the number of bytes moved. Interrupted reads are retried; while
/// the ring is full the pump sleeps and retries instead of dropping data.
pub fn pump<R: Read>(mut source: R, ring: &RingBuffer, config: &PumpConfig) -> Result<u64> {
    let mut chunk = vec![0u8; config.effective_chunk(ring)];
    let mut total = 0u64;

    loop {
        let read = match source.read(&mut chunk) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        };

        if read == 0 {
            tracing::debug!(total, "pump reached end of stream");
            return Ok(total);
        }

        append_blocking(ring, &chunk[..read], config)?;
        total += read as u64;
    }
}

fn append_blocking(ring: &RingBuffer, data: &[u8], config: &PumpConfig) -> Result<()> {
    let started = Instant::now();
    loop {
        match ring.append(data) {
            Ok(()) => return Ok(()),
            Err(TransportError::BufferFull { needed, available }) => {
                if let Some(limit) = config.max_stall {
                    if started.elapsed() >= limit {
                        return Err(TransportError::Stalled(limit));
                    }
                }
                tracing::trace!(needed, available, "ring full, waiting for consumer");
                std::thread::sleep(config.full_backoff);
            }
            Err(other) => return Err(other),
        }
    }
}

/// Async variant of [`pump`] for tokio readers.
#[cfg(feature = "async")]
pub async fn pump_async<R>(mut source: R, ring: &RingBuffer, config: &PumpConfig) -> Result<u64>
where
    R: tokio::io::AsyncRead + Unpin,
{
    use tokio::io::AsyncReadExt;

    let mut chunk = vec![0u8; config.effective_chunk(ring)];
    let mut total = 0u64;

    loop {
        let read = match source.read(&mut chunk).await {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(TransportError::Io(err)),
        };

        if read == 0 {
            tracing::debug!(total, "async pump reached end of stream");
            return Ok(total);
        }

        let started = Instant::now();
        loop {
            match ring.append(&chunk[..read]) {
                Ok(()) => break,
                Err(TransportError::BufferFull { .. }) => {
                    if let Some(limit) = config.max_stall {
                        if started.elapsed() >= limit {
                            return Err(TransportError::Stalled(limit));
                        }
                    }
                    tokio::time::sleep(config.full_backoff).await;
                }
                Err(other) => return Err(other),
            }
        }
        total += read as u64;
    }
}
