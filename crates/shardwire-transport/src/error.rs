/// Errors that can occur while moving bytes into a ring buffer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The ring buffer cannot accept the chunk without overwriting unread bytes.
    #[error("ring buffer full ({needed} bytes needed, {available} available)")]
    BufferFull { needed: usize, available: usize },

    /// An I/O error occurred on the source stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The pump gave up waiting for the consumer to make room.
    #[error("ring buffer stayed full for {0:?}")]
    Stalled(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, TransportError>;
