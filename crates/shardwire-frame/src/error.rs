/// Errors that can occur while framing or reading packets.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The first byte is not an opcode the length table knows.
    #[error("unknown opcode {0:#04x}")]
    UnknownOpcode(u8),

    /// A variable-length frame declared a length shorter than its own header.
    #[error("malformed frame {opcode:#04x}: declared length {declared}")]
    MalformedFrame { opcode: u8, declared: usize },

    /// A field read ran past the frame boundary.
    #[error("truncated frame ({needed} bytes needed, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// An outbound packet does not fit the 16-bit length field.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// A client version string could not be parsed.
    #[error("invalid client version: {0:?}")]
    InvalidVersion(String),

    /// An I/O error occurred while reading frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
