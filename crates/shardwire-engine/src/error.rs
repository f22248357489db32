/// Errors that can occur in engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A decoder is already registered for the opcode.
    #[error("decoder already registered for opcode {0:#04x}")]
    DuplicateDecoder(u8),

    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] shardwire_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] shardwire_frame::FrameError),

    /// World graph error.
    #[error("world error: {0}")]
    World(#[from] shardwire_world::WorldError),

    /// Layout decoding error.
    #[error("layout error: {0}")]
    Gump(#[from] shardwire_gump::GumpError),

    /// Invalid configuration.
    #[error("invalid config: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
