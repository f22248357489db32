use shardwire_frame::FrameError;

/// Errors that can occur while decoding a layout message.
#[derive(Debug, thiserror::Error)]
pub enum GumpError {
    /// A length or count field is out of range.
    #[error("malformed layout from {sender:#010x} (gump {gump_id:#x}): {reason}")]
    MalformedLayout {
        sender: u32,
        gump_id: u32,
        reason: String,
    },

    /// A zlib block failed to inflate.
    #[error("failed to inflate layout from {sender:#010x} (gump {gump_id:#x}): {source}")]
    Decompression {
        sender: u32,
        gump_id: u32,
        #[source]
        source: std::io::Error,
    },

    /// A command argument is missing.
    #[error("{command}: missing argument {index}")]
    MissingArgument { command: String, index: usize },

    /// A command argument did not parse.
    #[error("{command}: bad argument {index} ({value:?})")]
    BadArgument {
        command: String,
        index: usize,
        value: String,
    },

    /// Reading the surrounding message failed.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

pub type Result<T> = std::result::Result<T, GumpError>;
