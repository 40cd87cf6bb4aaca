use rtmpprims_amf::AmfError;
use rtmpprims_chunk::{ChunkError, MessageType};

/// Errors that can occur while decoding or encoding commands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// A value in the body could not be decoded or encoded.
    #[error("malformed value: {0}")]
    MalformedValue(#[from] AmfError),

    /// The value sequence does not start with a command name.
    #[error("invalid command frame: {0}")]
    InvalidCommandFrame(&'static str),

    /// The message is not a command message.
    #[error("message type {0} does not carry a command")]
    UnexpectedMessageType(MessageType),

    /// Chunk-level error while framing or writing.
    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),
}

pub type Result<T> = std::result::Result<T, CommandError>;
