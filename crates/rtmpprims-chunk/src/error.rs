use crate::header::ChunkType;

/// Errors that can occur during chunk encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The chunk stream id cannot be expressed in a basic header.
    #[error("invalid chunk stream id {0} (expected 2..=65599)")]
    InvalidChunkStreamId(u32),

    /// A relative chunk header arrived on a channel with no prior header.
    #[error("{chunk_type:?} chunk on channel {channel_id} without a previous header")]
    NoPreviousHeader {
        channel_id: u32,
        chunk_type: ChunkType,
    },

    /// The message body exceeds the configured or wire maximum.
    #[error("message too large ({size} bytes, max {max})")]
    MessageTooLarge { size: usize, max: usize },

    /// The header's declared body length does not match the body supplied.
    #[error("header declares {declared} body bytes but {actual} were supplied")]
    BodyLengthMismatch { declared: u32, actual: usize },

    /// A chunk size outside 1..=0x7FFFFFFF was requested or received.
    #[error("invalid chunk size {0}")]
    InvalidChunkSize(usize),

    /// An I/O error occurred while reading or writing chunks.
    #[error("chunk I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, ChunkError>;
