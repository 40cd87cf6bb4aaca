//! Chunk-stream framing with channel multiplexing for RTMP-style messages.
//!
//! Every message is split into chunks of at most `chunk_size` bytes. Each
//! chunk carries:
//! - A basic header: 2-bit chunk type + chunk stream (channel) id
//! - A message header whose size depends on the chunk type (11, 7, 3 or 0 bytes)
//! - An optional 4-byte extended timestamp
//!
//! Relative chunk types omit fields that are unchanged from the previous
//! message on the same channel. [`ChannelHistory`] decides when the sender
//! may use them; [`ChunkDecoder`] resolves them on the receiving side.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod channel;
pub mod codec;
pub mod error;
pub mod header;
pub mod history;
pub mod message;
pub mod reader;
pub mod writer;

#[cfg(feature = "async")]
pub use async_codec::ChunkCodec;
pub use channel::{
    channel_name, AUDIO, OVER_CONNECTION, OVER_CONNECTION_2, OVER_STREAM, PROTOCOL_CONTROL, VIDEO,
};
pub use codec::{
    encode_message, ChunkConfig, ChunkDecoder, Message, DEFAULT_CHUNK_SIZE, MAX_CHUNK_SIZE,
};
pub use error::{ChunkError, Result};
pub use header::{ChunkHeader, ChunkType, HeaderForm, MessageHeader, MAX_MESSAGE_LEN};
pub use history::{ChannelHistory, HeaderReservation};
pub use message::MessageType;
pub use reader::ChunkReader;
pub use writer::ChunkWriter;
