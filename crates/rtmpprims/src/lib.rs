//! RTMP-style command messages.
//!
//! rtmpprims decodes and encodes the command messages of a chunked,
//! multiplexed streaming protocol, choosing the smallest chunk header each
//! channel's send history allows.
//!
//! # Crate Structure
//!
//! - [`amf`]: AMF0 self-describing values
//! - [`chunk`]: Chunk-stream framing, message headers and per-channel send history
//! - [`command`]: Command decode/encode on top of the two

/// Re-export AMF0 value types.
pub mod amf {
    pub use rtmpprims_amf::*;
}

/// Re-export chunk framing types.
pub mod chunk {
    pub use rtmpprims_chunk::*;
}

/// Re-export command codec types.
pub mod command {
    pub use rtmpprims_command::*;
}

pub use rtmpprims_amf::Value;
pub use rtmpprims_chunk::{ChannelHistory, ChunkConfig, ChunkDecoder, ChunkWriter, MessageType};
pub use rtmpprims_command::{
    encode_command, Command, CommandError, CommandReader, CommandWriter,
};
