use bytes::{BufMut, BytesMut};

use crate::channel;
use crate::error::{ChunkError, Result};
use crate::message::MessageType;

/// Timestamp field value signalling that a 4-byte extended timestamp follows.
pub const EXTENDED_TIMESTAMP: u32 = 0xFF_FFFF;

/// Largest body length a 3-byte length field can declare.
pub const MAX_MESSAGE_LEN: u32 = 0xFF_FFFF;

/// Chunk header format (the 2-bit `fmt` field of the basic header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChunkType {
    /// Type 0: absolute timestamp, length, type and message stream id.
    Full,
    /// Type 1: timestamp delta, length and type; stream id reused.
    RelativeLarge,
    /// Type 2: timestamp delta only.
    RelativeTimestampOnly,
    /// Type 3: no message header; everything reused.
    RelativeSingleByte,
}

impl ChunkType {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ChunkType::Full,
            1 => ChunkType::RelativeLarge,
            2 => ChunkType::RelativeTimestampOnly,
            _ => ChunkType::RelativeSingleByte,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            ChunkType::Full => 0,
            ChunkType::RelativeLarge => 1,
            ChunkType::RelativeTimestampOnly => 2,
            ChunkType::RelativeSingleByte => 3,
        }
    }

    /// Size of the message header that follows the basic header.
    pub fn message_header_len(self) -> usize {
        match self {
            ChunkType::Full => 11,
            ChunkType::RelativeLarge => 7,
            ChunkType::RelativeTimestampOnly => 3,
            ChunkType::RelativeSingleByte => 0,
        }
    }
}

/// Header form chosen for an outgoing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderForm {
    /// Every header field explicit (type 0).
    Full,
    /// Stream id omitted and timestamp sent as a delta (type 1).
    Compressed,
}

impl HeaderForm {
    pub fn chunk_type(self) -> ChunkType {
        match self {
            HeaderForm::Full => ChunkType::Full,
            HeaderForm::Compressed => ChunkType::RelativeLarge,
        }
    }
}

/// A fully resolved message header, independent of how it was compressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    /// Chunk stream the message travels on.
    pub channel_id: u32,
    /// Absolute timestamp in milliseconds.
    pub timestamp: u32,
    /// Declared body length in bytes.
    pub body_len: u32,
    pub message_type: MessageType,
    pub message_stream_id: u32,
}

/// The header of the first chunk of a message, as written on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub chunk_type: ChunkType,
    pub channel_id: u32,
    /// Absolute timestamp for [`ChunkType::Full`], a delta otherwise.
    pub timestamp: u32,
    pub body_len: u32,
    pub message_type: MessageType,
    /// Only written for [`ChunkType::Full`].
    pub message_stream_id: u32,
}

impl ChunkHeader {
    /// Build the first-chunk header for `header` in the requested form.
    ///
    /// A compressed form needs the previous header on the channel to compute
    /// the timestamp delta, and omits the message stream id, so it is only
    /// built when that previous header carries the same stream id. Otherwise
    /// the full form is used.
    pub fn build(form: HeaderForm, header: &MessageHeader, previous: Option<&MessageHeader>) -> Self {
        match (form, previous) {
            (HeaderForm::Compressed, Some(previous))
                if previous.message_stream_id == header.message_stream_id =>
            {
                Self {
                    chunk_type: ChunkType::RelativeLarge,
                    channel_id: header.channel_id,
                    timestamp: header.timestamp.wrapping_sub(previous.timestamp),
                    body_len: header.body_len,
                    message_type: header.message_type,
                    message_stream_id: header.message_stream_id,
                }
            }
            _ => Self::full(header),
        }
    }

    /// The form this header was actually built in.
    pub fn form(&self) -> HeaderForm {
        match self.chunk_type {
            ChunkType::Full => HeaderForm::Full,
            _ => HeaderForm::Compressed,
        }
    }

    /// The type 0 header for `header`.
    pub fn full(header: &MessageHeader) -> Self {
        Self {
            chunk_type: ChunkType::Full,
            channel_id: header.channel_id,
            timestamp: header.timestamp,
            body_len: header.body_len,
            message_type: header.message_type,
            message_stream_id: header.message_stream_id,
        }
    }

    /// True if the timestamp field overflows into an extended timestamp.
    pub fn uses_extended_timestamp(&self) -> bool {
        self.chunk_type != ChunkType::RelativeSingleByte && self.timestamp >= EXTENDED_TIMESTAMP
    }

    /// Encoded size of this header (basic + message + extended timestamp).
    pub fn wire_len(&self) -> usize {
        let extended = if self.uses_extended_timestamp() { 4 } else { 0 };
        basic_header_len(self.channel_id) + self.chunk_type.message_header_len() + extended
    }

    /// Encode this header into `dst`.
    ///
    /// Wire format (type 0 shown; types 1 and 2 stop after type / timestamp):
    /// ```text
    /// ┌──────────────┬───────────┬───────────┬──────┬──────────────┬──────────────┐
    /// │ Basic header │ Timestamp │ Length    │ Type │ Stream id    │ Ext. time    │
    /// │ (1-3B)       │ (3B BE)   │ (3B BE)   │ (1B) │ (4B LE)      │ (0/4B BE)    │
    /// └──────────────┴───────────┴───────────┴──────┴──────────────┴──────────────┘
    /// ```
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        if self.body_len > MAX_MESSAGE_LEN {
            return Err(ChunkError::MessageTooLarge {
                size: self.body_len as usize,
                max: MAX_MESSAGE_LEN as usize,
            });
        }
        dst.reserve(self.wire_len());
        encode_basic_header(self.chunk_type, self.channel_id, dst)?;

        let extended = self.uses_extended_timestamp();
        if self.chunk_type != ChunkType::RelativeSingleByte {
            put_u24(dst, if extended { EXTENDED_TIMESTAMP } else { self.timestamp });
        }
        if matches!(self.chunk_type, ChunkType::Full | ChunkType::RelativeLarge) {
            put_u24(dst, self.body_len);
            dst.put_u8(self.message_type.as_u8());
        }
        if self.chunk_type == ChunkType::Full {
            dst.put_u32_le(self.message_stream_id);
        }
        if extended {
            dst.put_u32(self.timestamp);
        }
        Ok(())
    }
}

/// Size of the basic header for a channel id.
pub fn basic_header_len(channel_id: u32) -> usize {
    match channel_id {
        0..=63 => 1,
        64..=319 => 2,
        _ => 3,
    }
}

/// Encode a basic header (`fmt` + chunk stream id).
pub fn encode_basic_header(chunk_type: ChunkType, channel_id: u32, dst: &mut BytesMut) -> Result<()> {
    if !channel::is_valid(channel_id) {
        return Err(ChunkError::InvalidChunkStreamId(channel_id));
    }
    let fmt = chunk_type.bits() << 6;
    match channel_id {
        2..=63 => dst.put_u8(fmt | channel_id as u8),
        64..=319 => {
            dst.put_u8(fmt);
            dst.put_u8((channel_id - 64) as u8);
        }
        _ => {
            dst.put_u8(fmt | 1);
            dst.put_u16_le((channel_id - 64) as u16);
        }
    }
    Ok(())
}

/// Parse a basic header from the front of `src` without consuming it.
///
/// Returns `(chunk type, channel id, header length)`, or `None` if `src`
/// does not yet hold the whole basic header.
pub fn parse_basic_header(src: &[u8]) -> Option<(ChunkType, u32, usize)> {
    let first = *src.first()?;
    let chunk_type = ChunkType::from_bits(first >> 6);
    match first & 0x3F {
        0 => {
            let id = *src.get(1)?;
            Some((chunk_type, u32::from(id) + 64, 2))
        }
        1 => {
            let low = *src.get(1)?;
            let high = *src.get(2)?;
            let id = u32::from(u16::from_le_bytes([low, high])) + 64;
            Some((chunk_type, id, 3))
        }
        id => Some((chunk_type, u32::from(id), 1)),
    }
}

pub(crate) fn put_u24(dst: &mut BytesMut, value: u32) {
    dst.put_uint(u64::from(value & 0xFF_FFFF), 3);
}

pub(crate) fn read_u24(src: &[u8]) -> u32 {
    (u32::from(src[0]) << 16) | (u32::from(src[1]) << 8) | u32::from(src[2])
}
