use std::collections::HashMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::{debug, warn};

use crate::error::{ChunkError, Result};
use crate::header::{
    encode_basic_header, parse_basic_header, read_u24, ChunkHeader, ChunkType, MessageHeader,
    EXTENDED_TIMESTAMP, MAX_MESSAGE_LEN,
};
use crate::message::MessageType;

/// Chunk size every connection starts with.
pub const DEFAULT_CHUNK_SIZE: usize = 128;

/// Largest chunk size a set-chunk-size message can announce.
pub const MAX_CHUNK_SIZE: usize = 0x7FFF_FFFF;

/// A complete, reassembled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: MessageHeader,
    pub body: Bytes,
}

impl Message {
    pub fn new(header: MessageHeader, body: impl Into<Bytes>) -> Self {
        Self {
            header,
            body: body.into(),
        }
    }
}

/// Configuration for the chunk codec.
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Maximum chunk payload size in bytes. Default: 128.
    pub chunk_size: usize,
    /// Maximum accepted message body in bytes. Default: 16 MiB - 1.
    pub max_message_size: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            max_message_size: MAX_MESSAGE_LEN as usize,
        }
    }
}

pub(crate) fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size > MAX_CHUNK_SIZE {
        return Err(ChunkError::InvalidChunkSize(chunk_size));
    }
    Ok(())
}

/// Encode a message as a sequence of chunks.
///
/// The first chunk carries `header`; the body is split into pieces of at
/// most `chunk_size` bytes, each continuation prefixed with a type 3 basic
/// header (plus the extended timestamp again, if the first header used one).
pub fn encode_message(
    header: &ChunkHeader,
    body: &[u8],
    chunk_size: usize,
    dst: &mut BytesMut,
) -> Result<()> {
    validate_chunk_size(chunk_size)?;
    if body.len() != header.body_len as usize {
        return Err(ChunkError::BodyLengthMismatch {
            declared: header.body_len,
            actual: body.len(),
        });
    }

    let continuations = body.len().saturating_sub(1) / chunk_size;
    dst.reserve(header.wire_len() + body.len() + continuations * 7);
    header.encode(dst)?;

    let mut pieces = body.chunks(chunk_size);
    if let Some(first) = pieces.next() {
        dst.put_slice(first);
    }
    for piece in pieces {
        encode_basic_header(ChunkType::RelativeSingleByte, header.channel_id, dst)?;
        if header.uses_extended_timestamp() {
            dst.put_u32(header.timestamp);
        }
        dst.put_slice(piece);
    }
    Ok(())
}

/// Receive-side state for one channel.
#[derive(Debug)]
struct RxChannel {
    header: MessageHeader,
    /// Timestamp delta applied when a type 3 chunk starts a new message.
    delta: u32,
    extended: bool,
    /// Body bytes received so far for the message in progress.
    body: BytesMut,
}

/// Snapshot of the previous header on a channel, copied out before any
/// state is mutated.
#[derive(Debug, Clone, Copy)]
struct Previous {
    header: MessageHeader,
    delta: u32,
    extended: bool,
    received: usize,
}

enum Step {
    Incomplete,
    Partial,
    Complete(Message),
}

/// Stateful decoder that resolves relative headers and reassembles
/// interleaved chunks into messages.
#[derive(Debug)]
pub struct ChunkDecoder {
    channels: HashMap<u32, RxChannel>,
    config: ChunkConfig,
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::with_config(ChunkConfig::default())
    }

    pub fn with_config(config: ChunkConfig) -> Self {
        Self {
            channels: HashMap::new(),
            config,
        }
    }

    /// Decode the next complete message from `src`.
    ///
    /// Returns `Ok(None)` if `src` doesn't contain enough bytes yet. Whole
    /// chunks are consumed as they arrive; a chunk that is only partially
    /// buffered is left in `src` untouched.
    pub fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        loop {
            match self.decode_chunk(src)? {
                Step::Incomplete => return Ok(None),
                Step::Partial => continue,
                Step::Complete(message) => return Ok(Some(message)),
            }
        }
    }

    /// Current inbound chunk size.
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    /// Change the inbound chunk size (normally driven by the peer's
    /// set-chunk-size message, which the decoder applies itself).
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<()> {
        validate_chunk_size(chunk_size)?;
        self.config.chunk_size = chunk_size;
        Ok(())
    }

    pub fn set_max_message_size(&mut self, max_message_size: usize) {
        self.config.max_message_size = max_message_size;
    }

    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }

    /// True while any channel holds body bytes of a message that has not
    /// been completed yet.
    pub fn has_partial(&self) -> bool {
        self.channels.values().any(|state| !state.body.is_empty())
    }

    /// Header of the last message started on `channel_id`.
    pub fn last_header(&self, channel_id: u32) -> Option<&MessageHeader> {
        self.channels.get(&channel_id).map(|state| &state.header)
    }

    fn decode_chunk(&mut self, src: &mut BytesMut) -> Result<Step> {
        let Some((chunk_type, channel_id, basic_len)) = parse_basic_header(src) else {
            return Ok(Step::Incomplete);
        };
        let fields_end = basic_len + chunk_type.message_header_len();
        if src.len() < fields_end {
            return Ok(Step::Incomplete);
        }

        let previous = self.channels.get(&channel_id).map(|state| Previous {
            header: state.header,
            delta: state.delta,
            extended: state.extended,
            received: state.body.len(),
        });
        let require_previous = || {
            previous.ok_or(ChunkError::NoPreviousHeader {
                channel_id,
                chunk_type,
            })
        };

        let fields = &src[basic_len..fields_end];
        let extended = match chunk_type {
            ChunkType::RelativeSingleByte => require_previous()?.extended,
            _ => read_u24(&fields[0..3]) == EXTENDED_TIMESTAMP,
        };
        let header_len = fields_end + if extended { 4 } else { 0 };
        if src.len() < header_len {
            return Ok(Step::Incomplete);
        }
        let timestamp = if extended {
            u32::from_be_bytes([
                src[fields_end],
                src[fields_end + 1],
                src[fields_end + 2],
                src[fields_end + 3],
            ])
        } else if chunk_type == ChunkType::RelativeSingleByte {
            0
        } else {
            read_u24(&fields[0..3])
        };

        let (header, delta, continuation) = match chunk_type {
            ChunkType::Full => {
                let header = MessageHeader {
                    channel_id,
                    timestamp,
                    body_len: read_u24(&fields[3..6]),
                    message_type: MessageType::from(fields[6]),
                    message_stream_id: u32::from_le_bytes([
                        fields[7], fields[8], fields[9], fields[10],
                    ]),
                };
                (header, timestamp, false)
            }
            ChunkType::RelativeLarge => {
                let previous = require_previous()?;
                let header = MessageHeader {
                    channel_id,
                    timestamp: previous.header.timestamp.wrapping_add(timestamp),
                    body_len: read_u24(&fields[3..6]),
                    message_type: MessageType::from(fields[6]),
                    message_stream_id: previous.header.message_stream_id,
                };
                (header, timestamp, false)
            }
            ChunkType::RelativeTimestampOnly => {
                let previous = require_previous()?;
                let header = MessageHeader {
                    timestamp: previous.header.timestamp.wrapping_add(timestamp),
                    ..previous.header
                };
                (header, timestamp, false)
            }
            ChunkType::RelativeSingleByte => {
                let previous = require_previous()?;
                if previous.received > 0 {
                    (previous.header, previous.delta, true)
                } else {
                    let header = MessageHeader {
                        timestamp: previous.header.timestamp.wrapping_add(previous.delta),
                        ..previous.header
                    };
                    (header, previous.delta, false)
                }
            }
        };

        let body_len = header.body_len as usize;
        if body_len > self.config.max_message_size {
            return Err(ChunkError::MessageTooLarge {
                size: body_len,
                max: self.config.max_message_size,
            });
        }

        let received = if continuation {
            previous.map_or(0, |previous| previous.received)
        } else {
            0
        };
        let payload_len = (body_len - received).min(self.config.chunk_size);
        if src.len() < header_len + payload_len {
            return Ok(Step::Incomplete);
        }

        // The whole chunk is buffered: commit.
        src.advance(header_len);
        let payload = src.split_to(payload_len);

        let state = self.channels.entry(channel_id).or_insert_with(|| RxChannel {
            header,
            delta,
            extended,
            body: BytesMut::new(),
        });
        if !continuation {
            if !state.body.is_empty() {
                warn!(
                    channel_id,
                    discarded = state.body.len(),
                    "new message header interrupted an incomplete message"
                );
                state.body.clear();
            }
            state.header = header;
            state.delta = delta;
            state.extended = extended;
            state.body.reserve(body_len);
        }
        state.body.extend_from_slice(&payload);

        if state.body.len() < body_len {
            return Ok(Step::Partial);
        }

        let message = Message {
            header: state.header,
            body: state.body.split().freeze(),
        };
        self.apply_protocol_control(&message)?;
        Ok(Step::Complete(message))
    }

    fn apply_protocol_control(&mut self, message: &Message) -> Result<()> {
        if message.body.len() < 4 {
            return Ok(());
        }
        let value = u32::from_be_bytes([
            message.body[0],
            message.body[1],
            message.body[2],
            message.body[3],
        ]);
        match message.header.message_type {
            MessageType::SetChunkSize => {
                let chunk_size = (value & 0x7FFF_FFFF) as usize;
                self.set_chunk_size(chunk_size)?;
                debug!(chunk_size, "peer changed chunk size");
            }
            MessageType::Abort => {
                if let Some(state) = self.channels.get_mut(&value) {
                    debug!(
                        channel_id = value,
                        discarded = state.body.len(),
                        "peer aborted message"
                    );
                    state.body.clear();
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HeaderForm;

    fn header(channel_id: u32, timestamp: u32, body_len: usize) -> MessageHeader {
        MessageHeader {
            channel_id,
            timestamp,
            body_len: body_len as u32,
            message_type: MessageType::CommandAmf0,
            message_stream_id: 0,
        }
    }

    fn encode_full(channel_id: u32, timestamp: u32, body: &[u8], chunk_size: usize) -> BytesMut {
        let mut dst = BytesMut::new();
        let head = ChunkHeader::full(&header(channel_id, timestamp, body.len()));
        encode_message(&head, body, chunk_size, &mut dst).unwrap();
        dst
    }

    #[test]
    fn single_chunk_roundtrip() {
        let mut buf = encode_full(3, 10, b"hello", 128);
        assert_eq!(buf.len(), 12 + 5);

        let mut decoder = ChunkDecoder::new();
        let message = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.header, header(3, 10, 5));
        assert_eq!(message.body.as_ref(), b"hello");
        assert!(buf.is_empty());
    }

    #[test]
    fn body_split_into_type3_continuations() {
        let body: Vec<u8> = (0..300u16).map(|i| i as u8).collect();
        let buf = encode_full(3, 0, &body, 128);
        // 12-byte header + 300 body bytes + two 1-byte continuation headers.
        assert_eq!(buf.len(), 12 + 300 + 2);
        assert_eq!(buf[12 + 128], 0xC3);
        assert_eq!(buf[12 + 128 + 1 + 128], 0xC3);

        let mut buf = buf;
        let mut decoder = ChunkDecoder::new();
        let message = decoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(message.body.as_ref(), body.as_slice());
    }

    #[test]
    fn incomplete_input_does_not_consume() {
        let full = encode_full(3, 0, &[7u8; 200], 128);
        let mut decoder = ChunkDecoder::new();

        let mut partial = BytesMut::from(&full[..50]);
        assert!(decoder.decode(&mut partial).unwrap().is_none());
        assert_eq!(partial.len(), 50);

        // First chunk complete, second chunk not yet.
        let mut partial = BytesMut::from(&full[..12 + 128 + 10]);
        assert!(decoder.decode(&mut partial).unwrap().is_none());
        assert_eq!(partial.len(), 10);

        assert!(decoder.has_partial());

        partial.extend_from_slice(&full[12 + 128 + 10..]);
        let message = decoder.decode(&mut partial).unwrap().unwrap();
        assert_eq!(message.body.len(), 200);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn interleaved_channels_reassemble() {
        let a = encode_full(3, 0, &[0xAA; 200], 128);
        let b = encode_full(5, 0, &[0xBB; 10], 128);

        // a's first chunk, then all of b, then a's continuation.
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&a[..12 + 128]);
        wire.extend_from_slice(&b);
        wire.extend_from_slice(&a[12 + 128..]);

        let mut decoder = ChunkDecoder::new();
        let first = decoder.decode(&mut wire).unwrap().unwrap();
        assert_eq!(first.header.channel_id, 5);
        assert_eq!(first.body.as_ref(), &[0xBB; 10]);

        let second = decoder.decode(&mut wire).unwrap().unwrap();
        assert_eq!(second.header.channel_id, 3);
        assert_eq!(second.body.as_ref(), &[0xAA; 200][..]);
        assert!(wire.is_empty());
    }

    #[test]
    fn relative_headers_resolve_against_previous() {
        let first = header(3, 1000, 2);
        let second = header(3, 1030, 3);
        let mut wire = BytesMut::new();
        encode_message(&ChunkHeader::full(&first), b"ab", 128, &mut wire).unwrap();
        let relative = ChunkHeader::build(HeaderForm::Compressed, &second, Some(&first));
        encode_message(&relative, b"cde", 128, &mut wire).unwrap();
        // Type 2 header: delta only, reuses length 3.
        wire.extend_from_slice(&[0x83, 0x00, 0x00, 0x05]);
        wire.extend_from_slice(b"fgh");
        // Type 3 header starting a new message: reuses delta 5.
        wire.extend_from_slice(&[0xC3]);
        wire.extend_from_slice(b"ijk");

        let mut decoder = ChunkDecoder::new();
        let timestamps: Vec<u32> = std::iter::from_fn(|| decoder.decode(&mut wire).unwrap())
            .map(|message| message.header.timestamp)
            .collect();
        assert_eq!(timestamps, vec![1000, 1030, 1035, 1040]);
    }

    #[test]
    fn relative_header_without_previous_fails() {
        let mut wire = BytesMut::from(&[0x43, 0, 0, 0, 0, 0, 1, 20, 0x00][..]);
        let err = ChunkDecoder::new().decode(&mut wire).unwrap_err();
        assert!(matches!(
            err,
            ChunkError::NoPreviousHeader {
                channel_id: 3,
                chunk_type: ChunkType::RelativeLarge
            }
        ));
    }

    #[test]
    fn extended_timestamp_roundtrip_across_chunks() {
        let mut wire = encode_full(3, 0x0123_4567, &[1u8; 150], 128);
        // Continuation repeats the extended timestamp.
        assert_eq!(&wire[16 + 128..16 + 128 + 5], &[0xC3, 0x01, 0x23, 0x45, 0x67]);

        let mut decoder = ChunkDecoder::new();
        let message = decoder.decode(&mut wire).unwrap().unwrap();
        assert_eq!(message.header.timestamp, 0x0123_4567);
        assert_eq!(message.body.len(), 150);
    }

    #[test]
    fn message_too_large_rejected() {
        let mut wire = encode_full(3, 0, &[0u8; 64], 128);
        let mut decoder = ChunkDecoder::with_config(ChunkConfig {
            max_message_size: 16,
            ..ChunkConfig::default()
        });
        let err = decoder.decode(&mut wire).unwrap_err();
        assert!(matches!(err, ChunkError::MessageTooLarge { size: 64, max: 16 }));
    }

    #[test]
    fn set_chunk_size_applied_to_following_chunks() {
        let mut wire = BytesMut::new();
        let control = MessageHeader {
            channel_id: 2,
            timestamp: 0,
            body_len: 4,
            message_type: MessageType::SetChunkSize,
            message_stream_id: 0,
        };
        encode_message(&ChunkHeader::full(&control), &4096u32.to_be_bytes(), 128, &mut wire)
            .unwrap();
        wire.extend_from_slice(&encode_full(3, 0, &[9u8; 1000], 4096));

        let mut decoder = ChunkDecoder::new();
        let first = decoder.decode(&mut wire).unwrap().unwrap();
        assert_eq!(first.header.message_type, MessageType::SetChunkSize);
        assert_eq!(decoder.chunk_size(), 4096);

        let second = decoder.decode(&mut wire).unwrap().unwrap();
        assert_eq!(second.body.len(), 1000);
    }

    #[test]
    fn abort_discards_partial_message() {
        let big = encode_full(3, 0, &[1u8; 200], 128);
        let mut wire = BytesMut::from(&big[..12 + 128]);
        let abort = MessageHeader {
            channel_id: 2,
            timestamp: 0,
            body_len: 4,
            message_type: MessageType::Abort,
            message_stream_id: 0,
        };
        encode_message(&ChunkHeader::full(&abort), &3u32.to_be_bytes(), 128, &mut wire).unwrap();
        // A fresh type 3 message on channel 3 now starts a new 200-byte message.
        wire.extend_from_slice(&[0xC3]);
        wire.extend_from_slice(&[2u8; 128]);
        wire.extend_from_slice(&[0xC3]);
        wire.extend_from_slice(&[2u8; 72]);

        let mut decoder = ChunkDecoder::new();
        let first = decoder.decode(&mut wire).unwrap().unwrap();
        assert_eq!(first.header.message_type, MessageType::Abort);
        let second = decoder.decode(&mut wire).unwrap().unwrap();
        assert_eq!(second.body.as_ref(), &[2u8; 200][..]);
    }

    #[test]
    fn zero_length_message() {
        let mut wire = encode_full(3, 0, b"", 128);
        let message = ChunkDecoder::new().decode(&mut wire).unwrap().unwrap();
        assert!(message.body.is_empty());
    }

    #[test]
    fn rejects_bad_chunk_size_and_length_mismatch() {
        let head = ChunkHeader::full(&header(3, 0, 4));
        let mut dst = BytesMut::new();
        assert!(matches!(
            encode_message(&head, b"abcd", 0, &mut dst),
            Err(ChunkError::InvalidChunkSize(0))
        ));
        assert!(matches!(
            encode_message(&head, b"abc", 128, &mut dst),
            Err(ChunkError::BodyLengthMismatch {
                declared: 4,
                actual: 3
            })
        ));
        assert!(ChunkDecoder::new().set_chunk_size(0).is_err());
    }
}
