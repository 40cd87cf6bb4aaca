//! `tokio-util` codec over the chunk stream, for use with `Framed`.

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_message, ChunkConfig, ChunkDecoder, Message};
use crate::error::{ChunkError, Result};
use crate::header::ChunkHeader;

/// Decodes complete [`Message`]s and encodes `(ChunkHeader, body)` pairs.
///
/// Header compression is the caller's business: pass headers obtained from a
/// [`ChannelHistory`](crate::ChannelHistory) reservation and commit it once
/// the sink has accepted the item.
#[derive(Debug, Default)]
pub struct ChunkCodec {
    decoder: ChunkDecoder,
    outbound: ChunkConfig,
}

impl ChunkCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same configuration for both directions.
    pub fn with_config(config: ChunkConfig) -> Self {
        Self {
            decoder: ChunkDecoder::with_config(config.clone()),
            outbound: config,
        }
    }

    pub fn decoder(&self) -> &ChunkDecoder {
        &self.decoder
    }

    /// Outbound chunk size.
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<()> {
        crate::codec::validate_chunk_size(chunk_size)?;
        self.outbound.chunk_size = chunk_size;
        Ok(())
    }

    pub fn chunk_size(&self) -> usize {
        self.outbound.chunk_size
    }
}

impl Decoder for ChunkCodec {
    type Item = Message;
    type Error = ChunkError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        self.decoder.decode(src)
    }
}

impl Encoder<(ChunkHeader, Bytes)> for ChunkCodec {
    type Error = ChunkError;

    fn encode(&mut self, (header, body): (ChunkHeader, Bytes), dst: &mut BytesMut) -> Result<()> {
        if body.len() > self.outbound.max_message_size {
            return Err(ChunkError::MessageTooLarge {
                size: body.len(),
                max: self.outbound.max_message_size,
            });
        }
        encode_message(&header, &body, self.outbound.chunk_size, dst)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;
    use crate::header::MessageHeader;
    use crate::history::ChannelHistory;
    use crate::message::MessageType;

    fn command_header(timestamp: u32, body_len: usize) -> MessageHeader {
        MessageHeader {
            channel_id: 3,
            timestamp,
            body_len: body_len as u32,
            message_type: MessageType::CommandAmf0,
            message_stream_id: 0,
        }
    }

    #[tokio::test]
    async fn framed_roundtrip_with_compressed_headers() {
        let (client, server) = tokio::io::duplex(4096);
        let mut sink = FramedWrite::new(client, ChunkCodec::new());
        let mut stream = FramedRead::new(server, ChunkCodec::new());
        let mut history = ChannelHistory::new();

        for (timestamp, body) in [(0u32, &b"first"[..]), (40, &b"second"[..])] {
            let reservation = history.reserve(command_header(timestamp, body.len()));
            sink.send((*reservation.chunk_header(), Bytes::copy_from_slice(body)))
                .await
                .unwrap();
            reservation.commit();
        }

        let first = stream.next().await.unwrap().unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(first.body.as_ref(), b"first");
        assert_eq!(second.body.as_ref(), b"second");
        assert_eq!(second.header.timestamp, 40);
        assert_eq!(second.header.message_type, MessageType::CommandAmf0);
    }

    #[test]
    fn encoder_rejects_oversized_body() {
        let config = ChunkConfig {
            max_message_size: 2,
            ..ChunkConfig::default()
        };
        let mut codec = ChunkCodec::with_config(config);
        let mut dst = BytesMut::new();
        let header = ChunkHeader::full(&command_header(0, 3));
        let err = codec
            .encode((header, Bytes::from_static(b"abc")), &mut dst)
            .unwrap_err();
        assert!(matches!(err, ChunkError::MessageTooLarge { size: 3, max: 2 }));
        assert!(dst.is_empty());
    }

    #[test]
    fn decoder_waits_for_complete_message() {
        let mut codec = ChunkCodec::new();
        let mut wire = BytesMut::new();
        let header = ChunkHeader::full(&command_header(0, 4));
        codec
            .encode((header, Bytes::from_static(b"ping")), &mut wire)
            .unwrap();

        let mut partial = wire.split_to(6);
        assert!(Decoder::decode(&mut codec, &mut partial).unwrap().is_none());
        partial.unsplit(wire);
        let message = Decoder::decode(&mut codec, &mut partial).unwrap().unwrap();
        assert_eq!(message.body.as_ref(), b"ping");
    }
}
