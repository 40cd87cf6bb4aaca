use std::io::{ErrorKind, Read};

use bytes::BytesMut;

use crate::codec::{ChunkConfig, ChunkDecoder, Message};
use crate::error::{ChunkError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads and chunk interleaving internally; callers always
/// get complete messages.
pub struct ChunkReader<T> {
    inner: T,
    buf: BytesMut,
    decoder: ChunkDecoder,
}

impl<T: Read> ChunkReader<T> {
    /// Create a new chunk reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    /// Create a new chunk reader with explicit configuration.
    pub fn with_config(inner: T, config: ChunkConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            decoder: ChunkDecoder::with_config(config),
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Returns `Err(ChunkError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            if let Some(message) = self.decoder.decode(&mut self.buf)? {
                return Ok(message);
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            };

            if read == 0 {
                return Err(ChunkError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// True if bytes were received that did not yet form a complete message,
    /// either as an incomplete chunk or as whole chunks of an unfinished
    /// message.
    pub fn has_buffered(&self) -> bool {
        !self.buf.is_empty() || self.decoder.has_partial()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// The receive-side decoder (chunk size, per-channel headers).
    pub fn decoder(&self) -> &ChunkDecoder {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut ChunkDecoder {
        &mut self.decoder
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::encode_message;
    use crate::header::{ChunkHeader, MessageHeader};
    use crate::message::MessageType;

    fn wire_for(channel_id: u32, body: &[u8]) -> BytesMut {
        let header = ChunkHeader::full(&MessageHeader {
            channel_id,
            timestamp: 0,
            body_len: body.len() as u32,
            message_type: MessageType::CommandAmf0,
            message_stream_id: 0,
        });
        let mut wire = BytesMut::new();
        encode_message(&header, body, 128, &mut wire).unwrap();
        wire
    }

    #[test]
    fn read_single_message() {
        let wire = wire_for(3, b"hello");
        let mut reader = ChunkReader::new(Cursor::new(wire.to_vec()));
        let message = reader.read_message().unwrap();

        assert_eq!(message.header.channel_id, 3);
        assert_eq!(message.body.as_ref(), b"hello");
    }

    #[test]
    fn read_multiple_messages() {
        let mut wire = wire_for(3, b"one");
        wire.extend_from_slice(&wire_for(4, b"two"));
        wire.extend_from_slice(&wire_for(5, b"three"));

        let mut reader = ChunkReader::new(Cursor::new(wire.to_vec()));
        let m1 = reader.read_message().unwrap();
        let m2 = reader.read_message().unwrap();
        let m3 = reader.read_message().unwrap();

        assert_eq!((m1.header.channel_id, m1.body.as_ref()), (3, b"one".as_ref()));
        assert_eq!((m2.header.channel_id, m2.body.as_ref()), (4, b"two".as_ref()));
        assert_eq!((m3.header.channel_id, m3.body.as_ref()), (5, b"three".as_ref()));
    }

    #[test]
    fn partial_read_handling() {
        let body = vec![0xAB; 1000];
        let wire = wire_for(6, &body);
        let mut reader = ChunkReader::new(ByteByByteReader {
            bytes: wire.to_vec(),
            pos: 0,
        });

        let message = reader.read_message().unwrap();
        assert_eq!(message.header.channel_id, 6);
        assert_eq!(message.body.as_ref(), body.as_slice());
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = ChunkReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, ChunkError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_message() {
        let wire = wire_for(3, &[1u8; 300]);
        let mut reader = ChunkReader::new(Cursor::new(wire[..200].to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, ChunkError::ConnectionClosed));
        assert!(reader.has_buffered());
    }

    #[test]
    fn connection_closed_on_chunk_boundary_mid_message() {
        // 12-byte header plus the first 128-byte chunk, nothing else.
        let wire = wire_for(3, &[1u8; 300]);
        let mut reader = ChunkReader::new(Cursor::new(wire[..12 + 128].to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, ChunkError::ConnectionClosed));
        assert!(reader.has_buffered());
    }

    #[test]
    fn clean_close_after_whole_message_has_nothing_buffered() {
        let wire = wire_for(3, b"done");
        let mut reader = ChunkReader::new(Cursor::new(wire.to_vec()));
        reader.read_message().unwrap();
        assert!(matches!(
            reader.read_message(),
            Err(ChunkError::ConnectionClosed)
        ));
        assert!(!reader.has_buffered());
    }

    #[test]
    fn interrupted_read_retries() {
        let wire = wire_for(8, b"ok");
        let mut reader = ChunkReader::new(InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(wire.to_vec()),
        });
        let message = reader.read_message().unwrap();
        assert_eq!(message.header.channel_id, 8);
        assert_eq!(message.body.as_ref(), b"ok");
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_pipe() {
        let (left, right) = std::os::unix::net::UnixStream::pair().unwrap();
        let mut writer = crate::writer::ChunkWriter::new(left);
        let mut reader = ChunkReader::new(right);

        let header = ChunkHeader::full(&MessageHeader {
            channel_id: 3,
            timestamp: 0,
            body_len: 4,
            message_type: MessageType::CommandAmf0,
            message_stream_id: 0,
        });
        writer.write_message(&header, b"ping").unwrap();
        let message = reader.read_message().unwrap();

        assert_eq!(message.header.channel_id, 3);
        assert_eq!(message.body.as_ref(), b"ping");
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
