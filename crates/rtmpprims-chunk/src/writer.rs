use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use tracing::trace;

use crate::codec::{encode_message, validate_chunk_size, ChunkConfig};
use crate::error::{ChunkError, Result};
use crate::header::ChunkHeader;

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Writes chunked messages to any `Write` stream.
pub struct ChunkWriter<T> {
    inner: T,
    buf: BytesMut,
    config: ChunkConfig,
}

impl<T: Write> ChunkWriter<T> {
    /// Create a new chunk writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    /// Create a new chunk writer with explicit configuration.
    pub fn with_config(inner: T, config: ChunkConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Split `body` into chunks behind `header` and write them (blocking).
    ///
    /// Returns the number of bytes written. Nothing is written if the
    /// message fails to encode.
    pub fn write_message(&mut self, header: &ChunkHeader, body: &[u8]) -> Result<usize> {
        if body.len() > self.config.max_message_size {
            return Err(ChunkError::MessageTooLarge {
                size: body.len(),
                max: self.config.max_message_size,
            });
        }

        self.buf.clear();
        encode_message(header, body, self.config.chunk_size, &mut self.buf)?;
        trace!(
            channel_id = header.channel_id,
            chunk_type = ?header.chunk_type,
            bytes = self.buf.len(),
            "writing message"
        );

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(ChunkError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            }
        }

        self.flush()?;
        Ok(offset)
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => continue,
                Err(err) => return Err(ChunkError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Update the outbound chunk size for subsequent messages.
    ///
    /// The peer must be told separately (set-chunk-size message).
    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<()> {
        validate_chunk_size(chunk_size)?;
        self.config.chunk_size = chunk_size;
        Ok(())
    }

    /// Update maximum body size for subsequent messages.
    pub fn set_max_message_size(&mut self, max_message_size: usize) {
        self.config.max_message_size = max_message_size;
    }

    /// Current chunk writer configuration.
    pub fn config(&self) -> &ChunkConfig {
        &self.config
    }
}
