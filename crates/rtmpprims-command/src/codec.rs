use std::io::{Read, Write};

use bytes::BytesMut;
use rtmpprims_amf::{encode, Value};
use rtmpprims_chunk::{
    ChannelHistory, ChunkConfig, ChunkError, ChunkReader, ChunkWriter, HeaderForm, MessageHeader,
    MessageType, MAX_MESSAGE_LEN,
};
use tracing::{debug, trace};

use crate::command::Command;
use crate::error::Result;
use crate::variable::encode_all;

/// Encode the command body: name, transaction id, then the arguments.
pub fn encode_command_body(command: &Command, dst: &mut BytesMut) -> Result<()> {
    encode(&Value::text(command.name.as_str()), dst)?;
    encode(&Value::Number(f64::from(command.transaction_id)), dst)?;
    encode_all(&command.arguments, dst)
}

/// Encode `command` and write it to `writer`, compressing the header when
/// `history` allows it.
///
/// `history` is only updated once the whole message has been written. Any
/// failure (an unencodable argument, an invalid channel, a write error)
/// leaves it exactly as it was. Returns the number of bytes written.
pub fn encode_command<W: Write>(
    command: &Command,
    history: &mut ChannelHistory,
    writer: &mut ChunkWriter<W>,
) -> Result<usize> {
    let mut body = BytesMut::new();
    encode_command_body(command, &mut body)?;
    let body_len = u32::try_from(body.len())
        .ok()
        .filter(|len| *len <= MAX_MESSAGE_LEN)
        .ok_or(ChunkError::MessageTooLarge {
            size: body.len(),
            max: MAX_MESSAGE_LEN as usize,
        })?;

    let reservation = history.reserve(MessageHeader {
        channel_id: command.channel_id,
        timestamp: command.timestamp,
        body_len,
        message_type: MessageType::CommandAmf0,
        message_stream_id: command.message_stream_id,
    });
    let written = writer.write_message(reservation.chunk_header(), &body)?;
    debug!(
        command = %command.name,
        transaction_id = command.transaction_id,
        channel_id = command.channel_id,
        form = ?reservation.form(),
        bytes = written,
        "sent command"
    );
    reservation.commit();
    Ok(written)
}

/// A chunk writer bundled with the history of the connection it writes to.
///
/// Keeps the two from drifting apart: every header decision is made against
/// the history of this stream only. Wrap it in a `Mutex` to share it.
pub struct CommandWriter<W> {
    writer: ChunkWriter<W>,
    history: ChannelHistory,
}

impl<W: Write> CommandWriter<W> {
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    pub fn with_config(inner: W, config: ChunkConfig) -> Self {
        Self {
            writer: ChunkWriter::with_config(inner, config),
            history: ChannelHistory::new(),
        }
    }

    /// Encode and write one command. Returns the number of bytes written.
    pub fn send(&mut self, command: &Command) -> Result<usize> {
        encode_command(command, &mut self.history, &mut self.writer)
    }

    /// Header form `command` would be sent with next.
    ///
    /// Compressed only when the channel last carried a command on the same
    /// message stream.
    pub fn next_form(&self, command: &Command) -> HeaderForm {
        let same_stream = self
            .history
            .last_header(command.channel_id)
            .is_some_and(|last| last.message_stream_id == command.message_stream_id);
        if same_stream
            && self
                .history
                .can_compress_header(command.channel_id, MessageType::CommandAmf0)
        {
            HeaderForm::Compressed
        } else {
            HeaderForm::Full
        }
    }

    pub fn history(&self) -> &ChannelHistory {
        &self.history
    }

    /// Forget all sent headers; the next command on every channel goes out
    /// with a full header.
    pub fn reset_history(&mut self) {
        self.history.clear();
    }

    pub fn set_chunk_size(&mut self, chunk_size: usize) -> Result<()> {
        Ok(self.writer.set_chunk_size(chunk_size)?)
    }

    pub fn get_ref(&self) -> &W {
        self.writer.get_ref()
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

/// Reads commands from a chunk stream, skipping every other message type.
pub struct CommandReader<R> {
    reader: ChunkReader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, ChunkConfig::default())
    }

    pub fn with_config(inner: R, config: ChunkConfig) -> Self {
        Self {
            reader: ChunkReader::with_config(inner, config),
        }
    }

    /// Read the next command message (blocking).
    ///
    /// Returns a chunk-level `ConnectionClosed` error at end of stream.
    pub fn read_command(&mut self) -> Result<Command> {
        loop {
            let message = self.reader.read_message()?;
            if message.header.message_type.is_command() {
                return Command::decode_message(&message);
            }
            trace!(
                channel_id = message.header.channel_id,
                message_type = %message.header.message_type,
                "skipping non-command message"
            );
        }
    }

    pub fn get_ref(&self) -> &R {
        self.reader.get_ref()
    }

    pub fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}
