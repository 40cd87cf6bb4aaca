use std::fmt;

use bytes::Buf;
use rtmpprims_amf::Value;
use rtmpprims_chunk::{Message, MessageHeader, MessageType, OVER_CONNECTION};
use tracing::warn;

use crate::error::{CommandError, Result};
use crate::variable::decode_all;

/// Channel used for commands unless told otherwise.
pub const DEFAULT_COMMAND_CHANNEL: u32 = OVER_CONNECTION;

/// A remote procedure invocation: name, transaction id and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub name: String,
    /// Correlates a request with its `_result`/`_error` reply. 0 when the
    /// sender expects no reply.
    pub transaction_id: i32,
    pub arguments: Vec<Value>,
    /// Chunk stream the command travels on.
    pub channel_id: u32,
    pub message_stream_id: u32,
    pub timestamp: u32,
}

impl Command {
    pub fn new(name: impl Into<String>, transaction_id: i32) -> Self {
        Self {
            name: name.into(),
            transaction_id,
            arguments: Vec::new(),
            channel_id: DEFAULT_COMMAND_CHANNEL,
            message_stream_id: 0,
            timestamp: 0,
        }
    }

    pub fn on_channel(mut self, channel_id: u32) -> Self {
        self.channel_id = channel_id;
        self
    }

    pub fn on_stream(mut self, message_stream_id: u32) -> Self {
        self.message_stream_id = message_stream_id;
        self
    }

    pub fn at_timestamp(mut self, timestamp: u32) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_argument(mut self, argument: impl Into<Value>) -> Self {
        self.arguments.push(argument.into());
        self
    }

    pub fn with_arguments(mut self, arguments: impl IntoIterator<Item = Value>) -> Self {
        self.arguments.extend(arguments);
        self
    }

    pub fn push_argument(&mut self, argument: impl Into<Value>) {
        self.arguments.push(argument.into());
    }

    /// Decode a command from a message body.
    ///
    /// The first value must be a non-empty string (the name). A number right
    /// after it is taken as the transaction id; anything else stays in the
    /// arguments and the id defaults to 0. For AMF3 command messages the
    /// leading format byte is skipped. A body shorter than
    /// `header.body_len` is malformed.
    pub fn decode(header: &MessageHeader, mut body: impl Buf) -> Result<Self> {
        if !header.message_type.is_command() {
            return Err(CommandError::UnexpectedMessageType(header.message_type));
        }

        let mut budget = header.body_len as usize;
        if header.message_type == MessageType::CommandAmf3 {
            match body.chunk().first().copied() {
                Some(0x00) => {
                    body.advance(1);
                    budget = budget.saturating_sub(1);
                }
                first => warn!(
                    channel_id = header.channel_id,
                    first_byte = ?first,
                    "AMF3 command without format byte, reading as AMF0"
                ),
            }
        }

        let values = decode_all(&mut body, Some(budget))?;
        let (name, transaction_id, arguments) = split_values(values)?;

        Ok(Self {
            name,
            transaction_id,
            arguments,
            channel_id: header.channel_id,
            message_stream_id: header.message_stream_id,
            timestamp: header.timestamp,
        })
    }

    /// Decode a command from a reassembled chunk-stream message.
    pub fn decode_message(message: &Message) -> Result<Self> {
        Self::decode(&message.header, message.body.clone())
    }

    /// First argument, conventionally the command object (or null).
    pub fn command_object(&self) -> Option<&Value> {
        self.arguments.first()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RTMP Command (command: {}, transaction ID: {})",
            self.name, self.transaction_id
        )
    }
}

fn split_values(values: Vec<Value>) -> Result<(String, i32, Vec<Value>)> {
    let mut values = values.into_iter().peekable();

    let name = match values.next() {
        Some(Value::String(name) | Value::LongString(name)) if !name.is_empty() => name,
        Some(Value::String(_) | Value::LongString(_)) => {
            return Err(CommandError::InvalidCommandFrame("command name is empty"))
        }
        Some(_) => {
            return Err(CommandError::InvalidCommandFrame(
                "first value is not a command name",
            ))
        }
        None => return Err(CommandError::InvalidCommandFrame("command body is empty")),
    };

    // `as` saturates and maps NaN to 0.
    let transaction_id = match values.next_if(Value::is_number) {
        Some(Value::Number(id)) => id as i32,
        _ => 0,
    };

    Ok((name, transaction_id, values.collect()))
}
