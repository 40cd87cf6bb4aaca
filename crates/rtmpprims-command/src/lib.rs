//! Command messages over an RTMP-style chunk stream.
//!
//! A command body is a plain sequence of AMF0 values: the command name, an
//! optional numeric transaction id, then any number of arguments. Decoding
//! peels the name and transaction id off the front of the sequence; encoding
//! writes them back and picks the cheapest chunk header the channel's
//! [`ChannelHistory`] allows.

pub mod codec;
pub mod command;
pub mod error;
pub mod variable;

pub use codec::{encode_command, encode_command_body, CommandReader, CommandWriter};
pub use command::{Command, DEFAULT_COMMAND_CHANNEL};
pub use error::{CommandError, Result};
pub use variable::{decode_all, encode_all};

pub use rtmpprims_amf::Value;
pub use rtmpprims_chunk::{ChannelHistory, HeaderForm, MessageHeader, MessageType};
