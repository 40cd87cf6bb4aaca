//! Send-side header history, one entry per channel.
//!
//! A channel's entry holds the last message header that was fully written
//! on it. The entry drives header compression for the next message: a
//! relative header is only valid when the receiver can reconstruct the
//! omitted fields from what it last saw on that channel.

use std::collections::HashMap;

use tracing::trace;

use crate::header::{ChunkHeader, HeaderForm, MessageHeader};
use crate::message::MessageType;

/// Per-connection map from channel id to the last header sent on it.
///
/// Owned by whoever owns the outgoing side of the connection and passed by
/// `&mut` into encode calls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelHistory {
    channels: HashMap<u32, MessageHeader>,
}

impl ChannelHistory {
    /// Create an empty history. Every channel starts without a previous header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a message of `message_type` on `channel_id` may use a
    /// compressed header.
    ///
    /// True iff the last message sent on the channel had the same type.
    pub fn can_compress_header(&self, channel_id: u32, message_type: MessageType) -> bool {
        self.last_message_type(channel_id) == Some(message_type)
    }

    /// Type of the last message sent on `channel_id`.
    pub fn last_message_type(&self, channel_id: u32) -> Option<MessageType> {
        self.channels.get(&channel_id).map(|header| header.message_type)
    }

    /// Full header of the last message sent on `channel_id`.
    pub fn last_header(&self, channel_id: u32) -> Option<&MessageHeader> {
        self.channels.get(&channel_id)
    }

    /// Choose the header form for `header` and hold the channel until the
    /// message is either committed or abandoned.
    ///
    /// Eligibility is decided by message type alone. A compressed header
    /// cannot carry a message stream id, so a stream id change on the
    /// channel still produces a full header.
    ///
    /// The reservation borrows the history mutably, so no other decision can
    /// be made on this history between the query and the commit. Dropping
    /// the reservation without calling [`HeaderReservation::commit`] leaves
    /// the history untouched.
    pub fn reserve(&mut self, header: MessageHeader) -> HeaderReservation<'_> {
        let form = if self.can_compress_header(header.channel_id, header.message_type) {
            HeaderForm::Compressed
        } else {
            HeaderForm::Full
        };
        let chunk_header = ChunkHeader::build(form, &header, self.last_header(header.channel_id));
        HeaderReservation {
            history: self,
            header,
            chunk_header,
        }
    }

    /// Number of channels with a recorded header.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Forget every channel (protocol reset).
    pub fn clear(&mut self) {
        self.channels.clear();
    }
}

/// A pending header decision for one outgoing message.
#[must_use = "history is only updated when the reservation is committed"]
#[derive(Debug)]
pub struct HeaderReservation<'a> {
    history: &'a mut ChannelHistory,
    header: MessageHeader,
    chunk_header: ChunkHeader,
}

impl HeaderReservation<'_> {
    /// The form of the header that will actually be written.
    pub fn form(&self) -> HeaderForm {
        self.chunk_header.form()
    }

    /// The header to put in front of the message's first chunk.
    pub fn chunk_header(&self) -> &ChunkHeader {
        &self.chunk_header
    }

    pub fn message_header(&self) -> &MessageHeader {
        &self.header
    }

    /// Record the message as sent. Call only after it was fully written.
    pub fn commit(self) {
        trace!(
            channel_id = self.header.channel_id,
            message_type = %self.header.message_type,
            form = ?self.form(),
            "committing channel history"
        );
        self.history
            .channels
            .insert(self.header.channel_id, self.header);
    }
}
