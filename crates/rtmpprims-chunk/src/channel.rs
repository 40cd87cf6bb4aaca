//! Conventional chunk stream (channel) ids.
//!
//! Ids 0 and 1 are basic-header escape values and never name a channel.
//! Id 2 is reserved for protocol control messages; everything from 3 up is
//! free for applications, with the assignments below used by convention.

/// Protocol control messages (set chunk size, acknowledgements, ...).
pub const PROTOCOL_CONTROL: u32 = 2;

/// Connection-level commands (connect, createStream, ...).
pub const OVER_CONNECTION: u32 = 3;

/// Secondary connection-level channel.
pub const OVER_CONNECTION_2: u32 = 4;

/// Stream-level commands and data (play, publish, metadata).
pub const OVER_STREAM: u32 = 5;

/// Video data.
pub const VIDEO: u32 = 6;

/// Audio data.
pub const AUDIO: u32 = 7;

/// Lowest id a basic header can carry.
pub const MIN_CHANNEL_ID: u32 = 2;

/// Highest id a basic header can carry (3-byte form).
pub const MAX_CHANNEL_ID: u32 = 65_599;

/// Returns a human-readable name for a channel id.
pub fn channel_name(id: u32) -> &'static str {
    match id {
        PROTOCOL_CONTROL => "PROTOCOL_CONTROL",
        OVER_CONNECTION => "OVER_CONNECTION",
        OVER_CONNECTION_2 => "OVER_CONNECTION_2",
        OVER_STREAM => "OVER_STREAM",
        VIDEO => "VIDEO",
        AUDIO => "AUDIO",
        0 | 1 => "INVALID",
        _ => "USER",
    }
}

/// Returns true if the id can be carried in a basic header.
pub fn is_valid(id: u32) -> bool {
    (MIN_CHANNEL_ID..=MAX_CHANNEL_ID).contains(&id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_ranges() {
        assert_eq!(channel_name(OVER_CONNECTION), "OVER_CONNECTION");
        assert_eq!(channel_name(1), "INVALID");
        assert_eq!(channel_name(300), "USER");
        assert!(!is_valid(0));
        assert!(!is_valid(1));
        assert!(is_valid(2));
        assert!(is_valid(65_599));
        assert!(!is_valid(65_600));
    }
}
