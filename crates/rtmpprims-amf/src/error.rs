/// Errors that can occur while encoding or decoding AMF0 values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmfError {
    /// The type marker is not part of AMF0.
    #[error("unknown AMF0 marker 0x{0:02X}")]
    UnknownMarker(u8),

    /// The marker is valid AMF0 but is not accepted as a standalone value
    /// (movieclip, recordset, AVM+ switch, or a stray object-end).
    #[error("unsupported AMF0 marker 0x{0:02X}")]
    UnsupportedMarker(u8),

    /// The value's declared length runs past the end of the available bytes.
    #[error("truncated value (needed {needed} bytes, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// A boolean payload byte other than 0x00 or 0x01.
    #[error("invalid boolean byte 0x{0:02X}")]
    InvalidBoolean(u8),

    /// A string payload is not valid UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,

    /// An object's property list did not end with the object-end marker.
    #[error("object property list not terminated (found marker 0x{0:02X})")]
    MissingObjectEnd(u8),

    /// Objects and arrays are nested deeper than the decoder allows.
    #[error("values nested deeper than {0} levels")]
    NestingTooDeep(usize),

    /// A short string or property key does not fit a 16-bit length prefix.
    #[error("string of {0} bytes exceeds the 65535 byte short-string limit")]
    StringTooLong(usize),

    /// A long string or array does not fit a 32-bit length prefix.
    #[error("length {0} exceeds the 32-bit AMF0 limit")]
    LengthOverflow(usize),
}

pub type Result<T> = std::result::Result<T, AmfError>;
