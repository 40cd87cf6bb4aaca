use hex::FromHexError;

use crate::exit::{CliError, CliResult};

/// Parse a hex string. Whitespace, `:` separators and a `0x` prefix are
/// ignored.
pub fn decode_hex(input: &str) -> CliResult<Vec<u8>> {
    let input = input.trim();
    let input = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    let digits: String = input
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && *c != ':')
        .collect();

    hex::decode(&digits).map_err(|err| match err {
        FromHexError::InvalidHexCharacter { c, index } => {
            CliError::usage(format!("invalid hex digit {c:?} at position {index}"))
        }
        FromHexError::OddLength => CliError::usage("hex input has an odd number of digits"),
        other => CliError::usage(format!("invalid hex input: {other}")),
    })
}

pub fn encode_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}
