//! Value lists of unknown length, terminated by the end of the body.

use bytes::{Buf, BytesMut};
use rtmpprims_amf::{decode, encode, AmfError, Value};

use crate::error::Result;

/// Decode values until `budget` bytes (or, for `None`, the whole buffer)
/// are used up.
///
/// Fails on the first value that is malformed or runs past the budget; no
/// partial list is returned. Bytes past the budget are left in `src`. A
/// budget larger than what `src` holds is a truncated body and fails before
/// anything is decoded.
pub fn decode_all<B: Buf>(src: &mut B, budget: Option<usize>) -> Result<Vec<Value>> {
    let remaining = src.remaining();
    let limit = budget.unwrap_or(remaining);
    if limit > remaining {
        return Err(AmfError::Truncated {
            needed: limit,
            remaining,
        }
        .into());
    }
    let mut body = (&mut *src).take(limit);
    let mut values = Vec::new();
    while body.has_remaining() {
        values.push(decode(&mut body)?);
    }
    Ok(values)
}

/// Write each value's bytes in order. No count, no separators.
pub fn encode_all(values: &[Value], dst: &mut BytesMut) -> Result<()> {
    for value in values {
        encode(value, dst)?;
    }
    Ok(())
}
