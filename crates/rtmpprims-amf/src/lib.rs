//! AMF0 self-describing values.
//!
//! Every value on the wire starts with a one-byte type marker followed by
//! a marker-specific payload. [`decode`] reads exactly one value and
//! [`encode`] writes exactly one value; neither adds framing of its own.

pub mod decode;
pub mod encode;
pub mod error;
pub mod marker;
pub mod value;

pub use decode::{decode, MAX_NESTING_DEPTH};
pub use encode::encode;
pub use error::{AmfError, Result};
pub use value::Value;
