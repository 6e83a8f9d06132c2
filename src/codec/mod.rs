//! Byte-level packing and unpacking for the broker's wire protocol.

mod primitives;
mod traits;

pub use primitives::crc32;
pub use traits::{ReadError, ReadType, WriteError, WriteType};
