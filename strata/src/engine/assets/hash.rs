//! Content hashing for deduplicating GPU resources.
//!
//! Every cache in the engine keys its entries with a [`ContentHash`], a 64-bit
//! FNV-1a digest over the raw bytes of whatever is uploaded. The hash has no
//! seed, so it is stable across runs and platforms as long as the input bytes
//! are the same. Floating point data is hashed bit-for-bit, `0.0` and `-0.0`
//! (or two NaN payloads) are different content.

use bytemuck::Pod;
use std::fmt::{Display, Formatter};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash(u64);

impl ContentHash {
    pub const fn from_raw(value: u64) -> Self {
        ContentHash(value)
    }

    pub const fn value(self) -> u64 {
        self.0
    }

    /// Hashes a single byte buffer.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = ContentHasher::new();
        hasher.write(bytes);
        hasher.finish()
    }
}

impl Display for ContentHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Incremental FNV-1a hasher.
///
/// Inputs are folded in the order they are written. Integers are always
/// written little-endian.
#[derive(Clone, Debug)]
pub struct ContentHasher {
    state: u64,
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentHasher {
    pub const fn new() -> Self {
        ContentHasher {
            state: FNV_OFFSET_BASIS,
        }
    }

    pub fn write(&mut self, bytes: &[u8]) -> &mut Self {
        for byte in bytes {
            self.state ^= u64::from(*byte);
            self.state = self.state.wrapping_mul(FNV_PRIME);
        }
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.write(&[value])
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    pub fn write_u64(&mut self, value: u64) -> &mut Self {
        self.write(&value.to_le_bytes())
    }

    /// Writes the length of the slice followed by its raw bytes.
    pub fn write_slice<T: Pod>(&mut self, data: &[T]) -> &mut Self {
        self.write_u64(data.len() as u64);
        self.write(bytemuck::cast_slice(data))
    }

    pub fn write_str(&mut self, text: &str) -> &mut Self {
        self.write_u64(text.len() as u64);
        self.write(text.as_bytes())
    }

    pub fn finish(&self) -> ContentHash {
        ContentHash(self.state)
    }
}
