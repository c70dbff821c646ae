//! FNV-1 style 32-bit digest over byte buffers.
//!
//! Deterministic and unseeded: equal buffers hash equally across runs and
//! processes. Not suitable for attacker-controlled keys.

use core::hash::{BuildHasher, Hasher};

pub const FNV32_BASE: u32 = 0x811c_9dc5;
pub const FNV32_PRIME: u32 = 0x0100_0193;

/// Hash `buf` with the FNV-1 variant: multiply by the prime, then xor the byte.
#[inline]
pub fn bufhash(buf: &[u8]) -> u32 {
    fold(FNV32_BASE, buf)
}

#[inline]
fn fold(mut hash: u32, buf: &[u8]) -> u32 {
    for &c in buf {
        hash = hash.wrapping_mul(FNV32_PRIME) ^ u32::from(c);
    }
    hash
}

/// Streaming form of [`bufhash`]. Successive `write` calls digest as if the
/// buffers were concatenated.
#[derive(Clone, Copy, Debug)]
pub struct BufHasher {
    state: u32,
}

impl BufHasher {
    pub const fn new() -> Self {
        Self { state: FNV32_BASE }
    }

    /// The 32-bit digest accumulated so far.
    pub fn digest(&self) -> u32 {
        self.state
    }
}

impl Default for BufHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for BufHasher {
    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        self.state = fold(self.state, bytes);
    }

    fn finish(&self) -> u64 {
        u64::from(self.state)
    }
}

/// `BuildHasher` producing [`BufHasher`]s, for plugging the digest into std
/// collections.
#[derive(Clone, Copy, Debug, Default)]
pub struct BuildBufHasher;

impl BuildHasher for BuildBufHasher {
    type Hasher = BufHasher;

    fn build_hasher(&self) -> BufHasher {
        BufHasher::new()
    }
}
