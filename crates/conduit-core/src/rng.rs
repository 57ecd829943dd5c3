//! Seeded randomness for junction routing and suction picks.
//!
//! SplitMix64 over a single `u64`; the whole generator serializes as that
//! one word.

/// SplitMix64 generator. Two engines seeded alike route items identically.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform index in `0..len`. Returns `None` when `len` is zero.
    ///
    /// Uses the upper 32 bits with a multiply-shift reduction; the bias is
    /// below 2^-32 for any realistic candidate count.
    pub fn index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        let upper = self.next_u64() >> 32;
        Some(((upper * len as u64) >> 32) as usize)
    }

    /// Pick a uniformly random element of a slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.index(items.len()).map(|i| &items[i])
    }

    /// Raw state, folded into the engine's state hash.
    pub fn state(&self) -> u64 {
        self.state
    }
}
