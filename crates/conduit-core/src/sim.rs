//! Simulation clock and state hashing.

use crate::fixed::{Fixed64, Ticks};
use crate::geometry::Vec3;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// The engine's clock.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Current tick. Incremented once per step.
    pub tick: Ticks,
    /// Elapsed seconds not yet consumed by a whole step.
    pub accumulator: Fixed64,
}

impl SimState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add elapsed time and return how many whole steps of `dt` are due.
    /// The remainder carries into the next call.
    pub fn accumulate(&mut self, elapsed: Fixed64, dt: Fixed64) -> u64 {
        if dt <= Fixed64::ZERO || elapsed <= Fixed64::ZERO {
            return 0;
        }
        self.accumulator += elapsed;
        let mut steps = 0;
        while self.accumulator >= dt {
            self.accumulator -= dt;
            steps += 1;
        }
        steps
    }
}

/// Result of an `Engine::advance()` call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AdvanceResult {
    pub steps_run: u64,
    pub dropped: usize,
    pub deposited: usize,
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// Deterministic hash of engine state for desync detection.
///
/// FNV-1a (64-bit). Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    pub fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, v: Fixed64) {
        self.write(&v.to_bits().to_le_bytes());
    }

    /// Positions are hashed by bit pattern.
    pub fn write_vec3(&mut self, v: Vec3) {
        for c in [v.x, v.y, v.z] {
            self.write(&c.to_bits().to_le_bytes());
        }
    }

    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
