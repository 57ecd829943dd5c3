//! Routing policies for junctions.
//!
//! When an item leaves a segment and more than one descriptor in the next
//! node accepts it, the mapper builds a [`RoutingQuery`] and hands it to the
//! installed [`RoutingPolicy`]. The policy may pick any candidate; if it does
//! nothing, the first candidate is used.

use crate::descriptor::End;
use crate::id::{DescriptorId, NodeId};
use crate::rng::SimRng;
use crate::side::Side;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Candidates and queries
// ---------------------------------------------------------------------------

/// One way an item can continue into the next node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingCandidate {
    /// World side of the candidate's far endpoint.
    pub direction: Side,
    pub descriptor: DescriptorId,
    /// The node the candidate belongs to.
    pub node: NodeId,
    /// Which endpoint of the descriptor the item enters through.
    pub entry: End,
}

/// A junction decision in progress.
#[derive(Debug, Clone)]
pub struct RoutingQuery {
    candidates: Vec<RoutingCandidate>,
    chosen: usize,
}

impl RoutingQuery {
    /// Start a query defaulting to the first candidate. `None` if empty.
    pub fn new(candidates: Vec<RoutingCandidate>) -> Option<Self> {
        if candidates.is_empty() {
            return None;
        }
        Some(Self {
            candidates,
            chosen: 0,
        })
    }

    pub fn candidates(&self) -> &[RoutingCandidate] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Select a candidate by index. Out-of-range indices are ignored.
    pub fn choose(&mut self, index: usize) -> bool {
        if index < self.candidates.len() {
            self.chosen = index;
            true
        } else {
            false
        }
    }

    /// Select the first candidate heading toward `side`.
    pub fn choose_direction(&mut self, side: Side) -> bool {
        match self.candidates.iter().position(|c| c.direction == side) {
            Some(index) => self.choose(index),
            None => false,
        }
    }

    pub fn chosen_index(&self) -> usize {
        self.chosen
    }

    pub fn chosen(&self) -> &RoutingCandidate {
        &self.candidates[self.chosen]
    }
}

// ---------------------------------------------------------------------------
// Policies
// ---------------------------------------------------------------------------

/// Strategy for choosing among junction candidates.
pub trait RoutingPolicy: std::fmt::Debug {
    fn route(&mut self, query: &mut RoutingQuery);
}

/// Picks uniformly at random from a deterministic stream.
#[derive(Debug, Clone)]
pub struct UniformRandom {
    rng: SimRng,
}

impl UniformRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SimRng::new(seed),
        }
    }
}

impl RoutingPolicy for UniformRandom {
    fn route(&mut self, query: &mut RoutingQuery) {
        if let Some(index) = self.rng.index(query.len()) {
            query.choose(index);
        }
    }
}

/// Leaves the default choice in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstCandidate;

impl RoutingPolicy for FirstCandidate {
    fn route(&mut self, _query: &mut RoutingQuery) {}
}

/// Prefers directions in a fixed order; falls back to the default.
#[derive(Debug, Clone)]
pub struct DirectionPriority {
    order: Vec<Side>,
}

impl DirectionPriority {
    pub fn new(order: Vec<Side>) -> Self {
        Self { order }
    }
}

impl RoutingPolicy for DirectionPriority {
    fn route(&mut self, query: &mut RoutingQuery) {
        for side in &self.order {
            if query.choose_direction(*side) {
                return;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn candidate(direction: Side, descriptor: u32) -> RoutingCandidate {
        RoutingCandidate {
            direction,
            descriptor: DescriptorId(descriptor),
            node: NodeId::from(KeyData::from_ffi(1)),
            entry: End::First,
        }
    }

    fn three_way() -> RoutingQuery {
        RoutingQuery::new(vec![
            candidate(Side::East, 0),
            candidate(Side::Up, 1),
            candidate(Side::West, 2),
        ])
        .unwrap()
    }

    // -----------------------------------------------------------------------
    // Test 1: empty query is rejected and default is first
    // -----------------------------------------------------------------------
    #[test]
    fn query_defaults_to_first() {
        assert!(RoutingQuery::new(vec![]).is_none());
        let q = three_way();
        assert_eq!(q.chosen_index(), 0);
        assert_eq!(q.chosen().direction, Side::East);
    }

    // -----------------------------------------------------------------------
    // Test 2: out-of-range choice ignored
    // -----------------------------------------------------------------------
    #[test]
    fn choose_out_of_range_keeps_previous() {
        let mut q = three_way();
        assert!(q.choose(2));
        assert!(!q.choose(3));
        assert_eq!(q.chosen_index(), 2);
    }

    // -----------------------------------------------------------------------
    // Test 3: first candidate policy is a no-op
    // -----------------------------------------------------------------------
    #[test]
    fn first_candidate_keeps_default() {
        let mut q = three_way();
        FirstCandidate.route(&mut q);
        assert_eq!(q.chosen_index(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 4: direction priority
    // -----------------------------------------------------------------------
    #[test]
    fn direction_priority_picks_first_available() {
        let mut q = three_way();
        DirectionPriority::new(vec![Side::Down, Side::West, Side::Up]).route(&mut q);
        assert_eq!(q.chosen().direction, Side::West);

        let mut q = three_way();
        DirectionPriority::new(vec![Side::Down]).route(&mut q);
        assert_eq!(q.chosen_index(), 0);
    }

    // -----------------------------------------------------------------------
    // Test 5: uniform random spreads evenly and is deterministic
    // -----------------------------------------------------------------------
    #[test]
    fn uniform_random_is_even() {
        let mut policy = UniformRandom::new(7);
        let mut counts = [0u32; 3];
        for _ in 0..3000 {
            let mut q = three_way();
            policy.route(&mut q);
            counts[q.chosen_index()] += 1;
        }
        for c in counts {
            assert!((850..=1150).contains(&c), "uneven split: {counts:?}");
        }

        let mut a = UniformRandom::new(99);
        let mut b = UniformRandom::new(99);
        for _ in 0..50 {
            let (mut qa, mut qb) = (three_way(), three_way());
            a.route(&mut qa);
            b.route(&mut qb);
            assert_eq!(qa.chosen_index(), qb.chosen_index());
        }
    }

    // -----------------------------------------------------------------------
    // Test 6: duplicate descriptors survive as separate candidates
    // -----------------------------------------------------------------------
    #[test]
    fn duplicate_candidates_are_kept() {
        let mut both_ends = candidate(Side::Up, 4);
        both_ends.entry = End::Second;
        let q = RoutingQuery::new(vec![candidate(Side::Up, 4), both_ends]).unwrap();
        assert_eq!(q.len(), 2);
    }
}
