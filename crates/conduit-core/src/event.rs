//! Typed event system with pre-allocated ring buffers.
//!
//! Events are emitted while the engine mutates state (placement, insertion,
//! the transport tick, suction captures) and handed to listeners in batch by
//! [`EventBus::deliver`]. Each event kind has its own [`EventBuffer`] ring
//! buffer, allocated on first emit.
//!
//! # Suppression
//!
//! Event kinds can be suppressed via [`EventBus::suppress`], which prevents
//! any allocation or recording for that kind. High-volume kinds such as
//! [`EventKind::JunctionRouted`] are typical candidates.

use crate::fixed::Ticks;
use crate::id::{ContainerId, DescriptorId, ItemId, NodeId};
use crate::side::Side;
use crate::transport::DropReason;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// An engine event. All events carry the tick at which they occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // -- Items --
    ItemSpawned {
        item: ItemId,
        tick: Ticks,
    },
    ItemDespawned {
        item: ItemId,
        tick: Ticks,
    },
    ItemInserted {
        item: ItemId,
        node: NodeId,
        descriptor: DescriptorId,
        tick: Ticks,
    },
    ItemDropped {
        item: ItemId,
        reason: DropReason,
        tick: Ticks,
    },
    ItemDeposited {
        item: ItemId,
        container: ContainerId,
        tick: Ticks,
    },

    // -- Routing --
    JunctionRouted {
        item: ItemId,
        node: NodeId,
        direction: Side,
        candidates: u32,
        tick: Ticks,
    },
    SuctionCaptured {
        inlet: NodeId,
        item: ItemId,
        node: NodeId,
        tick: Ticks,
    },

    // -- Grid --
    NodePlaced {
        node: NodeId,
        tick: Ticks,
    },
    NodeRemoved {
        node: NodeId,
        tick: Ticks,
    },
}

/// Discriminant tag for event types, used for suppression and lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ItemSpawned,
    ItemDespawned,
    ItemInserted,
    ItemDropped,
    ItemDeposited,
    JunctionRouted,
    SuctionCaptured,
    NodePlaced,
    NodeRemoved,
}

const EVENT_KIND_COUNT: usize = 9;

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ItemSpawned { .. } => EventKind::ItemSpawned,
            Event::ItemDespawned { .. } => EventKind::ItemDespawned,
            Event::ItemInserted { .. } => EventKind::ItemInserted,
            Event::ItemDropped { .. } => EventKind::ItemDropped,
            Event::ItemDeposited { .. } => EventKind::ItemDeposited,
            Event::JunctionRouted { .. } => EventKind::JunctionRouted,
            Event::SuctionCaptured { .. } => EventKind::SuctionCaptured,
            Event::NodePlaced { .. } => EventKind::NodePlaced,
            Event::NodeRemoved { .. } => EventKind::NodeRemoved,
        }
    }

    pub fn tick(&self) -> Ticks {
        match self {
            Event::ItemSpawned { tick, .. }
            | Event::ItemDespawned { tick, .. }
            | Event::ItemInserted { tick, .. }
            | Event::ItemDropped { tick, .. }
            | Event::ItemDeposited { tick, .. }
            | Event::JunctionRouted { tick, .. }
            | Event::SuctionCaptured { tick, .. }
            | Event::NodePlaced { tick, .. }
            | Event::NodeRemoved { tick, .. } => *tick,
        }
    }
}

impl EventKind {
    fn index(self) -> usize {
        self as usize
    }
}

// ---------------------------------------------------------------------------
// EventBuffer
// ---------------------------------------------------------------------------

/// A pre-allocated ring buffer for events. Fixed capacity; when full, the
/// oldest events are dropped.
#[derive(Debug)]
pub struct EventBuffer {
    events: Vec<Option<Event>>,
    /// Next write position.
    head: usize,
    len: usize,
    /// Total events ever written, including overwritten ones.
    total_written: u64,
}

impl EventBuffer {
    /// A capacity of 0 is clamped to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: (0..capacity).map(|_| None).collect(),
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn push(&mut self, event: Event) {
        let capacity = self.capacity();
        self.events[self.head] = Some(event);
        self.head = (self.head + 1) % capacity;
        self.len = (self.len + 1).min(capacity);
        self.total_written += 1;
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events lost to overwriting.
    pub fn dropped_count(&self) -> u64 {
        self.total_written.saturating_sub(self.capacity() as u64)
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Event> + '_ {
        let capacity = self.capacity();
        let start = if self.len < capacity { 0 } else { self.head };
        (0..self.len).filter_map(move |i| self.events[(start + i) % capacity].as_ref())
    }

    pub fn clear(&mut self) {
        self.events.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// A read-only listener invoked during delivery.
pub type Listener = Box<dyn FnMut(&Event)>;

/// One ring buffer per event kind, listeners, and suppression flags.
pub struct EventBus {
    buffers: [Option<EventBuffer>; EVENT_KIND_COUNT],
    suppressed: [bool; EVENT_KIND_COUNT],
    listeners: Vec<(EventKind, Listener)>,
    capacity: usize,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("buffers", &self.buffers)
            .field("suppressed", &self.suppressed)
            .field("listeners", &self.listeners.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl EventBus {
    /// Create a bus whose per-kind buffers hold `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: Default::default(),
            suppressed: [false; EVENT_KIND_COUNT],
            listeners: Vec::new(),
            capacity,
        }
    }

    /// Stop recording a kind and free its buffer.
    pub fn suppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = true;
        self.buffers[kind.index()] = None;
    }

    pub fn unsuppress(&mut self, kind: EventKind) {
        self.suppressed[kind.index()] = false;
    }

    pub fn is_suppressed(&self, kind: EventKind) -> bool {
        self.suppressed[kind.index()]
    }

    pub fn emit(&mut self, event: Event) {
        let idx = event.kind().index();
        if self.suppressed[idx] {
            return;
        }
        let capacity = self.capacity;
        self.buffers[idx]
            .get_or_insert_with(|| EventBuffer::new(capacity))
            .push(event);
    }

    /// Register a listener for one kind. Listeners run in registration order.
    pub fn on(&mut self, kind: EventKind, listener: Listener) {
        self.listeners.push((kind, listener));
    }

    /// Hand every buffered event to its listeners, then clear the buffers.
    pub fn deliver(&mut self) {
        for (idx, slot) in self.buffers.iter_mut().enumerate() {
            let Some(buffer) = slot.as_mut() else {
                continue;
            };
            for (kind, listener) in &mut self.listeners {
                if kind.index() != idx {
                    continue;
                }
                for event in buffer.iter() {
                    listener(event);
                }
            }
            buffer.clear();
        }
    }

    pub fn buffer(&self, kind: EventKind) -> Option<&EventBuffer> {
        self.buffers[kind.index()].as_ref()
    }

    /// Buffered events of one kind, oldest first.
    pub fn events(&self, kind: EventKind) -> impl Iterator<Item = &Event> + '_ {
        self.buffer(kind).into_iter().flat_map(|b| b.iter())
    }

    /// Number of buffered events of one kind.
    pub fn count(&self, kind: EventKind) -> usize {
        self.buffer(kind).map_or(0, |b| b.len())
    }

    /// Clear every buffer without delivering.
    pub fn clear(&mut self) {
        for buffer in self.buffers.iter_mut().flatten() {
            buffer.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
