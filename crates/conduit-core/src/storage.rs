//! Containers that receptacle nodes deposit into.

use crate::id::{ContainerId, ItemId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub trait Storage {
    /// Try to place `item` in `container`. Returns whether it was accepted.
    fn try_deposit(&mut self, container: ContainerId, item: ItemId) -> bool;
}

/// A bounded list of stored items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub capacity: usize,
    pub items: Vec<ItemId>,
}

impl Container {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }
}

#[derive(Debug, Default)]
pub struct ContainerStore {
    containers: BTreeMap<ContainerId, Container>,
}

impl ContainerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a container.
    pub fn add_container(&mut self, id: ContainerId, capacity: usize) {
        self.containers.insert(id, Container::new(capacity));
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    /// Stored items, oldest first. Empty for unknown containers.
    pub fn contents(&self, id: ContainerId) -> &[ItemId] {
        self.containers
            .get(&id)
            .map(|c| c.items.as_slice())
            .unwrap_or(&[])
    }

    /// Take an item back out of a container.
    pub fn withdraw(&mut self, id: ContainerId, item: ItemId) -> bool {
        let Some(container) = self.containers.get_mut(&id) else {
            return false;
        };
        match container.items.iter().position(|i| *i == item) {
            Some(index) => {
                container.items.remove(index);
                true
            }
            None => false,
        }
    }
}

impl Storage for ContainerStore {
    fn try_deposit(&mut self, container: ContainerId, item: ItemId) -> bool {
        match self.containers.get_mut(&container) {
            Some(c) if !c.is_full() => {
                c.items.push(item);
                true
            }
            _ => false,
        }
    }
}
