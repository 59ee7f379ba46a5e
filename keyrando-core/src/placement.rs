use crate::graph::{Graph, KeyId, RoomId, NULL_KEY};

/// Where the copies of one key ended up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyPlacement {
    pub rooms: Vec<RoomId>,
    pub remaining: u32,
}

/// Mutable half of a solve: one [`KeyPlacement`] per key, indexed by key id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementState {
    placements: Vec<KeyPlacement>,
}

impl PlacementState {
    pub fn new(graph: &Graph) -> Self {
        let placements = graph
            .keys()
            .iter()
            .map(|key| KeyPlacement {
                rooms: Vec::new(),
                remaining: key.copies,
            })
            .collect();
        Self { placements }
    }

    /// A key is decided once at least one copy has been placed.
    pub fn is_decided(&self, key: KeyId) -> bool {
        !self.placements[key].rooms.is_empty()
    }

    pub fn rooms_of(&self, key: KeyId) -> &[RoomId] {
        &self.placements[key].rooms
    }

    pub fn remaining(&self, key: KeyId) -> u32 {
        self.placements[key].remaining
    }

    pub fn key_count(&self) -> usize {
        self.placements.len()
    }

    /// Records one copy of `key` in `room`. The sentinel is never placed.
    pub fn place(&mut self, key: KeyId, room: RoomId) {
        debug_assert_ne!(key, NULL_KEY, "the sentinel key is never placed");
        let entry = &mut self.placements[key];
        entry.rooms.push(room);
        entry.remaining = entry.remaining.saturating_sub(1);
    }

    /// Keys that have a copy in `room`.
    pub fn keys_in(&self, room: RoomId) -> impl Iterator<Item = KeyId> + '_ {
        self.placements
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.rooms.contains(&room))
            .map(|(key, _)| key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (KeyId, &KeyPlacement)> {
        self.placements.iter().enumerate()
    }
}
