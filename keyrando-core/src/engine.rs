use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::graph::{Graph, KeyId, RoomId, NULL_KEY};
use crate::overrides::{KeyRule, OverrideTable};
use crate::placement::PlacementState;
use crate::reachability::compute_reachable;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no candidate room left for key '{key}'")]
    NoCandidates { key: String },

    #[error("placement override names unknown key '{name}'")]
    UnknownKey { name: String },

    #[error("placement override names unknown room '{name}'")]
    UnknownRoom { name: String },

    #[error("key '{key}' has more than one placement override")]
    ConflictingOverride { key: String },

    #[error("the sentinel key cannot carry a placement override")]
    SentinelOverride,

    #[error("placement override names key {key} but only {key_count} keys exist")]
    KeyOutOfRange { key: KeyId, key_count: usize },

    #[error("placement override for key '{key}' names room {room} but only {room_count} rooms exist")]
    RoomOutOfRange {
        key: String,
        room: RoomId,
        room_count: usize,
    },
}

/// Assigns every key copy to a room so the graph stays traversable.
pub struct PlacementEngine<'g> {
    graph: &'g Graph,
    overrides: &'g OverrideTable,
}

impl<'g> PlacementEngine<'g> {
    pub fn new(graph: &'g Graph, overrides: &'g OverrideTable) -> Self {
        Self { graph, overrides }
    }

    /// Runs one placement pass.
    ///
    /// Pinned keys go in first. The rest are shuffled and placed copy by
    /// copy, each copy drawing uniformly from its restricted rooms or from
    /// the rooms reachable without it.
    pub fn solve<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PlacementState, PlacementError> {
        let graph = self.graph;
        let mut state = PlacementState::new(graph);
        let mut deck: Vec<KeyId> = Vec::new();

        for key in graph.placeable_keys() {
            match self.overrides.rule(key) {
                Some(&KeyRule::Pinned(room)) => {
                    let copies = graph.key(key).copies.max(1);
                    for _ in 0..copies {
                        state.place(key, room);
                    }
                    debug!(
                        "pinned {} x{} in {}",
                        graph.key(key).name,
                        copies,
                        graph.room(room).name
                    );
                }
                _ => deck.push(key),
            }
        }

        deck.shuffle(rng);

        for key in deck {
            while state.remaining(key) > 0 {
                let candidates = self.candidates(&state, key);
                let room = *candidates
                    .choose(rng)
                    .ok_or_else(|| PlacementError::NoCandidates {
                        key: graph.key(key).name.clone(),
                    })?;
                state.place(key, room);
                debug!(
                    "placed {} in {} ({} candidates)",
                    graph.key(key).name,
                    graph.room(room).name,
                    candidates.len()
                );
            }
        }

        Ok(state)
    }

    fn candidates(&self, state: &PlacementState, key: KeyId) -> Vec<RoomId> {
        debug_assert_ne!(key, NULL_KEY);
        match self.overrides.rule(key) {
            Some(KeyRule::Restricted(rooms)) => rooms.clone(),
            _ => compute_reachable(self.graph, state, key),
        }
    }
}

/// Places every key with no overrides.
pub fn solve<R: Rng + ?Sized>(graph: &Graph, rng: &mut R) -> Result<PlacementState, PlacementError> {
    PlacementEngine::new(graph, &OverrideTable::default()).solve(rng)
}
