use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::graph::{Graph, KeyId, RoomId, NULL_KEY};
use crate::placement::PlacementState;
use crate::validate::unreached_rooms;

/// Where one key ended up, by index and by name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyAssignment {
    pub key: KeyId,
    pub name: String,
    pub rooms: Vec<RoomId>,
    pub room_names: Vec<String>,
}

/// Result of a placement session, handed to the item pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementReport {
    pub seed: u64,
    pub valid: bool,
    pub unreached: Vec<RoomId>,
    pub placements: Vec<KeyAssignment>,
}

impl PlacementReport {
    pub fn new(graph: &Graph, state: &PlacementState, seed: u64) -> Self {
        let unreached = unreached_rooms(graph, state);
        let placements = graph
            .placeable_keys()
            .map(|key| {
                let rooms = state.rooms_of(key).to_vec();
                let room_names = rooms
                    .iter()
                    .map(|&room| graph.room(room).name.clone())
                    .collect();
                KeyAssignment {
                    key,
                    name: graph.key(key).name.clone(),
                    rooms,
                    room_names,
                }
            })
            .collect();

        Self {
            seed,
            valid: unreached.is_empty(),
            unreached,
            placements,
        }
    }

    pub fn rooms_of(&self, key: KeyId) -> Option<&[RoomId]> {
        self.placements
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.rooms.as_slice())
    }
}

/// Human-readable listing, one line per key.
pub fn render_spoiler(graph: &Graph, state: &PlacementState) -> String {
    let mut out = String::new();
    for (key, placement) in state.iter().filter(|&(key, _)| key != NULL_KEY) {
        let name = &graph.key(key).name;
        let rooms = &placement.rooms;
        if rooms.is_empty() {
            let _ = writeln!(out, "{} not placed", name);
        } else {
            let names: Vec<&str> = rooms
                .iter()
                .map(|&room| graph.room(room).name.as_str())
                .collect();
            let _ = writeln!(out, "{} in {}", name, names.join(","));
        }
    }
    out
}
