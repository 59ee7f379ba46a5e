use log::debug;

use crate::graph::{Door, Graph, KeyId, RoomId, START_ROOM};
use crate::placement::PlacementState;

/// Rooms reachable from the start room under the optimistic rule used while
/// placing keys, sorted ascending.
///
/// For every key a door requires (the sentinel is ignored):
///
/// - `excluded` never opens the door, so a key cannot guard its own spot;
/// - an undecided key is assumed obtainable;
/// - a decided key needs at least one placed copy already inside the set.
///
/// Passing [`crate::graph::NULL_KEY`] as `excluded` excludes nothing.
pub fn compute_reachable(graph: &Graph, state: &PlacementState, excluded: KeyId) -> Vec<RoomId> {
    let visited = flood(graph, state, excluded, |_| {});
    compress(&visited)
}

/// Same traversal as [`compute_reachable`], returning the reachable set as
/// it stood after every round. The last entry is the fixed point.
pub fn reachable_by_round(
    graph: &Graph,
    state: &PlacementState,
    excluded: KeyId,
) -> Vec<Vec<RoomId>> {
    let mut rounds = Vec::new();
    flood(graph, state, excluded, |visited| rounds.push(compress(visited)));
    rounds
}

fn door_passable(door: &Door, state: &PlacementState, excluded: KeyId, visited: &[bool]) -> bool {
    door.required_keys().all(|key| {
        if key == excluded {
            return false;
        }
        let rooms = state.rooms_of(key);
        rooms.is_empty() || rooms.iter().any(|&room| visited[room])
    })
}

// Round-based worklist. Doors that fail in a round wait for the next one;
// the walk stops on the first round that opens nothing, so cycles of
// mutually gated rooms cannot keep it spinning.
fn flood(
    graph: &Graph,
    state: &PlacementState,
    excluded: KeyId,
    mut on_round: impl FnMut(&[bool]),
) -> Vec<bool> {
    let mut visited = vec![false; graph.room_count()];
    visited[START_ROOM] = true;

    let mut waiting: Vec<&Door> = graph.doors_from(START_ROOM).collect();
    let mut rounds = 0usize;

    loop {
        let mut active = std::mem::take(&mut waiting);
        let mut progress = false;

        while let Some(door) = active.pop() {
            if visited[door.to] {
                continue;
            }
            if door_passable(door, state, excluded, &visited) {
                visited[door.to] = true;
                active.extend(graph.doors_from(door.to));
                progress = true;
            } else {
                waiting.push(door);
            }
        }

        rounds += 1;
        on_round(&visited);
        if !progress {
            break;
        }
    }

    debug!(
        "reachability: excluded={} rounds={} reached={}/{}",
        excluded,
        rounds,
        visited.iter().filter(|&&v| v).count(),
        graph.room_count()
    );

    visited
}

fn compress(visited: &[bool]) -> Vec<RoomId> {
    visited
        .iter()
        .enumerate()
        .filter_map(|(room, &seen)| seen.then_some(room))
        .collect()
}
