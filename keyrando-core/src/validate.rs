use log::warn;
use thiserror::Error;

use crate::graph::{Door, Graph, RoomId, NULL_KEY, START_ROOM};
use crate::placement::PlacementState;

/// A finished placement leaves some rooms out of reach.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("placement is not solvable, unreached rooms: {}", .names.join(", "))]
pub struct ValidationError {
    pub unreached: Vec<RoomId>,
    pub names: Vec<String>,
}

/// Strict playthrough of a completed placement.
///
/// Keys only count once a copy has been placed and the room holding it has
/// been visited during this walk. Undecided keys never open anything.
pub fn check_solution(graph: &Graph, state: &PlacementState) -> Result<(), ValidationError> {
    let unreached = unreached_rooms(graph, state);
    if unreached.is_empty() {
        return Ok(());
    }

    let names: Vec<String> = unreached
        .iter()
        .map(|&room| graph.room(room).name.clone())
        .collect();
    for name in &names {
        warn!("cannot visit: {}", name);
    }

    Err(ValidationError { unreached, names })
}

pub fn validate(graph: &Graph, state: &PlacementState) -> bool {
    check_solution(graph, state).is_ok()
}

/// Rooms the strict walk never visits, ascending.
pub fn unreached_rooms(graph: &Graph, state: &PlacementState) -> Vec<RoomId> {
    let mut visited = vec![false; graph.room_count()];
    let mut obtained = vec![false; graph.key_count()];
    obtained[NULL_KEY] = true;

    visited[START_ROOM] = true;
    collect_keys(state, START_ROOM, &mut obtained);

    let mut stalled: Vec<&Door> = graph.doors_from(START_ROOM).collect();
    loop {
        let mut doors = std::mem::take(&mut stalled);
        let mut progress = false;

        while let Some(door) = doors.pop() {
            if visited[door.to] {
                continue;
            }
            if door.keys.iter().all(|&key| obtained[key]) {
                visited[door.to] = true;
                collect_keys(state, door.to, &mut obtained);
                doors.extend(graph.doors_from(door.to));
                progress = true;
            } else {
                stalled.push(door);
            }
        }

        if !progress {
            break;
        }
    }

    visited
        .iter()
        .enumerate()
        .filter_map(|(room, &seen)| (!seen).then_some(room))
        .collect()
}

fn collect_keys(state: &PlacementState, room: RoomId, obtained: &mut [bool]) {
    for key in state.keys_in(room) {
        obtained[key] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> Graph {
        let mut b = Graph::builder();
        let start = b.room("Start");
        let end = b.room("End");
        let red = b.key("Red", 1);
        b.door(start, end, &[red]).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn accepts_key_in_start_room() {
        let graph = line();
        let mut state = PlacementState::new(&graph);
        state.place(1, 0);
        assert!(validate(&graph, &state));
        assert!(unreached_rooms(&graph, &state).is_empty());
    }

    #[test]
    fn rejects_key_behind_its_own_door() {
        let graph = line();
        let mut state = PlacementState::new(&graph);
        state.place(1, 1);

        let err = check_solution(&graph, &state).unwrap_err();
        assert_eq!(err.unreached, vec![1]);
        assert_eq!(err.names, vec!["End".to_string()]);
        assert!(err.to_string().contains("End"));
    }

    #[test]
    fn undecided_key_is_never_assumed() {
        let graph = line();
        let state = PlacementState::new(&graph);
        assert!(!validate(&graph, &state));
    }

    #[test]
    fn keys_picked_up_on_the_way_open_later_doors() {
        let mut b = Graph::builder();
        let start = b.room("Start");
        let hall = b.room("Hall");
        let vault = b.room("Vault");
        let red = b.key("Red", 1);
        let blue = b.key("Blue", 1);
        b.door(start, vault, &[red, blue]).unwrap();
        b.door(start, hall, &[red]).unwrap();
        let graph = b.build().unwrap();

        let mut state = PlacementState::new(&graph);
        state.place(red, start);
        state.place(blue, hall);
        assert!(validate(&graph, &state));
    }

    #[test]
    fn single_room_graph_is_trivially_solved() {
        let mut b = Graph::builder();
        b.room("Only");
        let graph = b.build().unwrap();
        assert!(validate(&graph, &PlacementState::new(&graph)));
    }
}
