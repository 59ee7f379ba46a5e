use thiserror::Error;

pub type RoomId = usize;
pub type KeyId = usize;

/// Room every traversal starts from.
pub const START_ROOM: RoomId = 0;

/// Sentinel key meaning "no requirement". Never placed, always satisfied.
pub const NULL_KEY: KeyId = 0;

pub const NULL_KEY_NAME: &str = "NULL";

/// Maximum number of keys a single door can require.
pub const MAX_DOOR_KEYS: usize = 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("graph has no rooms")]
    NoRooms,

    #[error("door {from} -> {to} references a room outside 0..{room_count}")]
    RoomOutOfRange {
        from: RoomId,
        to: RoomId,
        room_count: usize,
    },

    #[error("door {from} -> {to} requires key {key} but only {key_count} keys exist")]
    KeyOutOfRange {
        from: RoomId,
        to: RoomId,
        key: KeyId,
        key_count: usize,
    },

    #[error("door {from} -> {to} requires {got} keys, at most 4 are allowed")]
    TooManyKeys { from: RoomId, to: RoomId, got: usize },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Room {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Key {
    pub name: String,
    pub copies: u32,
}

/// Directed, locked passage. Unused key slots hold [`NULL_KEY`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Door {
    pub from: RoomId,
    pub to: RoomId,
    pub keys: [KeyId; MAX_DOOR_KEYS],
}

impl Door {
    /// Required keys with the sentinel slots filtered out.
    pub fn required_keys(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.keys.iter().copied().filter(|&k| k != NULL_KEY)
    }

    pub fn requires(&self, key: KeyId) -> bool {
        key != NULL_KEY && self.keys.contains(&key)
    }
}

/// Immutable progression graph. Built once per session through
/// [`GraphBuilder`] or the text loader.
#[derive(Clone, Debug)]
pub struct Graph {
    rooms: Vec<Room>,
    keys: Vec<Key>,
    doors: Vec<Door>,
    outgoing: Vec<Vec<usize>>,
}

impl Graph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::new()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Includes the sentinel at index 0.
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn doors(&self) -> &[Door] {
        &self.doors
    }

    pub fn room(&self, id: RoomId) -> &Room {
        &self.rooms[id]
    }

    pub fn key(&self, id: KeyId) -> &Key {
        &self.keys[id]
    }

    /// Doors leaving `room`.
    pub fn doors_from(&self, room: RoomId) -> impl Iterator<Item = &Door> + '_ {
        self.outgoing[room].iter().map(move |&d| &self.doors[d])
    }

    /// Every real key, skipping the sentinel.
    pub fn placeable_keys(&self) -> impl Iterator<Item = KeyId> {
        1..self.keys.len()
    }

    pub fn room_by_name(&self, name: &str) -> Option<RoomId> {
        self.rooms.iter().position(|r| r.name == name)
    }

    pub fn key_by_name(&self, name: &str) -> Option<KeyId> {
        self.keys.iter().position(|k| k.name == name)
    }
}

/// Assembles a [`Graph`], validating indices on [`GraphBuilder::build`].
///
/// The sentinel key is always present at index 0.
#[derive(Debug)]
pub struct GraphBuilder {
    rooms: Vec<Room>,
    keys: Vec<Key>,
    doors: Vec<Door>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            rooms: Vec::new(),
            keys: vec![Key {
                name: NULL_KEY_NAME.to_string(),
                copies: 1,
            }],
            doors: Vec::new(),
        }
    }

    pub fn room(&mut self, name: impl Into<String>) -> RoomId {
        self.rooms.push(Room { name: name.into() });
        self.rooms.len() - 1
    }

    pub fn key(&mut self, name: impl Into<String>, copies: u32) -> KeyId {
        self.keys.push(Key {
            name: name.into(),
            copies,
        });
        self.keys.len() - 1
    }

    /// Adds a door requiring every key in `keys` (AND semantics).
    pub fn door(&mut self, from: RoomId, to: RoomId, keys: &[KeyId]) -> Result<(), GraphError> {
        if keys.len() > MAX_DOOR_KEYS {
            return Err(GraphError::TooManyKeys {
                from,
                to,
                got: keys.len(),
            });
        }
        let mut slots = [NULL_KEY; MAX_DOOR_KEYS];
        slots[..keys.len()].copy_from_slice(keys);
        self.doors.push(Door {
            from,
            to,
            keys: slots,
        });
        Ok(())
    }

    pub fn room_by_name(&self, name: &str) -> Option<RoomId> {
        self.rooms.iter().position(|r| r.name == name)
    }

    pub fn key_by_name(&self, name: &str) -> Option<KeyId> {
        self.keys.iter().position(|k| k.name == name)
    }

    pub fn build(self) -> Result<Graph, GraphError> {
        let room_count = self.rooms.len();
        if room_count == 0 {
            return Err(GraphError::NoRooms);
        }

        let mut outgoing = vec![Vec::new(); room_count];
        for (idx, door) in self.doors.iter().enumerate() {
            if door.from >= room_count || door.to >= room_count {
                return Err(GraphError::RoomOutOfRange {
                    from: door.from,
                    to: door.to,
                    room_count,
                });
            }
            if let Some(&key) = door.keys.iter().find(|&&k| k >= self.keys.len()) {
                return Err(GraphError::KeyOutOfRange {
                    from: door.from,
                    to: door.to,
                    key,
                    key_count: self.keys.len(),
                });
            }
            outgoing[door.from].push(idx);
        }

        Ok(Graph {
            rooms: self.rooms,
            keys: self.keys,
            doors: self.doors,
            outgoing,
        })
    }
}
