use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::engine::PlacementError;
use crate::graph::{Graph, KeyId, RoomId, NULL_KEY};

/// Story keys that always land in one room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PinnedKey {
    pub key: String,
    pub room: String,
}

/// Keys whose candidate rooms are declared up front instead of computed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RestrictedKey {
    pub key: String,
    pub rooms: Vec<String>,
}

/// Declarative per-key placement rules, as read from the overrides file.
///
/// ```json
/// {
///   "pinned": [{ "key": "Kill Iron King", "room": "Iron Keep" }],
///   "restricted": [],
///   "early_access": [{ "key": "Blacksmith Key", "rooms": ["Start", "Town"] }]
/// }
/// ```
///
/// `early_access` entries only apply when early placement is switched on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlacementOverrides {
    #[serde(default)]
    pub pinned: Vec<PinnedKey>,
    #[serde(default)]
    pub restricted: Vec<RestrictedKey>,
    #[serde(default)]
    pub early_access: Vec<RestrictedKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyRule {
    Pinned(RoomId),
    Restricted(Vec<RoomId>),
}

/// Resolved rules keyed by key index, consulted by the engine before it
/// falls back to reachability.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    rules: BTreeMap<KeyId, KeyRule>,
}

impl OverrideTable {
    pub fn rule(&self, key: KeyId) -> Option<&KeyRule> {
        self.rules.get(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn pin(&mut self, graph: &Graph, key: KeyId, room: RoomId) -> Result<(), PlacementError> {
        self.insert(graph, key, KeyRule::Pinned(room))
    }

    pub fn restrict(
        &mut self,
        graph: &Graph,
        key: KeyId,
        rooms: Vec<RoomId>,
    ) -> Result<(), PlacementError> {
        self.insert(graph, key, KeyRule::Restricted(rooms))
    }

    fn insert(&mut self, graph: &Graph, key: KeyId, rule: KeyRule) -> Result<(), PlacementError> {
        if key == NULL_KEY {
            return Err(PlacementError::SentinelOverride);
        }
        if key >= graph.key_count() {
            return Err(PlacementError::KeyOutOfRange {
                key,
                key_count: graph.key_count(),
            });
        }
        let rooms = match &rule {
            KeyRule::Pinned(room) => std::slice::from_ref(room),
            KeyRule::Restricted(rooms) => rooms.as_slice(),
        };
        if let Some(&room) = rooms.iter().find(|&&room| room >= graph.room_count()) {
            return Err(PlacementError::RoomOutOfRange {
                key: graph.key(key).name.clone(),
                room,
                room_count: graph.room_count(),
            });
        }
        if self.rules.contains_key(&key) {
            return Err(PlacementError::ConflictingOverride {
                key: graph.key(key).name.clone(),
            });
        }
        self.rules.insert(key, rule);
        Ok(())
    }
}

impl PlacementOverrides {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Resolves key and room names against `graph`.
    pub fn resolve(&self, graph: &Graph, early_placement: bool) -> Result<OverrideTable, PlacementError> {
        let mut table = OverrideTable::default();

        for pin in &self.pinned {
            let key = lookup_key(graph, &pin.key)?;
            let room = lookup_room(graph, &pin.room)?;
            table.pin(graph, key, room)?;
        }

        let early: &[RestrictedKey] = if early_placement {
            self.early_access.as_slice()
        } else {
            &[]
        };
        for entry in self.restricted.iter().chain(early) {
            let key = lookup_key(graph, &entry.key)?;
            let rooms = entry
                .rooms
                .iter()
                .map(|name| lookup_room(graph, name))
                .collect::<Result<Vec<_>, _>>()?;
            table.restrict(graph, key, rooms)?;
        }

        Ok(table)
    }
}

fn lookup_key(graph: &Graph, name: &str) -> Result<KeyId, PlacementError> {
    graph
        .key_by_name(name)
        .ok_or_else(|| PlacementError::UnknownKey {
            name: name.to_string(),
        })
}

fn lookup_room(graph: &Graph, name: &str) -> Result<RoomId, PlacementError> {
    graph
        .room_by_name(name)
        .ok_or_else(|| PlacementError::UnknownRoom {
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        let mut b = Graph::builder();
        b.room("Start");
        b.room("Town");
        b.room("Keep");
        b.key("Smith Key", 1);
        b.key("Boss Kill", 1);
        b.build().unwrap()
    }

    fn overrides() -> PlacementOverrides {
        serde_json::from_str(
            r#"{
                "pinned": [{ "key": "Boss Kill", "room": "Keep" }],
                "early_access": [{ "key": "Smith Key", "rooms": ["Start", "Town"] }]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_with_missing_sections() {
        let o = overrides();
        assert_eq!(o.pinned.len(), 1);
        assert!(o.restricted.is_empty());
        assert_eq!(o.early_access[0].rooms, vec!["Start", "Town"]);
    }

    #[test]
    fn early_access_only_with_flag() {
        let g = graph();
        let off = overrides().resolve(&g, false).unwrap();
        assert_eq!(off.len(), 1);
        assert_eq!(off.rule(2), Some(&KeyRule::Pinned(2)));
        assert_eq!(off.rule(1), None);

        let on = overrides().resolve(&g, true).unwrap();
        assert_eq!(on.rule(1), Some(&KeyRule::Restricted(vec![0, 1])));
    }

    #[test]
    fn unknown_names_are_rejected() {
        let g = graph();
        let mut o = PlacementOverrides::default();
        o.pinned.push(PinnedKey {
            key: "Boss Kill".into(),
            room: "Nowhere".into(),
        });
        assert!(matches!(
            o.resolve(&g, false),
            Err(PlacementError::UnknownRoom { name }) if name == "Nowhere"
        ));

        o.pinned[0] = PinnedKey {
            key: "Missing".into(),
            room: "Keep".into(),
        };
        assert!(matches!(
            o.resolve(&g, false),
            Err(PlacementError::UnknownKey { .. })
        ));
    }

    #[test]
    fn a_key_gets_one_rule() {
        let g = graph();
        let mut o = overrides();
        o.restricted.push(RestrictedKey {
            key: "Boss Kill".into(),
            rooms: vec!["Town".into()],
        });
        assert!(matches!(
            o.resolve(&g, false),
            Err(PlacementError::ConflictingOverride { key }) if key == "Boss Kill"
        ));
    }

    #[test]
    fn sentinel_cannot_be_pinned() {
        let g = graph();
        let mut table = OverrideTable::default();
        assert!(matches!(
            table.pin(&g, NULL_KEY, 0),
            Err(PlacementError::SentinelOverride)
        ));
    }

    #[test]
    fn rules_must_name_existing_rooms() {
        let g = graph();
        let mut table = OverrideTable::default();
        assert_eq!(
            table.pin(&g, 2, 99),
            Err(PlacementError::RoomOutOfRange {
                key: "Boss Kill".into(),
                room: 99,
                room_count: 3,
            })
        );
        assert!(matches!(
            table.restrict(&g, 1, vec![0, 42]),
            Err(PlacementError::RoomOutOfRange { room: 42, .. })
        ));
        assert!(table.is_empty());

        table.restrict(&g, 1, vec![0, 2]).unwrap();
        assert!(!table.is_empty());
    }

    #[test]
    fn rules_must_name_existing_keys() {
        let g = graph();
        let mut table = OverrideTable::default();
        assert_eq!(
            table.pin(&g, 3, 0),
            Err(PlacementError::KeyOutOfRange {
                key: 3,
                key_count: 3,
            })
        );
        assert!(table.is_empty());
    }
}
