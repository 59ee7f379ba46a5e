use log::{debug, warn};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::graph::{Graph, GraphBuilder, GraphError, KeyId, MAX_DOOR_KEYS};

/// Errors that can occur while reading a graph description.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("graph description declares no rooms")]
    NoRooms,

    #[error("malformed {section} entry on line {line}: '{text}'")]
    Malformed {
        line: usize,
        section: &'static str,
        text: String,
    },

    #[error("failed to parse copy count '{token}' on line {line}")]
    ParseCount {
        line: usize,
        token: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("duplicate {kind} name '{name}' on line {line}")]
    DuplicateName {
        line: usize,
        kind: &'static str,
        name: String,
    },

    #[error("unknown room '{name}' on line {line}")]
    UnknownRoom { line: usize, name: String },

    #[error("unknown key '{name}' on line {line}")]
    UnknownKey { line: usize, name: String },

    #[error("door on line {line} lists {got} keys, at most {max} are allowed")]
    TooManyKeys { line: usize, got: usize, max: usize },

    #[error("invalid door on line {line}")]
    Graph {
        line: usize,
        #[source]
        source: GraphError,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Section {
    None,
    Rooms,
    Keys,
    Doors,
    Unknown,
}

/// Parse a graph description.
///
/// ```text
/// #ROOMS
/// Things Betwixt
/// Majula
/// #KEYS
/// Rotunda Lockstone,1
/// #DOORS
/// Things Betwixt,Majula,()
/// Majula,Heides Tower,(Rotunda Lockstone)
/// ```
///
/// - `#ROOMS`: one name per line. The first room is the start room.
/// - `#KEYS`: `name,copies`.
/// - `#DOORS`: `from,to,(key1;key2;...)` with at most four keys; `()` means
///   the door is open.
///
/// Blank lines, lines starting with `//`, and lines shorter than two
/// characters are ignored. Any other `#` header closes the current section.
/// The `NULL` sentinel key is always created first.
pub fn parse_graph(src: &str) -> Result<Graph, ParseError> {
    let mut builder = GraphBuilder::new();
    let mut section = Section::None;

    for (idx, raw_line) in src.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('#') {
            section = match line {
                "#ROOMS" => Section::Rooms,
                "#KEYS" => Section::Keys,
                "#DOORS" => Section::Doors,
                _ => {
                    debug!("line {}: skipping section {}", line_no, line);
                    Section::Unknown
                }
            };
            continue;
        }

        if line.starts_with("//") || line.len() < 2 {
            continue;
        }

        match section {
            Section::Rooms => parse_room(&mut builder, line_no, line)?,
            Section::Keys => parse_key(&mut builder, line_no, line)?,
            Section::Doors => parse_door(&mut builder, line_no, line)?,
            Section::Unknown => {}
            Section::None => {
                warn!("line {}: '{}' is outside any section, ignored", line_no, line);
            }
        }
    }

    match builder.build() {
        Ok(graph) => Ok(graph),
        Err(GraphError::NoRooms) => Err(ParseError::NoRooms),
        // Doors are range-checked as they are read.
        Err(source) => Err(ParseError::Graph { line: 0, source }),
    }
}

/// Read and parse a graph description file.
pub fn load_graph(path: &Path) -> crate::Result<Graph> {
    let src = fs::read_to_string(path)?;
    let graph = parse_graph(&src)?;
    debug!(
        "loaded {}: {} rooms, {} keys, {} doors",
        path.display(),
        graph.room_count(),
        graph.key_count() - 1,
        graph.doors().len()
    );
    Ok(graph)
}

fn parse_room(builder: &mut GraphBuilder, line: usize, text: &str) -> Result<(), ParseError> {
    if builder.room_by_name(text).is_some() {
        return Err(ParseError::DuplicateName {
            line,
            kind: "room",
            name: text.to_string(),
        });
    }
    builder.room(text);
    Ok(())
}

fn parse_key(builder: &mut GraphBuilder, line: usize, text: &str) -> Result<(), ParseError> {
    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    let [name, count] = tokens.as_slice() else {
        return Err(ParseError::Malformed {
            line,
            section: "key",
            text: text.to_string(),
        });
    };
    if name.is_empty() {
        return Err(ParseError::Malformed {
            line,
            section: "key",
            text: text.to_string(),
        });
    }

    let copies = count.parse::<u32>().map_err(|e| ParseError::ParseCount {
        line,
        token: count.to_string(),
        source: e,
    })?;

    if builder.key_by_name(name).is_some() {
        return Err(ParseError::DuplicateName {
            line,
            kind: "key",
            name: name.to_string(),
        });
    }
    builder.key(*name, copies);
    Ok(())
}

fn parse_door(builder: &mut GraphBuilder, line: usize, text: &str) -> Result<(), ParseError> {
    let tokens: Vec<&str> = text.split(',').map(str::trim).collect();
    let [from, to, keys] = tokens.as_slice() else {
        return Err(ParseError::Malformed {
            line,
            section: "door",
            text: text.to_string(),
        });
    };

    let from = builder
        .room_by_name(from)
        .ok_or_else(|| ParseError::UnknownRoom {
            line,
            name: from.to_string(),
        })?;
    let to = builder
        .room_by_name(to)
        .ok_or_else(|| ParseError::UnknownRoom {
            line,
            name: to.to_string(),
        })?;

    let inner = keys
        .strip_prefix('(')
        .and_then(|k| k.strip_suffix(')'))
        .ok_or_else(|| ParseError::Malformed {
            line,
            section: "door",
            text: text.to_string(),
        })?;

    let names: Vec<&str> = inner
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();
    if names.len() > MAX_DOOR_KEYS {
        return Err(ParseError::TooManyKeys {
            line,
            got: names.len(),
            max: MAX_DOOR_KEYS,
        });
    }

    let mut required: Vec<KeyId> = Vec::with_capacity(names.len());
    for name in names {
        let key = builder
            .key_by_name(name)
            .ok_or_else(|| ParseError::UnknownKey {
                line,
                name: name.to_string(),
            })?;
        required.push(key);
    }

    builder
        .door(from, to, &required)
        .map_err(|source| ParseError::Graph { line, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NULL_KEY;

    const FIVE_ROOMS: &str = "\
// cross-dependency fixture
#ROOMS
Start
Hub
West
East
Tower
#KEYS
Red,1
Blue,1
Green,1
Yellow,1
Magenta,2
#DOORS
Start,Hub,(Magenta)
Hub,Tower,(Red)
Hub,West,(Blue)
Hub,East,(Yellow)
West,East,(Green)
East,West,(Green)
";

    #[test]
    fn counts_match_source() {
        let graph = parse_graph(FIVE_ROOMS).unwrap();
        assert_eq!(graph.room_count(), 5);
        // Sentinel plus five declared keys.
        assert_eq!(graph.key_count(), 6);
        assert_eq!(graph.doors().len(), 6);
        assert_eq!(graph.key(NULL_KEY).name, "NULL");
        assert_eq!(graph.key_by_name("Magenta"), Some(5));
        assert_eq!(graph.key(5).copies, 2);
        assert_eq!(graph.room_by_name("Tower"), Some(4));
    }

    #[test]
    fn door_keys_resolve_in_order() {
        let graph = parse_graph(
            "#ROOMS\nStart\nVault\n#KEYS\nRed,1\nBlue,1\n#DOORS\nStart,Vault,(Blue;Red)\n",
        )
        .unwrap();
        assert_eq!(graph.doors()[0].keys, [2, 1, NULL_KEY, NULL_KEY]);
    }

    #[test]
    fn empty_parens_mean_open_door() {
        let graph = parse_graph("#ROOMS\nStart\nHall\n#DOORS\nStart,Hall,()\n").unwrap();
        assert_eq!(graph.doors()[0].keys, [NULL_KEY; MAX_DOOR_KEYS]);
    }

    #[test]
    fn tolerates_crlf_comments_and_unknown_sections() {
        let src = "#ROOMS\r\nStart\r\n// note\r\n#NOTES\r\nanything goes here\r\n#KEYS\r\nRed,1\r\n";
        let graph = parse_graph(src).unwrap();
        assert_eq!(graph.room_count(), 1);
        assert_eq!(graph.key_count(), 2);
    }

    #[test]
    fn unknown_room_is_an_error() {
        let err = parse_graph("#ROOMS\nStart\n#DOORS\nStart,Nowhere,()\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnknownRoom { line: 4, ref name } if name == "Nowhere"
        ));
    }

    #[test]
    fn unknown_key_is_an_error() {
        let err = parse_graph("#ROOMS\nStart\nHall\n#DOORS\nStart,Hall,(Red)\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownKey { line: 5, .. }));
    }

    #[test]
    fn fifth_key_is_an_error() {
        let src = "#ROOMS\nStart\nHall\n#KEYS\nA1,1\nB1,1\nC1,1\nD1,1\nE1,1\n#DOORS\nStart,Hall,(A1;B1;C1;D1;E1)\n";
        let err = parse_graph(src).unwrap_err();
        assert!(matches!(err, ParseError::TooManyKeys { got: 5, max: 4, .. }));
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(matches!(
            parse_graph("#ROOMS\nStart\n#KEYS\nRed\n"),
            Err(ParseError::Malformed { section: "key", .. })
        ));
        assert!(matches!(
            parse_graph("#ROOMS\nStart\n#KEYS\nRed,lots\n"),
            Err(ParseError::ParseCount { .. })
        ));
        assert!(matches!(
            parse_graph("#ROOMS\nStart\nHall\n#DOORS\nStart,Hall\n"),
            Err(ParseError::Malformed { section: "door", .. })
        ));
        assert!(matches!(
            parse_graph("#ROOMS\nStart\nHall\n#DOORS\nStart,Hall,Red\n"),
            Err(ParseError::Malformed { section: "door", .. })
        ));
    }

    #[test]
    fn duplicates_and_empty_input_are_errors() {
        assert!(matches!(
            parse_graph("#ROOMS\nStart\nStart\n"),
            Err(ParseError::DuplicateName { kind: "room", .. })
        ));
        assert!(matches!(
            parse_graph("#ROOMS\nStart\n#KEYS\nNULL,1\n"),
            Err(ParseError::DuplicateName { kind: "key", .. })
        ));
        assert!(matches!(parse_graph("#KEYS\nRed,1\n"), Err(ParseError::NoRooms)));
    }
}
