/// Level loading and validation.
///
/// ## Sources (priority order):
///   1. Configured levels directory (individual `.txt` files, sorted by name)
///   2. Built-in embedded levels
///
/// ## Single-level format (`.txt`):
///   Line 1 (optional): `# Level Name`
///   Remaining lines: map rows, one character per cell
///
/// ## Tile legend:
///   '#' = Unbreakable wall     ' ' = Air
///   '.' = Flux ground          'P' = Player start
///   'S' = Stone                's' = Stone, already falling
///   'B' = Box                  'b' = Box, already falling
///   'K' = Key 1                'L' = Lock 1
///   'k' = Key 2                'l' = Lock 2
///
/// A level must be rectangular and fully enclosed by Unbreakable tiles;
/// loading fails otherwise. Movement and push lookups rely on that closed
/// border to never index outside the grid, so a level that violates it is
/// rejected rather than loaded partially.

use std::path::Path;

use thiserror::Error;

use crate::domain::player::Player;
use crate::sim::map::Map;

/// The closed set of raw tile codes a level cell may hold.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RawTile {
    Air,
    Flux,
    Unbreakable,
    ActorStart,
    Stone,
    FallingStone,
    Box,
    FallingBox,
    Key1,
    Lock1,
    Key2,
    Lock2,
}

impl RawTile {
    pub fn from_char(ch: char) -> Option<RawTile> {
        match ch {
            ' ' => Some(RawTile::Air),
            '.' => Some(RawTile::Flux),
            '#' => Some(RawTile::Unbreakable),
            'P' => Some(RawTile::ActorStart),
            'S' => Some(RawTile::Stone),
            's' => Some(RawTile::FallingStone),
            'B' => Some(RawTile::Box),
            'b' => Some(RawTile::FallingBox),
            'K' => Some(RawTile::Key1),
            'L' => Some(RawTile::Lock1),
            'k' => Some(RawTile::Key2),
            'l' => Some(RawTile::Lock2),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("unrecognized tile code {code:?} at column {x}, row {y}")]
    UnknownTile { code: char, x: usize, y: usize },
    #[error("level has no rows")]
    Empty,
    #[error("row {y} is {len} cells wide, expected {expected}")]
    NotRectangular { y: usize, len: usize, expected: usize },
    #[error("level border is open at column {x}, row {y}")]
    OpenBorder { x: usize, y: usize },
    #[error("level has no player start")]
    MissingPlayer,
    #[error("level has a second player start at column {x}, row {y}")]
    DuplicatePlayer { x: usize, y: usize },
}

/// Runtime level data (owned strings, loaded from file or embedded).
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

impl LevelDef {
    /// Parse `.txt` content: optional `# Name` header, then map rows.
    /// Trailing blank lines are dropped; interior blanks stay and fail
    /// validation later.
    pub fn from_text(fallback_name: &str, text: &str) -> LevelDef {
        let mut lines = text.lines().peekable();
        let mut name = fallback_name.to_string();
        if let Some(first) = lines.peek() {
            // The top border row is solid wall, so "# " can only be a header.
            if let Some(rest) = first.strip_prefix("# ") {
                name = rest.trim().to_string();
                lines.next();
            }
        }
        let mut rows: Vec<String> = lines.map(|l| l.trim_end_matches('\r').to_string()).collect();
        while rows.last().map_or(false, |l| l.trim().is_empty()) {
            rows.pop();
        }
        LevelDef { name, rows }
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// Parse and validate a level, producing the map and the placed actor.
/// Construction is all-or-nothing: any malformed input fails the whole
/// level.
pub fn build(def: &LevelDef) -> Result<(Map, Player), LevelError> {
    let raw = parse_rows(&def.rows)?;
    validate_border(&raw)?;
    Map::from_raw(&raw)
}

/// Decode rows of legend characters into raw tile codes.
pub fn parse_rows(rows: &[String]) -> Result<Vec<Vec<RawTile>>, LevelError> {
    if rows.is_empty() {
        return Err(LevelError::Empty);
    }
    let expected = rows[0].chars().count();
    if expected == 0 {
        return Err(LevelError::Empty);
    }

    let mut raw: Vec<Vec<RawTile>> = Vec::with_capacity(rows.len());
    for (y, row) in rows.iter().enumerate() {
        let mut out: Vec<RawTile> = Vec::with_capacity(expected);
        for (x, ch) in row.chars().enumerate() {
            match RawTile::from_char(ch) {
                Some(code) => out.push(code),
                None => return Err(LevelError::UnknownTile { code: ch, x, y }),
            }
        }
        if out.len() != expected {
            return Err(LevelError::NotRectangular { y, len: out.len(), expected });
        }
        raw.push(out);
    }
    Ok(raw)
}

/// Every edge cell must be Unbreakable.
fn validate_border(raw: &[Vec<RawTile>]) -> Result<(), LevelError> {
    let height = raw.len();
    let width = raw[0].len();
    for (y, row) in raw.iter().enumerate() {
        for (x, code) in row.iter().enumerate() {
            let edge = y == 0 || y == height - 1 || x == 0 || x == width - 1;
            if edge && *code != RawTile::Unbreakable {
                return Err(LevelError::OpenBorder { x, y });
            }
        }
    }
    Ok(())
}

/// Load all `.txt` levels from a directory, sorted by file name.
/// Unreadable files are skipped.
pub fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let mut defs: Vec<LevelDef> = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return defs,
    };

    let mut paths: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |ext| ext == "txt"))
        .collect();
    paths.sort();

    for path in paths {
        if let Ok(text) = std::fs::read_to_string(&path) {
            let fallback = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| String::from("Unnamed"));
            defs.push(LevelDef::from_text(&fallback, &text));
        }
    }
    defs
}

// ══════════════════════════════════════════════════════════════
// Built-in levels
// ══════════════════════════════════════════════════════════════

pub fn embedded_levels() -> Vec<LevelDef> {
    fn def(name: &str, rows: &[&str]) -> LevelDef {
        LevelDef {
            name: name.to_string(),
            rows: rows.iter().map(|r| r.to_string()).collect(),
        }
    }

    vec![
        def(
            "First Steps",
            &[
                "########",
                "#P ..# #",
                "#S#B.# #",
                "#KS..# #",
                "#S...L #",
                "########",
            ],
        ),
        def(
            "Two of a Kind",
            &[
                "##########",
                "#P       #",
                "#.. B  S.#",
                "#   ...  #",
                "# k .l.  #",
                "#.#...#..#",
                "#K..L..l.#",
                "##########",
            ],
        ),
        def(
            "Rockfall",
            &[
                "########",
                "#P     #",
                "# SSS  #",
                "# S S  #",
                "#      #",
                "#  B   #",
                "#......#",
                "########",
            ],
        ),
    ]
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(rows: &[&str]) -> Vec<String> {
        rows.iter().map(|r| r.to_string()).collect()
    }

    // ── Parsing ──

    #[test]
    fn legend_covers_every_raw_code() {
        for (ch, code) in [
            (' ', RawTile::Air),
            ('.', RawTile::Flux),
            ('#', RawTile::Unbreakable),
            ('P', RawTile::ActorStart),
            ('S', RawTile::Stone),
            ('s', RawTile::FallingStone),
            ('B', RawTile::Box),
            ('b', RawTile::FallingBox),
            ('K', RawTile::Key1),
            ('L', RawTile::Lock1),
            ('k', RawTile::Key2),
            ('l', RawTile::Lock2),
        ] {
            assert_eq!(RawTile::from_char(ch), Some(code));
        }
    }

    #[test]
    fn unknown_code_fails_parsing() {
        let err = parse_rows(&rows(&["###", "#?#", "###"])).unwrap_err();
        assert!(matches!(err, LevelError::UnknownTile { code: '?', x: 1, y: 1 }));
    }

    #[test]
    fn ragged_rows_fail_parsing() {
        let err = parse_rows(&rows(&["####", "##", "####"])).unwrap_err();
        assert!(matches!(err, LevelError::NotRectangular { y: 1, len: 2, expected: 4 }));
    }

    #[test]
    fn empty_level_fails_parsing() {
        assert!(matches!(parse_rows(&rows(&[])), Err(LevelError::Empty)));
        assert!(matches!(parse_rows(&rows(&[""])), Err(LevelError::Empty)));
    }

    // ── Validation ──

    #[test]
    fn open_border_is_rejected() {
        let def = LevelDef {
            name: String::from("t"),
            rows: rows(&["####", "#P  ", "####"]),
        };
        let err = build(&def).unwrap_err();
        assert!(matches!(err, LevelError::OpenBorder { x: 3, y: 1 }));
    }

    #[test]
    fn missing_player_is_rejected() {
        let def = LevelDef {
            name: String::from("t"),
            rows: rows(&["####", "#  #", "####"]),
        };
        assert!(matches!(build(&def), Err(LevelError::MissingPlayer)));
    }

    #[test]
    fn valid_level_builds_with_actor_at_start() {
        let def = LevelDef {
            name: String::from("t"),
            rows: rows(&["#####", "# P #", "#####"]),
        };
        let (map, player) = build(&def).expect("level should build");
        assert_eq!((map.width(), map.height()), (5, 3));
        assert_eq!((player.x(), player.y()), (2, 1));
    }

    // ── Text format ──

    #[test]
    fn header_line_names_the_level() {
        let def = LevelDef::from_text("fallback", "# The Vault\n###\n#P#\n###\n");
        assert_eq!(def.name, "The Vault");
        assert_eq!(def.rows.len(), 3);
    }

    #[test]
    fn missing_header_falls_back_to_file_name() {
        let def = LevelDef::from_text("vault", "###\n#P#\n###\n");
        assert_eq!(def.name, "vault");
        assert_eq!(def.rows.len(), 3);
    }

    #[test]
    fn trailing_blank_lines_are_dropped() {
        let def = LevelDef::from_text("t", "###\n#P#\n###\n\n\n");
        assert_eq!(def.rows.len(), 3);
    }

    // ── Built-ins ──

    #[test]
    fn embedded_levels_all_build() {
        let levels = embedded_levels();
        assert!(!levels.is_empty());
        for def in &levels {
            build(def).unwrap_or_else(|e| panic!("{}: {e}", def.name));
        }
    }
}
