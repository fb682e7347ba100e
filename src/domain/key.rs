/// Key/lock pairing.
///
/// A KeyConfiguration describes one key/lock family: its display color,
/// which family it is, and the predicate that clears its locks. One
/// instance is shared (by Rc) between the key tile and every lock tile of
/// the family, so all of them observe the same color and family flag.

use crate::domain::tile::Tile;
use crate::sim::map::Map;

/// Predicate selecting which lock variant to clear from the map.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RemoveStrategy {
    Lock1,
    Lock2,
}

impl RemoveStrategy {
    /// Does this strategy clear the given tile?
    pub fn check(self, tile: &Tile) -> bool {
        match self {
            RemoveStrategy::Lock1 => tile.is_lock1(),
            RemoveStrategy::Lock2 => tile.is_lock2(),
        }
    }
}

/// Immutable descriptor for one key/lock family.
#[derive(PartialEq, Eq, Debug)]
pub struct KeyConfiguration {
    color: (u8, u8, u8),
    family_one: bool,
    remove: RemoveStrategy,
}

impl KeyConfiguration {
    pub fn new(color: (u8, u8, u8), family_one: bool, remove: RemoveStrategy) -> Self {
        KeyConfiguration { color, family_one, remove }
    }

    /// Is this the family-1 configuration?
    pub fn is_family_one(&self) -> bool {
        self.family_one
    }

    /// Display color. Logic never reads this; it is the only externally
    /// distinguishing signal, so the renderer needs it.
    pub fn color(&self) -> (u8, u8, u8) {
        self.color
    }

    /// Clear every lock of this family from the map.
    pub fn remove_lock(&self, map: &mut Map) {
        map.remove_matching(self.remove);
    }
}
