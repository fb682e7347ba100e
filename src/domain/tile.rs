/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.
///
/// Every query answers for the tile's own identity only; anything that
/// needs a neighbor lives on the Map.

use std::rc::Rc;

use crate::domain::falling::{FallStrategy, FallingState};
use crate::domain::key::KeyConfiguration;

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Tile {
    Air,
    /// Walkable ground decoration.
    Flux,
    /// Blocks all interaction.
    Unbreakable,
    /// Marker occupying the actor's own cell.
    Player,
    Stone(FallStrategy),
    Box(FallStrategy),
    Key(Rc<KeyConfiguration>),
    Lock(Rc<KeyConfiguration>),
}

impl Tile {
    pub fn is_air(&self) -> bool {
        matches!(self, Tile::Air)
    }

    /// Is this a family-1 lock? False for every non-lock.
    pub fn is_lock1(&self) -> bool {
        matches!(self, Tile::Lock(conf) if conf.is_family_one())
    }

    /// Is this a family-2 lock? False for every non-lock.
    pub fn is_lock2(&self) -> bool {
        matches!(self, Tile::Lock(conf) if !conf.is_family_one())
    }

    /// The state this cell imposes on whatever sits directly above it.
    /// Walkable cells give no support; solid cells do.
    pub fn support_state(&self) -> FallingState {
        match self {
            Tile::Air | Tile::Flux | Tile::Key(_) => FallingState::Falling,
            Tile::Unbreakable
            | Tile::Player
            | Tile::Stone(_)
            | Tile::Box(_)
            | Tile::Lock(_) => FallingState::Resting,
        }
    }

    /// Is this a gravity-affected block?
    pub fn can_fall(&self) -> bool {
        matches!(self, Tile::Stone(_) | Tile::Box(_))
    }

    /// Fall state of a gravity-affected block, if any.
    #[allow(dead_code)]
    pub fn fall(&self) -> Option<FallStrategy> {
        match self {
            Tile::Stone(fall) | Tile::Box(fall) => Some(*fall),
            _ => None,
        }
    }

    pub fn fall_mut(&mut self) -> Option<&mut FallStrategy> {
        match self {
            Tile::Stone(fall) | Tile::Box(fall) => Some(fall),
            _ => None,
        }
    }
}

/// Shared tile fixtures for unit tests across the crate.
#[cfg(test)]
pub mod test_support {
    use std::rc::Rc;

    use super::Tile;
    use crate::domain::falling::{FallStrategy, FallingState};
    use crate::domain::key::{KeyConfiguration, RemoveStrategy};

    pub fn gold_config() -> Rc<KeyConfiguration> {
        Rc::new(KeyConfiguration::new((255, 204, 0), true, RemoveStrategy::Lock1))
    }

    pub fn azure_config() -> Rc<KeyConfiguration> {
        Rc::new(KeyConfiguration::new((0, 204, 255), false, RemoveStrategy::Lock2))
    }

    pub fn key1() -> Tile {
        Tile::Key(gold_config())
    }

    pub fn lock1() -> Tile {
        Tile::Lock(gold_config())
    }

    pub fn key2() -> Tile {
        Tile::Key(azure_config())
    }

    pub fn lock2() -> Tile {
        Tile::Lock(azure_config())
    }

    pub fn stone(state: FallingState) -> Tile {
        Tile::Stone(FallStrategy::new(state))
    }

    pub fn boxed(state: FallingState) -> Tile {
        Tile::Box(FallStrategy::new(state))
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn only_air_is_air() {
        assert!(Tile::Air.is_air());
        assert!(!Tile::Flux.is_air());
        assert!(!stone(FallingState::Resting).is_air());
        assert!(!lock1().is_air());
    }

    #[test]
    fn lock_family_derives_from_configuration() {
        assert!(lock1().is_lock1());
        assert!(!lock1().is_lock2());
        assert!(lock2().is_lock2());
        assert!(!lock2().is_lock1());
    }

    #[test]
    fn non_locks_belong_to_no_family() {
        for tile in [Tile::Air, Tile::Unbreakable, key1(), key2(), boxed(FallingState::Resting)] {
            assert!(!tile.is_lock1());
            assert!(!tile.is_lock2());
        }
    }

    #[test]
    fn walkable_cells_impose_falling() {
        assert_eq!(Tile::Air.support_state(), FallingState::Falling);
        assert_eq!(Tile::Flux.support_state(), FallingState::Falling);
        assert_eq!(key1().support_state(), FallingState::Falling);
    }

    #[test]
    fn solid_cells_impose_resting() {
        assert_eq!(Tile::Unbreakable.support_state(), FallingState::Resting);
        assert_eq!(Tile::Player.support_state(), FallingState::Resting);
        assert_eq!(stone(FallingState::Falling).support_state(), FallingState::Resting);
        assert_eq!(boxed(FallingState::Resting).support_state(), FallingState::Resting);
        assert_eq!(lock2().support_state(), FallingState::Resting);
    }

    #[test]
    fn only_blocks_expose_fall_state() {
        assert!(stone(FallingState::Falling).fall().is_some());
        assert!(boxed(FallingState::Resting).fall().is_some());
        assert!(Tile::Air.fall().is_none());
        assert!(key1().fall().is_none());
    }
}
