/// Map: the tile grid and all cross-cell logic.
///
/// Grid cell identity is positional; a "move" overwrites the destination
/// and resets the source to Air. The grid holds exactly one Player marker
/// cell, kept in sync with the actor's coordinates by `move_player`.
///
/// Out-of-bounds lookups read as Unbreakable wall, but levels are enclosed
/// by a border the loader enforces, so movement and push lookups never
/// actually leave the grid.

use std::rc::Rc;

use crate::domain::falling::{FallStrategy, FallingState};
use crate::domain::key::{KeyConfiguration, RemoveStrategy};
use crate::domain::player::Player;
use crate::domain::tile::Tile;
use crate::sim::event::GameEvent;
use crate::sim::level::{LevelError, RawTile};

/// Family-1 key/lock display color.
const GOLD: (u8, u8, u8) = (255, 204, 0);
/// Family-2 key/lock display color.
const AZURE: (u8, u8, u8) = (0, 204, 255);

#[derive(Debug)]
pub struct Map {
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
    events: Vec<GameEvent>,
}

// ── Construction ──

impl Map {
    /// Build the grid from raw level codes and hand back the actor placed
    /// at its start cell. The raw→tile transform is an exhaustive match:
    /// a new raw code cannot be silently defaulted.
    ///
    /// Each key/lock family shares a single configuration instance, so the
    /// key and every lock of its family observe the same color and flag.
    pub fn from_raw(raw: &[Vec<RawTile>]) -> Result<(Map, Player), LevelError> {
        let height = raw.len();
        let width = raw.first().map_or(0, |row| row.len());

        let gold = Rc::new(KeyConfiguration::new(GOLD, true, RemoveStrategy::Lock1));
        let azure = Rc::new(KeyConfiguration::new(AZURE, false, RemoveStrategy::Lock2));

        let mut start: Option<(usize, usize)> = None;
        let mut tiles: Vec<Vec<Tile>> = Vec::with_capacity(height);

        for (y, row) in raw.iter().enumerate() {
            let mut out: Vec<Tile> = Vec::with_capacity(width);
            for (x, code) in row.iter().enumerate() {
                let tile = match code {
                    RawTile::Air => Tile::Air,
                    RawTile::Flux => Tile::Flux,
                    RawTile::Unbreakable => Tile::Unbreakable,
                    RawTile::ActorStart => {
                        if start.is_some() {
                            return Err(LevelError::DuplicatePlayer { x, y });
                        }
                        start = Some((x, y));
                        Tile::Player
                    }
                    RawTile::Stone => Tile::Stone(FallStrategy::new(FallingState::Resting)),
                    RawTile::FallingStone => Tile::Stone(FallStrategy::new(FallingState::Falling)),
                    RawTile::Box => Tile::Box(FallStrategy::new(FallingState::Resting)),
                    RawTile::FallingBox => Tile::Box(FallStrategy::new(FallingState::Falling)),
                    RawTile::Key1 => Tile::Key(Rc::clone(&gold)),
                    RawTile::Lock1 => Tile::Lock(Rc::clone(&gold)),
                    RawTile::Key2 => Tile::Key(Rc::clone(&azure)),
                    RawTile::Lock2 => Tile::Lock(Rc::clone(&azure)),
                };
                out.push(tile);
            }
            tiles.push(out);
        }

        let (px, py) = start.ok_or(LevelError::MissingPlayer)?;
        let map = Map { tiles, width, height, events: Vec::new() };
        Ok((map, Player::new(px, py)))
    }
}

// ── Queries ──

impl Map {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Tile at (x, y). Out of bounds reads as wall.
    pub fn tile_at(&self, x: usize, y: usize) -> Tile {
        if x < self.width && y < self.height {
            self.tiles[y][x].clone()
        } else {
            Tile::Unbreakable
        }
    }

    pub fn is_air(&self, x: usize, y: usize) -> bool {
        if x < self.width && y < self.height {
            self.tiles[y][x].is_air()
        } else {
            false
        }
    }

    /// Support imposed on the tile at (x, y) by the cell directly below it.
    /// The map bottom counts as solid ground.
    pub fn support_below(&self, x: usize, y: usize) -> FallingState {
        if y + 1 >= self.height {
            return FallingState::Resting;
        }
        self.tiles[y + 1][x].support_state()
    }
}

// ── Per-tick update ──

impl Map {
    /// Advance every tile one tick. Rows run bottom-to-top, columns left to
    /// right; with the bottom row first, a stack losing support drops one
    /// row per block within a single tick.
    pub fn update(&mut self) {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                self.update_tile(x, y);
            }
        }
    }

    fn update_tile(&mut self, x: usize, y: usize) {
        let support = self.support_below(x, y);
        let fall = match self.tiles[y][x].fall_mut() {
            Some(fall) => fall,
            None => return,
        };
        let was_falling = fall.state().is_falling();
        if fall.update(support) {
            self.drop_tile(x, y);
        } else if was_falling {
            self.events.push(GameEvent::BlockLanded { x, y });
        }
    }

    /// Relocate the tile at (x, y) one row down; the vacated cell becomes
    /// Air.
    fn drop_tile(&mut self, x: usize, y: usize) {
        let tile = std::mem::replace(&mut self.tiles[y][x], Tile::Air);
        self.tiles[y + 1][x] = tile;
    }
}

// ── Movement ──

impl Map {
    /// Resolve the actor's attempt to step into (x+dx, y). The destination
    /// tile alone decides the outcome: open, blocked, push, or key pickup.
    pub fn move_horizontal(&mut self, player: &mut Player, x: usize, y: usize, dx: i32) {
        let tx = (x as i32 + dx) as usize;
        let target = self.tile_at(tx, y);
        match &target {
            Tile::Air | Tile::Flux => player.walk(self, dx, 0),
            Tile::Key(conf) => {
                conf.remove_lock(self);
                self.events.push(GameEvent::KeyCollected { x: tx, y });
                player.walk(self, dx, 0);
            }
            Tile::Stone(fall) | Tile::Box(fall) => {
                if fall.accepts_push() {
                    player.push_request(self, target.clone(), dx);
                }
            }
            Tile::Unbreakable | Tile::Lock(_) | Tile::Player => {}
        }
    }

    /// Resolve the actor's attempt to step into (x, y+dy). Blocks are never
    /// pushed vertically.
    pub fn move_vertical(&mut self, player: &mut Player, x: usize, y: usize, dy: i32) {
        let ty = (y as i32 + dy) as usize;
        let target = self.tile_at(x, ty);
        match &target {
            Tile::Air | Tile::Flux => player.walk(self, 0, dy),
            Tile::Key(conf) => {
                conf.remove_lock(self);
                self.events.push(GameEvent::KeyCollected { x, y: ty });
                player.walk(self, 0, dy);
            }
            Tile::Unbreakable
            | Tile::Lock(_)
            | Tile::Player
            | Tile::Stone(_)
            | Tile::Box(_) => {}
        }
    }

    /// Unconditional marker relocation: the old cell becomes Air, the new
    /// cell the player marker. Callers have already validated the move.
    pub fn move_player(&mut self, x: usize, y: usize, newx: usize, newy: usize) {
        self.tiles[y][x] = Tile::Air;
        self.tiles[newy][newx] = Tile::Player;
    }

    /// Push the block the actor at (x, y) is stepping into. The push and
    /// the step are atomic: either the block lands at (x+2dx, y) and the
    /// actor advances to (x+dx, y), or nothing changes.
    ///
    /// Preconditions: the cell two steps away is Air, and the cell below
    /// that destination is not Air. A block never comes to rest mid-air.
    pub fn push_horizontal(
        &mut self,
        player: &mut Player,
        tile: Tile,
        x: usize,
        y: usize,
        dx: i32,
    ) {
        let step = (x as i32 + dx) as usize;
        let dest = (x as i32 + 2 * dx) as usize;
        if self.is_air(dest, y) && !self.is_air(dest, y + 1) {
            self.tiles[y][dest] = tile;
            self.events.push(GameEvent::BlockPushed { x: dest, y, dx });
            player.move_to_tile(self, step, y);
        }
    }

    /// Replace with Air every tile the predicate selects.
    pub fn remove_matching(&mut self, strategy: RemoveStrategy) {
        let mut count = 0;
        for row in self.tiles.iter_mut() {
            for tile in row.iter_mut() {
                if strategy.check(tile) {
                    *tile = Tile::Air;
                    count += 1;
                }
            }
        }
        if count > 0 {
            self.events.push(GameEvent::LocksOpened { count });
        }
    }
}

// ── Events ──

impl Map {
    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

// ══════════════════════════════════════════════════════════════
// Unit tests
// ══════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn map_from(rows: &[&str]) -> (Map, Player) {
        let raw: Vec<Vec<RawTile>> = rows
            .iter()
            .map(|row| {
                row.chars()
                    .map(|ch| RawTile::from_char(ch).expect("legend char"))
                    .collect()
            })
            .collect();
        Map::from_raw(&raw).expect("valid test level")
    }

    fn dump(map: &Map) -> Vec<Vec<Tile>> {
        (0..map.height())
            .map(|y| (0..map.width()).map(|x| map.tile_at(x, y)).collect())
            .collect()
    }

    fn marker_count(map: &Map) -> usize {
        dump(map)
            .iter()
            .flatten()
            .filter(|t| **t == Tile::Player)
            .count()
    }

    fn fall_state(map: &Map, x: usize, y: usize) -> FallingState {
        map.tile_at(x, y).fall().expect("block expected").state()
    }

    // ── Gravity ──

    #[test]
    fn unsupported_block_falls_one_row_per_tick() {
        let (mut map, _player) = map_from(&[
            "#####",
            "#PS #",
            "#   #",
            "#   #",
            "#####",
        ]);

        map.update();
        assert!(map.is_air(2, 1));
        assert!(map.tile_at(2, 2).can_fall());
        assert_eq!(fall_state(&map, 2, 2), FallingState::Falling);

        map.update();
        assert!(map.is_air(2, 2));
        assert!(map.tile_at(2, 3).can_fall());
    }

    #[test]
    fn block_lands_and_stays_put() {
        let (mut map, _player) = map_from(&[
            "#####",
            "#PS #",
            "#   #",
            "#####",
        ]);

        map.update(); // drops to row 2
        map.update(); // floor below: lands
        assert_eq!(fall_state(&map, 2, 2), FallingState::Resting);
        let settled = dump(&map);

        for _ in 0..5 {
            map.update();
        }
        assert_eq!(dump(&map), settled);
    }

    #[test]
    fn landing_emits_event_once() {
        let (mut map, _player) = map_from(&[
            "#####",
            "#PS #",
            "#   #",
            "#####",
        ]);

        map.update();
        map.take_events();
        map.update();
        assert_eq!(map.take_events(), vec![GameEvent::BlockLanded { x: 2, y: 2 }]);
        map.update();
        assert_eq!(map.take_events(), vec![]);
    }

    #[test]
    fn stack_of_three_drops_as_a_unit_in_one_tick() {
        let (mut map, _player) = map_from(&[
            "#######",
            "#P S  #",
            "#  S  #",
            "#  S  #",
            "#     #",
            "#######",
        ]);

        map.update();

        assert!(map.is_air(3, 1));
        assert!(map.tile_at(3, 2).can_fall());
        assert!(map.tile_at(3, 3).can_fall());
        assert!(map.tile_at(3, 4).can_fall());
    }

    #[test]
    fn block_above_flux_drops_onto_it() {
        // Walkable cells give no support; the dropping block overwrites them.
        let (mut map, _player) = map_from(&[
            "#####",
            "#PS #",
            "# . #",
            "#####",
        ]);
        map.update();
        assert!(map.is_air(2, 1));
        assert!(map.tile_at(2, 2).can_fall());
    }

    #[test]
    fn block_above_key_drops_onto_it() {
        let (mut map, _player) = map_from(&[
            "#####",
            "#PB #",
            "# K #",
            "#####",
        ]);
        map.update();
        assert!(map.is_air(2, 1));
        assert!(map.tile_at(2, 2).can_fall());
    }

    // ── Push ──

    #[test]
    fn push_moves_block_and_actor_together() {
        let (mut map, mut player) = map_from(&[
            "######",
            "#PS  #",
            "######",
        ]);

        player.move_horizontal(&mut map, 1);

        assert!(map.tile_at(3, 1).can_fall());
        assert_eq!(map.tile_at(2, 1), Tile::Player);
        assert!(map.is_air(1, 1));
        assert_eq!((player.x(), player.y()), (2, 1));
        assert_eq!(marker_count(&map), 1);
    }

    #[test]
    fn push_into_occupied_cell_is_a_noop() {
        let (mut map, mut player) = map_from(&[
            "######",
            "#PSS #",
            "######",
        ]);
        let before = dump(&map);

        player.move_horizontal(&mut map, 1);

        assert_eq!(dump(&map), before);
        assert_eq!((player.x(), player.y()), (1, 1));
    }

    #[test]
    fn push_over_a_drop_is_a_noop() {
        // Two-ahead is Air but the cell below that destination is also Air:
        // the block would come to rest mid-air, so nothing happens.
        let (mut map, mut player) = map_from(&[
            "######",
            "#PS  #",
            "#    #",
            "######",
        ]);
        let before = dump(&map);

        player.move_horizontal(&mut map, 1);

        assert_eq!(dump(&map), before);
        assert_eq!((player.x(), player.y()), (1, 1));
    }

    #[test]
    fn falling_block_refuses_push() {
        let (mut map, mut player) = map_from(&[
            "######",
            "#Ps  #",
            "#    #",
            "######",
        ]);
        let before = dump(&map);

        player.move_horizontal(&mut map, 1);

        assert_eq!(dump(&map), before);
        assert_eq!((player.x(), player.y()), (1, 1));
    }

    #[test]
    fn push_works_leftward() {
        let (mut map, mut player) = map_from(&[
            "######",
            "#  SP#",
            "######",
        ]);

        player.move_horizontal(&mut map, -1);

        assert!(map.tile_at(2, 1).can_fall());
        assert_eq!(map.tile_at(3, 1), Tile::Player);
        assert_eq!((player.x(), player.y()), (3, 1));
    }

    // ── Plain movement ──

    #[test]
    fn actor_walks_into_air_and_flux() {
        let (mut map, mut player) = map_from(&[
            "#####",
            "#P .#",
            "#####",
        ]);

        player.move_horizontal(&mut map, 1);
        assert_eq!((player.x(), player.y()), (2, 1));
        assert!(map.is_air(1, 1));

        player.move_horizontal(&mut map, 1);
        assert_eq!((player.x(), player.y()), (3, 1));
        assert_eq!(marker_count(&map), 1);
    }

    #[test]
    fn actor_climbs_and_descends_open_cells() {
        let (mut map, mut player) = map_from(&[
            "#####",
            "# . #",
            "#P  #",
            "#####",
        ]);

        player.move_vertical(&mut map, -1);
        assert_eq!((player.x(), player.y()), (1, 1));

        player.move_vertical(&mut map, 1);
        assert_eq!((player.x(), player.y()), (1, 2));
        assert_eq!(marker_count(&map), 1);
    }

    #[test]
    fn walls_and_locks_block_silently_and_idempotently() {
        let (mut map, mut player) = map_from(&[
            "#####",
            "#LP #",
            "#####",
        ]);
        let before = dump(&map);

        for _ in 0..3 {
            player.move_horizontal(&mut map, -1);
            player.move_vertical(&mut map, -1);
            player.move_vertical(&mut map, 1);
        }

        assert_eq!(dump(&map), before);
        assert_eq!((player.x(), player.y()), (2, 1));
    }

    #[test]
    fn vertical_attempt_against_block_is_a_noop() {
        let (mut map, mut player) = map_from(&[
            "#####",
            "#S  #",
            "#P  #",
            "#####",
        ]);
        let before = dump(&map);

        player.move_vertical(&mut map, -1);

        assert_eq!(dump(&map), before);
        assert_eq!((player.x(), player.y()), (1, 2));
    }

    // ── Keys and locks ──

    #[test]
    fn key_opens_every_lock_of_its_family_only() {
        let (mut map, mut player) = map_from(&[
            "########",
            "#PK Ll #",
            "#  L   #",
            "########",
        ]);

        player.move_horizontal(&mut map, 1);

        // Both family-1 locks cleared, family-2 lock untouched.
        assert!(map.is_air(4, 1));
        assert!(map.is_air(3, 2));
        assert!(map.tile_at(5, 1).is_lock2());
        // The actor occupies the key's former cell.
        assert_eq!((player.x(), player.y()), (2, 1));
        assert_eq!(map.tile_at(2, 1), Tile::Player);
    }

    #[test]
    fn family_two_key_leaves_family_one_locks() {
        let (mut map, mut player) = map_from(&[
            "########",
            "#Pk Ll #",
            "########",
        ]);

        player.move_horizontal(&mut map, 1);

        assert!(map.is_air(5, 1));
        assert!(map.tile_at(4, 1).is_lock1());
        assert_eq!((player.x(), player.y()), (2, 1));
    }

    #[test]
    fn key_pickup_works_vertically() {
        let (mut map, mut player) = map_from(&[
            "#####",
            "#P L#",
            "#K  #",
            "#####",
        ]);

        player.move_vertical(&mut map, 1);

        assert!(map.is_air(3, 1));
        assert_eq!((player.x(), player.y()), (1, 2));
        assert_eq!(map.tile_at(1, 2), Tile::Player);
    }

    #[test]
    fn key_pickup_emits_events() {
        let (mut map, mut player) = map_from(&[
            "######",
            "#PKLL#",
            "######",
        ]);

        player.move_horizontal(&mut map, 1);

        assert_eq!(
            map.take_events(),
            vec![
                GameEvent::LocksOpened { count: 2 },
                GameEvent::KeyCollected { x: 2, y: 1 },
            ]
        );
    }

    // ── Construction ──

    #[test]
    fn from_raw_rejects_missing_player() {
        let raw = vec![vec![RawTile::Unbreakable; 3]; 3];
        assert!(matches!(Map::from_raw(&raw), Err(LevelError::MissingPlayer)));
    }

    #[test]
    fn from_raw_rejects_duplicate_player() {
        let mut raw = vec![vec![RawTile::Unbreakable; 4]; 3];
        raw[1][1] = RawTile::ActorStart;
        raw[1][2] = RawTile::ActorStart;
        assert!(matches!(
            Map::from_raw(&raw),
            Err(LevelError::DuplicatePlayer { x: 2, y: 1 })
        ));
    }

    #[test]
    fn keys_and_locks_of_a_family_share_one_configuration() {
        let (map, _player) = map_from(&[
            "######",
            "#PKLL#",
            "######",
        ]);

        let key = map.tile_at(2, 1);
        let lock_a = map.tile_at(3, 1);
        let lock_b = map.tile_at(4, 1);
        match (&key, &lock_a, &lock_b) {
            (Tile::Key(k), Tile::Lock(a), Tile::Lock(b)) => {
                assert!(Rc::ptr_eq(k, a));
                assert!(Rc::ptr_eq(a, b));
            }
            other => panic!("unexpected tiles: {other:?}"),
        }
    }
}
