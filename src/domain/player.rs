/// The player: the only entity whose identity persists across ticks
/// independent of grid contents.
///
/// The player owns its coordinates; the map owns the corresponding marker
/// cell. `move_to_tile` is the single place coordinates change, which keeps
/// the two in sync.

use crate::domain::tile::Tile;
use crate::sim::map::Map;

#[derive(Clone, Debug)]
pub struct Player {
    x: usize,
    y: usize,
}

impl Player {
    pub fn new(x: usize, y: usize) -> Self {
        Player { x, y }
    }

    pub fn x(&self) -> usize {
        self.x
    }

    pub fn y(&self) -> usize {
        self.y
    }

    /// Ask the map to resolve a horizontal step; the destination tile
    /// decides the outcome.
    pub fn move_horizontal(&mut self, map: &mut Map, dx: i32) {
        let (x, y) = (self.x, self.y);
        map.move_horizontal(self, x, y, dx);
    }

    /// Ask the map to resolve a vertical step.
    pub fn move_vertical(&mut self, map: &mut Map, dy: i32) {
        let (x, y) = (self.x, self.y);
        map.move_vertical(self, x, y, dy);
    }

    /// Step by a validated delta. Callers have already established the
    /// destination is enterable.
    pub fn walk(&mut self, map: &mut Map, dx: i32, dy: i32) {
        let newx = (self.x as i32 + dx) as usize;
        let newy = (self.y as i32 + dy) as usize;
        self.move_to_tile(map, newx, newy);
    }

    /// Relocate to a cell: the map moves the marker, then the stored
    /// coordinates follow.
    pub fn move_to_tile(&mut self, map: &mut Map, newx: usize, newy: usize) {
        map.move_player(self.x, self.y, newx, newy);
        self.x = newx;
        self.y = newy;
    }

    /// Forward a push attempt against a resting block to the map, anchored
    /// at the player's own position.
    pub fn push_request(&mut self, map: &mut Map, tile: Tile, dx: i32) {
        let (x, y) = (self.x, self.y);
        map.push_horizontal(self, tile, x, y, dx);
    }
}
