/// The tick function: advances the world by one turn.
///
/// Two phases, in order:
///   1. Apply at most one queued command (the destination tile arbitrates).
///   2. Run the map's update pass once, to completion.
///
/// Everything is synchronous; there is no mutation of the grid outside
/// these two phases. Rendering happens after the tick, read-only.

use crate::domain::player::Player;
use crate::sim::command::CommandQueue;
use crate::sim::event::GameEvent;
use crate::sim::map::Map;

pub fn tick(map: &mut Map, player: &mut Player, commands: &mut CommandQueue) -> Vec<GameEvent> {
    if let Some(command) = commands.pop() {
        command.apply(map, player);
    }
    map.update();
    map.take_events()
}
