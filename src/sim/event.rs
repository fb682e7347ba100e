/// Events emitted during a simulation tick.
/// The presentation layer consumes these for the HUD message line.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(dead_code)]
pub enum GameEvent {
    KeyCollected { x: usize, y: usize },
    LocksOpened { count: usize },
    BlockPushed { x: usize, y: usize, dx: i32 },
    BlockLanded { x: usize, y: usize },
}
