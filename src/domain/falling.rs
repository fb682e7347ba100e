/// The fall state machine for gravity-affected blocks.
///
/// A block is either Falling (unsupported, drops one row per tick) or
/// Resting (supported, accepts horizontal pushes). The two are mutually
/// exclusive: a falling block never accepts a push, a resting block never
/// drops.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FallingState {
    Falling,
    Resting,
}

impl FallingState {
    pub fn is_falling(self) -> bool {
        matches!(self, FallingState::Falling)
    }

    pub fn is_resting(self) -> bool {
        matches!(self, FallingState::Resting)
    }
}

/// Owns one block's FallingState and re-derives it every tick from the
/// support imposed by the cell below the block.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FallStrategy {
    state: FallingState,
}

impl FallStrategy {
    pub fn new(state: FallingState) -> Self {
        FallStrategy { state }
    }

    pub fn state(self) -> FallingState {
        self.state
    }

    /// Adopt the support state of the cell below.
    /// Returns true when the block must drop one row this tick.
    pub fn update(&mut self, support: FallingState) -> bool {
        self.state = support;
        self.state.is_falling()
    }

    /// A resting block accepts a horizontal push; a falling one refuses.
    pub fn accepts_push(self) -> bool {
        self.state.is_resting()
    }
}
