/// Gamepad input tracker using gilrs.
///
/// The game is turn-stepped, so movement uses edge triggers: one command
/// per d-pad press, or per stick deflection past the deadzone. Meta button
/// mapping is loaded from config.toml via `load_button_config()`.
///
/// Default mapping:
///   D-pad / Left Stick    →  Movement
///   Start / A             →  Confirm
///   Select / B            →  Cancel
///   Start                 →  Restart

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};

use crate::config::GamepadConfig;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.5;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Btn {
    A,      // South
    B,      // East
    X,      // West
    Y,      // North
    Start,
    Select,
}

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }

    fn index(self) -> usize {
        match self {
            Btn::A => 0,
            Btn::B => 1,
            Btn::X => 2,
            Btn::Y => 3,
            Btn::Start => 4,
            Btn::Select => 5,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn press(&mut self) {
        if !self.held {
            self.just_pressed = true;
        }
        self.held = true;
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release(&mut self) {
        self.held = false;
    }
}

/// Action-to-button mapping (loaded from config).
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    restart: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::Start, Btn::A],
            cancel: vec![Btn::Select, Btn::B],
            restart: vec![Btn::Start],
        }
    }
}

const DIR_UP: usize = 0;
const DIR_DOWN: usize = 1;
const DIR_LEFT: usize = 2;
const DIR_RIGHT: usize = 3;

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; 6],
    dirs: [BtnState; 4],

    #[cfg(feature = "gamepad")]
    stick_x: f32,
    #[cfg(feature = "gamepad")]
    stick_y: f32,

    action_map: ActionMap,
}

impl GamepadState {
    pub fn new() -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: Gilrs::new().ok(),
            buttons: [BtnState::default(); 6],
            dirs: [BtnState::default(); 4],
            #[cfg(feature = "gamepad")]
            stick_x: 0.0,
            #[cfg(feature = "gamepad")]
            stick_y: 0.0,
            action_map: ActionMap::default(),
        }
    }

    /// Replace the default action mapping with config-named buttons.
    /// Unknown names are skipped; an action with no valid names keeps its
    /// defaults.
    pub fn load_button_config(&mut self, cfg: &GamepadConfig) {
        fn parse(names: &[String]) -> Vec<Btn> {
            names.iter().filter_map(|n| Btn::from_name(n)).collect()
        }
        let confirm = parse(&cfg.confirm);
        if !confirm.is_empty() {
            self.action_map.confirm = confirm;
        }
        let cancel = parse(&cfg.cancel);
        if !cancel.is_empty() {
            self.action_map.cancel = cancel;
        }
        let restart = parse(&cfg.restart);
        if !restart.is_empty() {
            self.action_map.restart = restart;
        }
    }

    /// Pump pending gamepad events. Call once per frame.
    #[cfg(feature = "gamepad")]
    pub fn update(&mut self) {
        for b in self.buttons.iter_mut() {
            b.just_pressed = false;
        }
        for d in self.dirs.iter_mut() {
            d.just_pressed = false;
        }

        let gilrs = match self.gilrs.as_mut() {
            Some(g) => g,
            None => return,
        };

        let mut stick_x = self.stick_x;
        let mut stick_y = self.stick_y;

        while let Some(ev) = gilrs.next_event() {
            match ev.event {
                EventType::ButtonPressed(btn, _) => match btn {
                    Button::DPadUp => self.dirs[DIR_UP].press(),
                    Button::DPadDown => self.dirs[DIR_DOWN].press(),
                    Button::DPadLeft => self.dirs[DIR_LEFT].press(),
                    Button::DPadRight => self.dirs[DIR_RIGHT].press(),
                    other => {
                        if let Some(b) = Btn::from_gilrs(other) {
                            self.buttons[b.index()].press();
                        }
                    }
                },
                EventType::ButtonReleased(btn, _) => match btn {
                    Button::DPadUp => self.dirs[DIR_UP].release(),
                    Button::DPadDown => self.dirs[DIR_DOWN].release(),
                    Button::DPadLeft => self.dirs[DIR_LEFT].release(),
                    Button::DPadRight => self.dirs[DIR_RIGHT].release(),
                    other => {
                        if let Some(b) = Btn::from_gilrs(other) {
                            self.buttons[b.index()].release();
                        }
                    }
                },
                EventType::AxisChanged(Axis::LeftStickX, v, _) => stick_x = v,
                EventType::AxisChanged(Axis::LeftStickY, v, _) => stick_y = v,
                _ => {}
            }
        }

        // Stick edges: entering the deadzone boundary counts as one press.
        // gilrs reports stick up as positive Y.
        self.stick_edge(DIR_LEFT, self.stick_x <= -STICK_DEADZONE, stick_x <= -STICK_DEADZONE);
        self.stick_edge(DIR_RIGHT, self.stick_x >= STICK_DEADZONE, stick_x >= STICK_DEADZONE);
        self.stick_edge(DIR_UP, self.stick_y >= STICK_DEADZONE, stick_y >= STICK_DEADZONE);
        self.stick_edge(DIR_DOWN, self.stick_y <= -STICK_DEADZONE, stick_y <= -STICK_DEADZONE);
        self.stick_x = stick_x;
        self.stick_y = stick_y;
    }

    #[cfg(not(feature = "gamepad"))]
    pub fn update(&mut self) {
        for b in self.buttons.iter_mut() {
            b.just_pressed = false;
        }
        for d in self.dirs.iter_mut() {
            d.just_pressed = false;
        }
    }

    #[cfg(feature = "gamepad")]
    fn stick_edge(&mut self, dir: usize, was: bool, now: bool) {
        if now && !was {
            self.dirs[dir].just_pressed = true;
        }
    }

    // ── Queries ──

    pub fn up_pressed(&self) -> bool {
        self.dirs[DIR_UP].just_pressed
    }

    pub fn down_pressed(&self) -> bool {
        self.dirs[DIR_DOWN].just_pressed
    }

    pub fn left_pressed(&self) -> bool {
        self.dirs[DIR_LEFT].just_pressed
    }

    pub fn right_pressed(&self) -> bool {
        self.dirs[DIR_RIGHT].just_pressed
    }

    pub fn confirm_pressed(&self) -> bool {
        self.any_action_pressed(&self.action_map.confirm)
    }

    pub fn cancel_pressed(&self) -> bool {
        self.any_action_pressed(&self.action_map.cancel)
    }

    pub fn restart_pressed(&self) -> bool {
        self.any_action_pressed(&self.action_map.restart)
    }

    fn any_action_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|b| self.buttons[b.index()].just_pressed)
    }
}
