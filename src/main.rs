/// Entry point and game loop.

mod config;
mod domain;
mod sim;
mod ui;

use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use config::GameConfig;
use domain::player::Player;
use sim::command::{Command, CommandQueue};
use sim::event::GameEvent;
use sim::level::{self, LevelDef};
use sim::map::Map;
use sim::step;
use ui::gamepad::GamepadState;
use ui::input::InputState;
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Title,
    Playing,
}

/// A running level: the simulation state plus its command queue.
pub struct Session {
    pub map: Map,
    pub player: Player,
    pub commands: CommandQueue,
    pub level_index: usize,
    pub name: String,
    pub tick: u64,
}

/// Shell-owned application state: phase, level list, the running session,
/// and the transient HUD message.
pub struct App {
    pub phase: Phase,
    pub levels: Vec<LevelDef>,
    pub cursor: usize,
    pub session: Option<Session>,
    pub message: String,
    pub message_timer: u32,
}

impl App {
    fn new(levels: Vec<LevelDef>) -> Self {
        App {
            phase: Phase::Title,
            levels,
            cursor: 0,
            session: None,
            message: String::new(),
            message_timer: 0,
        }
    }

    fn set_message(&mut self, msg: &str, duration: u32) {
        self.message = msg.to_string();
        self.message_timer = duration;
    }

    /// Start (or restart) the level at `index`. A level that fails to load
    /// drops back to the title screen with the error in the message line.
    fn start_level(&mut self, index: usize) {
        let def = match self.levels.get(index) {
            Some(def) => def.clone(),
            None => return,
        };
        match level::build(&def) {
            Ok((map, player)) => {
                self.session = Some(Session {
                    map,
                    player,
                    commands: CommandQueue::new(),
                    level_index: index,
                    name: def.name.clone(),
                    tick: 0,
                });
                self.phase = Phase::Playing;
                self.set_message(&def.name, 20);
            }
            Err(e) => {
                self.session = None;
                self.phase = Phase::Title;
                self.set_message(&format!("Cannot load {}: {e}", def.name), 60);
            }
        }
    }

    fn return_to_title(&mut self) {
        self.session = None;
        self.phase = Phase::Title;
        self.message.clear();
        self.message_timer = 0;
    }
}

fn main() {
    let config = GameConfig::load();

    let mut levels = level::load_from_directory(&config.levels_dir);
    if levels.is_empty() {
        levels = level::embedded_levels();
    }

    let mut app = App::new(levels);
    let mut renderer = Renderer::new();

    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }

    let result = game_loop(&mut app, &mut renderer, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    if let Err(e) = result {
        eprintln!("Game error: {e}");
    }

    println!();
    println!("Thanks for playing Keystone!");
}

fn game_loop(
    app: &mut App,
    renderer: &mut Renderer,
    config: &GameConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut kb = InputState::new();
    let mut gp = GamepadState::new();
    gp.load_button_config(&config.gamepad);
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(config.speed.tick_rate_ms);

    loop {
        kb.drain_events();
        gp.update();

        if kb.ctrl_c_pressed() {
            break;
        }
        if handle_meta(app, &kb, &gp) {
            break;
        }

        if app.phase == Phase::Playing {
            queue_movement(app, &kb, &gp);
        }

        if last_tick.elapsed() >= tick_rate {
            if app.message_timer > 0 {
                app.message_timer -= 1;
                if app.message_timer == 0 {
                    app.message.clear();
                }
            }

            if app.phase == Phase::Playing {
                let message = app.session.as_mut().map(|session| {
                    let events =
                        step::tick(&mut session.map, &mut session.player, &mut session.commands);
                    session.tick += 1;
                    describe_events(&events)
                });
                if let Some(Some(msg)) = message {
                    app.set_message(&msg, 12);
                }
            }

            last_tick = Instant::now();
        }

        renderer.render(app)?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

// ── Key Constants ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_RESTART: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_QUIT: &[KeyCode] = &[KeyCode::Char('q'), KeyCode::Char('Q')];

/// Map this frame's presses to queued commands, in arrival order.
fn queue_movement(app: &mut App, kb: &InputState, gp: &GamepadState) {
    let session = match app.session.as_mut() {
        Some(session) => session,
        None => return,
    };

    for code in kb.presses() {
        let command = if KEYS_LEFT.contains(code) {
            Some(Command::MoveLeft)
        } else if KEYS_RIGHT.contains(code) {
            Some(Command::MoveRight)
        } else if KEYS_UP.contains(code) {
            Some(Command::MoveUp)
        } else if KEYS_DOWN.contains(code) {
            Some(Command::MoveDown)
        } else {
            None
        };
        if let Some(command) = command {
            session.commands.push(command);
        }
    }

    if gp.left_pressed() {
        session.commands.push(Command::MoveLeft);
    }
    if gp.right_pressed() {
        session.commands.push(Command::MoveRight);
    }
    if gp.up_pressed() {
        session.commands.push(Command::MoveUp);
    }
    if gp.down_pressed() {
        session.commands.push(Command::MoveDown);
    }
}

/// Phase-dependent meta keys. Returns true to quit the program.
fn handle_meta(app: &mut App, kb: &InputState, gp: &GamepadState) -> bool {
    let confirm = kb.any_pressed(KEYS_CONFIRM) || gp.confirm_pressed();
    let esc = kb.any_pressed(&[KeyCode::Esc]) || gp.cancel_pressed();

    match app.phase {
        Phase::Title => {
            if kb.any_pressed(&[KeyCode::Up]) || gp.up_pressed() {
                if app.cursor > 0 {
                    app.cursor -= 1;
                }
            } else if kb.any_pressed(&[KeyCode::Down]) || gp.down_pressed() {
                if app.cursor + 1 < app.levels.len() {
                    app.cursor += 1;
                }
            } else if confirm {
                let cursor = app.cursor;
                app.start_level(cursor);
            } else if kb.any_pressed(KEYS_QUIT) || esc {
                return true;
            }
        }

        Phase::Playing => {
            if esc {
                app.return_to_title();
            } else if kb.any_pressed(KEYS_RESTART) || gp.restart_pressed() {
                let index = app.session.as_ref().map(|s| s.level_index);
                if let Some(index) = index {
                    app.start_level(index);
                    app.set_message("Level restarted", 20);
                }
            }
        }
    }

    false
}

/// One-line summary of a tick's events for the HUD, if anything notable
/// happened.
fn describe_events(events: &[GameEvent]) -> Option<String> {
    let mut opened = 0;
    let mut key = false;
    let mut pushed = false;
    for event in events {
        match event {
            GameEvent::LocksOpened { count } => opened += count,
            GameEvent::KeyCollected { .. } => key = true,
            GameEvent::BlockPushed { .. } => pushed = true,
            GameEvent::BlockLanded { .. } => {}
        }
    }

    if key {
        Some(match opened {
            0 => String::from("Key collected (no matching locks)"),
            1 => String::from("Key collected: 1 lock opens"),
            n => format!("Key collected: {n} locks open"),
        })
    } else if pushed {
        Some(String::from("Shoved"))
    } else {
        None
    }
}
