/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// This eliminates flicker caused by full-screen redraws. The renderer is
/// a read-only pass over the app state; it never mutates the simulation.

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::tile::Tile;
use crate::{App, Phase};

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" terminal cells. Matches the
    /// Clear color so inter-row gap pixels blend with cell backgrounds.
    const BASE_BG: Color = Color::Rgb { r: 18, g: 18, b: 28 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
    /// Different from any real cell, so every position will be diff'd.
    const INVALID: Cell = Cell { ch: '?', fg: Color::Magenta, bg: Color::Magenta };
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y) with given colors. Each char occupies 1 column.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, fg, bg });
            cx += 1;
        }
    }
}

// ── Tile appearance ──

/// Each game cell spans 2 terminal columns.
const CELL_W: usize = 2;

/// Vertical offsets
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

const FLUX_BG: Color = Color::Rgb { r: 204, g: 255, b: 204 };
const WALL_BG: Color = Color::Rgb { r: 153, g: 153, b: 153 };
const PLAYER_BG: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const STONE_BG: Color = Color::Rgb { r: 0, g: 0, b: 204 };
const BOX_BG: Color = Color::Rgb { r: 139, g: 69, b: 19 };

fn rgb(color: (u8, u8, u8)) -> Color {
    Color::Rgb { r: color.0, g: color.1, b: color.2 }
}

/// The two terminal cells for one game cell.
fn tile_cells(tile: &Tile) -> [Cell; CELL_W] {
    let solid = |bg: Color| [Cell { ch: ' ', fg: Color::White, bg }; CELL_W];
    match tile {
        Tile::Air => [Cell::BLANK; CELL_W],
        Tile::Flux => solid(FLUX_BG),
        Tile::Unbreakable => solid(WALL_BG),
        Tile::Player => solid(PLAYER_BG),
        Tile::Stone(_) => solid(STONE_BG),
        Tile::Box(_) => solid(BOX_BG),
        Tile::Key(conf) => {
            let fg = rgb(conf.color());
            [
                Cell { ch: '-', fg, bg: Cell::BASE_BG },
                Cell { ch: 'o', fg, bg: Cell::BASE_BG },
            ]
        }
        Tile::Lock(conf) => {
            let bg = rgb(conf.color());
            [
                Cell { ch: '[', fg: Color::Black, bg },
                Cell { ch: ']', fg: Color::Black, bg },
            ]
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame: back ≠ front for every cell.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, app: &App) -> io::Result<()> {
        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            // Force full repaint after resize.
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        match app.phase {
            Phase::Title => self.draw_title(app),
            Phase::Playing => self.draw_session(app),
        }
        self.flush_diff()
    }

    // ── Screens ──

    fn draw_title(&mut self, app: &App) {
        let accent = Color::Rgb { r: 255, g: 204, b: 0 };
        self.front.put_str(2, 1, "K E Y S T O N E", accent, Cell::BASE_BG);
        self.front.put_str(2, 2, "a block-and-key puzzle", Color::DarkGrey, Cell::BASE_BG);

        self.front.put_str(2, 4, "Levels:", Color::White, Cell::BASE_BG);
        for (i, def) in app.levels.iter().enumerate() {
            let y = 5 + i;
            if y + 3 >= self.term_h {
                break;
            }
            let marker = if i == app.cursor { "> " } else { "  " };
            let fg = if i == app.cursor { accent } else { Color::Grey };
            self.front.put_str(2, y, &format!("{marker}{}", def.name), fg, Cell::BASE_BG);
        }

        if app.message_timer > 0 {
            self.front.put_str(2, self.term_h.saturating_sub(3), &app.message, Color::Red, Cell::BASE_BG);
        }
        self.front.put_str(
            2,
            self.term_h.saturating_sub(2),
            "[Up/Down] Select   [Enter] Play   [Q] Quit",
            Color::DarkGrey,
            Cell::BASE_BG,
        );
    }

    fn draw_session(&mut self, app: &App) {
        let session = match app.session.as_ref() {
            Some(s) => s,
            None => return,
        };

        self.front.put_str(
            2,
            HUD_ROW,
            &format!(
                "KEYSTONE  {}  tick {}  actor ({}, {})",
                session.name,
                session.tick,
                session.player.x(),
                session.player.y()
            ),
            Color::White,
            Cell::BASE_BG,
        );

        let map = &session.map;
        for y in 0..map.height() {
            for x in 0..map.width() {
                let cells = tile_cells(&map.tile_at(x, y));
                for (i, cell) in cells.iter().enumerate() {
                    self.front.set(x * CELL_W + i, MAP_ROW + y, *cell);
                }
            }
        }

        let msg_row = MAP_ROW + map.height() + 1;
        if app.message_timer > 0 {
            self.front.put_str(2, msg_row, &app.message, Color::Yellow, Cell::BASE_BG);
        }
        self.front.put_str(
            2,
            msg_row + 1,
            "[Arrows/WASD] Move   [R] Restart   [Esc] Title",
            Color::DarkGrey,
            Cell::BASE_BG,
        );
    }

    // ── Diff flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg: Option<Color> = None;
        let mut last_bg: Option<Color> = None;

        for y in 0..self.term_h {
            for x in 0..self.term_w {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
                if last_fg != Some(cell.fg) {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(self.writer, Print(cell.ch))?;
            }
        }

        self.writer.flush()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }
}
