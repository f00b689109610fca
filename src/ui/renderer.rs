//! Presentation layer: double-buffered, diff-based terminal renderer.
//!
//! How it works:
//!   1. Build the next frame into `front` buffer (array of Cell)
//!   2. Compare each cell with `back` buffer (previous frame)
//!   3. Only emit terminal commands for cells that changed
//!   4. All commands are batched with `queue!`, flushed once at the end
//!   5. Swap front/back
//!
//! Playfield units are scaled onto whatever terminal area is available, so
//! the same round plays on any terminal size.

use std::io::{self, BufWriter, Write};
use std::mem::Discriminant;

use crossterm::{
    cursor::{self, MoveTo},
    event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::config::PlayfieldConfig;
use crate::domain::difficulty::ALL_DIFFICULTIES;
use crate::domain::word::FallingWord;
use crate::screen::{App, AppContext, Burst, NewScore, Screen, UpdateChoice, INITIALS_LEN, SHOT_TRAVEL};
use crate::sim::round::Round;

// ── Palette ──

const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };
const HDR: Color = Color::Rgb { r: 255, g: 220, b: 50 };
const KEY_C: Color = Color::Rgb { r: 100, g: 200, b: 255 };
const DESC_C: Color = Color::Rgb { r: 180, g: 180, b: 180 };
const SEP_C: Color = Color::Rgb { r: 80, g: 80, b: 80 };
const WORD_C: Color = Color::Rgb { r: 235, g: 235, b: 235 };
const MATCH_C: Color = Color::Rgb { r: 90, g: 230, b: 120 };
const TARGET_C: Color = Color::Rgb { r: 255, g: 150, b: 60 };
const DANGER_C: Color = Color::Rgb { r: 255, g: 80, b: 80 };
const DIM_BG: Color = Color::Rgb { r: 40, g: 40, b: 40 };

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: BASE_BG };

    /// Sentinel cell used to invalidate the back buffer.
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

    /// Write a string at (x, y). Returns the column after the last char.
    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) -> usize {
        let mut cx = x;
        for ch in s.chars() {
            if cx >= self.width {
                break;
            }
            self.set(cx, y, Cell { ch, fg, bg });
            cx += 1;
        }
        cx
    }

    fn put_centered(&mut self, y: usize, s: &str, fg: Color) {
        let x = self.width.saturating_sub(s.chars().count()) / 2;
        self.put_str(x, y, s, fg, BASE_BG);
    }

    fn fill_row(&mut self, y: usize, ch: char, fg: Color) {
        for x in 0..self.width {
            self.set(x, y, Cell { ch, fg, bg: BASE_BG });
        }
    }
}

/// Terminal-cell rectangle the playfield is projected into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Area {
    pub x: usize,
    pub y: usize,
    pub w: usize,
    pub h: usize,
}

/// Project playfield coordinates into `area`. `None` while above the top edge
/// or outside the field.
pub fn project(x: f32, y: f32, field: &PlayfieldConfig, area: Area) -> Option<(usize, usize)> {
    if y < 0.0 || x < 0.0 || area.w == 0 || area.h == 0 {
        return None;
    }
    let col = (x / field.width * area.w as f32) as usize;
    let row = (y / field.height * area.h as f32) as usize;
    (col < area.w && row < area.h).then_some((area.x + col, area.y + row))
}

/// Colored spans for one word: brackets mark the active target, the matched
/// prefix is highlighted.
fn word_spans(w: &FallingWord, is_target: bool) -> Vec<(String, Color)> {
    if is_target {
        vec![
            ("[".to_string(), TARGET_C),
            (w.matched_part().to_string(), MATCH_C),
            (w.unmatched_part().to_string(), WORD_C),
            ("]".to_string(), TARGET_C),
        ]
    } else {
        vec![(w.word.clone(), WORD_C)]
    }
}

// ── Renderer ──

/// HUD + separator above the playfield; input + help below.
const CHROME_TOP: usize = 2;
const CHROME_BOTTOM: usize = 2;

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
    term_w: usize,
    term_h: usize,
    last_screen: Option<(Discriminant<Screen>, bool)>,
    enhanced_keys: bool,
    anim: u32,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
            term_w: 0,
            term_h: 0,
            last_screen: None,
            enhanced_keys: false,
            anim: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(BASE_BG),
            Clear(ClearType::All)
        )?;

        // Needed to tell Ctrl+Enter apart from Enter.
        if terminal::supports_keyboard_enhancement().unwrap_or(false) {
            execute!(
                self.writer,
                PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
            )?;
            self.enhanced_keys = true;
        } else {
            log::info!("keyboard enhancement unavailable, use F11 for fullscreen");
        }

        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.term_w = tw as usize;
        self.term_h = th as usize;
        self.front.resize(self.term_w, self.term_h);
        self.back.resize(self.term_w, self.term_h);
        // Force full repaint on first frame.
        self.back.cells.fill(Cell::INVALID);

        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        if self.enhanced_keys {
            execute!(self.writer, PopKeyboardEnhancementFlags)?;
        }
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    pub fn render(&mut self, app: &App) -> io::Result<()> {
        self.anim = self.anim.wrapping_add(1);

        // Detect terminal resize
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.term_w = tw as usize;
            self.term_h = th as usize;
            self.front.resize(self.term_w, self.term_h);
            self.back.resize(self.term_w, self.term_h);
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
        }

        // Screen or layout change: clean transition
        let key = (std::mem::discriminant(&app.screen), app.ctx.fullscreen);
        if self.last_screen != Some(key) {
            self.back.cells.fill(Cell::INVALID);
            queue!(self.writer, SetBackgroundColor(BASE_BG), Clear(ClearType::All))?;
            self.last_screen = Some(key);
        }

        self.front.clear();
        self.compose(&app.screen, &app.ctx);

        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    fn compose(&mut self, screen: &Screen, ctx: &AppContext) {
        match screen {
            Screen::Welcome { .. } => self.compose_welcome(ctx),
            Screen::Round { round, .. } => self.compose_round(round, ctx),
            Screen::Initials { score, difficulty, initials } => {
                self.compose_initials(*score, difficulty.label(), initials, ctx.scores.rank_of(*score))
            }
            Screen::HighScores { new_score } => self.compose_high_scores(ctx, *new_score),
            Screen::Update { choice, resume } => {
                self.compose(resume, ctx);
                self.compose_update(*choice);
            }
        }
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Color::White;
        let mut last_bg = BASE_BG;
        let mut need_move = true;
        let mut last_x: usize = 0;
        let mut last_y: usize = 0;

        // Explicit base colors; ResetColor would fall back to the terminal's own.
        queue!(self.writer, SetForegroundColor(Color::White), SetBackgroundColor(BASE_BG))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    need_move = true;
                    continue;
                }

                if need_move || x != last_x + 1 || y != last_y {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                    need_move = false;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.ch))?;
                last_x = x;
                last_y = y;
            }
        }

        self.writer.flush()
    }

    // ══════════════════════════════════════════════════════════════
    // Compose: build front buffer content
    // ══════════════════════════════════════════════════════════════

    fn compose_welcome(&mut self, ctx: &AppContext) {
        let h = self.front.height;
        let top = h.saturating_sub(18) / 2;

        let title = "      T Y P E D   L A Y U P      ";
        let bar = "═".repeat(title.chars().count());
        self.front.put_centered(top, &format!("╔{bar}╗"), HDR);
        self.front.put_centered(top + 1, &format!("║{title}║"), HDR);
        self.front.put_centered(top + 2, &format!("╚{bar}╝"), HDR);
        self.front.put_centered(top + 4, "Type the falling words. Enter shoots.", DESC_C);

        for (i, d) in ALL_DIFFICULTIES.iter().enumerate() {
            let selected = *d == ctx.selected;
            let line = if selected {
                format!("▶ {}  {:<9}◀", i + 1, d.label())
            } else {
                format!("  {}  {:<9} ", i + 1, d.label())
            };
            self.front.put_centered(top + 6 + i, &line, if selected { HDR } else { DESC_C });
        }

        self.front.put_centered(top + 11, "SPACE start   ←/→ difficulty   H high scores   Q quit", KEY_C);
        self.front.put_centered(top + 13, "Enter fire · Esc reset · Ctrl+P pause · Ctrl+Enter/F11 fullscreen", SEP_C);

        if ctx.update.is_available() {
            let blink = (self.anim / 30) % 2 == 0;
            let fg = if blink { TARGET_C } else { HDR };
            self.front.put_centered(top + 16, "A new version is installed. Press U to update.", fg);
        }
    }

    fn playfield_area(&self, fullscreen: bool) -> Area {
        let (top, bottom) = if fullscreen { (0, 1) } else { (CHROME_TOP, CHROME_BOTTOM) };
        Area {
            x: 0,
            y: top,
            w: self.front.width,
            h: self.front.height.saturating_sub(top + bottom),
        }
    }

    fn compose_round(&mut self, round: &Round, ctx: &AppContext) {
        let area = self.playfield_area(ctx.fullscreen);
        let field = round.field();

        if !ctx.fullscreen {
            self.compose_hud(round);
            self.front.fill_row(1, '─', SEP_C);
        }

        // Danger line at the bottom edge of the field.
        let floor = area.y + area.h.saturating_sub(1);
        for x in 0..area.w {
            self.front.set(x, floor, Cell { ch: '▁', fg: DANGER_C, bg: BASE_BG });
        }

        for w in &round.words {
            let Some((col, row)) = project(w.x, w.y, field, area) else { continue };
            let spans = word_spans(w, round.target == Some(w.id));
            let len: usize = spans.iter().map(|(s, _)| s.chars().count()).sum();
            let start = col.saturating_sub(len / 2).min(area.w.saturating_sub(len));
            let mut cx = start;
            for (text, fg) in spans {
                cx = self.front.put_str(cx, row, &text, fg, BASE_BG);
            }
        }

        for b in &ctx.bursts {
            self.compose_burst(b, field, area);
        }

        if let Some(flash) = &ctx.flash {
            self.front.put_centered(area.y + 1, &flash.text, HDR);
        }

        // Typed input
        let input_row = self.front.height.saturating_sub(if ctx.fullscreen { 1 } else { 2 });
        let cx = self.front.put_str(1, input_row, "> ", KEY_C, BASE_BG);
        let fg = if round.target.is_some() { MATCH_C } else { WORD_C };
        let cx = self.front.put_str(cx, input_row, &round.input, fg, BASE_BG);
        if (self.anim / 20) % 2 == 0 {
            self.front.put_str(cx, input_row, "_", SEP_C, BASE_BG);
        }

        if !ctx.fullscreen {
            let help_row = self.front.height.saturating_sub(1);
            self.front.put_str(1, help_row, "Enter fire · Esc reset · Ctrl+P pause · Ctrl+Enter fullscreen", SEP_C, BASE_BG);
        }

        if round.paused {
            self.compose_pause_overlay(area);
        }
        if round.over {
            let mid = area.y + area.h / 2;
            self.front.put_centered(mid, "  G A M E   O V E R  ", DANGER_C);
            self.front.put_centered(mid + 1, &format!("  SCORE {}  ", round.score), HDR);
        }
    }

    fn compose_hud(&mut self, round: &Round) {
        let lives = "♥".repeat(round.lives as usize);
        let x = self.front.put_str(1, 0, "SCORE ", DESC_C, BASE_BG);
        let x = self.front.put_str(x, 0, &format!("{:<6}", round.score), HDR, BASE_BG);
        let x = self.front.put_str(x, 0, "LIVES ", DESC_C, BASE_BG);
        let x = self.front.put_str(x, 0, &format!("{:<4}", lives), DANGER_C, BASE_BG);
        let x = self.front.put_str(x, 0, "RESETS ", DESC_C, BASE_BG);
        let x = self.front.put_str(x, 0, &format!("{:<3}", round.free_resets), KEY_C, BASE_BG);
        let x = self.front.put_str(x, 0, "LEVEL ", DESC_C, BASE_BG);
        let x = self.front.put_str(x, 0, &format!("{:<3}", round.tier + 1), KEY_C, BASE_BG);
        let secs = round.elapsed.as_secs();
        let x = self.front.put_str(x, 0, &format!("{:02}:{:02}  ", secs / 60, secs % 60), DESC_C, BASE_BG);
        self.front.put_str(x, 0, round.difficulty.label(), HDR, BASE_BG);
    }

    fn compose_burst(&mut self, b: &Burst, field: &PlayfieldConfig, area: Area) {
        let Some((col, row)) = project(b.x, b.y.max(0.0), field, area) else { return };
        if b.age < SHOT_TRAVEL {
            self.front.set(col, row, Cell { ch: '✸', fg: TARGET_C, bg: BASE_BG });
        } else {
            let label = format!("+{}", b.points);
            let start = col.saturating_sub(label.len() / 2);
            self.front.put_str(start, row, &label, MATCH_C, BASE_BG);
        }
    }

    fn compose_pause_overlay(&mut self, area: Area) {
        let box_w = 32_usize.min(area.w);
        let box_h = 5_usize.min(area.h);
        let box_x = area.x + area.w.saturating_sub(box_w) / 2;
        let box_y = area.y + area.h.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell { ch: ' ', fg: Color::White, bg: DIM_BG });
            }
        }
        let blink = (self.anim / 30) % 2 == 0;
        let label = if blink { "▶  PAUSED  ◀" } else { "   PAUSED   " };
        self.front.put_str(box_x + box_w.saturating_sub(12) / 2, box_y + 1, label, HDR, DIM_BG);
        self.front.put_str(box_x + box_w.saturating_sub(20) / 2, box_y + 3, "Ctrl+P to resume", KEY_C, DIM_BG);
    }

    fn compose_initials(&mut self, score: u32, difficulty: &str, initials: &str, rank: usize) {
        let top = self.front.height.saturating_sub(12) / 2;
        self.front.put_centered(top, "G A M E   O V E R", DANGER_C);
        self.front.put_centered(top + 2, &format!("SCORE {score}  ({difficulty})  RANK #{rank}"), HDR);
        self.front.put_centered(top + 4, "NEW TOP TEN SCORE! ENTER YOUR INITIALS", KEY_C);

        let slots: String = (0..INITIALS_LEN)
            .map(|i| initials.chars().nth(i).unwrap_or('_'))
            .flat_map(|c| [c, ' '])
            .collect();
        self.front.put_centered(top + 6, slots.trim_end(), WORD_C);
        self.front.put_centered(top + 9, "A-Z type · Backspace delete · Enter save", SEP_C);
    }

    fn compose_high_scores(&mut self, ctx: &AppContext, new_score: Option<NewScore>) {
        let top = self.front.height.saturating_sub(20) / 2;
        self.front.put_centered(top, "H I G H   S C O R E S", HDR);

        let message = match new_score {
            Some(NewScore { rank: Some(1), .. }) => "NEW HIGH SCORE!".to_string(),
            Some(NewScore { rank: Some(n), .. }) => format!("Rank #{n}"),
            Some(NewScore { score, rank: None }) => format!("Your score: {score}"),
            None => String::new(),
        };
        self.front.put_centered(top + 2, &message, MATCH_C);

        self.front.put_centered(top + 4, &format!("{:<4} {:<4} {:>7}  {:<8} {}", "#", "NAME", "SCORE", "DATE", "D"), SEP_C);
        if ctx.scores.is_empty() {
            self.front.put_centered(top + 6, "No scores yet", DESC_C);
        }
        for (i, e) in ctx.scores.entries.iter().enumerate() {
            let line = format!(
                "{:<4} {:<4} {:>7}  {:<8} {}",
                format!("{}.", i + 1),
                e.username,
                e.score,
                e.date.format("%m/%d/%y").to_string(),
                e.difficulty.letter(),
            );
            let highlight = new_score.and_then(|n| n.rank) == Some(i + 1);
            self.front.put_centered(top + 5 + i, &line, if highlight { HDR } else { WORD_C });
        }

        self.front.put_centered(top + 17, "SPACE / Esc  back", KEY_C);
    }

    fn compose_update(&mut self, choice: UpdateChoice) {
        let box_w = 44_usize.min(self.front.width);
        let box_h = 7_usize.min(self.front.height);
        let box_x = self.front.width.saturating_sub(box_w) / 2;
        let box_y = self.front.height.saturating_sub(box_h) / 2;

        for y in box_y..box_y + box_h {
            for x in box_x..box_x + box_w {
                self.front.set(x, y, Cell { ch: ' ', fg: Color::White, bg: DIM_BG });
            }
        }
        self.front.put_str(box_x + 2, box_y + 1, "A new version of the game is installed.", HDR, DIM_BG);
        let (reload_fg, later_fg) = match choice {
            UpdateChoice::Reload => (HDR, SEP_C),
            UpdateChoice::Later => (SEP_C, HDR),
        };
        self.front.put_str(box_x + 8, box_y + 3, "[ R  Reload ]", reload_fg, DIM_BG);
        self.front.put_str(box_x + 24, box_y + 3, "[ L  Later ]", later_fg, DIM_BG);
        self.front.put_str(box_x + 2, box_y + 5, "Enter confirm · Esc later", SEP_C, DIM_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::word::WordId;

    fn area() -> Area {
        Area { x: 0, y: 2, w: 80, h: 20 }
    }

    #[test]
    fn projection_scales_to_area() {
        let field = GameConfig::default().playfield;
        assert_eq!(project(0.0, 0.0, &field, area()), Some((0, 2)));
        assert_eq!(project(400.0, 300.0, &field, area()), Some((40, 12)));
        assert_eq!(project(799.0, 599.0, &field, area()), Some((79, 21)));
    }

    #[test]
    fn offscreen_positions_are_hidden() {
        let field = GameConfig::default().playfield;
        assert_eq!(project(400.0, -40.0, &field, area()), None);
        assert_eq!(project(400.0, 620.0, &field, area()), None);
        assert_eq!(project(400.0, 10.0, &field, Area { x: 0, y: 0, w: 0, h: 0 }), None);
    }

    #[test]
    fn target_spans_split_on_matched_prefix() {
        let mut w = FallingWord::new(WordId(1), "castle", 0.0, 0.0, 1.0);
        w.matched = 3;
        let text: Vec<String> = word_spans(&w, true).into_iter().map(|(s, _)| s).collect();
        assert_eq!(text, vec!["[", "cas", "tle", "]"]);
        let plain: Vec<String> = word_spans(&w, false).into_iter().map(|(s, _)| s).collect();
        assert_eq!(plain, vec!["castle"]);
    }
}
