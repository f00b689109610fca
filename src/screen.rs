//! Screens and navigation.
//!
//! The app is always on exactly one `Screen`. Per-screen key and frame
//! handlers produce a `Route`; `navigate` is the only place a route turns
//! into the next screen.

use std::rc::Rc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::GameConfig;
use crate::domain::difficulty::{Difficulty, ALL_DIFFICULTIES};
use crate::domain::pool::WordPool;
use crate::sim::event::RoundEvent;
use crate::sim::highscores::{HighScores, ScoreFile};
use crate::sim::resolver::handle_key;
use crate::sim::round::Round;
use crate::sim::step::step;
use crate::ui::input::round_key;
use crate::ui::sound::{cue_for, Cue};
use crate::update::UpdateNotice;

/// Time from a shot to its impact flash.
pub const SHOT_TRAVEL: Duration = Duration::from_millis(120);
/// How long a "+points" burst stays on screen.
pub const BURST_TTL: Duration = Duration::from_millis(700);
pub const FLASH_TTL: Duration = Duration::from_millis(1500);

pub const INITIALS_LEN: usize = 3;

// ── Screens ──

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateChoice {
    Reload,
    Later,
}

/// Score just achieved, shown on the high-score screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NewScore {
    pub score: u32,
    /// Position on the board, if it made the top ten.
    pub rank: Option<usize>,
}

pub enum Screen {
    Welcome { selected: Difficulty },
    Round { round: Box<Round>, over_for: Duration },
    Initials { score: u32, difficulty: Difficulty, initials: String },
    HighScores { new_score: Option<NewScore> },
    /// Suspends `resume` until the player decides.
    Update { choice: UpdateChoice, resume: Box<Screen> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Welcome,
    Round { difficulty: Difficulty },
    Initials { score: u32, difficulty: Difficulty },
    HighScores { new_score: Option<NewScore> },
    Update,
    Resume,
    Quit,
    Reload,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
    /// Leave the loop and start the newly installed build.
    Reload,
}

/// Short-lived shot marker drawn over the playfield.
#[derive(Clone, Debug)]
pub struct Burst {
    pub x: f32,
    pub y: f32,
    pub points: u32,
    pub age: Duration,
    pub landed: bool,
}

/// One-line status message over the playfield (level up, resets).
#[derive(Clone, Debug, PartialEq)]
pub struct Flash {
    pub text: String,
    pub age: Duration,
}

// ── Context shared by all screens ──

pub struct AppContext {
    pub config: GameConfig,
    pub pool: Rc<WordPool>,
    pub scores: HighScores,
    pub store: ScoreFile,
    pub update: UpdateNotice,
    /// Last difficulty picked on the welcome screen.
    pub selected: Difficulty,
    pub fullscreen: bool,
    /// Cues queued for the sound engine this frame.
    pub cues: Vec<Cue>,
    pub bursts: Vec<Burst>,
    pub flash: Option<Flash>,
    seeds: Pcg32,
}

impl AppContext {
    pub fn new(config: GameConfig, pool: WordPool, store: ScoreFile, update: UpdateNotice, seed: u64) -> Self {
        let scores = store.load();
        let selected = config.general.difficulty;
        AppContext {
            config,
            pool: Rc::new(pool),
            scores,
            store,
            update,
            selected,
            fullscreen: false,
            cues: Vec::new(),
            bursts: Vec::new(),
            flash: None,
            seeds: Pcg32::seed_from_u64(seed),
        }
    }

    fn absorb(&mut self, events: Vec<RoundEvent>) {
        for ev in events {
            if let Some(cue) = cue_for(&ev) {
                self.cues.push(cue);
            }
            match ev {
                RoundEvent::Shot { x, y, points, .. } => self.bursts.push(Burst {
                    x,
                    y,
                    points,
                    age: Duration::ZERO,
                    landed: false,
                }),
                RoundEvent::FullscreenToggled => self.fullscreen = !self.fullscreen,
                RoundEvent::ResetAwarded { total } => self.show(format!("FREE RESET EARNED ({total})")),
                RoundEvent::ResetUsed { remaining } => self.show(format!("RESET ({remaining} left)")),
                RoundEvent::ResetRejected => self.show("NO RESETS LEFT".to_string()),
                RoundEvent::DifficultyIncreased { tier } => self.show(format!("LEVEL {}", tier + 1)),
                RoundEvent::WordSpawned { id } | RoundEvent::WordEscaped { id } => {
                    log::trace!("word #{} spawned or escaped", id.0)
                }
                RoundEvent::TargetChanged { id } => log::trace!("target {:?}", id.map(|w| w.0)),
                _ => {}
            }
        }
    }

    fn show(&mut self, text: String) {
        self.flash = Some(Flash { text, age: Duration::ZERO });
    }

    fn age_effects(&mut self, dt: Duration) {
        for b in &mut self.bursts {
            b.age += dt;
            if !b.landed && b.age >= SHOT_TRAVEL {
                b.landed = true;
                self.cues.push(Cue::Hit);
            }
        }
        self.bursts.retain(|b| b.age < BURST_TTL);

        if let Some(f) = &mut self.flash {
            f.age += dt;
            if f.age >= FLASH_TTL {
                self.flash = None;
            }
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Navigation
// ══════════════════════════════════════════════════════════════

pub fn navigate(current: Screen, route: Route, ctx: &mut AppContext) -> (Screen, Flow) {
    let next = match route {
        Route::Quit => return (current, Flow::Quit),
        Route::Reload => return (current, Flow::Reload),
        Route::Welcome => Screen::Welcome { selected: ctx.selected },
        Route::Round { difficulty } => {
            ctx.selected = difficulty;
            ctx.bursts.clear();
            ctx.flash = None;
            let seed = ctx.seeds.random::<u64>();
            let mut round = Round::new(difficulty, &ctx.config, ctx.pool.clone(), ctx.scores.clone(), seed);
            let events = round.begin();
            ctx.absorb(events);
            Screen::Round { round: Box::new(round), over_for: Duration::ZERO }
        }
        Route::Initials { score, difficulty } => Screen::Initials {
            score,
            difficulty,
            initials: String::with_capacity(INITIALS_LEN),
        },
        Route::HighScores { new_score } => Screen::HighScores { new_score },
        Route::Update => match current {
            Screen::Update { choice, resume } => Screen::Update { choice, resume },
            other if ctx.update.is_available() => Screen::Update {
                choice: UpdateChoice::Reload,
                resume: Box::new(other),
            },
            other => other,
        },
        Route::Resume => match current {
            Screen::Update { resume, .. } => *resume,
            other => other,
        },
    };
    (next, Flow::Continue)
}

pub struct App {
    pub screen: Screen,
    pub ctx: AppContext,
}

impl App {
    pub fn new(ctx: AppContext, start: Route) -> Self {
        let mut app = App {
            screen: Screen::Welcome { selected: ctx.selected },
            ctx,
        };
        app.go(start);
        app
    }

    fn go(&mut self, route: Route) -> Flow {
        let placeholder = Screen::Welcome { selected: self.ctx.selected };
        let current = std::mem::replace(&mut self.screen, placeholder);
        let (next, flow) = navigate(current, route, &mut self.ctx);
        self.screen = next;
        flow
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.kind == KeyEventKind::Release {
            return Flow::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        {
            return Flow::Quit;
        }

        let ctx = &mut self.ctx;
        let route = match &mut self.screen {
            Screen::Welcome { selected } => welcome_key(selected, key, ctx),
            Screen::Round { round, .. } => {
                let events = handle_key(round, round_key(&key));
                ctx.absorb(events);
                None
            }
            Screen::Initials { score, difficulty, initials } => {
                initials_key(*score, *difficulty, initials, key, ctx)
            }
            Screen::HighScores { .. } => match key.code {
                KeyCode::Char(' ') | KeyCode::Esc => Some(Route::Welcome),
                _ => None,
            },
            Screen::Update { choice, .. } => update_key(choice, key, ctx),
        };

        match route {
            Some(r) => self.go(r),
            None => Flow::Continue,
        }
    }

    pub fn on_frame(&mut self, dt: Duration, now: Instant) -> Flow {
        self.ctx.update.poll(now);
        self.ctx.age_effects(dt);

        let ctx = &mut self.ctx;
        let route = match &mut self.screen {
            Screen::Round { round, over_for } => {
                if round.over {
                    *over_for += dt;
                    (*over_for >= ctx.config.timing.game_over_delay).then(|| after_round(round))
                } else {
                    let events = step(round, dt);
                    ctx.absorb(events);
                    None
                }
            }
            _ => None,
        };

        match route {
            Some(r) => self.go(r),
            None => Flow::Continue,
        }
    }
}

fn after_round(round: &Round) -> Route {
    match round.summary() {
        Some(s) if s.qualifies_for_top_ten => Route::Initials { score: s.score, difficulty: s.difficulty },
        Some(s) => Route::HighScores { new_score: Some(NewScore { score: s.score, rank: None }) },
        None => Route::Welcome,
    }
}

// ── Per-screen key handling ──

fn welcome_key(selected: &mut Difficulty, key: KeyEvent, ctx: &mut AppContext) -> Option<Route> {
    match key.code {
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            *selected = ALL_DIFFICULTIES[idx];
            ctx.selected = *selected;
            None
        }
        KeyCode::Left | KeyCode::Up => {
            *selected = selected.prev();
            ctx.selected = *selected;
            None
        }
        KeyCode::Right | KeyCode::Down => {
            *selected = selected.next();
            ctx.selected = *selected;
            None
        }
        KeyCode::Char(' ') => Some(Route::Round { difficulty: *selected }),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Route::HighScores { new_score: None }),
        KeyCode::Char('u') | KeyCode::Char('U') if ctx.update.is_available() => Some(Route::Update),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Route::Quit),
        _ => None,
    }
}

fn initials_key(
    score: u32,
    difficulty: Difficulty,
    initials: &mut String,
    key: KeyEvent,
    ctx: &mut AppContext,
) -> Option<Route> {
    match key.code {
        KeyCode::Char(c) if c.is_ascii_alphabetic() => {
            if initials.len() < INITIALS_LEN {
                initials.push(c.to_ascii_uppercase());
                ctx.cues.push(Cue::Type);
            }
            None
        }
        KeyCode::Backspace => {
            initials.pop();
            None
        }
        KeyCode::Enter if initials.len() == INITIALS_LEN => {
            let rank = ctx.scores.insert(initials, score, difficulty, Utc::now());
            if let Err(e) = ctx.store.save(&ctx.scores) {
                log::warn!("could not save high scores to {}: {e}", ctx.store.path().display());
            }
            Some(Route::HighScores { new_score: Some(NewScore { score, rank }) })
        }
        KeyCode::Enter => {
            ctx.cues.push(Cue::Miss);
            None
        }
        _ => None,
    }
}

fn update_key(choice: &mut UpdateChoice, key: KeyEvent, ctx: &mut AppContext) -> Option<Route> {
    match key.code {
        KeyCode::Char('r') | KeyCode::Char('R') => {
            *choice = UpdateChoice::Reload;
            None
        }
        KeyCode::Char('l') | KeyCode::Char('L') => {
            *choice = UpdateChoice::Later;
            None
        }
        KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down => {
            *choice = match choice {
                UpdateChoice::Reload => UpdateChoice::Later,
                UpdateChoice::Later => UpdateChoice::Reload,
            };
            None
        }
        KeyCode::Enter if *choice == UpdateChoice::Reload => Some(Route::Reload),
        KeyCode::Enter | KeyCode::Esc => {
            ctx.update.clear();
            Some(Route::Resume)
        }
        _ => None,
    }
}
