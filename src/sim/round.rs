//! Round: the complete state of one live game.
//!
//! ## Ownership
//!   The round exclusively owns its live `FallingWord`s. A word leaves the
//!   live set in exactly three ways: shot, escaped, or the round is dropped.
//!
//! ## Active target
//!   `target` is `Some(id)` only while `id` names a live word that has
//!   `input` as a prefix. Every path that removes a word or mutates `input`
//!   keeps this true (`clear_input`, `resolver::recompute_target`).
//!
//! ## Timers
//!   Spawn and escalation timers only advance inside `step::step`, which is
//!   skipped while paused, so pausing freezes their remaining time.

use std::rc::Rc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::config::{GameConfig, PlayfieldConfig, RoundConfig};
use crate::domain::difficulty::{Difficulty, DifficultySettings};
use crate::domain::pool::WordPool;
use crate::domain::word::{FallingWord, WordId};
use super::event::{RoundEvent, RoundSummary};
use super::highscores::HighScores;
use super::timer::IntervalTimer;

/// Points between free-reset awards.
pub const RESET_AWARD_STEP: u32 = 100;

pub struct Round {
    pub difficulty: Difficulty,
    pub settings: DifficultySettings,

    // ── Counters ──
    pub score: u32,
    pub lives: u32,
    pub free_resets: u32,
    /// Escalation steps taken so far.
    pub tier: u32,

    // ── Typing ──
    pub input: String,
    pub target: Option<WordId>,

    // ── Lifecycle ──
    pub paused: bool,
    pub over: bool,
    /// Un-paused play time.
    pub elapsed: Duration,

    /// Live set, in spawn order (tie-break order for targeting).
    pub words: Vec<FallingWord>,

    pub(super) spawn_timer: IntervalTimer,
    pub(super) escalation_timer: IntervalTimer,

    rules: RoundConfig,
    field: PlayfieldConfig,
    pool: Rc<WordPool>,
    /// Leaderboard as of round start, for the top-ten decision.
    board: HighScores,
    rng: Pcg32,
    next_id: u64,
    summary: Option<RoundSummary>,
}

impl Round {
    pub fn new(
        difficulty: Difficulty,
        config: &GameConfig,
        pool: Rc<WordPool>,
        board: HighScores,
        seed: u64,
    ) -> Self {
        let settings = difficulty.settings();
        Round {
            difficulty,
            settings,
            score: 0,
            lives: config.round.starting_lives,
            free_resets: config.round.starting_resets,
            tier: 0,
            input: String::new(),
            target: None,
            paused: false,
            over: false,
            elapsed: Duration::ZERO,
            words: Vec::with_capacity(crate::domain::difficulty::MAX_LIVE_WORDS),
            spawn_timer: IntervalTimer::new(settings.spawn_interval(0)),
            escalation_timer: IntervalTimer::new(config.round.escalation_interval),
            rules: config.round.clone(),
            field: config.playfield.clone(),
            pool,
            board,
            rng: Pcg32::seed_from_u64(seed),
            next_id: 0,
            summary: None,
        }
    }

    /// Kick off the round: the first word appears without waiting a full interval.
    pub fn begin(&mut self) -> Vec<RoundEvent> {
        log::info!(
            "Round start: difficulty={} lives={} resets={}",
            self.difficulty.as_str(), self.lives, self.free_resets,
        );
        let mut events = Vec::new();
        self.try_spawn(&mut events);
        events
    }

    // ── Queries ──

    pub fn word(&self, id: WordId) -> Option<&FallingWord> {
        self.words.iter().find(|w| w.id == id)
    }

    pub fn active_word(&self) -> Option<&FallingWord> {
        self.target.and_then(|id| self.word(id))
    }

    pub fn capacity(&self) -> usize {
        self.settings.capacity(self.score)
    }

    pub fn spawn_interval(&self) -> Duration {
        self.settings.spawn_interval(self.tier)
    }

    pub fn field(&self) -> &PlayfieldConfig {
        &self.field
    }

    pub fn summary(&self) -> Option<RoundSummary> {
        self.summary
    }

    // ══════════════════════════════════════════════════════════════
    // Spawning / escalation
    // ══════════════════════════════════════════════════════════════

    /// One spawn attempt. Skipped while paused, after the round ends, or at capacity.
    pub(super) fn try_spawn(&mut self, events: &mut Vec<RoundEvent>) {
        if self.paused || self.over {
            return;
        }
        if self.words.len() >= self.capacity() {
            return;
        }
        let Some(text) = self.pool.choose(&mut self.rng) else {
            log::warn!("word pool is empty, nothing to spawn");
            return;
        };
        let text = text.to_string();

        let (lo, hi) = self.field.spawn_x_range();
        let x = if hi > lo { self.rng.random_range(lo..=hi) } else { lo };
        let speed = self.settings.speed_at(self.tier);
        let id = WordId(self.next_id);
        self.next_id += 1;

        log::debug!("spawn #{} {:?} x={x:.0} speed={speed}", id.0, text);
        self.words.push(FallingWord::new(id, &text, x, self.field.spawn_y(), speed));
        events.push(RoundEvent::WordSpawned { id });
    }

    /// Step up one tier and re-arm spawning at the new cadence.
    pub(super) fn escalate(&mut self, events: &mut Vec<RoundEvent>) {
        if self.paused || self.over {
            return;
        }
        self.tier += 1;
        let interval = self.spawn_interval();
        log::info!("Difficulty up: tier {} (spawn every {}ms)", self.tier, interval.as_millis());
        events.push(RoundEvent::DifficultyIncreased { tier: self.tier });
        self.spawn_timer.rearm(interval);
        self.try_spawn(events);
    }

    // ══════════════════════════════════════════════════════════════
    // Outcomes
    // ══════════════════════════════════════════════════════════════

    /// Remove the target, clear typing, award points (and resets per 100).
    pub(super) fn shoot(&mut self, id: WordId, events: &mut Vec<RoundEvent>) {
        let Some(idx) = self.words.iter().position(|w| w.id == id) else {
            return;
        };
        let word = self.words.remove(idx);
        self.clear_input();

        let old = self.score;
        self.score = self.score.saturating_add(self.rules.points_per_hit);
        events.push(RoundEvent::Shot { id, x: word.x, y: word.y, points: self.rules.points_per_hit });
        log::debug!("shot {:?}, score {}", word.word, self.score);

        let awarded = resets_earned(old, self.score);
        if awarded > 0 {
            self.free_resets += awarded;
            events.push(RoundEvent::ResetAwarded { total: self.free_resets });
        }
    }

    pub(super) fn misfire(&mut self, events: &mut Vec<RoundEvent>) {
        self.clear_input();
        events.push(RoundEvent::Misfired);
    }

    /// Empty prefix, no target, no highlighting.
    pub(super) fn clear_input(&mut self) {
        self.input.clear();
        self.target = None;
        for w in &mut self.words {
            w.matched = 0;
        }
    }

    /// Lose one life; the last one ends the round. No-op once over.
    pub(super) fn lose_life(&mut self, events: &mut Vec<RoundEvent>) {
        if self.over {
            return;
        }
        self.lives = self.lives.saturating_sub(1);
        events.push(RoundEvent::LifeLost { remaining: self.lives });
        if self.lives == 0 {
            self.finish(events);
        }
    }

    /// Enter the terminal state. Emits `RoundOver` exactly once.
    pub(super) fn finish(&mut self, events: &mut Vec<RoundEvent>) {
        if self.over {
            return;
        }
        self.over = true;
        self.spawn_timer.stop();
        self.escalation_timer.stop();

        let summary = RoundSummary {
            score: self.score,
            difficulty: self.difficulty,
            qualifies_for_top_ten: self.board.qualifies(self.score),
        };
        log::info!(
            "Round over: score={} difficulty={} tier={} top10={}",
            summary.score, summary.difficulty.as_str(), self.tier, summary.qualifies_for_top_ten,
        );
        self.summary = Some(summary);
        events.push(RoundEvent::RoundOver(summary));
    }
}

/// Number of multiples of 100 crossed going from `old` to `new`.
pub fn resets_earned(old: u32, new: u32) -> u32 {
    (new / RESET_AWARD_STEP).saturating_sub(old / RESET_AWARD_STEP)
}
