//! Events emitted by a round (tick or keystroke).
//! The presentation layer consumes these for sound cues and flashes.

use crate::domain::difficulty::Difficulty;
use crate::domain::word::WordId;

/// Terminal result of a round, emitted exactly once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundSummary {
    pub score: u32,
    pub difficulty: Difficulty,
    pub qualifies_for_top_ten: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RoundEvent {
    WordSpawned { id: WordId },
    LetterTyped,
    TargetChanged { id: Option<WordId> },
    Shot { id: WordId, x: f32, y: f32, points: u32 },
    Misfired,
    InputCleared,
    ResetUsed { remaining: u32 },
    /// No free resets left; caller plays a failure cue.
    ResetRejected,
    ResetAwarded { total: u32 },
    WordEscaped { id: WordId },
    LifeLost { remaining: u32 },
    DifficultyIncreased { tier: u32 },
    Paused,
    Resumed,
    FullscreenToggled,
    RoundOver(RoundSummary),
}
