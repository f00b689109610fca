//! Difficulty tiers and their fixed tuning table.
//!
//! Everything here is pure: a tier maps to an immutable `DifficultySettings`,
//! and the escalation formulas (spawn cadence, fall speed, live-word
//! capacity) are functions of that table plus round counters.

use std::time::Duration;

/// Spawn interval shrinks by this much per escalation tier.
pub const SPAWN_INTERVAL_STEP_MS: u64 = 200;
/// One extra simultaneous word per this many points.
pub const SCORE_PER_EXTRA_WORD: u32 = 200;
/// Hard ceiling on simultaneous live words, regardless of tier or score.
pub const MAX_LIVE_WORDS: usize = 8;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Insanity,
}

pub const ALL_DIFFICULTIES: [Difficulty; 4] = [
    Difficulty::Easy,
    Difficulty::Medium,
    Difficulty::Hard,
    Difficulty::Insanity,
];

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct DifficultySettings {
    pub max_simultaneous: usize,
    pub spawn_interval_ms: u64,
    pub min_spawn_interval_ms: u64,
    /// Units per second.
    pub start_speed: f32,
    pub max_speed: f32,
    pub acceleration_per_tier: f32,
}

impl Difficulty {
    pub fn settings(self) -> DifficultySettings {
        match self {
            Difficulty::Easy => DifficultySettings {
                max_simultaneous: 2,
                spawn_interval_ms: 3000,
                min_spawn_interval_ms: 1500,
                start_speed: 40.0,
                max_speed: 100.0,
                acceleration_per_tier: 5.0,
            },
            Difficulty::Medium => DifficultySettings {
                max_simultaneous: 3,
                spawn_interval_ms: 2000,
                min_spawn_interval_ms: 800,
                start_speed: 50.0,
                max_speed: 150.0,
                acceleration_per_tier: 10.0,
            },
            Difficulty::Hard => DifficultySettings {
                max_simultaneous: 4,
                spawn_interval_ms: 1500,
                min_spawn_interval_ms: 500,
                start_speed: 70.0,
                max_speed: 200.0,
                acceleration_per_tier: 15.0,
            },
            Difficulty::Insanity => DifficultySettings {
                max_simultaneous: 8,
                spawn_interval_ms: 750,
                min_spawn_interval_ms: 250,
                start_speed: 140.0,
                max_speed: 400.0,
                acceleration_per_tier: 30.0,
            },
        }
    }

    /// Lowercase identifier, also the persisted form.
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Insanity => "insanity",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
            Difficulty::Insanity => "INSANITY",
        }
    }

    /// Single-letter tag used in the high-score table.
    pub fn letter(self) -> char {
        match self {
            Difficulty::Easy => 'E',
            Difficulty::Medium => 'M',
            Difficulty::Hard => 'H',
            Difficulty::Insanity => 'I',
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" | "e" => Some(Difficulty::Easy),
            "medium" | "med" | "m" => Some(Difficulty::Medium),
            "hard" | "h" => Some(Difficulty::Hard),
            "insanity" | "insane" | "i" => Some(Difficulty::Insanity),
            _ => None,
        }
    }

    /// Absent or unrecognized input selects Medium.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        s.and_then(Self::parse).unwrap_or_default()
    }

    fn index(self) -> usize {
        ALL_DIFFICULTIES.iter().position(|d| *d == self).unwrap_or(1)
    }

    /// Cycle forward through the tiers (wraps).
    pub fn next(self) -> Self {
        ALL_DIFFICULTIES[(self.index() + 1) % ALL_DIFFICULTIES.len()]
    }

    /// Cycle backward through the tiers (wraps).
    pub fn prev(self) -> Self {
        let n = ALL_DIFFICULTIES.len();
        ALL_DIFFICULTIES[(self.index() + n - 1) % n]
    }
}

impl DifficultySettings {
    /// `max(min, base - tier * 200ms)`
    pub fn spawn_interval(&self, tier: u32) -> Duration {
        let shrink = SPAWN_INTERVAL_STEP_MS.saturating_mul(tier as u64);
        let ms = self
            .spawn_interval_ms
            .saturating_sub(shrink)
            .max(self.min_spawn_interval_ms);
        Duration::from_millis(ms)
    }

    /// Fall speed for a word spawned at this tier, capped at `max_speed`.
    pub fn speed_at(&self, tier: u32) -> f32 {
        (self.start_speed + tier as f32 * self.acceleration_per_tier).min(self.max_speed)
    }

    /// How many words may be alive at once for the current score.
    pub fn capacity(&self, score: u32) -> usize {
        let bonus = (score / SCORE_PER_EXTRA_WORD) as usize;
        (self.max_simultaneous + bonus).min(MAX_LIVE_WORDS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_contract_holds_for_every_tier() {
        for d in ALL_DIFFICULTIES {
            let s = d.settings();
            assert!(s.max_simultaneous > 0, "{:?}", d);
            assert!(s.spawn_interval_ms > 0 && s.min_spawn_interval_ms > 0);
            assert!(s.start_speed > 0.0 && s.acceleration_per_tier > 0.0);
            assert!(s.max_speed >= s.start_speed, "{:?}", d);
            assert!(s.min_spawn_interval_ms <= s.spawn_interval_ms, "{:?}", d);
        }
    }

    #[test]
    fn spawn_interval_shrinks_then_floors() {
        let s = Difficulty::Medium.settings();
        assert_eq!(s.spawn_interval(0), Duration::from_millis(2000));
        assert_eq!(s.spawn_interval(3), Duration::from_millis(1400));
        assert_eq!(s.spawn_interval(6), Duration::from_millis(800));
        assert_eq!(s.spawn_interval(50), Duration::from_millis(800));
        assert_eq!(s.spawn_interval(u32::MAX), Duration::from_millis(800));
    }

    #[test]
    fn speed_accelerates_and_caps() {
        let s = Difficulty::Easy.settings();
        assert_eq!(s.speed_at(0), 40.0);
        assert_eq!(s.speed_at(4), 60.0);
        assert_eq!(s.speed_at(100), 100.0);
    }

    #[test]
    fn capacity_grows_with_score_up_to_eight() {
        let s = Difficulty::Easy.settings();
        assert_eq!(s.capacity(0), 2);
        assert_eq!(s.capacity(199), 2);
        assert_eq!(s.capacity(200), 3);
        assert_eq!(s.capacity(5000), MAX_LIVE_WORDS);
        assert_eq!(Difficulty::Insanity.settings().capacity(0), MAX_LIVE_WORDS);
    }

    #[test]
    fn parse_defaults_to_medium() {
        assert_eq!(Difficulty::parse("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::parse(" insanity "), Some(Difficulty::Insanity));
        assert_eq!(Difficulty::parse("nightmare"), None);
        assert_eq!(Difficulty::parse_or_default(None), Difficulty::Medium);
        assert_eq!(Difficulty::parse_or_default(Some("bogus")), Difficulty::Medium);
        assert_eq!(Difficulty::parse_or_default(Some("easy")), Difficulty::Easy);
    }

    #[test]
    fn cycling_wraps_both_ways() {
        assert_eq!(Difficulty::Insanity.next(), Difficulty::Easy);
        assert_eq!(Difficulty::Easy.prev(), Difficulty::Insanity);
        for d in ALL_DIFFICULTIES {
            assert_eq!(d.next().prev(), d);
        }
    }
}
