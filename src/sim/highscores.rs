//! High score leaderboard, persisted as JSON in the data directory.
//!
//! Top 10, ordered descending by score. Loading is best-effort: legacy
//! files (a bare array of numbers), entries missing fields, and outright
//! garbage all degrade to a usable list instead of an error.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::difficulty::Difficulty;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;
/// Stand-in initials for entries that predate usernames.
pub const PLACEHOLDER_NAME: &str = "AAA";
pub const FILE_NAME: &str = "highscores.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("high score file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("high score encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A single high score entry
#[derive(Debug, Clone, PartialEq)]
pub struct HighScoreEntry {
    /// Three uppercase letters
    pub username: String,
    pub score: u32,
    pub date: DateTime<Utc>,
    pub difficulty: Difficulty,
}

/// High score leaderboard
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Fewer than 10 entries, or strictly better than the 10th.
    pub fn qualifies(&self, score: u32) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// 1-indexed rank the score would hold among the current entries.
    pub fn rank_of(&self, score: u32) -> usize {
        self.entries.iter().filter(|e| e.score > score).count() + 1
    }

    /// Insert keeping descending order and the cap. Ties go after existing
    /// entries. Returns the rank achieved, or None if it fell off the end.
    pub fn insert(&mut self, username: &str, score: u32, difficulty: Difficulty, date: DateTime<Utc>) -> Option<usize> {
        let entry = HighScoreEntry {
            username: normalize_name(Some(username)),
            score,
            date,
            difficulty,
        };
        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());
        self.entries.insert(pos, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        (pos < MAX_HIGH_SCORES).then_some(pos + 1)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tolerant parse of stored JSON. Never fails.
    pub fn parse(json: &str) -> Self {
        let stored: Vec<StoredScore> = match serde_json::from_str(json) {
            Ok(v) => v,
            Err(e) => {
                log::warn!("high score data unreadable, starting fresh: {e}");
                return Self::new();
            }
        };

        let now = Utc::now();
        let mut entries: Vec<HighScoreEntry> = stored
            .into_iter()
            .filter_map(|s| match s {
                StoredScore::Bare(score) => Some(HighScoreEntry {
                    username: PLACEHOLDER_NAME.to_string(),
                    score: clamp_score(score)?,
                    date: now,
                    difficulty: Difficulty::Medium,
                }),
                StoredScore::Full(e) => Some(HighScoreEntry {
                    username: normalize_name(e.username.as_deref()),
                    score: clamp_score(e.score?)?,
                    date: e
                        .date
                        .as_deref()
                        .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                        .map(|d| d.with_timezone(&Utc))
                        .unwrap_or(now),
                    difficulty: Difficulty::parse_or_default(e.difficulty.as_deref()),
                }),
                StoredScore::Unknown(v) => {
                    log::debug!("skipping unrecognized high score record: {v}");
                    None
                }
            })
            .collect();

        // Stable: equal scores keep their stored order.
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_HIGH_SCORES);
        HighScores { entries }
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let out: Vec<StoredEntryOut<'_>> = self
            .entries
            .iter()
            .map(|e| StoredEntryOut {
                username: &e.username,
                score: e.score,
                date: e.date.to_rfc3339(),
                difficulty: e.difficulty.as_str(),
            })
            .collect();
        Ok(serde_json::to_string_pretty(&out)?)
    }
}

// ── Stored schema ──

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredScore {
    /// Legacy format: just the number.
    Bare(f64),
    Full(StoredEntry),
    Unknown(serde_json::Value),
}

#[derive(Deserialize)]
struct StoredEntry {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
}

#[derive(Serialize)]
struct StoredEntryOut<'a> {
    username: &'a str,
    score: u32,
    date: String,
    difficulty: &'static str,
}

fn clamp_score(raw: f64) -> Option<u32> {
    raw.is_finite().then(|| raw.clamp(0.0, u32::MAX as f64) as u32)
}

fn normalize_name(raw: Option<&str>) -> String {
    let name: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(3)
        .collect::<String>()
        .to_ascii_uppercase();
    if name.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        name
    }
}

// ══════════════════════════════════════════════════════════════
// File store
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct ScoreFile {
    path: PathBuf,
}

impl ScoreFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ScoreFile { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file is an empty board; anything unreadable is logged and
    /// treated the same.
    pub fn load(&self) -> HighScores {
        match std::fs::read_to_string(&self.path) {
            Ok(json) => {
                let scores = HighScores::parse(&json);
                log::info!("Loaded {} high scores", scores.entries.len());
                scores
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HighScores::new(),
            Err(e) => {
                log::warn!("could not read {}: {e}", self.path.display());
                HighScores::new()
            }
        }
    }

    /// Write to a sibling temp file, then rename over the real one.
    pub fn save(&self, scores: &HighScores) -> Result<(), StoreError> {
        let json = scores.to_json()?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        log::info!("High scores saved ({} entries)", scores.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn board(scores: &[u32]) -> HighScores {
        let mut hs = HighScores::new();
        for &s in scores {
            hs.insert("ABC", s, Difficulty::Medium, at(1));
        }
        hs
    }

    #[test]
    fn qualifies_with_room_or_beating_tenth() {
        assert!(HighScores::new().qualifies(0));
        let nine = board(&[100; 9]);
        assert!(nine.qualifies(0));
        let full = board(&[100, 90, 80, 70, 60, 50, 40, 30, 20, 10]);
        assert!(!full.qualifies(10));
        assert!(full.qualifies(11));
    }

    #[test]
    fn insert_keeps_order_and_cap() {
        let mut hs = board(&[100, 90, 80, 70, 60, 50, 40, 30, 20, 10]);
        assert_eq!(hs.insert("new", 75, Difficulty::Hard, at(2)), Some(4));
        assert_eq!(hs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(hs.entries[3].username, "NEW");
        assert_eq!(hs.entries.last().map(|e| e.score), Some(20));
        assert_eq!(hs.insert("low", 5, Difficulty::Easy, at(2)), None);
    }

    #[test]
    fn ties_rank_after_existing() {
        let mut hs = board(&[50, 50]);
        assert_eq!(hs.rank_of(50), 1);
        assert_eq!(hs.insert("zed", 50, Difficulty::Easy, at(3)), Some(3));
        assert_eq!(hs.rank_of(60), 1);
        assert_eq!(hs.rank_of(10), 4);
    }

    #[test]
    fn legacy_numbers_become_placeholder_entries() {
        let hs = HighScores::parse("[30, 120, 70]");
        let scores: Vec<u32> = hs.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![120, 70, 30]);
        assert!(hs.entries.iter().all(|e| e.username == PLACEHOLDER_NAME));
        assert!(hs.entries.iter().all(|e| e.difficulty == Difficulty::Medium));
    }

    #[test]
    fn missing_fields_default() {
        let json = r#"[
            {"username": "bob", "score": 40, "date": "2024-01-05T10:00:00.000Z"},
            {"score": 90, "difficulty": "insanity"},
            {"username": "eve", "score": 60, "difficulty": "legendary", "date": "yesterday"},
            {"username": "nos"},
            "garbage"
        ]"#;
        let hs = HighScores::parse(json);
        assert_eq!(hs.entries.len(), 3);
        assert_eq!(hs.entries[0].username, "AAA");
        assert_eq!(hs.entries[0].difficulty, Difficulty::Insanity);
        assert_eq!(hs.entries[1].username, "EVE");
        assert_eq!(hs.entries[1].difficulty, Difficulty::Medium);
        assert_eq!(hs.entries[2].username, "BOB");
        assert_eq!(hs.entries[2].date, Utc.with_ymd_and_hms(2024, 1, 5, 10, 0, 0).unwrap());
    }

    #[test]
    fn garbage_is_empty_not_error() {
        assert!(HighScores::parse("{not json").is_empty());
        assert!(HighScores::parse(r#"{"entries": []}"#).is_empty());
        assert!(HighScores::parse("").is_empty());
    }

    #[test]
    fn oversized_file_is_truncated() {
        let json = format!("[{}]", (1..=15).map(|n| n.to_string()).collect::<Vec<_>>().join(","));
        let hs = HighScores::parse(&json);
        assert_eq!(hs.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(hs.entries[0].score, 15);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScoreFile::in_dir(dir.path());
        assert!(store.load().is_empty());

        let mut hs = HighScores::new();
        hs.insert("ACE", 250, Difficulty::Hard, at(9));
        hs.insert("BOB", 120, Difficulty::Easy, at(10));
        store.save(&hs).unwrap();

        assert_eq!(store.load(), hs);
        assert!(store.path().exists());
    }

    #[test]
    fn unreadable_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ScoreFile::in_dir(dir.path());
        std::fs::write(store.path(), "\u{0}\u{1}binary").unwrap();
        assert!(store.load().is_empty());
    }
}
