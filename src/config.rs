//! External configuration loader.
//!
//! Reads `config.toml` from an explicit `--config` path, else from the
//! executable's directory, the CWD, or the per-user data directory.
//! Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::difficulty::Difficulty;

const APP_DIR: &str = "typed-layup";

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub timing: TimingConfig,
    pub round: RoundConfig,
    pub playfield: PlayfieldConfig,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    /// Resolved word file; `None` means use the built-in dictionary.
    pub words_file: Option<PathBuf>,
    pub difficulty: Difficulty,
    pub check_updates: bool,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame: Duration,
    /// Frame deltas longer than this are clamped (terminal stalls, suspend).
    pub max_frame: Duration,
    pub game_over_delay: Duration,
}

#[derive(Clone, Debug)]
pub struct RoundConfig {
    pub starting_lives: u32,
    pub starting_resets: u32,
    pub points_per_hit: u32,
    pub escalation_interval: Duration,
}

/// Playfield geometry in abstract units; the renderer scales to the terminal.
#[derive(Clone, Debug)]
pub struct PlayfieldConfig {
    pub width: f32,
    pub height: f32,
    /// Half-extent of a word's body; also the escape overshoot.
    pub word_radius: f32,
    /// Extra horizontal margin beyond the radius when placing a new word.
    pub side_margin: f32,
}

impl PlayfieldConfig {
    /// Horizontal range a new word may be centered in.
    pub fn spawn_x_range(&self) -> (f32, f32) {
        let lo = self.word_radius + self.side_margin;
        let hi = (self.width - self.word_radius - self.side_margin).max(lo);
        (lo, hi)
    }

    /// Words enter fully above the top edge.
    pub fn spawn_y(&self) -> f32 {
        -self.word_radius
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    round: TomlRound,
    #[serde(default)]
    playfield: TomlPlayfield,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_words_file")]
    words_file: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default = "default_check_updates")]
    check_updates: bool,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_max_frame_ms")]
    max_frame_ms: u64,
    #[serde(default = "default_game_over_delay")]
    game_over_delay_ms: u64,
    #[serde(default = "default_escalation_interval")]
    escalation_interval_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlRound {
    #[serde(default = "default_lives")]
    starting_lives: u32,
    #[serde(default = "default_resets")]
    starting_resets: u32,
    #[serde(default = "default_points_per_hit")]
    points_per_hit: u32,
}

#[derive(Deserialize, Debug)]
struct TomlPlayfield {
    #[serde(default = "default_width")]
    width: f32,
    #[serde(default = "default_height")]
    height: f32,
    #[serde(default = "default_word_radius")]
    word_radius: f32,
    #[serde(default = "default_side_margin")]
    side_margin: f32,
}

// ── Defaults ──

fn default_words_file() -> String { "words.txt".into() }
fn default_difficulty() -> String { "medium".into() }
fn default_check_updates() -> bool { true }
fn default_frame_ms() -> u64 { 16 }
fn default_max_frame_ms() -> u64 { 250 }
fn default_game_over_delay() -> u64 { 1000 }
fn default_escalation_interval() -> u64 { 30_000 }
fn default_lives() -> u32 { 3 }
fn default_resets() -> u32 { 1 }
fn default_points_per_hit() -> u32 { 10 }
fn default_width() -> f32 { 800.0 }
fn default_height() -> f32 { 600.0 }
fn default_word_radius() -> f32 { 40.0 }
fn default_side_margin() -> f32 { 50.0 }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            words_file: default_words_file(),
            difficulty: default_difficulty(),
            check_updates: default_check_updates(),
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            max_frame_ms: default_max_frame_ms(),
            game_over_delay_ms: default_game_over_delay(),
            escalation_interval_ms: default_escalation_interval(),
        }
    }
}

impl Default for TomlRound {
    fn default() -> Self {
        TomlRound {
            starting_lives: default_lives(),
            starting_resets: default_resets(),
            points_per_hit: default_points_per_hit(),
        }
    }
}

impl Default for TomlPlayfield {
    fn default() -> Self {
        TomlPlayfield {
            width: default_width(),
            height: default_height(),
            word_radius: default_word_radius(),
            side_margin: default_side_margin(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        resolve(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) explicit path, (2) exe directory, (3) CWD, (4) data dir.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load(explicit: Option<&Path>) -> Self {
        let mut search_dirs = candidate_dirs();
        // A word list named by an explicit config sits next to that file first.
        if let Some(dir) = explicit.and_then(Path::parent).filter(|d| !d.as_os_str().is_empty()) {
            search_dirs.retain(|d| d != dir);
            search_dirs.insert(0, dir.to_path_buf());
        }
        let toml_cfg = match explicit {
            Some(path) => read_toml(path).unwrap_or_default(),
            None => search_dirs
                .iter()
                .map(|d| d.join("config.toml"))
                .find(|p| p.exists())
                .and_then(|p| read_toml(&p))
                .unwrap_or_default(),
        };
        resolve(toml_cfg, &search_dirs)
    }

    /// Parse config text directly (no file search for the word list).
    #[cfg(test)]
    pub fn from_toml_str(text: &str) -> Self {
        let cfg = toml::from_str::<TomlConfig>(text).unwrap_or_default();
        resolve(cfg, &[])
    }
}

fn read_toml(path: &Path) -> Option<TomlConfig> {
    match std::fs::read_to_string(path) {
        Ok(text) => match toml::from_str::<TomlConfig>(&text) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                Some(cfg)
            }
            Err(e) => {
                log::warn!("{}: parse error, using default settings: {e}", path.display());
                None
            }
        },
        Err(e) => {
            log::warn!("could not read {}: {e}", path.display());
            None
        }
    }
}

fn resolve(cfg: TomlConfig, search_dirs: &[PathBuf]) -> GameConfig {
    let difficulty = Difficulty::parse(&cfg.general.difficulty).unwrap_or_else(|| {
        log::warn!("unknown difficulty {:?} in config, using medium", cfg.general.difficulty);
        Difficulty::Medium
    });

    // Resolve the word file the same way as config.toml: absolute as-is,
    // relative against each candidate directory.
    let words_file = if cfg.general.words_file.trim().is_empty() {
        None
    } else {
        let raw = PathBuf::from(&cfg.general.words_file);
        if raw.is_absolute() {
            Some(raw)
        } else {
            search_dirs.iter().map(|d| d.join(&raw)).find(|p| p.is_file())
        }
    };

    let pf = cfg.playfield;
    let word_radius = pf.word_radius.max(1.0);
    let side_margin = pf.side_margin.max(0.0);
    // The field must at least fit one centered word inside its margins.
    let width = pf.width.max(2.0 * (word_radius + side_margin) + 1.0);
    let height = pf.height.max(2.0 * word_radius);

    GameConfig {
        general: GeneralConfig {
            words_file,
            difficulty,
            check_updates: cfg.general.check_updates,
        },
        timing: TimingConfig {
            frame: Duration::from_millis(cfg.timing.frame_ms.max(1)),
            max_frame: Duration::from_millis(cfg.timing.max_frame_ms.max(cfg.timing.frame_ms).max(1)),
            game_over_delay: Duration::from_millis(cfg.timing.game_over_delay_ms),
        },
        round: RoundConfig {
            starting_lives: cfg.round.starting_lives.max(1),
            starting_resets: cfg.round.starting_resets,
            points_per_hit: cfg.round.points_per_hit.max(1),
            escalation_interval: Duration::from_millis(cfg.timing.escalation_interval_ms.max(1)),
        },
        playfield: PlayfieldConfig {
            width,
            height,
            word_radius,
            side_margin,
        },
    }
}

/// Candidate directories to search: exe dir + CWD + data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/typed-layup)
    if let Some(xdg) = xdg_data_dir() {
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn xdg_data_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local/share").join(APP_DIR))
}

/// Writable directory for the high-score file and the log.
pub fn data_dir() -> PathBuf {
    // 1. Exe directory (works for local/portable installs)
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            // System installs like /usr/games/ won't be writable
            let probe = parent.join(".write_test_typed_layup");
            if std::fs::write(&probe, "").is_ok() {
                let _ = std::fs::remove_file(&probe);
                return parent.to_path_buf();
            }
        }
    }

    // 2. XDG data home
    if let Some(xdg) = xdg_data_dir() {
        if std::fs::create_dir_all(&xdg).is_ok() {
            return xdg;
        }
    }

    // 3. Fallback to CWD
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}
