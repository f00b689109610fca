//! Entry point and game loop.

mod config;
mod domain;
mod screen;
mod sim;
mod ui;
mod update;

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;

use config::GameConfig;
use domain::difficulty::Difficulty;
use domain::pool::WordPool;
use screen::{App, AppContext, Flow, Route};
use sim::highscores::ScoreFile;
use ui::input::InputState;
use ui::renderer::Renderer;
use ui::sound::SoundEngine;
use update::UpdateNotice;

const LOG_FILE: &str = "typed-layup.log";

#[derive(Parser, Debug)]
#[command(name = "typed-layup", version)]
#[command(about = "Terminal typing arcade: shoot the falling words before they land")]
struct Cli {
    /// easy, medium, hard or insanity (overrides config.toml)
    #[arg(short, long)]
    difficulty: Option<String>,
    /// Explicit config.toml to load
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Seed for word choice and placement (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Skip the welcome screen and start a round immediately
    #[arg(long)]
    play: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    // Resolved before anything can replace the binary on disk.
    let exe = std::env::current_exe().ok();

    let data_dir = config::data_dir();
    init_logging(&data_dir);

    let mut config = GameConfig::load(cli.config.as_deref());
    if let Some(raw) = &cli.difficulty {
        config.general.difficulty = Difficulty::parse(raw).unwrap_or_else(|| {
            log::warn!("unknown difficulty {raw:?}, using medium");
            Difficulty::Medium
        });
    }

    let pool = WordPool::load(config.general.words_file.as_deref());
    let store = ScoreFile::in_dir(&data_dir);
    let update = UpdateNotice::init(config.general.check_updates);
    let seed = cli.seed.unwrap_or_else(rand::random);
    log::info!(
        "Starting: difficulty={} words={} seed={seed} data={}",
        config.general.difficulty.as_str(), pool.len(), data_dir.display(),
    );

    let start = if cli.play {
        Route::Round { difficulty: config.general.difficulty }
    } else {
        Route::Welcome
    };
    let mut app = App::new(AppContext::new(config, pool, store, update, seed), start);

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        let _ = renderer.cleanup();
        return Err(e).context("terminal init failed");
    }

    let sound = SoundEngine::new();
    let result = game_loop(&mut app, &mut renderer, sound.as_ref());

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result? {
        Flow::Reload => relaunch(exe),
        _ => {
            log::info!("Exit");
            println!("Thanks for playing Typed Layup!");
            Ok(())
        }
    }
}

fn game_loop(app: &mut App, renderer: &mut Renderer, sound: Option<&SoundEngine>) -> Result<Flow> {
    let mut input = InputState::new();
    let frame = app.ctx.config.timing.frame;
    let max_frame = app.ctx.config.timing.max_frame;
    let mut last = Instant::now();

    loop {
        input.drain_events();
        for key in input.keys.drain(..) {
            let flow = app.on_key(key);
            if flow != Flow::Continue {
                return Ok(flow);
            }
        }

        // Long stalls (suspend, slow terminal) are clamped so words don't teleport.
        let now = Instant::now();
        let dt = now.duration_since(last).min(max_frame);
        last = now;

        let flow = app.on_frame(dt, now);
        if flow != Flow::Continue {
            return Ok(flow);
        }

        for cue in app.ctx.cues.drain(..) {
            if let Some(sfx) = sound {
                sfx.play(cue);
            }
        }

        renderer.render(app).context("render failed")?;

        let spent = now.elapsed();
        if spent < frame {
            std::thread::sleep(frame - spent);
        }
    }
}

/// Route `log` records into a file in the data directory; the terminal is
/// in raw mode and stderr output would corrupt the screen.
fn init_logging(dir: &Path) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    let path = dir.join(LOG_FILE);
    match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        Err(e) => eprintln!("could not open {}: {e}", path.display()),
    }
    builder.init();
}

/// Replace this process with the freshly installed build, same arguments.
fn relaunch(exe: Option<PathBuf>) -> Result<()> {
    let exe = match exe {
        Some(p) => p,
        None => std::env::current_exe().context("could not locate the executable")?,
    };
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();
    log::info!("Relaunching {}", exe.display());
    let status = std::process::Command::new(&exe)
        .args(&args)
        .status()
        .with_context(|| format!("failed to relaunch {}", exe.display()))?;
    std::process::exit(status.code().unwrap_or(0));
}
