mod app;

use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event as CEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use pixelpet_config::Settings;
use pixelpet_core::{adoption::SpritePipeline, event::Event, logging};

use crate::app::App;

/// A virtual pet that lives in your terminal.
#[derive(Debug, Parser)]
#[command(name = "pixelpet", version, about)]
struct Cli {
    /// Configuration file. Defaults to $PIXELPET_CONFIG, then the user config dir.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Use the built-in offline generator even when a backend is configured.
    #[arg(long)]
    offline: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Segment an existing sprite sheet and rewrite the atlas file.
    Atlas {
        /// PNG sprite sheet to index.
        sheet: PathBuf,
    },
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_buffer = logging::init();

    let (settings, source) = Settings::load(cli.config.as_deref())?;
    settings.validate()?;
    match &source {
        Some(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        None => tracing::info!("no configuration file found; using defaults"),
    }

    if let Some(Command::Atlas { sheet }) = &cli.command {
        return run_atlas(&settings, sheet);
    }

    let generator = pixelpet_remote::from_settings(&settings.generator, cli.offline);
    let app = App::new(&settings, generator, log_buffer, Utc::now())?;
    tracing::info!("pixelpet starting up");

    let mut terminal = setup_terminal()?;
    let res = run(&mut terminal, app);
    restore_terminal(terminal)?;
    res
}

fn run_atlas(settings: &Settings, sheet: &Path) -> Result<()> {
    let pipeline = SpritePipeline::from_settings(settings);
    let entry = pipeline
        .index_existing(sheet)
        .with_context(|| format!("failed to index {}", sheet.display()))?;

    println!("{} frame(s) in {}", entry.frames.len(), entry.source);
    for (i, rect) in entry.frames.iter().enumerate() {
        println!("  {i}: x={} y={} w={} h={}", rect.x, rect.y, rect.w, rect.h);
    }
    println!("atlas written to {}", pipeline.atlas_file().display());
    Ok(())
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, mut app: App) -> Result<()> {
    let tick_interval = Duration::from_millis(100);
    let poll_timeout = Duration::from_millis(16);
    let mut last_tick = Instant::now();

    loop {
        // ── Render ──
        terminal.draw(|f| app.draw(f))?;

        // ── Poll → Publish ──
        if event::poll(poll_timeout)? {
            match event::read()? {
                CEvent::Key(key) => app.handle_key(key),
                CEvent::Resize(cols, rows) => app.publish(Event::Resize { cols, rows }),
                _ => {}
            }
        }

        if last_tick.elapsed() >= tick_interval {
            last_tick = Instant::now();
            app.publish(Event::Tick { now: last_tick });
        }

        // ── Drain → Dispatch ──
        app.pump(Utc::now());
        if app.should_quit() {
            return Ok(());
        }
    }
}
