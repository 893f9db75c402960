//! Recallify - terminal study client
//!
//! Studies MCQ and flashcard sets exported from the Recallify backend and
//! previews the next review interval on every grade button.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::info;
use ratatui::prelude::*;

use recallify::config::Config;
use recallify::models::{Language, ReviewState};
use recallify::schedule;
use recallify::storage::DeckStorage;
use recallify::ui::App;

// ══════════════════════════════════════════════════════════════════════════
// CLI Arguments
// ══════════════════════════════════════════════════════════════════════════

#[derive(Parser, Debug)]
#[command(name = "recallify")]
#[command(author, version, about = "Study Recallify question and flashcard sets in the terminal", long_about = None)]
struct Args {
    /// Directory containing deck files
    #[arg(short, long)]
    decks_dir: Option<PathBuf>,

    /// Where to write the log (level from RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the interval preview for each grade and exit
    #[arg(long)]
    preview: bool,

    /// Easiness factor for --preview
    #[arg(long, default_value_t = 2.5, requires = "preview")]
    ef: f64,

    /// Consecutive successful reviews for --preview
    #[arg(long, default_value_t = 0, requires = "preview")]
    repetitions: u32,

    /// Previous interval in hours for --preview
    #[arg(long, default_value_t = 0.0, requires = "preview")]
    interval_hours: f64,
}

// ══════════════════════════════════════════════════════════════════════════
// Main Entry Point
// ══════════════════════════════════════════════════════════════════════════

fn main() -> Result<()> {
    let args = Args::parse();

    // Load config
    let config = Config::load().unwrap_or_default();

    if args.preview {
        let state = ReviewState::new(args.ef, args.repetitions, args.interval_hours);
        return print_preview(&state, config.language);
    }

    let log_file = args.log_file.unwrap_or_else(default_log_path);
    init_logging(&log_file)?;

    // Determine decks directory
    let decks_dir = args
        .decks_dir
        .or_else(|| config.decks_dir.clone())
        .unwrap_or_else(DeckStorage::default_path);
    info!("Using decks directory {:?}", decks_dir);

    let storage = DeckStorage::new(decks_dir)?;

    run_tui(storage, config)
}

fn print_preview(state: &ReviewState, language: Language) -> Result<()> {
    let preview = schedule::preview_intervals(state)?;
    for (grade, label) in preview {
        println!("{} {:<12} {}", grade.value(), grade.label(language), label);
    }
    Ok(())
}

fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recallify")
        .join("recallify.log")
}

/// The TUI owns the terminal, so logs go to a file.
fn init_logging(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {:?}", parent))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {:?}", path))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
    Ok(())
}

fn run_tui(storage: DeckStorage, config: Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(storage, config);

    // Run main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Error: {}", err);
        return Err(err);
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    while app.running {
        terminal.draw(|frame| app.render(frame))?;
        app.handle_events()?;
    }
    Ok(())
}
