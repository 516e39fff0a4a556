//! Quotebook TUI
//!
//! Terminal user interface over the synchronization controller.
//!
//! ## Layout
//!
//! - Top: search bar
//! - Left: the catalog view (all quotes or search results)
//! - Right: random quote, the create/edit form and the external suggestion
//! - Bottom: status line (errors, notices, key hints)
//!
//! ## Navigation
//!
//! - j/k or ↑/↓: Move selection up/down
//! - /: Search, Esc: clear search
//! - a: New quote, e: Edit, d: Delete
//! - r: Random quote, x: External suggestion
//! - ?: Help, q: Quit
//!
//! Every intent that talks to the catalog service runs as its own tokio
//! task, so requests overlap freely; the screen redraws whenever the store
//! signals a change.

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::watch;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use quotebook_core::{Config, HttpQuoteRepository, SyncController};

use app::{App, Intent};

use crate::commands::Controller;

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    // Initialize TUI logging (file-based, only if QUOTEBOOK_LOG is set)
    init_tui_logging(&config);

    let repo = HttpQuoteRepository::from_config(&config)
        .context("Failed to set up the quote service client")?;
    let controller = SyncController::new(repo);
    let mut changes = controller.store().subscribe();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new(config.api_url.clone());
    dispatch(&controller, Intent::InitialLoad);

    let result = run_app(&mut terminal, &mut app, &controller, &mut changes).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    controller: &Controller,
    changes: &mut watch::Receiver<u64>,
) -> Result<()> {
    loop {
        // Check for status message timeout
        app.check_status_timeout();

        let state = controller.snapshot();
        app.sync_with(&state);

        terminal.draw(|frame| ui::draw(frame, app, &state))?;

        tokio::select! {
            biased;

            // Store changed - redraw
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                // Check for terminal events (non-blocking)
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        if let Some(intent) = app.handle_key(key.code, key.modifiers, &state) {
                            dispatch(controller, intent);
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Forward an intent to the controller
///
/// Form edits apply immediately; anything that calls the service is spawned.
fn dispatch(controller: &Controller, intent: Intent) {
    debug!(?intent, "Dispatching intent");
    match intent {
        Intent::ToggleForm => controller.toggle_form(),
        Intent::BeginEdit(id) => {
            // A failure is recorded in the store and shown in the status bar
            let _ = controller.begin_edit(id);
        }
        Intent::CancelEdit => controller.cancel_edit(),
        Intent::SetDraftText(text) => controller.set_draft_text(&text),
        Intent::SetDraftAuthor(author) => controller.set_draft_author(&author),
        Intent::UseSuggestion => controller.use_suggestion(),
        other => spawn_intent(controller.clone(), other),
    }
}

fn spawn_intent(controller: Controller, intent: Intent) {
    tokio::spawn(async move {
        let result = match intent {
            Intent::InitialLoad => controller.initial_load().await,
            Intent::Reload => controller.reload_catalog().await,
            Intent::Search(term) => controller.search(&term).await,
            Intent::ClearSearch => controller.clear_search().await,
            Intent::RefreshRandom => controller.refresh_random().await,
            Intent::TextFocusLost => controller.text_focus_lost().await,
            Intent::AuthorFocusLost => controller.author_focus_lost().await,
            Intent::FetchExternal(query) => controller.fetch_external(query).await,
            Intent::AdoptSuggestion => controller.adopt_suggestion().await.map(|_| ()),
            Intent::Submit => controller.submit_form().await.map(|_| ()),
            Intent::Delete(id) => controller.delete(id).await,
            Intent::ToggleForm
            | Intent::BeginEdit(_)
            | Intent::CancelEdit
            | Intent::SetDraftText(_)
            | Intent::SetDraftAuthor(_)
            | Intent::UseSuggestion => Ok(()),
        };

        if let Err(failure) = result {
            debug!(error = %failure, "Intent finished with an error");
        }
    });
}

/// Initialize file-based logging for TUI mode
///
/// Only logs if QUOTEBOOK_LOG is set; the terminal itself stays clean.
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("QUOTEBOOK_LOG") else {
        return;
    };

    // Determine log file path
    let log_path = config
        .log_file
        .clone()
        .unwrap_or_else(|| config.default_log_path());

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    // Create log file
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "quotebook_core={},quotebook={}",
        log_level, log_level
    ));

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
