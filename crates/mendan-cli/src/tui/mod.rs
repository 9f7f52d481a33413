//! mendan TUI
//!
//! Terminal calendar for browsing and editing interview records.
//!
//! ## Layout
//!
//! - Left: month calendar (dates with records show the student names)
//! - Right: records of the selected date, or search results
//!
//! ## Navigation
//!
//! - h/j/k/l or arrows: Move the selected date (day / week)
//! - [ / ]: Previous / next month, { / }: previous / next year
//! - t: Today
//! - Tab: Switch focus between calendar and record list
//! - Enter: Edit the selected date
//! - q: Quit
//!
//! ## Commands
//!
//! - d: Delete the selected date, D: delete everything
//! - T: Templates
//! - E / B: Export CSV / write backup
//! - /: Search
//! - :: Command mode (export, restore, goto, clear, ...)

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Local;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mendan_core::{Config, RecordStore, TemplateStore};

use app::{ActivePane, App, CommandResult, InputMode};

use crate::editor;

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    // File-based, only if MENDAN_LOG is set
    init_tui_logging(&config);

    let kv = crate::open_storage(&config)?;
    let mut store = RecordStore::initialize(Arc::clone(&kv)).await;
    let templates = TemplateStore::load(kv);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new(&config, templates, Local::now().date_naive());

    let result = run_app(&mut terminal, &mut app, &mut store).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    store.flush().await;
    info!("TUI closed");

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut RecordStore,
) -> Result<()> {
    let mut revisions = store.subscribe();
    let mut needs_redraw = true;

    loop {
        if app.check_status_timeout() {
            needs_redraw = true;
        }

        if needs_redraw {
            terminal.draw(|frame| ui::draw(frame, app, store))?;
            needs_redraw = false;
        }

        tokio::select! {
            biased;

            // The store changed: refresh cached views
            changed = revisions.changed() => {
                if changed.is_ok() {
                    app.on_store_changed(store);
                    needs_redraw = true;
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if event::poll(Duration::from_millis(0))? {
                    match event::read()? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => {
                            needs_redraw = true;
                            handle_key(terminal, app, store, key)?;
                        }
                        Event::Resize(..) => needs_redraw = true,
                        _ => {}
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

fn handle_key<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut RecordStore,
    key: KeyEvent,
) -> Result<()> {
    // If error modal is showing, any key dismisses it
    if app.has_error() {
        app.clear_error();
        return Ok(());
    }

    // If help is showing, any key dismisses it
    if app.show_help {
        app.show_help = false;
        return Ok(());
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, store, key.code, key.modifiers),
        InputMode::Search => handle_search_mode(app, store, key.code),
        InputMode::Command => handle_command_mode(app, store, key.code, key.modifiers),
        InputMode::Editor => handle_editor_mode(terminal, app, store, key)?,
        InputMode::Templates => handle_templates_mode(terminal, app, key)?,
        InputMode::Confirm => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => app.confirm(store),
            _ => app.cancel_confirm(),
        },
    }

    Ok(())
}

/// Handle key events in normal mode
fn handle_normal_mode(app: &mut App, store: &mut RecordStore, code: KeyCode, modifiers: KeyModifiers) {
    let in_calendar = app.active_pane == ActivePane::Calendar;

    match code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        KeyCode::Tab | KeyCode::BackTab => app.active_pane = app.active_pane.toggle(),

        // Calendar navigation
        KeyCode::Char('h') | KeyCode::Left if in_calendar => app.move_days(-1),
        KeyCode::Char('l') | KeyCode::Right if in_calendar => app.move_days(1),
        KeyCode::Char('k') | KeyCode::Up if in_calendar => app.move_days(-7),
        KeyCode::Char('j') | KeyCode::Down if in_calendar => app.move_days(7),

        // Record list navigation
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(store),
        KeyCode::Char('h') | KeyCode::Left => app.active_pane = ActivePane::Calendar,

        KeyCode::Char('[') | KeyCode::Char('p') => app.move_months(-1),
        KeyCode::Char(']') | KeyCode::Char('n') => app.move_months(1),
        KeyCode::Char('{') => app.move_months(-12),
        KeyCode::Char('}') => app.move_months(12),
        KeyCode::Char('t') => app.go_today(),

        KeyCode::Enter => {
            if !in_calendar && !app.search_query.is_empty() && !app.open_selected_hit() {
                return;
            }
            app.open_editor(store);
        }

        KeyCode::Char('d') => app.request_delete_date(store),
        KeyCode::Char('D') => app.request_clear_all(store),
        KeyCode::Char('T') => app.open_templates(),
        KeyCode::Char('E') => app.export(store, "csv"),
        KeyCode::Char('B') => app.export(store, "backup"),

        KeyCode::Char('/') => app.enter_search_mode(),
        KeyCode::Esc if !app.search_query.is_empty() => app.clear_search(store),
        KeyCode::Char(':') => app.enter_command_mode(),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }
}

/// Handle key events while typing a search query
fn handle_search_mode(app: &mut App, store: &RecordStore, code: KeyCode) {
    match code {
        KeyCode::Esc => app.clear_search(store),
        KeyCode::Enter => {
            app.input_mode = InputMode::Normal;
            if !app.hits.is_empty() {
                app.active_pane = ActivePane::Day;
            }
        }
        KeyCode::Backspace => app.search_backspace(store),
        KeyCode::Char(c) => app.search_insert(c, store),
        _ => {}
    }
}

/// Handle key events in command mode
fn handle_command_mode(
    app: &mut App,
    store: &mut RecordStore,
    code: KeyCode,
    modifiers: KeyModifiers,
) {
    match code {
        KeyCode::Esc => app.exit_input_mode(),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.exit_input_mode();
        }
        KeyCode::Enter => {
            if app.execute_command(store) == CommandResult::Quit {
                app.should_quit = true;
            }
        }
        KeyCode::Backspace => {
            if app.command_input.pop().is_none() {
                app.exit_input_mode();
            }
        }
        KeyCode::Char(c) => app.command_input.push(c),
        _ => {}
    }
}

/// Handle key events in the entry editor
fn handle_editor_mode<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    store: &mut RecordStore,
    key: KeyEvent,
) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => app.close_editor(),
        KeyCode::Char('s') if ctrl => app.save_editor(store),
        KeyCode::Char('x') if ctrl => app.request_delete_date(store),
        KeyCode::Char('e') if ctrl => {
            let current = app.editor.as_ref().and_then(|s| s.current_content());
            if let Some(current) = current {
                if let Some(edited) = run_external_editor(terminal, app, &current)? {
                    if let Some(state) = app.editor.as_mut() {
                        state.set_current_content(edited.trim_end_matches('\n').to_string());
                    }
                }
            }
        }
        KeyCode::Char(c @ '1'..='3') if alt => {
            let slot = c as usize - '1' as usize;
            app.insert_template(slot);
        }
        _ => {
            let Some(state) = app.editor.as_mut() else {
                return Ok(());
            };
            match key.code {
                KeyCode::Char('n') if ctrl => state.add_entry(),
                KeyCode::Char('d') if ctrl => state.remove_current(),
                KeyCode::Tab | KeyCode::Down => state.next_field(),
                KeyCode::BackTab | KeyCode::Up => state.prev_field(),
                KeyCode::Left => state.cycle(false),
                KeyCode::Right => state.cycle(true),
                KeyCode::Enter => state.newline(),
                KeyCode::Backspace => state.delete_char(),
                KeyCode::Char(' ') if state.editor.options().choices(state.field).is_some() => {
                    state.cycle(true)
                }
                KeyCode::Char(c) if !ctrl => state.insert_char(c),
                _ => {}
            }
        }
    }

    Ok(())
}

/// Handle key events in the template editor
fn handle_templates_mode<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    key: KeyEvent,
) -> Result<()> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Esc => app.close_templates(),
        KeyCode::Char('s') if ctrl => app.save_template(),
        KeyCode::Char('d') if ctrl => app.request_clear_template(),
        KeyCode::Char('e') if ctrl => {
            let current = app
                .template_state
                .as_ref()
                .map(|s| s.current().to_string())
                .unwrap_or_default();
            if let Some(edited) = run_external_editor(terminal, app, &current)? {
                if let Some(draft) = app.template_state.as_mut().and_then(|s| s.current_mut()) {
                    *draft = edited.trim_end_matches('\n').to_string();
                }
            }
        }
        _ => {
            let Some(state) = app.template_state.as_mut() else {
                return Ok(());
            };
            match key.code {
                KeyCode::Tab | KeyCode::Right => state.next_tab(),
                KeyCode::BackTab | KeyCode::Left => state.prev_tab(),
                KeyCode::Enter => {
                    if let Some(draft) = state.current_mut() {
                        draft.push('\n');
                    }
                }
                KeyCode::Backspace => {
                    if let Some(draft) = state.current_mut() {
                        draft.pop();
                    }
                }
                KeyCode::Char(c) if !ctrl => {
                    if let Some(draft) = state.current_mut() {
                        draft.push(c);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(())
}

/// Leave the TUI, edit `initial` in $EDITOR, and come back
///
/// Returns `None` (with an error modal) when the editor fails.
fn run_external_editor<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    initial: &str,
) -> Result<Option<String>> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(cursor::Show)?;

    let edited = editor::edit_text(initial);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    terminal.clear()?;

    match edited {
        Ok(text) => Ok(Some(text)),
        Err(e) => {
            app.set_error(format!("Editor failed: {:#}", e));
            Ok(None)
        }
    }
}

/// Initialize file-based logging for TUI mode
///
/// Only logs if MENDAN_LOG environment variable is set.
/// Logs go to `config.log_file` or `data_dir/debug.log`.
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("MENDAN_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "mendan_core={},mendan_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
