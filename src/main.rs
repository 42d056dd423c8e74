use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use crossterm::{
    event::{
        self, DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture, Event,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use datagrid::{GridConfig, SelectionMode, logging};
use ratatui::{backend::CrosstermBackend, prelude::*};

mod app;
mod db;
mod ui;

use app::App;
use db::{DBRequest, start_db_worker};

#[derive(Parser, Debug)]
#[command(author, version, about = "Browse and edit SQLite tables in a data grid")]
#[command(group(ArgGroup::new("selection").args(["multiple", "single", "no_select"])))]
struct Args {
    /// Path to SQLite database file (opened read-only)
    #[arg(value_name = "DB_PATH")]
    db_path: String,

    /// Table to open on start
    #[arg(short, long)]
    table: Option<String>,

    /// Maximum rows loaded per table
    #[arg(short = 'n', long, default_value_t = 200)]
    limit: usize,

    /// Grid configuration (JSON): columns, selection, pagination, sorters
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Allow selecting several rows
    #[arg(long)]
    multiple: bool,

    /// Allow selecting one row at a time
    #[arg(long)]
    single: bool,

    /// Rows cannot be selected
    #[arg(long)]
    no_select: bool,

    /// Write diagnostics to this file (filter with RUST_LOG)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

impl Args {
    /// Selection mode forced on the command line, if any.
    fn selection_override(&self) -> Option<Option<SelectionMode>> {
        if self.multiple {
            Some(Some(SelectionMode::Multiple))
        } else if self.single {
            Some(Some(SelectionMode::Single))
        } else if self.no_select {
            Some(None)
        } else {
            None
        }
    }

    fn grid_config(&self) -> Result<GridConfig> {
        let mut config = match &self.config {
            Some(path) => GridConfig::load(path)?,
            // derived columns get the row selector gutter
            None => {
                let mut config = GridConfig::default();
                config.set_selection_mode(Some(SelectionMode::Multiple));
                config
            }
        };
        if let Some(mode) = self.selection_override() {
            config.set_selection_mode(mode);
        }
        Ok(config)
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init(args.log_file.as_deref())?;
    let config = args
        .grid_config()
        .context("Failed to prepare grid configuration")?;

    // DB worker channels
    let (req_tx, req_rx) = crossbeam_channel::unbounded::<DBRequest>();
    let (resp_tx, resp_rx) = crossbeam_channel::unbounded();

    let db_path = args.db_path.clone();
    std::thread::spawn(move || start_db_worker(db_path, req_rx, resp_tx));

    let mut app = App::new(args.limit, config, req_tx, resp_rx);
    app.request_schema_refresh();
    if let Some(table) = args.table.clone() {
        app.open_table(table);
    }

    let mut terminal = setup_terminal()?;
    let res = run_app(&mut terminal, &mut app, Duration::from_millis(100));

    restore_terminal(terminal)?;
    if let Err(e) = res {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:?}");
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    tick_rate: Duration,
) -> Result<()> {
    let mut last_tick = Instant::now();
    // Redraw only when state changes or on tick
    let mut dirty = true;
    loop {
        // Process any DB responses without blocking
        while let Ok(msg) = app.resp_rx.try_recv() {
            app.handle_db_response(msg);
            dirty = true;
        }
        if app.drain_grid_events() {
            dirty = true;
        }

        let tick_due = last_tick.elapsed() >= tick_rate;
        if dirty || tick_due {
            terminal.draw(|f| ui::draw(f, app))?;
            // reveal the focused cell, which may take one more frame
            if app.after_render() {
                terminal.draw(|f| ui::draw(f, app))?;
            }
            dirty = false;
            if tick_due {
                last_tick = Instant::now();
            }
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::from_secs(0));

        if event::poll(timeout)? {
            dirty |= match event::read()? {
                Event::Key(key) => app.on_key(key),
                Event::Mouse(mouse) => app.on_mouse(mouse),
                Event::FocusGained => {
                    app.set_terminal_focus(true);
                    false
                }
                Event::FocusLost => {
                    app.set_terminal_focus(false);
                    false
                }
                Event::Resize(_, _) => true,
                _ => false,
            };
        }

        if app.should_quit {
            return Ok(());
        }
    }
}
