mod config;
mod loader;
mod session;

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use holescope_logs::{RecordLog, SourceEvent};
use holescope_tui::{Action, AppState, Event, EventHandler, KeyBindings, LogViewerScreen, Tui};

use config::Config;
use session::{Session, next_source_event};

/// Holescope - A terminal UI for exploring Pi-hole DNS logs
#[derive(Parser, Debug)]
#[command(name = "holescope")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Log file to open [default: /var/log/pihole.log]
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Keep reading lines appended to the file
    #[arg(short, long)]
    pub follow: bool,

    /// Poll interval for --follow, in milliseconds
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_ms: Option<u64>,

    /// Year to stamp on records (log lines carry none)
    #[arg(long, value_name = "Y")]
    pub reference_year: Option<i32>,

    /// Fail the load on the first malformed line instead of skipping it
    #[arg(long)]
    pub abort_on_malformed: bool,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(args.log_file.as_deref())?;

    // Run the application
    let result = run_app(args).await;

    // Handle any errors
    if let Err(e) = &result {
        eprintln!("Error: {:#}", e);
    }

    result
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let subscriber = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
    );

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            subscriber.with_writer(Mutex::new(file)).with_ansi(false).init();
        }
        None => subscriber.with_writer(std::io::stderr).init(),
    }

    Ok(())
}

async fn run_app(args: Args) -> Result<()> {
    let config = Config::resolve(&args)?;

    let mut state = AppState::new(config.log_path.display().to_string(), config.follow);
    let mut session = Session::new(config);

    // First load happens before the terminal is taken over so failures print plainly
    let loaded = session.load().await?;
    state.loaded(loaded.skipped);

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Initialize TUI
    let mut tui = Tui::new()?;

    // Initialize event handler
    let mut events = EventHandler::new(Duration::from_millis(250));

    // Initialize keybindings
    let keybindings = KeyBindings::new();

    // Initial render
    render(&mut tui, &mut state, &session.log)?;

    // Main event loop
    loop {
        tokio::select! {
            // Handle terminal events
            Some(event) = events.next() => {
                match event {
                    Event::Key(key) => {
                        let action = keybindings.resolve(
                            state.ui_state.focus,
                            state.ui_state.help_visible,
                            &key,
                        );
                        if let Some(action) = action {
                            // Any key press clears a stale message
                            if state.ui_state.message.is_some() {
                                let _ = action_tx.send(Action::DismissMessage);
                            }
                            let _ = action_tx.send(action);
                        }
                    }
                    Event::Tick | Event::Resize(_, _) => {}
                    Event::Error(e) => {
                        state.show_message(e);
                    }
                }
            }

            // Handle followed file
            Some(source_event) = next_source_event(&mut session.follow) => {
                match source_event {
                    SourceEvent::Lines(lines) => session.append(&lines, &mut state),
                    SourceEvent::Truncated => {
                        tracing::debug!("log file truncated, reloading");
                        session.reload_after_truncation(&mut state).await;
                    }
                    SourceEvent::Error(e) => state.show_message(e),
                }
            }

            // Handle user actions
            Some(action) = action_rx.recv() => {
                match action {
                    Action::Reload => session.reload(&mut state).await,
                    action => state.apply(action),
                }
            }
        }

        if state.should_quit {
            break;
        }

        render(&mut tui, &mut state, &session.log)?;
    }

    // Cleanup
    session.stop();
    events.shutdown();
    tui.restore()?;

    Ok(())
}

fn render(tui: &mut Tui, state: &mut AppState, log: &RecordLog) -> Result<()> {
    tui.terminal().draw(|frame| {
        LogViewerScreen::render(frame, state, log);
    })?;
    Ok(())
}
