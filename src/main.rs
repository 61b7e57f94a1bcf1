//! retroterm - a retro CRT-style terminal driven by a remote command service
//!
//! retroterm paints a fixed 80x25 green-on-black character grid and feeds it
//! from a line-oriented command service behind a capability URL. On start it
//! replays the service's boot message stream, then hands the prompt to the
//! user; every submitted line goes out as a command request and the reply
//! lines scroll in above the prompt.
//!
//! # Quick Start
//!
//! ```text
//! retroterm                                   # endpoint from config/env
//! retroterm -e https://sim.example.net/cap/k  # endpoint from the CLI
//! ```
//!
//! # Keys
//!
//! | Key | Action |
//! |-----|--------|
//! | printable | Append to the pending command |
//! | Backspace | Delete the last character |
//! | Enter | Submit the pending command |
//! | Esc / Ctrl+C | Quit |

mod config;
mod core;
mod ui;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::core::grid::Grid;
use crate::core::protocol::HttpTransport;
use crate::core::session::{RemoteSession, SessionState};
use crate::ui::{ConsoleSurface, InputRouter, Renderer, Surface};

/// Version string from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Command line options
struct Args {
    /// Endpoint override from the CLI
    endpoint: Option<String>,
}

fn print_version() {
    eprintln!("retroterm {}", VERSION);
}

fn print_help() {
    eprintln!(
        "retroterm {} - a retro CRT-style terminal driven by a remote command service",
        VERSION
    );
    eprintln!();
    eprintln!("Usage: retroterm [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -e, --endpoint <URL>  Capability URL of the command service");
    eprintln!("  -v, --version         Show version");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("The endpoint may also be set via the RETROTERM_ENDPOINT environment");
    eprintln!("variable or the `endpoint` key in ~/.retroterm/config.toml; the");
    eprintln!("command line wins, then the environment, then the file.");
    eprintln!();
    eprintln!("Keys: type to build a command, Enter submits, Backspace deletes,");
    eprintln!("      Esc or Ctrl+C quits.");
    eprintln!();
    eprintln!("Configuration: ~/.retroterm/config.toml");
    eprintln!("Log file:      ~/.retroterm/retroterm.log");
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args { endpoint: None };
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-v" | "--version" => {
                print_version();
                std::process::exit(0);
            }
            "-e" | "--endpoint" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing endpoint argument".to_string());
                }
                parsed.endpoint = Some(args[i].clone());
            }
            arg => {
                return Err(format!("Unknown argument: {}. Use -h for help.", arg));
            }
        }
        i += 1;
    }

    Ok(parsed)
}

fn init_logging() {
    let log_path = config::home_dir()
        .map(|home| home.join(".retroterm").join("retroterm.log"))
        .unwrap_or_else(|| std::path::PathBuf::from("retroterm.log"));

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok();

    if let Some(file) = log_file {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_writer(std::sync::Mutex::new(file))
            .with_ansi(false)
            .finish();
        let _ = tracing::subscriber::set_global_default(subscriber);
    }
}

fn main() -> anyhow::Result<()> {
    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("Use --help for usage information");
            std::process::exit(1);
        }
    };

    init_logging();
    info!("retroterm starting...");

    let mut config = Config::load();
    if let Ok(url) = env::var("RETROTERM_ENDPOINT") {
        if !url.is_empty() {
            config.endpoint = Some(url);
        }
    }
    if let Some(url) = args.endpoint {
        config.endpoint = Some(url);
    }
    match &config.endpoint {
        Some(url) => info!("endpoint: {}", url),
        None => info!("no endpoint configured"),
    }

    run_terminal(config)
}

fn run_terminal(config: Config) -> anyhow::Result<()> {
    let mut surface = ConsoleSurface::new();
    surface.init()?;
    info!("surface size: {}x{}", surface.width(), surface.height());

    let mut grid = Grid::new(config.screen.cols, config.screen.rows);
    let mut renderer = Renderer::new(config.screen.cols, config.screen.rows);
    renderer.layout(&surface);

    let transport = Arc::new(HttpTransport::new(Duration::from_secs(
        config.service.request_timeout_secs,
    )));
    let mut session = RemoteSession::new(
        config.endpoint.clone(),
        transport,
        Duration::from_millis(config.service.pull_interval_ms),
    );
    let mut router = InputRouter::new();

    session.start(&mut grid);

    let frame = Duration::from_millis(config.screen.frame_ms.max(1));
    let result = run_main_loop(
        &mut surface,
        &mut grid,
        &mut renderer,
        &mut session,
        &mut router,
        frame,
    );

    let _ = surface.cleanup();
    result
}

/// Main event loop
fn run_main_loop(
    surface: &mut ConsoleSurface,
    grid: &mut Grid,
    renderer: &mut Renderer,
    session: &mut RemoteSession,
    router: &mut InputRouter,
    frame: Duration,
) -> anyhow::Result<()> {
    loop {
        session.poll(grid);

        if let Err(e) =
            renderer.render(surface, grid, session.state() == SessionState::AcceptingInput)
        {
            error!("render failed: {}", e);
            return Err(e.into());
        }

        // Wait out the rest of the frame for input.
        if event::poll(frame)? {
            match event::read()? {
                Event::Key(key_event) => {
                    if key_event.kind != KeyEventKind::Press {
                        continue;
                    }
                    let ctrl_c = key_event.modifiers.contains(KeyModifiers::CONTROL)
                        && key_event.code == KeyCode::Char('c');
                    if key_event.code == KeyCode::Esc || ctrl_c {
                        info!("quit requested");
                        break;
                    }
                    router.handle_key(&key_event, grid, session);
                }

                Event::Resize(cols, rows) => {
                    info!("resize: {}x{}", cols, rows);
                    surface.set_size(cols, rows);
                    renderer.layout(&*surface);
                }

                _ => {}
            }
        }
    }

    Ok(())
}
