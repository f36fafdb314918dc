//! # Gamepad Mapper
//!
//! Interactively map the buttons and axes of a gamepad to the standard layout.
//!
//! The tool polls the first detected evdev gamepad and walks through every
//! standard button and axis, asking the user to press each one in turn.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use gamepad_mapper::codegen::{self, DEFAULT_MAPPER_NAME};
use gamepad_mapper::config::{Config, LoggingConfig};
use gamepad_mapper::device::gamepad::{list_gamepads, EvdevGamepad};
use gamepad_mapper::mapping::export::MappingExport;
use gamepad_mapper::mapping::state::MappingState;
use gamepad_mapper::mapping::step::default_steps;
use gamepad_mapper::view::terminal::{spawn_stdin_actions, TerminalDisplay};
use gamepad_mapper::view::{MappingView, UserAction};

/// Capacity of the user action channel
const ACTION_CHANNEL_CAPACITY: usize = 16;

/// Log file name used when `logging.file` names only a directory
const DEFAULT_LOG_FILE: &str = "gamepad-mapper.log";

#[derive(Parser, Debug)]
#[command(name = "gamepad-mapper")]
#[command(about = "Map physical gamepad buttons and axes to the standard layout")]
#[command(version)]
struct Cli {
    /// Config file path (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// evdev device to map instead of auto-detecting
    #[arg(short, long)]
    device: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the interactive mapping (default)
    Map,
    /// List detected gamepads
    ListDevices,
    /// Generate mapping-table code from an exported mapping
    Codegen {
        /// Exported mapping JSON file
        export: PathBuf,

        /// Name of the generated mapper function
        #[arg(short, long, default_value = DEFAULT_MAPPER_NAME)]
        name: String,
    },
}

/// Main entry point for Gamepad Mapper
///
/// # Control Flow
///
/// 1. Load configuration (file from `--config`, otherwise defaults) and
///    apply `--device`.
/// 2. Set up logging to stderr, or to `logging.file` when configured.
///    Stdout is reserved for the mapping display.
/// 3. Run the chosen subcommand. `map` polls the gamepad until the user
///    quits, stdin closes, or Ctrl+C is pressed.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(device) = &cli.device {
        config.controller.device_path = device.display().to_string();
    }

    let _log_guard = init_logging(&config.logging)?;
    info!("Gamepad Mapper v{} starting...", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Command::Map) {
        Command::Map => run_mapping(&config).await,
        Command::ListDevices => list_devices(),
        Command::Codegen { export, name } => generate_code(&export, &name),
    }
}

/// Initializes tracing; the returned guard flushes the log file on drop.
fn init_logging(logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid log filter")?;

    if logging.file.trim().is_empty() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let (dir, file) = split_log_path(Path::new(logging.file.trim()));
    let appender = tracing_appender::rolling::never(dir, file);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

/// Splits a log path into directory and file name, defaulting both.
fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file = path.file_name().unwrap_or_else(|| OsStr::new(DEFAULT_LOG_FILE));
    (dir.to_path_buf(), PathBuf::from(file))
}

async fn run_mapping(config: &Config) -> Result<()> {
    let source = EvdevGamepad::new(config.device_path(), config.rescan_interval());
    let state = MappingState::new(default_steps());
    let view = MappingView::new(source, TerminalDisplay::stdout(), state, config.view_options());

    let (tx, rx) = mpsc::channel(ACTION_CHANNEL_CAPACITY);
    spawn_stdin_actions(tx.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, shutting down...");
            let _ = tx.send(UserAction::Quit).await;
        }
    });

    info!("Type s/b/r/d and Enter to skip, go back, reset or finish; q to quit");

    let view = view.run(rx).await?;
    let state = view.state();
    info!(
        "Mapped {} of {} controls",
        state.mappings().iter().filter(|m| m.maps_to.is_some()).count(),
        state.len()
    );

    Ok(())
}

fn list_devices() -> Result<()> {
    let gamepads = list_gamepads()?;
    if gamepads.is_empty() {
        println!("No gamepads found");
    }
    for gamepad in gamepads {
        println!("{}\t{}", gamepad.path.display(), gamepad.id);
    }
    Ok(())
}

fn generate_code(export_path: &Path, mapper_name: &str) -> Result<()> {
    let export = MappingExport::load(export_path)
        .with_context(|| format!("Failed to read export {}", export_path.display()))?;
    print!("{}", codegen::render(&export, mapper_name)?);
    Ok(())
}
