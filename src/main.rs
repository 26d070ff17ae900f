// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use inapp_camera::{Config, Lens};
use std::fs::File;
use std::sync::Mutex;

mod cli;

#[derive(Parser)]
#[command(name = "inapp-camera")]
#[command(about = "Preview a camera, record short clips and review the latest one")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the camera screen in the terminal (default)
    Ui,

    /// Record a clip without the screen
    Record {
        /// Lens to record with (front or back)
        #[arg(short, long)]
        lens: Option<Lens>,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },

    /// Show the required permissions and whether they are granted
    Permissions,

    /// Show the active configuration
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        None | Some(Commands::Ui) => init_file_logging(),
        Some(_) => init_logging(),
    }
    let config = Config::load();

    match cli.command {
        None | Some(Commands::Ui) => inapp_camera::terminal::run(config),
        Some(Commands::Record { lens, duration }) => cli::record(config, lens, duration),
        Some(Commands::Permissions) => cli::show_permissions(&config),
        Some(Commands::Config { write }) => cli::show_config(&config, write),
    }
}

fn env_filter() -> tracing_subscriber::EnvFilter {
    // Set RUST_LOG to control the level, e.g. RUST_LOG=inapp_camera=debug
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .with_level(true)
        .init();
}

/// The terminal screen owns stdout, so logs go to the cache directory
fn init_file_logging() {
    let file = dirs::cache_dir()
        .map(|dir| dir.join("inapp-camera"))
        .and_then(|dir| {
            std::fs::create_dir_all(&dir).ok()?;
            File::create(dir.join("inapp-camera.log")).ok()
        });

    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(env_filter())
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new("off"))
            .init(),
    }
}
