//! Chameleon CLI - voice effects from the command line.

mod commands;

use std::path::PathBuf;

use chameleon_config::AppConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chameleon")]
#[command(author, version, about = "Chameleon voice effects CLI", long_about = None)]
struct Cli {
    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render one audio file through the effect chain
    Process(commands::process::ProcessArgs),

    /// Render several files into an output directory
    Batch(commands::batch::BatchArgs),

    /// Process the microphone live
    Realtime(commands::realtime::RealtimeArgs),

    /// Show audio file information
    Info(commands::info::InfoArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// List, show and save presets
    Presets(commands::presets::PresetsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.unwrap_or_else(AppConfig::default_path);
    let config = AppConfig::load_or_default(&config_path)?;
    tracing::debug!(path = %config_path.display(), ?config, "app config");

    match cli.command {
        Commands::Process(args) => commands::process::run(args, &config),
        Commands::Batch(args) => commands::batch::run(args, &config),
        Commands::Realtime(args) => commands::realtime::run(args, &config),
        Commands::Info(args) => commands::info::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::Presets(args) => commands::presets::run(args),
    }
}
