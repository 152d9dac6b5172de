//! Simple EQ CLI
//!
//! Command-line interface for the equalizer engine.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use simple_eq::cli::{commands, Cli, Commands};
use simple_eq::config::EngineConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Simple EQ v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    config.validate().context("invalid engine configuration")?;

    match cli.command {
        Some(cmd) => handle_command(cmd, &config),
        None => {
            println!("Simple EQ v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, config: &EngineConfig) -> anyhow::Result<()> {
    match cmd {
        Commands::Render { input, output, eq } => commands::render(&input, &output, &eq, config)
            .with_context(|| format!("rendering {}", input.display())),
        Commands::Response { points, eq } => {
            commands::response(points, &eq, config).context("computing response curve")
        }
        Commands::Impulse { blocks, eq } => {
            let report = commands::impulse(blocks, &eq, config)?;
            if !report.all_finite {
                anyhow::bail!("impulse response produced non-finite samples");
            }
            Ok(())
        }
        Commands::Spectrum { input, peaks, eq } => commands::spectrum(&input, peaks, &eq, config)
            .with_context(|| format!("analyzing {}", input.display())),
    }
}
