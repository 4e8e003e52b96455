use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use mirrorbits_core::{Commands, CoreConfig};

#[derive(Parser)]
#[command(
    name = "mirrorbits",
    about = "A smart download redirector (administration)",
    disable_help_subcommand = true
)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "MIRRORBITS_CONFIG", default_value = "mirrorbits.toml")]
    config: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    debug: bool,

    /// COMMAND [arg...]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mirrorbits_core=debug,mirrorbits=debug"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("mirrorbits_core=warn,mirrorbits=warn"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let config = CoreConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    tracing::debug!(store = %config.store.path.display(), "configuration loaded");

    let mut commands = Commands::new(config);
    let stdout = io::stdout();
    let stderr = io::stderr();
    commands
        .dispatch(&cli.command, &mut stdout.lock(), &mut stderr.lock())
        .map_err(anyhow::Error::from)
}
