use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

#[derive(Parser)]
#[command(name = "rs-dependabot-upload")]
#[command(about = "Publish a Dependabot CSV report to the security assessment platform")]
#[command(long_about = "Resolves the configured network, creates a Dependabot_<date>_<time> assessment, \
                       uploads the report into a new upload slot and starts parsing. Reads conf/config.toml \
                       and the RS_API_KEY environment variable.")]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true, help = "Configuration file (default: conf/config.toml next to the binary)")]
    pub config: Option<PathBuf>,

    /// Exit non-zero when the run does not complete
    #[arg(long, global = true, help = "Use exit codes 1 (step failed), 2 (configuration), 130 (interrupted) instead of always 0")]
    pub strict_exit: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the full upload workflow (default)
    Run,
    /// Validate the configuration without contacting the platform
    Check,
}
