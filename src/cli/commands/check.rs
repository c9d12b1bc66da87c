use anyhow::Result;
use std::path::PathBuf;

use super::{print_config_error, CommandOutcome};
use crate::config::{UploaderConfig, API_KEY_ENV};

/// Load and validate the configuration without touching the network
pub struct CheckCommand {
    pub config_path: PathBuf,
}

impl CheckCommand {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub async fn execute(&self) -> Result<CommandOutcome> {
        println!("🔍 Checking configuration: {}", self.config_path.display());

        let config = match UploaderConfig::load(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                print_config_error(&e);
                return Ok(CommandOutcome::ConfigFailed);
            }
        };

        match config.validate() {
            Ok(settings) => {
                println!("✅ Configuration is complete");
                println!();
                print!("{}", config.to_redacted_toml()?);
                println!("{API_KEY_ENV} = <set>");
                println!();
                println!("📄 Report: {}", settings.report.path().display());
                println!(
                    "🔁 Retries: up to {} attempts per call",
                    settings.retry.max_attempts()
                );
                Ok(CommandOutcome::Success)
            }
            Err(e) => {
                print_config_error(&e);
                Ok(CommandOutcome::ConfigFailed)
            }
        }
    }
}
