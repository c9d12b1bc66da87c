use anyhow::Result;
use std::path::{Path, PathBuf};

use super::Commands;
use crate::config::{ConfigError, UploaderConfig};
use crate::shutdown::{RunOutcome, ShutdownCoordinator};

pub mod check;
pub mod run;

pub use check::CheckCommand;
pub use run::RunCommand;

/// How a command ended, mapped to a process exit code at the top level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Success,
    ConfigFailed,
    WorkflowFailed,
    Interrupted,
}

impl CommandOutcome {
    /// Without `strict`, every outcome exits 0 so schedulers treat the job as finished
    pub fn exit_code(self, strict: bool) -> u8 {
        if !strict {
            return 0;
        }
        match self {
            CommandOutcome::Success => 0,
            CommandOutcome::WorkflowFailed => 1,
            CommandOutcome::ConfigFailed => 2,
            CommandOutcome::Interrupted => 130,
        }
    }
}

/// Run `command` from start to finish under the interrupt listener, so Ctrl-C during
/// configuration loading ends the run the same way as Ctrl-C mid-upload
pub async fn execute(command: Commands, config_path: Option<&Path>) -> Result<CommandOutcome> {
    execute_until(ShutdownCoordinator::ctrl_c(), command, config_path).await
}

async fn execute_until<S>(
    coordinator: ShutdownCoordinator<S>,
    command: Commands,
    config_path: Option<&Path>,
) -> Result<CommandOutcome>
where
    S: std::future::Future<Output = ()>,
{
    let work = async {
        UploaderConfig::load_env_file()?;
        let config_path = resolve_config_path(config_path);
        match command {
            Commands::Run => RunCommand::new(config_path).execute().await,
            Commands::Check => CheckCommand::new(config_path).execute().await,
        }
    };

    match coordinator.run_until_interrupted(work).await {
        RunOutcome::Completed(result) => result,
        RunOutcome::Interrupted => {
            println!();
            println!("⏹️  Interrupted. Exiting...");
            Ok(CommandOutcome::Interrupted)
        }
    }
}

pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(UploaderConfig::default_path)
}

pub fn print_config_error(error: &ConfigError) {
    println!("❌ Configuration Error");
    println!("─────────────────────");
    println!("📂 {error}");
    println!();
    println!("🔧 QUICK FIXES:");
    for fix in error.quick_fixes() {
        println!("   → {fix}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lenient_exit_is_always_zero() {
        for outcome in [
            CommandOutcome::Success,
            CommandOutcome::ConfigFailed,
            CommandOutcome::WorkflowFailed,
            CommandOutcome::Interrupted,
        ] {
            assert_eq!(outcome.exit_code(false), 0);
        }
    }

    #[test]
    fn test_strict_exit_codes() {
        assert_eq!(CommandOutcome::Success.exit_code(true), 0);
        assert_eq!(CommandOutcome::WorkflowFailed.exit_code(true), 1);
        assert_eq!(CommandOutcome::ConfigFailed.exit_code(true), 2);
        assert_eq!(CommandOutcome::Interrupted.exit_code(true), 130);
    }

    #[test]
    fn test_explicit_config_path_wins() {
        assert_eq!(resolve_config_path(Some(Path::new("/etc/x.toml"))), PathBuf::from("/etc/x.toml"));
    }

    #[tokio::test]
    async fn test_interrupt_before_config_load_is_an_orderly_outcome() {
        let coordinator = ShutdownCoordinator::with_signal(async {});
        let outcome = execute_until(coordinator, Commands::Run, Some(Path::new("/nonexistent/config.toml")))
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::Interrupted);
        assert_eq!(outcome.exit_code(false), 0);
    }

    #[tokio::test]
    async fn test_command_completes_when_no_interrupt_arrives() {
        let dir = tempfile::tempdir().unwrap();
        let coordinator = ShutdownCoordinator::with_signal(std::future::pending::<()>());
        let outcome = execute_until(coordinator, Commands::Check, Some(&dir.path().join("absent.toml")))
            .await
            .unwrap();
        assert_eq!(outcome, CommandOutcome::ConfigFailed);
    }
}
