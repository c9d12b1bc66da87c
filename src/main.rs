use clap::Parser;
use std::process::ExitCode;

use rs_dependabot_upload::cli::commands::{self, CommandOutcome};
use rs_dependabot_upload::cli::{Cli, Commands};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let strict = cli.strict_exit;

    // Single sequential workflow
    let outcome = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(anyhow::Error::from)
        .and_then(|runtime| {
            runtime.block_on(commands::execute(
                cli.command.unwrap_or(Commands::Run),
                cli.config.as_deref(),
            ))
        });

    match outcome {
        Ok(outcome) => ExitCode::from(outcome.exit_code(strict)),
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::from(CommandOutcome::WorkflowFailed.exit_code(strict))
        }
    }
}
