use anyhow::Result;
use std::path::PathBuf;

use super::{print_config_error, CommandOutcome};
use crate::clock::SystemClock;
use crate::config::UploaderConfig;
use crate::http::RetryingHttpClient;
use crate::telemetry::init_telemetry;
use crate::workflows::{UploadWorkflow, WorkflowError, WorkflowReport};

pub struct RunCommand {
    pub config_path: PathBuf,
}

impl RunCommand {
    pub fn new(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub async fn execute(&self) -> Result<CommandOutcome> {
        let config = match UploaderConfig::load(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                print_config_error(&e);
                return Ok(CommandOutcome::ConfigFailed);
            }
        };
        init_telemetry(&config.logging.level, config.logging.format)?;

        let settings = match config.validate() {
            Ok(settings) => settings,
            Err(e) => {
                print_config_error(&e);
                return Ok(CommandOutcome::ConfigFailed);
            }
        };

        let transport = RetryingHttpClient::new(settings.retry.clone(), settings.timeouts.clone())?;
        let clock = SystemClock;

        println!(
            "🚀 Publishing {} to network '{}'",
            settings.report.path().display(),
            settings.network_name
        );

        let mut workflow = UploadWorkflow::new(&transport, &settings.context, &clock);
        Ok(match workflow.run(&settings.network_name, &settings.report).await {
            Ok(report) => {
                print_success(&report);
                CommandOutcome::Success
            }
            Err(error) => {
                print_failure(&error);
                CommandOutcome::WorkflowFailed
            }
        })
    }
}

fn print_success(report: &WorkflowReport) {
    println!("✅ Network resolved: {}", report.network);
    println!("✅ Assessment successfully created");
    println!("   📋 Assessment Name: {}", report.assessment.name);
    println!("   🆔 Assessment ID: {}", report.assessment.id);
    println!("✅ Upload slot allocated: {}", report.upload);
    println!("✅ Report uploaded");
    println!("🎯 Successfully started parsing the uploaded file");
    println!("   🔗 Correlation ID: {}", report.correlation_id);
}

fn print_failure(error: &WorkflowError) {
    println!("❌ Upload workflow stopped");
    println!("──────────────────────────");
    println!("🌐 {error}");

    if let Some(orphaned) = error.orphaned().filter(|o| !o.is_empty()) {
        println!();
        println!("📦 Left on the platform (not rolled back):");
        if let Some(assessment) = &orphaned.assessment {
            println!("   → Assessment {assessment}");
        }
        if let Some(upload) = &orphaned.upload {
            println!("   → Upload {upload}");
        }
    }

    if let Some(platform_error) = error.platform_error() {
        println!();
        println!("🔧 QUICK FIXES:");
        for fix in platform_error.quick_fixes() {
            println!("   → {fix}");
        }
    }
    println!();
    println!("Exiting...");
}
