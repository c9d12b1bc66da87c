use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` takes precedence over `level` when set. Console progress for the operator
/// is printed separately on stdout.
pub fn init_telemetry(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?,
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(filter)
            .try_init()?,
    }

    tracing::debug!("Telemetry initialized");
    Ok(())
}

/// Generate a correlation ID linking every log line of one run
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn create_workflow_span(correlation_id: &str, network_name: &str, report: &str) -> tracing::Span {
    tracing::info_span!(
        "upload_workflow",
        correlation.id = correlation_id,
        network.name = network_name,
        report.file = report,
    )
}

/// Logs how long a workflow step took when finished
pub struct StepTimer {
    step: String,
    start: Instant,
}

impl StepTimer {
    pub fn new(step: impl Into<String>) -> Self {
        Self {
            step: step.into(),
            start: Instant::now(),
        }
    }

    pub fn finish(self, succeeded: bool) {
        info!(
            step = %self.step,
            succeeded,
            duration_ms = self.start.elapsed().as_millis() as u64,
            "Step completed"
        );
    }
}
