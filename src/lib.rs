// Dependabot report uploader library
// Exposes the platform client and workflow for the binary and integration tests

pub mod cli;
pub mod clock;
pub mod config;
pub mod http;
pub mod platform;
pub mod shutdown;
pub mod telemetry;
pub mod workflows;

// Re-export key types for easy access
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, RunSettings, UploaderConfig};
pub use http::{ApiRequest, ApiResponse, RetryConfig, RetryingHttpClient, Transport, TransportError};
pub use platform::{
    AssessmentId, CreatedAssessment, NetworkId, PlatformClient, PlatformContext, PlatformError, ReportFile, UploadId,
};
pub use shutdown::{RunOutcome, ShutdownCoordinator};
pub use telemetry::{create_workflow_span, generate_correlation_id, init_telemetry, StepTimer};
pub use workflows::{UploadWorkflow, UploadWorkflowState, WorkflowError, WorkflowReport, WorkflowStage};
