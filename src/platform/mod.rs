pub mod assessments;
pub mod context;
pub mod errors;
pub mod networks;
pub mod types;
pub mod uploads;

pub use assessments::AssessmentHandler;
pub use context::PlatformContext;
pub use errors::PlatformError;
pub use networks::NetworkHandler;
pub use types::{AssessmentId, CreatedAssessment, NetworkId, RawId, ReportFile, UploadId};
pub use uploads::UploadHandler;

use crate::http::Transport;

/// Entry point to the platform's per-resource handlers
pub struct PlatformClient<'a> {
    transport: &'a dyn Transport,
    context: &'a PlatformContext,
}

impl<'a> PlatformClient<'a> {
    pub fn new(transport: &'a dyn Transport, context: &'a PlatformContext) -> Self {
        Self { transport, context }
    }

    pub fn context(&self) -> &PlatformContext {
        self.context
    }

    pub fn networks(&self) -> NetworkHandler<'a> {
        NetworkHandler::new(self.transport, self.context)
    }

    pub fn assessments(&self) -> AssessmentHandler<'a> {
        AssessmentHandler::new(self.transport, self.context)
    }

    pub fn uploads(&self) -> UploadHandler<'a> {
        UploadHandler::new(self.transport, self.context)
    }
}
