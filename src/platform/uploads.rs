use reqwest::StatusCode;
use tracing::{debug, info};

use super::context::PlatformContext;
use super::errors::PlatformError;
use super::types::{AssessmentId, Created, NetworkId, NewUpload, ReportFile, StartParsing, UploadId};
use crate::clock::{Clock, DATE_FORMAT};
use crate::http::{FilePart, Transport};

pub const FILE_FIELD: &str = "scanFile";

/// Handler for the upload slot lifecycle: allocate, attach the file, start parsing
pub struct UploadHandler<'a> {
    transport: &'a dyn Transport,
    context: &'a PlatformContext,
}

impl<'a> UploadHandler<'a> {
    pub fn new(transport: &'a dyn Transport, context: &'a PlatformContext) -> Self {
        Self { transport, context }
    }

    /// Allocate an upload slot bound to `assessment` and `network`, named after today's date
    pub async fn allocate(
        &self,
        clock: &dyn Clock,
        assessment: &AssessmentId,
        network: &NetworkId,
    ) -> Result<UploadId, PlatformError> {
        const OPERATION: &str = "allocate upload";

        let body = NewUpload {
            assessment_id: assessment.clone(),
            name: clock.now().format(DATE_FORMAT).to_string(),
            network_id: network.clone(),
        };
        let body = serde_json::to_value(&body)
            .map_err(|source| PlatformError::Encode { operation: OPERATION, source })?;
        let request = self.context.post("upload").json(body);

        let response = self.transport.send(&request).await?;
        if response.status != StatusCode::CREATED {
            return Err(PlatformError::unexpected_status(
                OPERATION,
                response.status,
                StatusCode::CREATED,
                &response.body,
            ));
        }

        let created: Created<UploadId> = response
            .json()
            .map_err(|source| PlatformError::Decode { operation: OPERATION, source })?;

        info!(upload_id = %created.id, assessment_id = %assessment, network_id = %network, "Upload slot allocated");
        Ok(created.id)
    }

    /// Send the report verbatim as a multipart upload into the slot
    pub async fn transmit(&self, upload: &UploadId, report: &ReportFile) -> Result<(), PlatformError> {
        const OPERATION: &str = "upload file";

        let path = report.path();
        let contents = tokio::fs::read(&path)
            .await
            .map_err(|source| PlatformError::ReportUnreadable { path: path.clone(), source })?;
        debug!(path = %path.display(), bytes = contents.len(), "Report loaded");

        let request = self
            .context
            .post_segments(&["upload", upload.to_string().as_str(), "file"])
            .header("Content-Disposition", "form-data")
            .header("filename", report.file_name())
            .multipart(FilePart {
                field: FILE_FIELD.to_string(),
                file_name: report.file_name().to_string(),
                contents,
            });

        let response = self.transport.send(&request).await?;
        if response.status != StatusCode::CREATED {
            return Err(PlatformError::unexpected_status(
                OPERATION,
                response.status,
                StatusCode::CREATED,
                &response.body,
            ));
        }

        info!(upload_id = %upload, file = report.file_name(), "Report attached to upload");
        Ok(())
    }

    /// Ask the platform to parse the attached file, with automatic remediation workflows off
    pub async fn start_parsing(&self, upload: &UploadId) -> Result<(), PlatformError> {
        const OPERATION: &str = "start parsing";

        let body = serde_json::to_value(StartParsing { auto_urba: false })
            .map_err(|source| PlatformError::Encode { operation: OPERATION, source })?;
        let request = self
            .context
            .post_segments(&["upload", upload.to_string().as_str(), "start"])
            .json(body);

        let response = self.transport.send(&request).await?;
        if response.status != StatusCode::OK {
            return Err(PlatformError::unexpected_status(
                OPERATION,
                response.status,
                StatusCode::OK,
                &response.body,
            ));
        }

        info!(upload_id = %upload, "Parsing started");
        Ok(())
    }
}
