use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

use crate::http::TransportError;

/// A platform call that did not honour its contract
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{operation} returned HTTP {status} (expected {expected})")]
    UnexpectedStatus {
        operation: &'static str,
        status: StatusCode,
        expected: StatusCode,
        body: String,
    },

    #[error("network '{name}' matched {matches} networks (expected exactly one)")]
    NetworkResolution { name: String, matches: u64 },

    #[error("could not encode {operation} request: {source}")]
    Encode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not decode {operation} response: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not read report file {}: {source}", path.display())]
    ReportUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PlatformError {
    pub fn unexpected_status(
        operation: &'static str,
        status: StatusCode,
        expected: StatusCode,
        body: &str,
    ) -> Self {
        PlatformError::UnexpectedStatus {
            operation,
            status,
            expected,
            body: body.chars().take(512).collect(),
        }
    }

    /// Operator-facing suggestions for fixing the failure
    pub fn quick_fixes(&self) -> Vec<&'static str> {
        match self {
            PlatformError::Transport(TransportError::RetriesExhausted { .. }) => vec![
                "The platform kept answering busy or unreachable; try again later",
                "Check connectivity to platform_url from this host",
            ],
            PlatformError::Transport(_) => vec![
                "Check that platform_url is a valid https:// URL",
                "Check proxy and firewall settings for outbound HTTPS",
            ],
            PlatformError::UnexpectedStatus { status, .. } => match status.as_u16() {
                401 | 403 => vec![
                    "RS_API_KEY is invalid, expired, or lacks access to this client",
                    "Verify client_id belongs to the API key's user",
                ],
                404 => vec!["Verify client_id and platform_url in the config file"],
                400 | 422 => vec!["The platform rejected the request body; check the report and config values"],
                _ => vec!["Check the platform status and retry the run"],
            },
            PlatformError::NetworkResolution { matches: 0, .. } => vec![
                "No network has exactly this name; network_name must match exactly",
                "Update network_name in the config file",
            ],
            PlatformError::NetworkResolution { .. } => {
                vec!["Several networks share this name; rename one on the platform"]
            }
            PlatformError::Encode { .. } => vec!["A configured value could not be encoded as JSON; check the config file"],
            PlatformError::Decode { .. } => {
                vec!["The platform answered with an unexpected body; check platform_url"]
            }
            PlatformError::ReportUnreadable { .. } => vec![
                "Check folder and csv_filename in the config file",
                "Make sure the scan step produced the report before this job runs",
            ],
        }
    }
}
