use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::context::PlatformContext;
use super::errors::PlatformError;
use super::types::{NetworkId, NetworkSearchRequest, NetworkSearchResponse};
use crate::http::Transport;

const OPERATION: &str = "search networks";

/// Handler for network lookups
pub struct NetworkHandler<'a> {
    transport: &'a dyn Transport,
    context: &'a PlatformContext,
}

impl<'a> NetworkHandler<'a> {
    pub fn new(transport: &'a dyn Transport, context: &'a PlatformContext) -> Self {
        Self { transport, context }
    }

    /// Resolve a network name to its id.
    ///
    /// The search is an exact match on the name; anything other than a single hit is a
    /// resolution failure.
    pub async fn resolve(&self, network_name: &str) -> Result<NetworkId, PlatformError> {
        let body = serde_json::to_value(NetworkSearchRequest::exact_name(network_name))
            .map_err(|source| PlatformError::Encode { operation: OPERATION, source })?;
        let request = self.context.post("network/search").json(body);

        debug!(network = network_name, "Searching for network");
        let response = self.transport.send(&request).await?;

        if response.status != StatusCode::OK {
            return Err(PlatformError::unexpected_status(
                OPERATION,
                response.status,
                StatusCode::OK,
                &response.body,
            ));
        }

        let search: NetworkSearchResponse = response
            .json()
            .map_err(|source| PlatformError::Decode { operation: OPERATION, source })?;

        let matches = search.page.total_elements;
        if matches != 1 {
            warn!(network = network_name, matches, "Network name did not resolve to a single network");
            return Err(PlatformError::NetworkResolution {
                name: network_name.to_string(),
                matches,
            });
        }

        let network = search
            .embedded
            .networks
            .into_iter()
            .next()
            .ok_or_else(|| PlatformError::NetworkResolution {
                name: network_name.to_string(),
                matches: 0,
            })?;

        info!(network = network_name, network_id = %network.id, "Network resolved");
        Ok(network.id)
    }
}
