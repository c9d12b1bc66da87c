use reqwest::Url;

use crate::http::ApiRequest;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Everything a step needs to address the platform.
///
/// Built once from validated configuration and passed by reference to every step.
#[derive(Clone, PartialEq, Eq)]
pub struct PlatformContext {
    base_url: String,
    client_id: String,
    api_key: String,
}

impl PlatformContext {
    pub fn new(platform_url: &str, client_id: &str, api_key: &str) -> Self {
        Self {
            base_url: platform_url.trim().trim_end_matches('/').to_string(),
            client_id: client_id.trim().to_string(),
            api_key: api_key.trim().to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `{platform_url}/api/v1/client/{client_id}/{path}`
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/api/v1/client/{}/{}",
            self.base_url,
            self.client_id,
            path.trim_start_matches('/')
        )
    }

    /// Endpoint built from raw path segments; each segment is percent-encoded, so an opaque
    /// id can never introduce extra path components
    pub fn endpoint_segments(&self, segments: &[&str]) -> String {
        let fallback = || self.endpoint(&segments.join("/"));
        let Ok(mut url) = Url::parse(&self.endpoint("")) else {
            // Unparseable base: the transport rejects the request with a clear error
            return fallback();
        };
        match url.path_segments_mut() {
            Ok(mut path) => {
                path.pop_if_empty().extend(segments);
            }
            Err(()) => return fallback(),
        }
        url.into()
    }

    /// POST to `path` with the API key attached
    pub fn post(&self, path: &str) -> ApiRequest {
        ApiRequest::post(self.endpoint(path)).header(API_KEY_HEADER, self.api_key.clone())
    }

    /// POST to the endpoint named by `segments`, see [`Self::endpoint_segments`]
    pub fn post_segments(&self, segments: &[&str]) -> ApiRequest {
        ApiRequest::post(self.endpoint_segments(segments)).header(API_KEY_HEADER, self.api_key.clone())
    }
}

impl std::fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformContext")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_client_scope() {
        let context = PlatformContext::new("https://platform.example.com/", "1234", "key");
        assert_eq!(
            context.endpoint("network/search"),
            "https://platform.example.com/api/v1/client/1234/network/search"
        );
        assert_eq!(
            context.endpoint("/upload/9/file"),
            "https://platform.example.com/api/v1/client/1234/upload/9/file"
        );
    }

    #[test]
    fn test_post_attaches_api_key() {
        let context = PlatformContext::new("https://platform.example.com", "1", "secret");
        let request = context.post("assessment");
        assert_eq!(request.header_value("x-api-key"), Some("secret"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let context = PlatformContext::new("https://platform.example.com", "1", "secret");
        let rendered = format!("{context:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_segments_are_percent_encoded() {
        let context = PlatformContext::new("https://platform.example.com", "1234", "key");
        assert_eq!(
            context.endpoint_segments(&["upload", "a/b c?", "file"]),
            "https://platform.example.com/api/v1/client/1234/upload/a%2Fb%20c%3F/file"
        );
        assert_eq!(
            context.endpoint_segments(&["upload", "9001", "start"]),
            "https://platform.example.com/api/v1/client/1234/upload/9001/start"
        );
    }

    #[test]
    fn test_post_segments_attaches_api_key() {
        let context = PlatformContext::new("https://platform.example.com", "1", "secret");
        let request = context.post_segments(&["upload", "7", "file"]);
        assert_eq!(request.url, "https://platform.example.com/api/v1/client/1/upload/7/file");
        assert_eq!(request.header_value("x-api-key"), Some("secret"));
    }
}
