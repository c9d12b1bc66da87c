pub mod client;
pub mod retry;

#[cfg(test)]
mod test;

pub use client::{
    ApiRequest, ApiResponse, FilePart, RequestBody, RetryingHttpClient, TimeoutSettings, Transport,
    TransportError,
};
pub use retry::RetryConfig;

#[cfg(test)]
pub use client::MockTransport;
