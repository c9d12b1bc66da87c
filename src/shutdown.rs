use std::future::Future;
use tracing::{info, warn};

/// Result of racing a run against an operator interrupt
#[derive(Debug, PartialEq, Eq)]
pub enum RunOutcome<T> {
    Completed(T),
    Interrupted,
}

/// Top-level interrupt handling.
///
/// The interrupt is caught exactly once, here. Whatever step was in flight is dropped;
/// resources already created on the platform stay as they are.
pub struct ShutdownCoordinator<S> {
    signal: S,
}

impl ShutdownCoordinator<std::pin::Pin<Box<dyn Future<Output = ()> + Send>>> {
    /// Coordinator listening for Ctrl-C / SIGINT
    pub fn ctrl_c() -> Self {
        Self::with_signal(Box::pin(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for interrupt signal: {}", e);
                std::future::pending::<()>().await;
            }
        }))
    }
}

impl<S> ShutdownCoordinator<S>
where
    S: Future<Output = ()>,
{
    pub fn with_signal(signal: S) -> Self {
        Self { signal }
    }

    pub async fn run_until_interrupted<F, T>(self, work: F) -> RunOutcome<T>
    where
        F: Future<Output = T>,
    {
        // Signal first: the listener is installed before any work runs
        tokio::select! {
            biased;
            _ = self.signal => {
                info!("Interrupt received, stopping without compensation");
                RunOutcome::Interrupted
            }
            result = work => RunOutcome::Completed(result),
        }
    }
}
