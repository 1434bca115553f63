//! Stop coordination for the diploma service. OS signals and programmatic
//! stop requests both end the HTTP server so storage can be flushed.

use std::future::Future;

use tokio::signal;
use tokio::sync::watch;

/// Latched stop flag.
///
/// Once triggered it stays triggered: a waiter created after
/// [`shutdown`](Self::shutdown) resolves immediately.
pub struct ShutdownController {
    stopped: watch::Sender<bool>,
}

impl ShutdownController {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        Self { stopped }
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Request a stop. Repeated calls are no-ops.
    pub fn shutdown(&self) {
        if !self.stopped.send_replace(true) {
            tracing::debug!("shutdown requested");
        }
    }

    /// Resolves once a stop has been requested.
    pub fn triggered(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut stopped = self.stopped.subscribe();
        async move {
            // Err means the controller is gone, which also ends the wait.
            let _ = stopped.wait_for(|stopped| *stopped).await;
        }
    }

    /// Wait for SIGTERM or SIGINT, then request a stop.
    pub async fn wait_for_signal(&self) {
        let ctrl_c = signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    sigterm.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to install SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => { tracing::info!("received SIGINT, stopping diploma service"); }
            _ = terminate => { tracing::info!("received SIGTERM, stopping diploma service"); }
        }

        self.shutdown();
    }
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}
