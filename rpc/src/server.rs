//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

use diploma_identity::IdentityGateway;
use diploma_kpi::KpiAggregator;
use diploma_store::DiplomaStore;
use diploma_workflow::DiplomaWorkflow;

use crate::error::RpcError;
use crate::handlers;
use crate::metrics::WorkflowMetrics;

/// Shared state handed to every handler.
pub struct ApiState<S> {
    pub workflow: Arc<DiplomaWorkflow<S>>,
    pub kpi: Arc<KpiAggregator<S>>,
    pub gateway: IdentityGateway,
    /// `None` when metrics are disabled; `/metrics` is then not routed.
    pub metrics: Option<Arc<WorkflowMetrics>>,
    /// Credential required by the anchoring callback.
    pub anchor_callback_token: Option<String>,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            workflow: Arc::clone(&self.workflow),
            kpi: Arc::clone(&self.kpi),
            gateway: self.gateway.clone(),
            metrics: self.metrics.clone(),
            anchor_callback_token: self.anchor_callback_token.clone(),
        }
    }
}

pub fn build_router<S: DiplomaStore + 'static>(state: ApiState<S>) -> Router {
    let mut router = Router::<ApiState<S>>::new()
        .route("/health", get(handlers::health))
        .route(
            "/diplomas",
            post(handlers::create_template::<S>).get(handlers::list_templates::<S>),
        )
        .route(
            "/diplomas/requests",
            post(handlers::create_request::<S>).get(handlers::list_requests::<S>),
        )
        .route("/diplomas/requests/my", get(handlers::my_requests::<S>))
        .route(
            "/diplomas/requests/:id",
            get(handlers::get_request::<S>).delete(handlers::delete_request::<S>),
        )
        .route("/diplomas/requests/:id/sign", post(handlers::sign_request::<S>))
        .route(
            "/diplomas/requests/:id/anchor-request",
            post(handlers::request_anchor::<S>),
        )
        .route(
            "/diplomas/requests/:id/anchor-confirm",
            post(handlers::confirm_anchor::<S>),
        )
        .route(
            "/diplomas/requests/:id/anchor-payload",
            get(handlers::anchor_payload::<S>),
        )
        .route("/diplomas/wallet/can-sign/:id", get(handlers::can_sign::<S>))
        .route("/diplomas/kpi/metrics/all", get(handlers::kpi_metrics::<S>))
        .route(
            "/diplomas/kpi/graduated-students",
            get(handlers::graduated_students::<S>),
        )
        .route("/diplomas/:id", get(handlers::get_template::<S>));

    if state.metrics.is_some() {
        router = router.route("/metrics", get(handlers::metrics::<S>));
    }

    router.layer(CorsLayer::permissive()).with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
}

impl RpcServer {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr }
    }

    /// Serve `router` until `shutdown` resolves.
    pub async fn start<F>(&self, router: Router, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        tracing::info!(addr = %self.addr, "HTTP server ready and accepting connections");
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
