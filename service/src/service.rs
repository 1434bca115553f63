//! Process wiring: storage, identity, workflow observers and the HTTP API.

use std::sync::Arc;

use axum::Router;

use diploma_identity::{HttpIdentityClient, IdentityGateway};
use diploma_kpi::KpiAggregator;
use diploma_rpc::{build_router, ApiState, RpcServer, WorkflowMetrics};
use diploma_store::RequestStore;
use diploma_store_lmdb::LmdbStore;
use diploma_types::{Clock, RequestStatus, SystemClock};
use diploma_workflow::DiplomaWorkflow;

use crate::shutdown::ShutdownController;
use crate::{ServiceConfig, ServiceError};

pub struct DiplomaService {
    config: ServiceConfig,
    store: Arc<LmdbStore>,
    state: ApiState<LmdbStore>,
    pub shutdown: Arc<ShutdownController>,
}

impl DiplomaService {
    /// Open storage and wire every component. Nothing is served yet.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        config.validate()?;

        let store = Arc::new(LmdbStore::open(&config.data_dir, config.map_size_bytes())?);
        tracing::info!(
            data_dir = %config.data_dir.display(),
            requests = store.request_count()?,
            "store opened"
        );

        let identity = Arc::new(HttpIdentityClient::with_timeout(
            config.auth_service_url.clone(),
            config.identity_timeout(),
        ));
        let gateway = IdentityGateway::new(identity.clone(), identity, config.identity_scheme);

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let kpi = Arc::new(KpiAggregator::new(
            Arc::clone(&store),
            Arc::clone(&clock),
            config.kpi_ttl_secs,
        ));

        let mut workflow = DiplomaWorkflow::new(Arc::clone(&store), clock);
        workflow.subscribe(kpi.listener());

        let metrics = if config.enable_metrics {
            let metrics = Arc::new(WorkflowMetrics::new()?);
            metrics.set_pending(store.count_by_status(RequestStatus::Pending)?);
            workflow.subscribe(metrics.listener());
            Some(metrics)
        } else {
            None
        };

        let state = ApiState {
            workflow: Arc::new(workflow),
            kpi,
            gateway,
            metrics,
            anchor_callback_token: config.anchor_callback_token().map(str::to_string),
        };
        if state.anchor_callback_token.is_none() {
            tracing::warn!("no anchor_callback_token configured; anchor confirmations are disabled");
        }

        Ok(Self {
            config,
            store,
            state,
            shutdown: Arc::new(ShutdownController::new()),
        })
    }

    pub fn state(&self) -> &ApiState<LmdbStore> {
        &self.state
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Serve the API until SIGINT/SIGTERM or [`ShutdownController::shutdown`].
    pub async fn start(&self) -> Result<(), ServiceError> {
        let addr = self.config.socket_addr()?;
        tracing::info!(
            %addr,
            identity_scheme = self.state.gateway.scheme().as_str(),
            auth_service = %self.config.auth_service_url,
            metrics = self.config.enable_metrics,
            "diploma service starting"
        );

        let server = RpcServer::new(addr);
        let router = self.router();
        let server_stop = self.shutdown.triggered();
        let mut server_handle =
            tokio::spawn(async move { server.start(router, server_stop).await });

        tokio::select! {
            _ = self.shutdown.wait_for_signal() => {}
            _ = self.shutdown.triggered() => { tracing::info!("stopping diploma service"); }
            result = &mut server_handle => {
                // The server stopped on its own, most likely a bind failure.
                return match result {
                    Ok(inner) => inner.map_err(ServiceError::from),
                    Err(e) => Err(ServiceError::Task(e.to_string())),
                };
            }
        }

        match server_handle.await {
            Ok(inner) => Ok(inner?),
            Err(e) => Err(ServiceError::Task(e.to_string())),
        }
    }

    /// Flush storage to disk.
    pub fn stop(&self) -> Result<(), ServiceError> {
        self.shutdown.shutdown();
        self.store.sync()?;
        tracing::info!("diploma service stopped");
        Ok(())
    }
}
