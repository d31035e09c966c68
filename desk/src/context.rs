use std::sync::Arc;

use shared::{
    driver::{self, SharedSession, SubmissionReceipt},
    session::{AllocationSession, Applied},
    ApiError, Backend, ProjectScope, Role, SubmissionError,
};
use tokio::sync::Mutex;
use tracing::instrument;

use crate::api::prometheus::{OperationKind, PrometheusClient};

#[derive(Clone)]
pub struct Context {
    pub session: SharedSession,
    pub backend: Arc<dyn Backend>,
    pub prometheus: Arc<PrometheusClient>,
    pub role: Role,
    /// Other projects whose leaderboards may be requested by route.
    pub leaderboard_routes: Vec<String>,
}

impl Context {
    pub fn new(
        scope: ProjectScope,
        backend: Arc<dyn Backend>,
        prometheus: Arc<PrometheusClient>,
        role: Role,
    ) -> Self {
        Self {
            session: Arc::new(Mutex::new(AllocationSession::new(scope))),
            backend,
            prometheus,
            role,
            leaderboard_routes: Vec::new(),
        }
    }

    pub fn with_leaderboard_routes(mut self, routes: Vec<String>) -> Self {
        self.leaderboard_routes = routes;
        self
    }

    #[instrument(skip(self))]
    pub async fn reload(&self) -> Result<Applied, ApiError> {
        let result = driver::reload(&self.session, self.backend.as_ref(), self.role).await;
        self.prometheus.record(OperationKind::Reload, result.is_ok());
        self.publish_directory().await;
        result
    }

    #[instrument(skip(self))]
    pub async fn submit(&self) -> Result<SubmissionReceipt, SubmissionError> {
        let started = chrono::Utc::now();
        let result = driver::submit(&self.session, self.backend.as_ref(), self.role).await;
        self.prometheus.record_submission(result.is_ok(), started);
        if let Ok(receipt) = &result {
            if receipt.applied == Applied::Current {
                self.prometheus
                    .record(OperationKind::Reload, receipt.refreshed);
            }
        }
        self.publish_directory().await;
        result
    }

    pub async fn publish_directory(&self) {
        let session = self.session.lock().await;
        self.prometheus
            .set_directory(session.workers().len(), session.capacity());
    }

    pub fn serves_leaderboard(&self, route: &str) -> bool {
        self.leaderboard_routes.iter().any(|r| r == route)
    }
}
