use crate::{wire::AssignmentRequestBody, ApiError, Availability, Role, Worker};

/// Every developer that can receive work, whether or not they have worked
/// on the project yet. Counters in this listing are empty.
#[async_trait::async_trait]
pub trait DeveloperProvider: Send + Sync {
    async fn developers(&self, role: Role) -> Result<Vec<Worker>, ApiError>;
}

/// Per-worker counters for a project.
#[async_trait::async_trait]
pub trait TaskStatsProvider: Send + Sync {
    async fn worker_stats(&self, project_route: &str) -> Result<Vec<Worker>, ApiError>;
}

/// Unassigned work per skill tag.
#[async_trait::async_trait]
pub trait AvailabilityProvider: Send + Sync {
    async fn availability(&self, project_id: &str) -> Result<Availability, ApiError>;
}

/// Persists a finished allocation.
#[async_trait::async_trait]
pub trait AssignmentSubmitter: Send + Sync {
    async fn assign_tasks(
        &self,
        project_id: &str,
        body: &AssignmentRequestBody,
    ) -> Result<(), ApiError>;
}

/// Everything an allocation session needs from the backend.
pub trait Backend:
    DeveloperProvider + TaskStatsProvider + AvailabilityProvider + AssignmentSubmitter
{
}

impl<T> Backend for T where
    T: DeveloperProvider + TaskStatsProvider + AvailabilityProvider + AssignmentSubmitter
{
}
