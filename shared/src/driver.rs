use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::{
    session::{AllocationSession, Applied},
    merge_directory, ApiError, Backend, Role, SkillTag, SubmissionError,
};

pub type SharedSession = Arc<Mutex<AllocationSession>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub skill: SkillTag,
    pub workers: usize,
    pub planned_total: u64,
    pub submitted_at: DateTime<Utc>,
    pub applied: Applied,
    pub refreshed: bool,
}

/// Fetches the developer listing, the project stats and the work pool
/// together and installs the merged directory unless a newer reload was
/// started meanwhile. The lock is released while the requests are in flight.
/// Without a developer listing the stats rows alone make up the directory.
#[instrument(skip(session, backend))]
pub async fn reload<B>(
    session: &Mutex<AllocationSession>,
    backend: &B,
    role: Role,
) -> Result<Applied, ApiError>
where
    B: Backend + ?Sized,
{
    let (ticket, scope) = {
        let mut session = session.lock().await;
        (session.begin_reload(), session.scope().clone())
    };

    let (fetched, developers) = futures::join!(
        async {
            futures::try_join!(
                backend.worker_stats(&scope.project_route),
                backend.availability(&scope.project_id),
            )
        },
        backend.developers(role),
    );
    let (stats, availability) =
        fetched.inspect_err(|e| error!("Failed to load {}: {e}", scope.project_route))?;

    let workers = match developers {
        Ok(developers) => merge_directory(developers, stats),
        Err(e) => {
            warn!("Developer listing unavailable, using stats rows only: {e}");
            stats
        }
    };

    Ok(session
        .lock()
        .await
        .finish_reload(ticket, workers, availability))
}

/// Sends the current allocation. A successful, still current submission
/// clears the allocation and triggers a directory reload so the counters
/// reflect the new assignments.
#[instrument(skip(session, backend))]
pub async fn submit<B>(
    session: &Mutex<AllocationSession>,
    backend: &B,
    role: Role,
) -> Result<SubmissionReceipt, SubmissionError>
where
    B: Backend + ?Sized,
{
    let pending = session.lock().await.prepare_submission(role)?;
    if pending.planned_total > pending.available {
        warn!(
            "Submitting {} tasks for {} with only {} available, the backend will decide",
            pending.planned_total, pending.skill, pending.available
        );
    }

    let result = backend
        .assign_tasks(&pending.project_id, &pending.body)
        .await;
    let applied = session
        .lock()
        .await
        .finish_submission(pending.ticket, result)?;

    info!(
        "Assigned {} tasks for {} to {} workers",
        pending.planned_total, pending.skill, pending.workers
    );

    let refreshed = match applied {
        Applied::Current => match reload(session, backend, role).await {
            Ok(_) => true,
            Err(e) => {
                warn!("Assignment saved but the directory refresh failed: {e}");
                false
            }
        },
        Applied::Stale => false,
    };

    Ok(SubmissionReceipt {
        skill: pending.skill,
        workers: pending.workers,
        planned_total: pending.planned_total,
        submitted_at: Utc::now(),
        applied,
        refreshed,
    })
}
