//! Application state for one allocation desk: the worker directory, the work
//! pool, the active filter and the in-progress allocation.
//!
//! Every operation is a synchronous update of [`AllocationSession`]. Network
//! round trips are split into a `begin`/`prepare` half that hands out a ticket
//! and a `finish` half that only applies the response if the ticket is still
//! the latest one, so a slow response can never overwrite newer state.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    wire::AssignmentRequestBody, AllocationError, AllocationRequest, ApiError, Availability,
    ProjectScope, RawQuantity, Role, SkillTag, SubmissionError, Worker, WorkerFilter,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub ticket: SubmissionTicket,
    pub project_id: String,
    pub skill: SkillTag,
    pub body: AssignmentRequestBody,
    pub workers: usize,
    pub planned_total: u64,
    pub available: u64,
}

#[derive(Debug)]
pub struct AllocationSession {
    scope: ProjectScope,
    directory: Vec<Worker>,
    availability: Availability,
    filter: WorkerFilter,
    request: AllocationRequest,
    reload_seq: u64,
    submission_seq: u64,
    in_flight: Option<u64>,
}

impl AllocationSession {
    pub fn new(scope: ProjectScope) -> Self {
        Self {
            scope,
            directory: Vec::new(),
            availability: Availability::default(),
            filter: WorkerFilter::default(),
            request: AllocationRequest::default(),
            reload_seq: 0,
            submission_seq: 0,
            in_flight: None,
        }
    }

    pub fn scope(&self) -> &ProjectScope {
        &self.scope
    }

    pub fn workers(&self) -> &[Worker] {
        &self.directory
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn filter(&self) -> &WorkerFilter {
        &self.filter
    }

    pub fn request(&self) -> &AllocationRequest {
        &self.request
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Switches to another project. Everything loaded for the previous one
    /// is dropped and responses still in flight for it will be discarded.
    pub fn open_project(&mut self, scope: ProjectScope) {
        info!("Opening project {}", scope.project_route);
        self.scope = scope;
        self.directory.clear();
        self.availability = Availability::default();
        self.request = AllocationRequest::new(self.filter.skill.skill().map(str::to_string));
        self.reload_seq += 1;
        self.submission_seq += 1;
        self.in_flight = None;
    }

    pub fn filtered_workers(&self) -> Vec<Worker> {
        self.filter.apply(&self.directory)
    }

    /// Pool the bulk fill is checked against.
    pub fn capacity(&self) -> u64 {
        self.availability.for_skill(self.request.skill.as_deref())
    }

    /// Replaces the filter. Picking another skill opens a fresh allocation
    /// for it; returns whether that happened.
    pub fn set_filter(&mut self, filter: WorkerFilter) -> bool {
        let skill = filter.skill.skill().map(str::to_string);
        self.filter = filter;
        if skill == self.request.skill {
            return false;
        }

        debug!("Skill scope changed to {skill:?}, starting a new allocation");
        self.request = AllocationRequest::new(skill);
        self.submission_seq += 1;
        true
    }

    pub fn set_individual_quantity(
        &mut self,
        worker_id: &str,
        raw: Option<&RawQuantity>,
    ) -> Result<u32, AllocationError> {
        self.request.set_individual_quantity(worker_id, raw)
    }

    pub fn set_global_quantity(
        &mut self,
        raw: Option<&RawQuantity>,
    ) -> Result<u32, AllocationError> {
        let filtered = self.filtered_workers();
        let available = self.capacity();
        self.request.set_global_quantity(raw, &filtered, available)
    }

    pub fn begin_reload(&mut self) -> ReloadTicket {
        self.reload_seq += 1;
        ReloadTicket(self.reload_seq)
    }

    /// Installs a fetched directory. Only called with successful responses,
    /// a failed fetch leaves the previous directory as it was.
    pub fn finish_reload(
        &mut self,
        ticket: ReloadTicket,
        workers: Vec<Worker>,
        availability: Availability,
    ) -> Applied {
        if ticket.0 != self.reload_seq {
            debug!(
                "Discarding reload {} superseded by {}",
                ticket.0, self.reload_seq
            );
            return Applied::Stale;
        }

        info!(
            "Loaded {} workers, {} tasks available",
            workers.len(),
            availability.total
        );
        self.directory = workers;
        self.availability = availability;
        Applied::Current
    }

    pub fn prepare_submission(
        &mut self,
        role: Role,
    ) -> Result<PendingSubmission, AllocationError> {
        if self.in_flight.is_some() {
            return Err(AllocationError::SubmissionInFlight);
        }
        let skill = self
            .request
            .skill
            .clone()
            .ok_or(AllocationError::NoSkillSelected)?;
        if self.request.is_empty() {
            return Err(AllocationError::EmptyAllocation);
        }

        let data = self
            .request
            .build_submission(&self.directory)
            .inspect_err(|e| error!("Aborting submission for {skill}: {e:?}"))?;

        self.submission_seq += 1;
        self.in_flight = Some(self.submission_seq);
        Ok(PendingSubmission {
            ticket: SubmissionTicket(self.submission_seq),
            project_id: self.scope.project_id.clone(),
            workers: self.request.quantities.len(),
            planned_total: self.request.planned_total(),
            available: self.capacity(),
            body: AssignmentRequestBody { role, data },
            skill,
        })
    }

    /// On success the allocation is cleared, unless the session moved on to
    /// another scope meanwhile. On failure nothing is lost.
    pub fn finish_submission(
        &mut self,
        ticket: SubmissionTicket,
        result: Result<(), ApiError>,
    ) -> Result<Applied, SubmissionError> {
        if self.in_flight == Some(ticket.0) {
            self.in_flight = None;
        }

        match result {
            Ok(()) if ticket.0 == self.submission_seq => {
                self.request.clear();
                Ok(Applied::Current)
            }
            Ok(()) => {
                debug!("Submission {} finished after the scope changed", ticket.0);
                Ok(Applied::Stale)
            }
            Err(e) => {
                error!("Failed to assign tasks: {e}");
                Err(SubmissionError::rejected(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::tests::worker;

    fn session() -> AllocationSession {
        let mut session = AllocationSession::new(ProjectScope::new("7", "PROJECT_P_CODING"));
        let ticket = session.begin_reload();
        session.finish_reload(
            ticket,
            vec![
                worker("1", "a@x.com", "Pune", &["php"]),
                worker("2", "b@x.com", "Una", &["python"]),
                worker("3", "c@x.com", "Pune", &["php", "python"]),
            ],
            Availability {
                total: 50,
                per_skill: [("php".to_string(), 2), ("python".to_string(), 30)]
                    .into_iter()
                    .collect(),
            },
        );
        session
    }

    fn qty(value: i64) -> RawQuantity {
        RawQuantity::Integer(value)
    }

    #[test]
    fn new_skill_opens_a_fresh_allocation() {
        let mut session = session();
        assert!(session.set_filter(WorkerFilter::new("All", "python", "")));
        session.set_individual_quantity("2", Some(&qty(4))).unwrap();

        assert!(!session.set_filter(WorkerFilter::new("Pune", "python", "")));
        assert_eq!(session.request().quantity("2"), 4);

        assert!(session.set_filter(WorkerFilter::new("Pune", "php", "")));
        assert!(session.request().is_empty());
        assert_eq!(session.request().skill.as_deref(), Some("php"));
    }

    #[test]
    fn bulk_fill_uses_filter_and_skill_capacity() {
        let mut session = session();
        session.set_filter(WorkerFilter::new("All", "php", ""));
        assert_eq!(session.capacity(), 2);
        assert_eq!(session.set_global_quantity(Some(&qty(5))), Ok(5));
        assert_eq!(session.request().quantity("1"), 5);
        assert_eq!(session.request().quantity("3"), 5);
        assert_eq!(session.request().quantity("2"), 0);

        session.set_filter(WorkerFilter::new("All", "all", ""));
        session.set_filter(WorkerFilter::new("All", "php", "c@"));
        assert_eq!(session.set_global_quantity(Some(&qty(1))), Ok(1));
    }

    #[test]
    fn bulk_fill_refused_when_view_exceeds_pool() {
        let mut session = session();
        let ticket = session.begin_reload();
        session.finish_reload(
            ticket,
            (0..5)
                .map(|i| worker(&i.to_string(), &format!("d{i}@x.com"), "Pune", &["php"]))
                .collect(),
            Availability {
                total: 3,
                ..Default::default()
            },
        );
        session.set_filter(WorkerFilter::new("All", "php", ""));
        let before = session.request().clone();

        assert_eq!(
            session.set_global_quantity(Some(&qty(2))),
            Err(AllocationError::Capacity {
                workers: 5,
                available: 3
            })
        );
        assert_eq!(session.request(), &before);
    }

    #[test]
    fn stale_reload_is_discarded() {
        let mut session = session();
        let first = session.begin_reload();
        let second = session.begin_reload();

        let reloaded = vec![worker("9", "z@x.com", "Una", &[])];
        assert_eq!(
            session.finish_reload(second, reloaded, Availability::default()),
            Applied::Current
        );
        assert_eq!(
            session.finish_reload(first, Vec::new(), Availability::default()),
            Applied::Stale
        );
        assert_eq!(session.workers().len(), 1);
    }

    #[test]
    fn reload_for_a_closed_project_is_discarded() {
        let mut session = session();
        let ticket = session.begin_reload();
        session.open_project(ProjectScope::new("8", "PROJECT_P_SCRATCHPAD"));
        let reloaded = vec![worker("9", "z@x.com", "Una", &[])];
        assert_eq!(
            session.finish_reload(ticket, reloaded, Availability::default()),
            Applied::Stale
        );
        assert!(session.workers().is_empty());
    }

    #[test]
    fn successful_submission_resets_the_allocation() {
        let mut session = session();
        session.set_filter(WorkerFilter::new("All", "python", ""));
        session.set_global_quantity(Some(&qty(3))).unwrap();

        let pending = session.prepare_submission(Role::Admin).unwrap();
        assert!(session.is_submitting());
        assert_eq!(pending.project_id, "7");
        assert_eq!(pending.planned_total, 6);
        assert_eq!(pending.available, 30);
        assert_eq!(
            serde_json::to_value(&pending.body).unwrap(),
            serde_json::json!({
                "role": "Admin",
                "data": { "python": { "b@x.com": "3", "c@x.com": "3" } }
            })
        );

        let applied = session.finish_submission(pending.ticket, Ok(())).unwrap();
        assert_eq!(applied, Applied::Current);
        assert!(session.request().is_empty());
        assert_eq!(session.request().global_quantity, 0);
        assert!(!session.is_submitting());
    }

    #[test]
    fn failed_submission_keeps_the_allocation() {
        let mut session = session();
        session.set_filter(WorkerFilter::new("All", "python", ""));
        session.set_global_quantity(Some(&qty(3))).unwrap();
        let before = session.request().clone();

        let pending = session.prepare_submission(Role::Admin).unwrap();
        let err = session
            .finish_submission(
                pending.ticket,
                Err(ApiError::Status {
                    status: 500,
                    message: None,
                }),
            )
            .unwrap_err();

        assert_eq!(err.to_string(), "Failed to assign tasks.");
        assert_eq!(session.request(), &before);
        assert!(!session.is_submitting());
    }

    #[test]
    fn second_submission_is_blocked_while_one_is_in_flight() {
        let mut session = session();
        session.set_filter(WorkerFilter::new("All", "php", ""));
        session.set_individual_quantity("1", Some(&qty(1))).unwrap();

        let pending = session.prepare_submission(Role::Admin).unwrap();
        assert_eq!(
            session.prepare_submission(Role::Admin).unwrap_err(),
            AllocationError::SubmissionInFlight
        );
        session.finish_submission(pending.ticket, Ok(())).unwrap();
        assert!(!session.is_submitting());
    }

    #[test]
    fn submission_finishing_after_scope_change_does_not_clear_new_work() {
        let mut session = session();
        session.set_filter(WorkerFilter::new("All", "php", ""));
        session.set_individual_quantity("1", Some(&qty(2))).unwrap();
        let pending = session.prepare_submission(Role::Admin).unwrap();

        session.set_filter(WorkerFilter::new("All", "python", ""));
        session.set_individual_quantity("2", Some(&qty(6))).unwrap();

        let applied = session.finish_submission(pending.ticket, Ok(())).unwrap();
        assert_eq!(applied, Applied::Stale);
        assert_eq!(session.request().quantity("2"), 6);
    }

    #[test]
    fn submission_rejects_missing_skill_empty_plan_and_unknown_worker() {
        let mut session = session();
        session.set_individual_quantity("1", Some(&qty(2))).unwrap();
        assert_eq!(
            session.prepare_submission(Role::Admin).unwrap_err(),
            AllocationError::NoSkillSelected
        );

        session.set_filter(WorkerFilter::new("All", "php", ""));
        assert_eq!(
            session.prepare_submission(Role::Admin).unwrap_err(),
            AllocationError::EmptyAllocation
        );

        session.set_individual_quantity("404", Some(&qty(2))).unwrap();
        assert_eq!(
            session.prepare_submission(Role::Admin).unwrap_err(),
            AllocationError::MissingWorker {
                worker_id: "404".to_string()
            }
        );
        assert!(!session.is_submitting());
    }
}
