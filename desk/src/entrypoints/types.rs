use rocket::{
    http::Status,
    response::{self, Responder},
    serde::json::Json,
    Request, Response,
};
use serde::{Deserialize, Serialize};
use shared::{
    AllocationError, AllocationRequest, ApiError, RawQuantity, SkillCount, SkillTag,
    SubmissionError, Worker, WorkerFilter, WorkerId,
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub kind: ErrorKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Backend,
    Internal,
}

/// Error side of every JSON endpoint.
#[derive(Debug)]
pub struct ApiFailure {
    pub status: Status,
    pub body: ErrorResponse,
}

impl ApiFailure {
    fn new(status: Status, kind: ErrorKind, message: impl ToString) -> Self {
        Self {
            status,
            body: ErrorResponse {
                message: message.to_string(),
                kind,
            },
        }
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self::new(Status::NotFound, ErrorKind::NotFound, message)
    }
}

impl From<AllocationError> for ApiFailure {
    fn from(e: AllocationError) -> Self {
        match e {
            AllocationError::SubmissionInFlight => {
                Self::new(Status::Conflict, ErrorKind::Conflict, e)
            }
            AllocationError::MissingWorker { .. } => {
                Self::new(Status::InternalServerError, ErrorKind::Internal, e)
            }
            e => Self::new(Status::UnprocessableEntity, ErrorKind::Validation, e),
        }
    }
}

impl From<ApiError> for ApiFailure {
    fn from(e: ApiError) -> Self {
        Self::new(Status::BadGateway, ErrorKind::Backend, e)
    }
}

impl From<SubmissionError> for ApiFailure {
    fn from(e: SubmissionError) -> Self {
        match e {
            SubmissionError::Allocation(e) => e.into(),
            e @ SubmissionError::Rejected { .. } => {
                Self::new(Status::BadGateway, ErrorKind::Backend, e)
            }
        }
    }
}

impl<'r> Responder<'r, 'static> for ApiFailure {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        Response::build_from(Json(self.body).respond_to(request)?)
            .status(self.status)
            .ok()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiFailure>;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuantityInput {
    #[serde(default)]
    pub quantity: Option<RawQuantity>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerResponse {
    pub id: WorkerId,
    pub email: String,
    pub name: String,
    pub location: String,
    pub skills: Vec<SkillTag>,
    pub total: u32,
    pub approved: u32,
    pub rejected: u32,
    pub pending_to_check: u32,
    pub pending_to_complete: u32,
    pub rewrites: u32,
    pub approval_rate: f64,
    /// Quantity planned for this worker in the open allocation.
    pub planned: u32,
}

impl WorkerResponse {
    pub fn new(worker: Worker, request: &AllocationRequest) -> Self {
        let rates = worker.counters.rates();
        Self {
            planned: request.quantity(&worker.id),
            name: worker.display_name(),
            id: worker.id,
            email: worker.email,
            location: worker.location,
            skills: worker.skills,
            total: worker.counters.total,
            approved: worker.counters.approved,
            rejected: worker.counters.rejected,
            pending_to_check: worker.counters.pending_to_check,
            pending_to_complete: worker.counters.pending_to_complete,
            rewrites: worker.counters.rewrites,
            approval_rate: rates.approval_rate,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkersResponse {
    pub records: Vec<WorkerResponse>,
    pub total_records: usize,
    pub locations: Vec<String>,
    pub skills: Vec<SkillTag>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub total: u64,
    pub skills: Vec<SkillCount>,
    /// Pool the bulk fill is checked against for the active skill.
    pub capacity: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AllocationResponse {
    pub skill: Option<SkillTag>,
    pub quantities: Vec<PlannedQuantity>,
    pub global_quantity: u32,
    pub planned_total: u64,
    pub available: u64,
    pub submitting: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlannedQuantity {
    pub worker_id: WorkerId,
    pub quantity: u32,
}

impl AllocationResponse {
    pub fn new(request: &AllocationRequest, available: u64, submitting: bool) -> Self {
        Self {
            skill: request.skill.clone(),
            quantities: request
                .quantities
                .iter()
                .map(|(worker_id, quantity)| PlannedQuantity {
                    worker_id: worker_id.clone(),
                    quantity: *quantity,
                })
                .collect(),
            global_quantity: request.global_quantity,
            planned_total: request.planned_total(),
            available,
            submitting,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FilterResponse {
    pub filter: WorkerFilter,
    /// Set when the new skill opened a fresh allocation.
    pub allocation_reset: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub applied: shared::session::Applied,
    pub workers: usize,
    pub available: u64,
}
