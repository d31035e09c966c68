use thiserror::Error;

use crate::{WorkerId, MAX_QUANTITY};

pub const GENERIC_SUBMISSION_FAILURE: &str = "Failed to assign tasks.";

/// Local, synchronous failures of the allocation bookkeeping. None of them
/// mutate state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    #[error("Please enter a value between 0 and {max}.", max = MAX_QUANTITY)]
    OutOfBounds { value: i64 },
    #[error(
        "The number of developers ({workers}) exceeds the total tasks available ({available}). Please assign individually."
    )]
    Capacity { workers: usize, available: u64 },
    /// Internal inconsistency. The id is kept for the log, users only see
    /// the generic failure.
    #[error("{}", GENERIC_SUBMISSION_FAILURE)]
    MissingWorker { worker_id: WorkerId },
    #[error("an assignment is already being submitted")]
    SubmissionInFlight,
    #[error("there is nothing to assign")]
    EmptyAllocation,
    #[error("select a skill before assigning tasks")]
    NoSkillSelected,
}

impl AllocationError {
    /// Whether the error is caused by user input rather than internal state.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::OutOfBounds { .. }
                | Self::Capacity { .. }
                | Self::EmptyAllocation
                | Self::NoSkillSelected
        )
    }
}

/// Failures talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend responded with {status}")]
    Status { status: u16, message: Option<String> },
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// Message the backend put in its error body, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error("{message}")]
    Rejected {
        message: String,
        #[source]
        source: ApiError,
    },
}

impl SubmissionError {
    pub fn rejected(source: ApiError) -> Self {
        let message = source
            .server_message()
            .unwrap_or(GENERIC_SUBMISSION_FAILURE)
            .to_string();
        Self::Rejected { message, source }
    }
}
