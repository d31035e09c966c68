use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

mod allocation;
mod error;
mod filter;
mod leaderboard;
mod metrics;
mod provider;
mod worker;

pub mod driver;
pub mod session;
pub mod wire;

#[cfg(feature = "client")]
pub mod client;

pub use allocation::*;
pub use error::*;
pub use filter::*;
pub use leaderboard::*;
pub use metrics::*;
pub use provider::*;
pub use worker::*;

pub type WorkerId = String;
pub type SkillTag = String;
pub type Email = String;

/// Upper bound (inclusive) for a single worker's quantity in one allocation.
pub const MAX_QUANTITY: u32 = 40;

// Two different eligibility thresholds are used by the two ranking views.
// Kept apart until someone confirms they should be the same.
pub const LEADERBOARD_MIN_APPROVED: u32 = 10;
pub const PERFORMER_SUMMARY_MIN_APPROVED: u32 = 4;

pub const LEADERBOARD_LIMIT: usize = 10;
pub const PERFORMER_SUMMARY_LIMIT: usize = 3;

/// Role of the person acting on the dashboard. Sent along with a submission,
/// the backend only accepts assignments from admins.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
pub enum Role {
    #[default]
    Admin,
    Reviewer,
    Developer,
}

/// Identifies the project an allocation session works against. The stats
/// endpoints are keyed by route, availability and submission by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectScope {
    pub project_id: String,
    pub project_route: String,
}

impl ProjectScope {
    pub fn new(project_id: impl Into<String>, project_route: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            project_route: project_route.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn role_round_trips_through_its_name() {
        assert_eq!(Role::from_str("Admin").unwrap(), Role::Admin);
        assert_eq!(Role::Reviewer.to_string(), "Reviewer");
        assert!(Role::from_str("Root").is_err());
    }
}
