use serde::{Deserialize, Serialize};

use crate::{SkillTag, Worker};

pub const ALL_LOCATIONS: &str = "All";
pub const ALL_SKILLS: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LocationFilter {
    #[default]
    All,
    Exact(String),
}

impl LocationFilter {
    pub fn parse(value: &str) -> Self {
        if value == ALL_LOCATIONS {
            Self::All
        } else {
            Self::Exact(value.to_string())
        }
    }

    pub fn matches(&self, worker: &Worker) -> bool {
        match self {
            Self::All => true,
            Self::Exact(location) => worker.location == *location,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_LOCATIONS,
            Self::Exact(location) => location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SkillFilter {
    #[default]
    All,
    Only(SkillTag),
}

impl SkillFilter {
    /// Empty input and the `all` sentinel both mean "no skill filter".
    pub fn parse(value: &str) -> Self {
        if value.is_empty() || value == ALL_SKILLS {
            Self::All
        } else {
            Self::Only(value.to_string())
        }
    }

    pub fn matches(&self, worker: &Worker) -> bool {
        match self {
            Self::All => true,
            Self::Only(skill) => worker.has_skill(skill),
        }
    }

    pub fn skill(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Only(skill) => Some(skill),
        }
    }

    pub fn as_str(&self) -> &str {
        self.skill().unwrap_or(ALL_SKILLS)
    }
}

/// The three predicates of the worker table. Plain strings on the wire, so a
/// dashboard can send back exactly what its dropdowns hold.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "FilterParams", into = "FilterParams")]
pub struct WorkerFilter {
    pub location: LocationFilter,
    pub skill: SkillFilter,
    pub search: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl From<FilterParams> for WorkerFilter {
    fn from(params: FilterParams) -> Self {
        Self {
            location: params
                .location
                .as_deref()
                .map(LocationFilter::parse)
                .unwrap_or_default(),
            skill: params
                .skill
                .as_deref()
                .map(SkillFilter::parse)
                .unwrap_or_default(),
            search: params.search.unwrap_or_default(),
        }
    }
}

impl From<WorkerFilter> for FilterParams {
    fn from(filter: WorkerFilter) -> Self {
        Self {
            location: Some(filter.location.as_str().to_string()),
            skill: Some(filter.skill.as_str().to_string()),
            search: Some(filter.search),
        }
    }
}

impl WorkerFilter {
    pub fn new(location: &str, skill: &str, search: &str) -> Self {
        Self {
            location: LocationFilter::parse(location),
            skill: SkillFilter::parse(skill),
            search: search.to_string(),
        }
    }

    pub fn matches_search(&self, worker: &Worker) -> bool {
        worker
            .email
            .to_lowercase()
            .contains(&self.search.to_lowercase())
    }

    pub fn apply(&self, workers: &[Worker]) -> Vec<Worker> {
        workers
            .iter()
            .filter(|w| self.location.matches(w))
            .filter(|w| self.skill.matches(w))
            .filter(|w| self.matches_search(w))
            .cloned()
            .collect()
    }
}

/// Location, then skill, then case-insensitive email search. Never touches
/// the input slice.
pub fn filter_workers(
    workers: &[Worker],
    location: &str,
    skill: &str,
    email_search: &str,
) -> Vec<Worker> {
    WorkerFilter::new(location, skill, email_search).apply(workers)
}
