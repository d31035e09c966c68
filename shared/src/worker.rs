use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{Email, SkillTag, WorkerId};

/// Raw performance counters as reported by the backend. Read-only snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TaskCounters {
    pub total: u32,
    pub approved: u32,
    pub rejected: u32,
    pub pending_to_check: u32,
    pub pending_to_complete: u32,
    pub rewrites: u32,
}

impl TaskCounters {
    /// Accumulates another snapshot. Counters clamp at `u32::MAX`.
    pub fn add(&mut self, other: &TaskCounters) {
        self.total = self.total.saturating_add(other.total);
        self.approved = self.approved.saturating_add(other.approved);
        self.rejected = self.rejected.saturating_add(other.rejected);
        self.pending_to_check = self.pending_to_check.saturating_add(other.pending_to_check);
        self.pending_to_complete = self
            .pending_to_complete
            .saturating_add(other.pending_to_complete);
        self.rewrites = self.rewrites.saturating_add(other.rewrites);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub id: WorkerId,
    pub email: Email,
    pub location: String,
    pub skills: Vec<SkillTag>,
    pub counters: TaskCounters,
}

impl Worker {
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.iter().any(|s| s == skill)
    }

    pub fn display_name(&self) -> String {
        display_name(&self.email)
    }
}

/// Turns `john.doe@example.com` into `John Doe`.
pub fn display_name(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let name = local
        .split(['.', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if name.is_empty() {
        "Unknown".to_string()
    } else {
        name
    }
}

/// Unique location tags in the order they first appear.
pub fn distinct_locations(workers: &[Worker]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    workers
        .iter()
        .filter(|w| seen.insert(w.location.as_str()))
        .map(|w| w.location.clone())
        .collect()
}

pub fn distinct_skills(workers: &[Worker]) -> Vec<SkillTag> {
    workers
        .iter()
        .flat_map(|w| w.skills.iter().cloned())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Builds the allocation directory. Listed developers keep their own id,
/// location and skills and take the counters of the stats row with the same
/// email, zero when they have not worked on the project yet. Stats rows for
/// emails outside the listing follow in fetch order.
pub fn merge_directory(developers: Vec<Worker>, stats: Vec<Worker>) -> Vec<Worker> {
    let mut counters: BTreeMap<Email, TaskCounters> = BTreeMap::new();
    for row in &stats {
        counters.entry(row.email.clone()).or_insert(row.counters);
    }

    let mut directory: Vec<Worker> = developers
        .into_iter()
        .map(|mut developer| {
            developer.counters = counters.get(&developer.email).copied().unwrap_or_default();
            developer
        })
        .collect();
    let listed: BTreeSet<Email> = directory.iter().map(|w| w.email.clone()).collect();
    directory.extend(stats.into_iter().filter(|row| !listed.contains(&row.email)));
    directory
}
