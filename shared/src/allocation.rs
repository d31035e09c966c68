use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{AllocationError, Email, SkillTag, Worker, WorkerId, MAX_QUANTITY};

/// Quantity as typed into a form field: a JSON number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawQuantity {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl RawQuantity {
    pub fn parse(&self) -> i64 {
        match self {
            Self::Integer(value) => *value,
            Self::Float(value) if value.is_finite() => value.trunc() as i64,
            Self::Float(_) => 0,
            Self::Text(text) => parse_quantity(text),
        }
    }
}

/// Reads the leading integer of `raw` the way a lenient form field does:
/// surrounding whitespace and trailing garbage are ignored, anything without
/// leading digits is 0.
pub fn parse_quantity(raw: &str) -> i64 {
    let trimmed = raw.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });

    if negative {
        -value
    } else {
        value
    }
}

fn check_bounds(value: i64) -> Result<u32, AllocationError> {
    u32::try_from(value)
        .ok()
        .filter(|quantity| *quantity <= MAX_QUANTITY)
        .ok_or(AllocationError::OutOfBounds { value })
}

/// Unassigned work, in total and per skill tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Availability {
    pub total: u64,
    pub per_skill: BTreeMap<SkillTag, u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCount {
    pub skill: SkillTag,
    pub count: u64,
}

impl Availability {
    /// Pool the capacity check runs against: the skill's own count when the
    /// backend reports one, the overall total otherwise.
    pub fn for_skill(&self, skill: Option<&str>) -> u64 {
        skill
            .and_then(|skill| self.per_skill.get(skill))
            .copied()
            .unwrap_or(self.total)
    }

    pub fn skill_counts(&self) -> Vec<SkillCount> {
        self.per_skill
            .iter()
            .map(|(skill, count)| SkillCount {
                skill: skill.clone(),
                count: *count,
            })
            .collect()
    }
}

/// The not yet submitted plan for one skill tag.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub skill: Option<SkillTag>,
    pub quantities: BTreeMap<WorkerId, u32>,
    pub global_quantity: u32,
}

impl AllocationRequest {
    pub fn new(skill: Option<SkillTag>) -> Self {
        Self {
            skill,
            ..Default::default()
        }
    }

    /// Quantity currently planned for a worker. Unset means 0.
    pub fn quantity(&self, worker_id: &str) -> u32 {
        self.quantities.get(worker_id).copied().unwrap_or_default()
    }

    pub fn planned_total(&self) -> u64 {
        self.quantities.values().map(|q| u64::from(*q)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    /// Drops the mapping and the global value. The skill scope stays.
    pub fn clear(&mut self) {
        self.quantities.clear();
        self.global_quantity = 0;
    }

    pub fn set_individual_quantity(
        &mut self,
        worker_id: &str,
        raw: Option<&RawQuantity>,
    ) -> Result<u32, AllocationError> {
        let value = raw.map(RawQuantity::parse).unwrap_or_default();
        let quantity = check_bounds(value).inspect_err(|_| {
            warn!("Rejected quantity {value} for worker {worker_id}");
        })?;

        self.quantities.insert(worker_id.to_string(), quantity);
        Ok(quantity)
    }

    /// Gives every filtered worker the same quantity, replacing their
    /// individual overrides. Refused outright when there are more workers in
    /// view than available items.
    pub fn set_global_quantity(
        &mut self,
        raw: Option<&RawQuantity>,
        filtered_workers: &[Worker],
        total_available: u64,
    ) -> Result<u32, AllocationError> {
        let value = raw.map(RawQuantity::parse).unwrap_or_default();

        if filtered_workers.len() as u64 > total_available {
            warn!(
                "Refused bulk fill: {} workers in view, {total_available} tasks available",
                filtered_workers.len()
            );
            return Err(AllocationError::Capacity {
                workers: filtered_workers.len(),
                available: total_available,
            });
        }
        let quantity = check_bounds(value).inspect_err(|_| {
            warn!("Rejected bulk quantity {value}");
        })?;

        self.global_quantity = quantity;
        for worker in filtered_workers {
            self.quantities.insert(worker.id.clone(), quantity);
        }
        Ok(quantity)
    }

    pub fn build_submission(
        &self,
        directory: &[Worker],
    ) -> Result<AssignmentPayload, AllocationError> {
        let skill = self
            .skill
            .as_deref()
            .ok_or(AllocationError::NoSkillSelected)?;
        build_submission(skill, &self.quantities, directory)
    }
}

/// `{ skill: { email: "quantity" } }`, the shape the assignment endpoint takes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentPayload(pub BTreeMap<SkillTag, BTreeMap<Email, String>>);

impl AssignmentPayload {
    pub fn entries(&self, skill: &str) -> Option<&BTreeMap<Email, String>> {
        self.0.get(skill)
    }
}

/// Resolves every worker in `mapping` to their email. A worker the directory
/// does not know aborts the whole build.
pub fn build_submission(
    skill: &str,
    mapping: &BTreeMap<WorkerId, u32>,
    directory: &[Worker],
) -> Result<AssignmentPayload, AllocationError> {
    let mut entries = BTreeMap::new();
    for (worker_id, quantity) in mapping {
        let worker = directory
            .iter()
            .find(|w| w.id == *worker_id)
            .ok_or_else(|| AllocationError::MissingWorker {
                worker_id: worker_id.clone(),
            })?;
        entries.insert(worker.email.clone(), quantity.to_string());
    }

    let mut payload = BTreeMap::new();
    payload.insert(skill.to_string(), entries);
    Ok(AssignmentPayload(payload))
}
