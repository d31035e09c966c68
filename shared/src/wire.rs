//! Shapes of the `/api/*` backend endpoints.
//!
//! The backend is loose about number types: counters show up as numbers,
//! numeric strings or null depending on the query that produced them. All of
//! that is normalised here so the rest of the crate only sees [`Worker`] and
//! [`Availability`].

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::{parse_quantity, AssignmentPayload, Availability, Role, TaskCounters, Worker};

fn number_from_value(value: &Value) -> u64 {
    match value {
        Value::Number(number) => number
            .as_u64()
            .or_else(|| {
                number
                    .as_f64()
                    .filter(|f| f.is_finite() && *f > 0.0)
                    .map(|f| f.trunc() as u64)
            })
            .unwrap_or_default(),
        Value::String(text) => parse_quantity(text).max(0) as u64,
        _ => 0,
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(number_from_value).unwrap_or_default())
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    lenient_u64(deserializer).map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

fn lenient_optional_count<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<u32>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| !v.is_null())
        .map(|v| u32::try_from(number_from_value(&v)).unwrap_or(u32::MAX)))
}

fn lenient_percentage<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::String(text)) if !text.is_empty() => Some(text),
        _ => None,
    })
}

fn lenient_skills<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(skill) => Some(skill),
                _ => None,
            })
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|skill| !skill.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

/// One row of the per-worker stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct WorkerStatsRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
    #[serde(default)]
    pub updated_by_mail: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub total_tasks: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub approved_count: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub rejected_count: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub null_count: u32,
    #[serde(default, deserialize_with = "lenient_optional_count")]
    pub pending_check: Option<u32>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub pending_to_complete: u32,
    #[serde(default, deserialize_with = "lenient_count")]
    pub batch_rewrite_count: u32,
    #[serde(default, deserialize_with = "lenient_percentage")]
    pub approved_percentage: Option<f64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_skills")]
    pub skillsets: Vec<String>,
}

impl WorkerStatsRecord {
    pub fn counters(&self) -> TaskCounters {
        TaskCounters {
            total: self.total_tasks,
            approved: self.approved_count,
            rejected: self.rejected_count,
            pending_to_check: self.pending_check.unwrap_or(self.null_count),
            pending_to_complete: self.pending_to_complete,
            rewrites: self.batch_rewrite_count,
        }
    }

    /// Rows without any email cannot be assigned to and are dropped.
    pub fn into_worker(self) -> Option<Worker> {
        let counters = self.counters();
        let email = self
            .updated_by_mail
            .filter(|e| !e.is_empty())
            .or(self.user_email.filter(|e| !e.is_empty()))?;

        Some(Worker {
            id: self.user_id.unwrap_or_else(|| email.clone()),
            email,
            location: self.location.unwrap_or_default(),
            skills: self.skillsets,
            counters,
        })
    }
}

pub fn parse_workers(records: Vec<WorkerStatsRecord>) -> Vec<Worker> {
    let received = records.len();
    let workers: Vec<Worker> = records
        .into_iter()
        .filter_map(WorkerStatsRecord::into_worker)
        .collect();
    if workers.len() != received {
        warn!(
            "Dropped {} stats rows without an email",
            received - workers.len()
        );
    }
    workers
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub tasks_available: u64,
    #[serde(default)]
    pub languages: BTreeMap<String, Value>,
}

impl From<AvailabilityResponse> for Availability {
    fn from(response: AvailabilityResponse) -> Self {
        Self {
            total: response.tasks_available,
            per_skill: response
                .languages
                .into_iter()
                .map(|(skill, count)| (skill, number_from_value(&count)))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DevelopersRequestBody {
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRequestBody {
    pub role: Role,
    pub data: AssignmentPayload,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    pub fn into_message(self) -> Option<String> {
        self.message.or(self.error)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn stats_row_accepts_numbers_strings_and_nulls() {
        let record: WorkerStatsRecord = serde_json::from_value(json!({
            "UPDATED_BY_MAIL": "a@x.com",
            "TOTAL_TASKS": "100",
            "APPROVED_COUNT": 70,
            "REJECTED_COUNT": "20",
            "NULL_COUNT": 10,
            "PENDING_TO_COMPLETE": null,
            "BATCH_REWRITE_COUNT": 5.0,
            "APPROVED_PERCENTAGE": "77.78",
            "LOCATION": "Pune",
            "SKILLSETS": ["php", "python"]
        }))
        .unwrap();

        let worker = record.into_worker().unwrap();
        assert_eq!(worker.id, "a@x.com");
        assert_eq!(worker.counters.total, 100);
        assert_eq!(worker.counters.approved, 70);
        assert_eq!(worker.counters.rejected, 20);
        assert_eq!(worker.counters.pending_to_check, 10);
        assert_eq!(worker.counters.pending_to_complete, 0);
        assert_eq!(worker.counters.rewrites, 5);
        assert_eq!(worker.skills, vec!["php", "python"]);
        assert_eq!(worker.counters.rates().approval_rate, 77.78);
    }

    #[test]
    fn pending_check_wins_over_null_count() {
        let record: WorkerStatsRecord = serde_json::from_value(json!({
            "UPDATED_BY_MAIL": "a@x.com",
            "NULL_COUNT": 10,
            "PENDING_CHECK": 3,
        }))
        .unwrap();
        assert_eq!(record.counters().pending_to_check, 3);
    }

    #[test]
    fn developer_listing_rows_carry_their_own_id() {
        let record: WorkerStatsRecord = serde_json::from_value(json!({
            "USER_ID": 1033,
            "USER_EMAIL": "dev@x.com",
            "LOCATION": "Una",
            "SKILLSETS": null,
        }))
        .unwrap();
        let worker = record.into_worker().unwrap();
        assert_eq!(worker.id, "1033");
        assert_eq!(worker.email, "dev@x.com");
        assert!(worker.skills.is_empty());
    }

    #[test]
    fn rows_without_email_are_dropped() {
        let records: Vec<WorkerStatsRecord> = serde_json::from_value(json!([
            { "UPDATED_BY_MAIL": "a@x.com" },
            { "TOTAL_TASKS": 4 },
            { "UPDATED_BY_MAIL": "" },
        ]))
        .unwrap();
        let workers = parse_workers(records);
        assert_eq!(workers.len(), 1);
    }

    #[test]
    fn negative_and_garbage_counters_become_zero() {
        let record: WorkerStatsRecord = serde_json::from_value(json!({
            "UPDATED_BY_MAIL": "a@x.com",
            "TOTAL_TASKS": -4,
            "APPROVED_COUNT": "lots",
            "SKILLSETS": "php, go ,",
        }))
        .unwrap();
        assert_eq!(record.total_tasks, 0);
        assert_eq!(record.approved_count, 0);
        assert_eq!(record.skillsets, vec!["php", "go"]);
    }

    #[test]
    fn availability_response_maps_into_domain() {
        let response: AvailabilityResponse = serde_json::from_value(json!({
            "tasksAvailable": 42,
            "languages": { "php": 30, "python": "12", "go": null }
        }))
        .unwrap();
        let availability = Availability::from(response);
        assert_eq!(availability.total, 42);
        assert_eq!(availability.per_skill["php"], 30);
        assert_eq!(availability.per_skill["python"], 12);
        assert_eq!(availability.per_skill["go"], 0);
    }

    #[test]
    fn assignment_body_serialises_role_and_string_quantities() {
        let mut entries = BTreeMap::new();
        entries.insert("a@x.com".to_string(), "5".to_string());
        let mut data = BTreeMap::new();
        data.insert("php".to_string(), entries);

        let body = AssignmentRequestBody {
            role: Role::Admin,
            data: AssignmentPayload(data),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({ "role": "Admin", "data": { "php": { "a@x.com": "5" } } })
        );
    }

    #[test]
    fn error_body_reads_message_or_error() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"error":"Bad Request","message":"Permission denied"}"#)
                .unwrap();
        assert_eq!(body.into_message().as_deref(), Some("Permission denied"));

        let body: ErrorBody = serde_json::from_str(r#"{"error":"No Language"}"#).unwrap();
        assert_eq!(body.into_message().as_deref(), Some("No Language"));
    }
}
