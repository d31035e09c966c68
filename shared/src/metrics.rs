use serde::{Deserialize, Serialize};

use crate::{TaskCounters, Worker};

/// Percentages derived from raw counters. Never stored, recomputed whenever
/// the counters change.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rates {
    pub approval_rate: f64,
    pub rejection_rate: f64,
    pub rewrite_rate: f64,
}

/// Rounds half-up to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Work still waiting for review is excluded from the denominator. When
/// nothing has been reviewed every rate is zero.
pub fn compute_rates(
    total: u32,
    approved: u32,
    rejected: u32,
    rewrites: u32,
    pending_to_check: u32,
) -> Rates {
    let denominator = i64::from(total) - i64::from(pending_to_check);
    if denominator <= 0 {
        return Rates::default();
    }

    let rate = |numerator: u32| round2(f64::from(numerator) / denominator as f64 * 100.0);
    Rates {
        approval_rate: rate(approved),
        rejection_rate: rate(rejected),
        rewrite_rate: rate(rewrites),
    }
}

impl TaskCounters {
    pub fn rates(&self) -> Rates {
        compute_rates(
            self.total,
            self.approved,
            self.rejected,
            self.rewrites,
            self.pending_to_check,
        )
    }
}

/// Project-wide totals and rates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub workers: usize,
    pub counters: TaskCounters,
    pub rates: Rates,
}

impl ProjectSummary {
    pub fn from_counters(workers: usize, counters: TaskCounters) -> Self {
        Self {
            workers,
            rates: counters.rates(),
            counters,
        }
    }

    pub fn from_workers(workers: &[Worker]) -> Self {
        let counters = workers.iter().fold(TaskCounters::default(), |mut acc, w| {
            acc.add(&w.counters);
            acc
        });
        Self::from_counters(workers.len(), counters)
    }
}

/// One worker's own dashboard numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalStats {
    pub email: String,
    pub counters: TaskCounters,
    pub rates: Rates,
}

pub fn personal_stats(workers: &[Worker], email: &str) -> Option<PersonalStats> {
    workers
        .iter()
        .find(|w| w.email == email)
        .map(|w| PersonalStats {
            email: w.email.clone(),
            counters: w.counters,
            rates: w.counters.rates(),
        })
}
