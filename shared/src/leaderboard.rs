use serde::{Deserialize, Serialize};

use crate::{
    Rates, Worker, LEADERBOARD_LIMIT, LEADERBOARD_MIN_APPROVED, PERFORMER_SUMMARY_LIMIT,
    PERFORMER_SUMMARY_MIN_APPROVED,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub place: u32,
    pub email: String,
    pub total: u32,
    pub approved: u32,
    pub rejected: u32,
    pub rewrites: u32,
    pub pending_to_check: u32,
    pub pending_to_complete: u32,
    #[serde(flatten)]
    pub rates: Rates,
}

impl From<&Worker> for LeaderboardEntry {
    fn from(worker: &Worker) -> Self {
        let counters = &worker.counters;
        Self {
            place: 0,
            email: worker.email.clone(),
            total: counters.total,
            approved: counters.approved,
            rejected: counters.rejected,
            rewrites: counters.rewrites,
            pending_to_check: counters.pending_to_check,
            pending_to_complete: counters.pending_to_complete,
            rates: counters.rates(),
        }
    }
}

/// Every worker with more than `min_approved` approvals, best approval rate
/// first. The sort is stable so ties keep the fetch order.
fn ranked(workers: &[Worker], min_approved: u32) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = workers
        .iter()
        .map(LeaderboardEntry::from)
        .filter(|entry| entry.approved > min_approved)
        .collect();

    entries.sort_by(|a, b| b.rates.approval_rate.total_cmp(&a.rates.approval_rate));
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.place = index as u32 + 1;
    }
    entries
}

pub fn build_leaderboard(
    workers: &[Worker],
    min_approved: u32,
    limit: usize,
) -> Vec<LeaderboardEntry> {
    let mut entries = ranked(workers, min_approved);
    entries.truncate(limit);
    entries
}

/// Leaderboard page view: top ten among workers with more than ten approvals.
pub fn leaderboard(workers: &[Worker]) -> Vec<LeaderboardEntry> {
    build_leaderboard(workers, LEADERBOARD_MIN_APPROVED, LEADERBOARD_LIMIT)
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformerSummary {
    pub top: Vec<LeaderboardEntry>,
    pub bottom: Vec<LeaderboardEntry>,
}

/// Head and tail of the same ranking. With fewer than six qualifying workers
/// an entry can show up in both lists.
pub fn performer_summary(workers: &[Worker]) -> PerformerSummary {
    let entries = ranked(workers, PERFORMER_SUMMARY_MIN_APPROVED);
    let tail_start = entries.len().saturating_sub(PERFORMER_SUMMARY_LIMIT);
    PerformerSummary {
        top: entries.iter().take(PERFORMER_SUMMARY_LIMIT).cloned().collect(),
        bottom: entries[tail_start..].to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worker::tests::{with_counters, worker};

    fn scored(index: u32, approved: u32, rejected: u32) -> Worker {
        with_counters(
            worker(
                &index.to_string(),
                &format!("dev{index}@x.com"),
                "Pune",
                &[],
            ),
            approved,
            rejected,
            approved + rejected,
        )
    }

    #[test]
    fn top_ten_sorted_strictly_descending() {
        // 15 workers, all above the threshold, distinct approval rates
        let workers: Vec<Worker> = (0..15).map(|i| scored(i, 11 + i, 15 - i)).collect();

        let board = build_leaderboard(&workers, LEADERBOARD_MIN_APPROVED, LEADERBOARD_LIMIT);
        assert_eq!(board.len(), 10);
        for pair in board.windows(2) {
            assert!(pair[0].rates.approval_rate > pair[1].rates.approval_rate);
        }
        assert_eq!(board[0].email, "dev14@x.com");
        assert_eq!(board[0].place, 1);
        assert_eq!(board[9].place, 10);
    }

    #[test]
    fn threshold_is_strictly_greater_than() {
        let workers = vec![scored(0, 10, 0), scored(1, 11, 0)];
        let board = leaderboard(&workers);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].email, "dev1@x.com");
    }

    #[test]
    fn ties_keep_fetch_order() {
        let workers = vec![scored(0, 20, 5), scored(1, 40, 10), scored(2, 12, 3)];
        let board = leaderboard(&workers);
        let emails: Vec<_> = board.iter().map(|e| e.email.as_str()).collect();
        assert_eq!(emails, vec!["dev0@x.com", "dev1@x.com", "dev2@x.com"]);
    }

    #[test]
    fn rates_exclude_pending_to_check() {
        let mut w = scored(0, 30, 10);
        w.counters.total = 50;
        w.counters.pending_to_check = 10;
        let board = leaderboard(&[w]);
        assert_eq!(board[0].rates.approval_rate, 75.0);
        assert_eq!(board[0].rates.rejection_rate, 25.0);
    }

    #[test]
    fn performer_summary_uses_its_own_threshold() {
        let workers = vec![
            scored(0, 5, 0),
            scored(1, 4, 0),
            scored(2, 9, 1),
            scored(3, 6, 6),
            scored(4, 8, 4),
            scored(5, 7, 1),
            scored(6, 5, 5),
        ];
        let summary = performer_summary(&workers);
        let top: Vec<_> = summary.top.iter().map(|e| e.email.as_str()).collect();
        let bottom: Vec<_> = summary.bottom.iter().map(|e| e.email.as_str()).collect();

        assert_eq!(top, vec!["dev0@x.com", "dev2@x.com", "dev5@x.com"]);
        assert_eq!(bottom, vec!["dev4@x.com", "dev3@x.com", "dev6@x.com"]);
    }

    #[test]
    fn performer_summary_overlaps_with_few_workers() {
        let workers = vec![scored(0, 5, 0), scored(1, 6, 6)];
        let summary = performer_summary(&workers);
        assert_eq!(summary.top.len(), 2);
        assert_eq!(summary.bottom.len(), 2);
        assert_eq!(summary.top, summary.bottom);
    }

    #[test]
    fn empty_input_gives_empty_views() {
        assert!(leaderboard(&[]).is_empty());
        assert_eq!(performer_summary(&[]), PerformerSummary::default());
    }
}
