//! Leaderboard ranking over completed progress rows.

use gamehub_core::repository::CompletedEntry;
use serde::Serialize;

/// One user's line on the leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaderboardEntry {
    /// The ranked user.
    pub user_id: i64,
    /// Sum of points over the user's completions in the sample.
    pub total_points: i64,
    /// Number of the user's completions in the sample.
    pub completed_count: u32,
}

/// Groups completion rows per user and ranks by total points, highest first.
///
/// Only the rows handed in are counted. The read side passes the first
/// `limit` completions, so a user whose completions fall outside that sample
/// is under-counted or missing entirely. Users with equal totals keep the
/// order in which they first appear.
#[must_use]
pub fn rank(completions: &[CompletedEntry], limit: usize) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = Vec::new();
    for completion in completions {
        match entries.iter_mut().find(|e| e.user_id == completion.user_id) {
            Some(entry) => {
                entry.total_points += i64::from(completion.points);
                entry.completed_count += 1;
            }
            None => entries.push(LeaderboardEntry {
                user_id: completion.user_id,
                total_points: i64::from(completion.points),
                completed_count: 1,
            }),
        }
    }
    entries.sort_by(|a, b| b.total_points.cmp(&a.total_points));
    entries.truncate(limit);
    entries
}
