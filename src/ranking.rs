//! Leaderboard aggregation over profile score histories.

use crate::types::{UserId, UserProfile};
use serde::Serialize;

/// Number of entries shown on the public leaderboard
pub const DEFAULT_RANKING_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RankingEntry {
    /// 1-based position
    pub rank: usize,
    pub uid: UserId,
    pub display_name: String,
    pub total: u64,
    pub games_played: usize,
}

/// Rank profiles by total points, highest first, keeping the top `limit`.
///
/// Equal totals are ordered by registration time (earliest first), then by uid,
/// so the order never depends on how the profiles happen to be stored.
pub fn rank_profiles(profiles: &[UserProfile], limit: usize) -> Vec<RankingEntry> {
    let mut totals: Vec<(&UserProfile, u64)> = profiles.iter().map(|p| (p, p.total())).collect();

    totals.sort_by(|(a, a_total), (b, b_total)| {
        b_total
            .cmp(a_total)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.uid.cmp(&b.uid))
    });

    totals
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (profile, total))| RankingEntry {
            rank: i + 1,
            uid: profile.uid.clone(),
            display_name: profile.display_name.clone(),
            total,
            games_played: profile.scores.len(),
        })
        .collect()
}
