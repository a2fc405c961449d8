use std::cmp::Reverse;

use crate::models::{PlayerScore, Score};

/// 1-based standing: one plus the number of peers with a strictly greater score.
/// Tied players share a rank.
pub fn compute_rank<I>(score: Score, peers: I) -> usize
where
    I: IntoIterator<Item = Score>,
{
    peers.into_iter().filter(|peer| *peer > score).count() + 1
}

/// Highest scores first; equal scores fall back to the older account.
pub fn top_k(mut players: Vec<PlayerScore>, k: usize) -> Vec<PlayerScore> {
    players.sort_by_key(|p| (Reverse(p.clicks), p.id));
    players.truncate(k);
    players
}
