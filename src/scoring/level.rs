//! Level progression.
//!
//! Raw clicks convert to points at 1000:1. Each level costs a threshold of
//! points; the first costs 10 and each following one `floor(previous * 2.5)`.
//! The sequence is walked step by step because truncation compounds.

use serde::{Deserialize, Serialize};

use crate::models::Score;

pub const CLICKS_PER_POINT: u64 = 1000;
pub const BASE_THRESHOLD: u64 = 10;

/// Result of walking the threshold sequence for a point total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub points_into_level: u64,
    pub threshold: u64,
}

impl LevelProgress {
    pub fn progress_percent(&self) -> u8 {
        progress_percent(self.points_into_level, self.threshold)
    }
}

/// Everything the UI shows about a user's level.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LevelState {
    pub level: u32,
    pub points: u64,
    pub points_into_level: u64,
    pub threshold: u64,
    pub progress_percent: u8,
}

impl LevelState {
    pub fn from_score(score: Score) -> Self {
        let points = points_for(score);
        let progress = compute_level(points);

        Self {
            level: progress.level,
            points,
            points_into_level: progress.points_into_level,
            threshold: progress.threshold,
            progress_percent: progress.progress_percent(),
        }
    }
}

pub fn points_for(score: Score) -> u64 {
    score.value() / CLICKS_PER_POINT
}

/// `floor(threshold * 2.5)` in integer arithmetic. Saturates at `u64::MAX`,
/// which no reachable remainder can meet, so the level loop still ends.
pub fn next_threshold(threshold: u64) -> u64 {
    threshold.checked_mul(5).map_or(u64::MAX, |t| t / 2)
}

pub fn compute_level(points: u64) -> LevelProgress {
    let mut level = 1;
    let mut threshold = BASE_THRESHOLD;
    let mut remaining = points;

    while remaining >= threshold {
        remaining -= threshold;
        threshold = next_threshold(threshold);
        level += 1;
    }

    LevelProgress {
        level,
        points_into_level: remaining,
        threshold,
    }
}

/// Whole percent of the current level completed, rounded down.
pub fn progress_percent(points_into_level: u64, threshold: u64) -> u8 {
    if threshold == 0 {
        return 0;
    }
    let percent = (points_into_level as u128 * 100) / threshold as u128;
    percent.min(100) as u8
}

/// Iterator over the per-level thresholds, starting with level 1.
pub fn thresholds() -> impl Iterator<Item = u64> {
    std::iter::successors(Some(BASE_THRESHOLD), |&t| Some(next_threshold(t)))
}
