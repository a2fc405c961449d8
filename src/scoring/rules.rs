use serde::{Deserialize, Serialize};

use crate::models::Score;
use super::level::{compute_level, points_for};

pub const AVATAR_MIN_LEVEL: u32 = 5;
pub const WIN_INTERVAL: u64 = 10_000;

/// Feature gates and limits of the game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameRules {
    pub leaderboard_size: usize,
    pub avatar_min_level: u32,
    pub win_interval: u64,
    pub chat_history_limit: usize,
    pub max_message_len: usize,
    pub admin_username: String,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            leaderboard_size: 10,
            avatar_min_level: AVATAR_MIN_LEVEL,
            win_interval: WIN_INTERVAL,
            chat_history_limit: 50,
            max_message_len: 500,
            admin_username: "admin".to_string(),
        }
    }
}

impl GameRules {
    pub fn validate(&self) -> Result<(), String> {
        if self.leaderboard_size == 0 {
            return Err("Leaderboard size must be positive".to_string());
        }
        if self.avatar_min_level == 0 {
            return Err("Avatar level gate must be at least 1".to_string());
        }
        if self.win_interval == 0 {
            return Err("Win interval must be positive".to_string());
        }
        if self.chat_history_limit == 0 || self.max_message_len == 0 {
            return Err("Chat limits must be positive".to_string());
        }
        if self.admin_username.trim().is_empty() {
            return Err("Admin username must not be empty".to_string());
        }

        Ok(())
    }

    pub fn can_upload_avatar(&self, score: Score) -> bool {
        compute_level(points_for(score)).level >= self.avatar_min_level
    }

    pub fn is_winning_tap(&self, score: Score) -> bool {
        score.value() % self.win_interval == 0
    }
}

pub fn can_upload_avatar(score: Score) -> bool {
    compute_level(points_for(score)).level >= AVATAR_MIN_LEVEL
}

pub fn is_winning_tap(score: Score) -> bool {
    score.value() % WIN_INTERVAL == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_gate_at_level_five() {
        // level 5 starts at 252 points
        assert!(!can_upload_avatar(Score(251_999)));
        assert!(can_upload_avatar(Score(252_000)));
        assert!(!can_upload_avatar(Score(0)));
    }

    #[test]
    fn test_avatar_gate_matches_level() {
        for clicks in (0..600_000u64).step_by(997) {
            let level = compute_level(clicks / 1000).level;
            assert_eq!(can_upload_avatar(Score(clicks)), level >= 5);
        }
    }

    #[test]
    fn test_winning_tap() {
        assert!(is_winning_tap(Score(0)));
        assert!(is_winning_tap(Score(10_000)));
        assert!(is_winning_tap(Score(30_000)));
        assert!(!is_winning_tap(Score(9_999)));
        assert!(!is_winning_tap(Score(10_001)));
    }

    #[test]
    fn test_configured_rules() {
        let rules = GameRules {
            avatar_min_level: 2,
            win_interval: 7,
            ..GameRules::default()
        };
        assert!(rules.can_upload_avatar(Score(10_000)));
        assert!(!rules.can_upload_avatar(Score(9_999)));
        assert!(rules.is_winning_tap(Score(14)));
        assert!(!rules.is_winning_tap(Score(15)));
    }

    #[test]
    fn test_validate() {
        assert!(GameRules::default().validate().is_ok());

        let rules = GameRules { win_interval: 0, ..GameRules::default() };
        assert!(rules.validate().is_err());

        let rules = GameRules { leaderboard_size: 0, ..GameRules::default() };
        assert!(rules.validate().is_err());
    }
}
