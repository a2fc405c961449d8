pub mod level;
pub mod rank;
pub mod rules;

pub use level::{compute_level, points_for, progress_percent, LevelProgress, LevelState};
pub use rank::{compute_rank, top_k};
pub use rules::{can_upload_avatar, is_winning_tap, GameRules};
