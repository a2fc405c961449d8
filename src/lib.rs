pub mod models;
pub mod config;
pub mod scoring;
pub mod storage;
pub mod session;
pub mod game;
pub mod server;

pub use models::{ClickerError, Result, Score, User, UserId};
pub use config::Settings;
pub use scoring::{compute_level, compute_rank, can_upload_avatar, is_winning_tap, GameRules, LevelState};
