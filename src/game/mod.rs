pub mod chat;
pub mod service;

pub use chat::ChatHub;
pub use service::{ChatHistory, Dashboard, GameService, TapOutcome};
