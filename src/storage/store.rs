use async_trait::async_trait;

use crate::models::{ChatMessage, Credentials, Location, PlayerScore, Result, User, UserId, UserLocation};

/// Persistence behind the game: accounts, scores, locations and chat history.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Create tables if they do not exist yet
    async fn migrate(&self) -> Result<()>;

    /// Insert a new account, failing with `UsernameTaken` on conflict
    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>>;

    async fn get_user(&self, id: UserId) -> Result<Option<User>>;

    /// Add one click and return the new total
    async fn increment_clicks(&self, id: UserId) -> Result<u64>;

    /// Every player's score, in no particular order
    async fn player_scores(&self) -> Result<Vec<PlayerScore>>;

    async fn set_avatar(&self, id: UserId, filename: &str) -> Result<()>;

    async fn set_location(&self, id: UserId, location: Location) -> Result<()>;

    async fn located_users(&self) -> Result<Vec<UserLocation>>;

    async fn insert_message(&self, user_id: UserId, text: &str) -> Result<ChatMessage>;

    /// Latest `limit` messages, oldest first
    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChatMessage>>;
}
