use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    models::{
        ChatEvent, ChatMessage, ClickerError, Location, PlayerScore, Result, Score, User, UserId,
        UserLocation,
    },
    scoring::{compute_rank, top_k, GameRules, LevelState},
    session::{hash_password, verify_password},
    storage::GameStore,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dashboard {
    pub user: User,
    pub level: LevelState,
    pub place: usize,
    pub leaderboard: Vec<PlayerScore>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapOutcome {
    pub clicks: u64,
    pub level: LevelState,
    pub winning_tap: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistory {
    pub user: User,
    pub messages: Vec<ChatMessage>,
}

/// Game logic between the HTTP layer and storage.
pub struct GameService {
    store: Arc<dyn GameStore>,
    rules: GameRules,
}

impl GameService {
    pub fn new(store: Arc<dyn GameStore>, rules: GameRules) -> Self {
        Self { store, rules }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ClickerError::InvalidArgument(
                "username and password are required".to_string(),
            ));
        }

        if self.store.find_credentials(username).await?.is_some() {
            return Err(ClickerError::UsernameTaken(username.to_string()));
        }

        let user = self.store.create_user(username, &hash_password(password)).await?;
        info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let credentials = self
            .store
            .find_credentials(username.trim())
            .await?
            .ok_or(ClickerError::InvalidCredentials)?;

        if !verify_password(password, &credentials.password_hash) {
            warn!("Failed login for {}", username);
            return Err(ClickerError::InvalidCredentials);
        }

        self.user(credentials.user_id).await
    }

    pub async fn user(&self, user_id: UserId) -> Result<User> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or(ClickerError::UserNotFound(user_id))
    }

    /// Current standing of `score` among all players.
    pub async fn place(&self, score: Score) -> Result<usize> {
        let peers = self.store.player_scores().await?;
        Ok(compute_rank(score, peers.iter().map(|p| Score(p.clicks))))
    }

    pub async fn dashboard(&self, user_id: UserId) -> Result<Dashboard> {
        let user = self.user(user_id).await?;
        let peers = self.store.player_scores().await?;

        let place = compute_rank(user.score(), peers.iter().map(|p| Score(p.clicks)));
        let leaderboard = top_k(peers, self.rules.leaderboard_size);
        let level = LevelState::from_score(user.score());

        Ok(Dashboard {
            user,
            level,
            place,
            leaderboard,
        })
    }

    pub async fn tap(&self, user_id: UserId) -> Result<TapOutcome> {
        let clicks = self.store.increment_clicks(user_id).await?;
        let score = Score(clicks);
        let winning_tap = self.rules.is_winning_tap(score);

        if winning_tap {
            info!("User {} hit a winning tap at {} clicks", user_id, clicks);
        }

        Ok(TapOutcome {
            clicks,
            level: LevelState::from_score(score),
            winning_tap,
        })
    }

    /// Fails with `Forbidden` until the user reaches the avatar level.
    pub async fn authorize_avatar(&self, user_id: UserId) -> Result<User> {
        let user = self.user(user_id).await?;

        if !self.rules.can_upload_avatar(user.score()) {
            return Err(ClickerError::Forbidden(format!(
                "avatar upload unlocks at level {}",
                self.rules.avatar_min_level
            )));
        }

        Ok(user)
    }

    pub async fn set_avatar(&self, user_id: UserId, filename: &str) -> Result<()> {
        self.authorize_avatar(user_id).await?;
        self.store.set_avatar(user_id, filename).await?;
        debug!("User {} avatar set to {}", user_id, filename);
        Ok(())
    }

    pub async fn submit_location(&self, user_id: UserId, location: Location) -> Result<()> {
        location.validate()?;
        self.store.set_location(user_id, location).await
    }

    /// Everyone's submitted location; admin only.
    pub async fn locations(&self, user_id: UserId) -> Result<Vec<UserLocation>> {
        let user = self.user(user_id).await?;

        if !user.is_admin(&self.rules.admin_username) {
            return Err(ClickerError::Forbidden("admin only".to_string()));
        }

        self.store.located_users().await
    }

    pub async fn chat_history(&self, user_id: UserId) -> Result<ChatHistory> {
        let user = self.user(user_id).await?;
        let messages = self.store.recent_messages(self.rules.chat_history_limit).await?;

        Ok(ChatHistory { user, messages })
    }

    /// Persist a chat line and build the event to broadcast.
    pub async fn post_message(&self, user_id: UserId, text: &str) -> Result<ChatEvent> {
        let text: String = text.chars().take(self.rules.max_message_len).collect();
        if text.trim().is_empty() {
            return Err(ClickerError::InvalidArgument("message is empty".to_string()));
        }

        let user = self.user(user_id).await?;
        let message = self.store.insert_message(user.id, &text).await?;
        let place = self.place(user.score()).await?;

        Ok(ChatEvent::ReceiveMessage {
            username: user.username,
            avatar: user.avatar,
            text: message.text,
            place,
        })
    }
}
