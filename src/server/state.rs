use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::Settings,
    game::{ChatHub, GameService},
    models::Result,
    session::{MemorySessionStore, SessionStore},
    storage::{GameStore, SqliteStore},
};

/// Everything a request handler can reach. Built once at startup.
pub struct AppState {
    pub settings: Settings,
    pub game: GameService,
    pub sessions: Arc<dyn SessionStore>,
    pub chat: ChatHub,
}

impl AppState {
    pub fn new(
        settings: Settings,
        store: Arc<dyn GameStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Arc<Self> {
        let game = GameService::new(store, settings.game.clone());
        let chat = ChatHub::new(settings.chat.channel_capacity);

        Arc::new(Self {
            settings,
            game,
            sessions,
            chat,
        })
    }

    /// Connect to the configured database, migrate it, and start with no sessions.
    pub async fn from_settings(settings: Settings) -> Result<Arc<Self>> {
        let store = SqliteStore::connect(&settings.database).await?;
        store.migrate().await?;

        let sessions = MemorySessionStore::new(Duration::from_secs(settings.session.ttl_seconds));

        Ok(Self::new(settings, Arc::new(store), Arc::new(sessions)))
    }
}
