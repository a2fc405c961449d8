use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::{
    config::DatabaseSettings,
    models::{
        ChatMessage, ClickerError, Credentials, Location, PlayerScore, Result, Score, User, UserId,
        UserLocation,
    },
};
use super::GameStore;

const CREATE_USERS: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        clicks INTEGER NOT NULL DEFAULT 0,
        lat REAL,
        lon REAL,
        city TEXT,
        avatar TEXT NOT NULL DEFAULT 'default.png'
    )
"#;

const CREATE_MESSAGES: &str = r#"
    CREATE TABLE IF NOT EXISTS messages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        text TEXT NOT NULL,
        timestamp TEXT NOT NULL
    )
"#;

const USER_COLUMNS: &str = "id, username, clicks, avatar, lat, lon, city";

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.user_id, u.username, u.avatar, m.text, m.timestamp
    FROM messages m
    JOIN users u ON u.id = m.user_id
"#;

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    clicks: i64,
    avatar: String,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
}

impl TryFrom<UserRow> for User {
    type Error = ClickerError;

    fn try_from(row: UserRow) -> Result<Self> {
        let location = match (row.lat, row.lon) {
            (Some(lat), Some(lon)) => Some(Location { lat, lon, city: row.city }),
            _ => None,
        };

        Ok(User {
            id: row.id,
            username: row.username,
            clicks: Score::try_from(row.clicks)?.value(),
            avatar: row.avatar,
            location,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i64,
    user_id: i64,
    username: String,
    avatar: String,
    text: String,
    timestamp: DateTime<Utc>,
}

impl From<MessageRow> for ChatMessage {
    fn from(row: MessageRow) -> Self {
        ChatMessage {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            avatar: row.avatar,
            text: row.text,
            timestamp: row.timestamp,
        }
    }
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// SQLite-backed [`GameStore`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self> {
        info!("Connecting to database at {}", settings.url);

        let options = SqliteConnectOptions::from_str(&settings.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Private in-memory database, mainly for tests and dry runs.
    pub async fn in_memory() -> Result<Self> {
        // A single connection that never expires keeps the memory database alive.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn fetch_message(&self, id: i64) -> Result<ChatMessage> {
        let row: MessageRow = sqlx::query_as(&format!("{} WHERE m.id = ?", MESSAGE_SELECT))
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }
}

#[async_trait]
impl GameStore for SqliteStore {
    async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_USERS).execute(&self.pool).await?;
        sqlx::query(CREATE_MESSAGES).execute(&self.pool).await?;
        debug!("Database schema ready");
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (username, password_hash) VALUES (?, ?) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => row.try_into(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ClickerError::UsernameTaken(username.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_credentials(&self, username: &str) -> Result<Option<Credentials>> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, password_hash FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(user_id, password_hash)| Credentials { user_id, password_hash }))
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    async fn increment_clicks(&self, id: UserId) -> Result<u64> {
        let clicks: Option<i64> =
            sqlx::query_scalar("UPDATE users SET clicks = clicks + 1 WHERE id = ? RETURNING clicks")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        let clicks = clicks.ok_or(ClickerError::UserNotFound(id))?;
        Ok(Score::try_from(clicks)?.value())
    }

    async fn player_scores(&self) -> Result<Vec<PlayerScore>> {
        let rows: Vec<(i64, String, String, i64)> =
            sqlx::query_as("SELECT id, username, avatar, clicks FROM users")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(id, username, avatar, clicks)| {
                Ok(PlayerScore {
                    id,
                    username,
                    avatar,
                    clicks: Score::try_from(clicks)?.value(),
                })
            })
            .collect()
    }

    async fn set_avatar(&self, id: UserId, filename: &str) -> Result<()> {
        let result = sqlx::query("UPDATE users SET avatar = ? WHERE id = ?")
            .bind(filename)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ClickerError::UserNotFound(id));
        }
        Ok(())
    }

    async fn set_location(&self, id: UserId, location: Location) -> Result<()> {
        let result = sqlx::query("UPDATE users SET lat = ?, lon = ?, city = ? WHERE id = ?")
            .bind(location.lat)
            .bind(location.lon)
            .bind(location.city)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ClickerError::UserNotFound(id));
        }
        Ok(())
    }

    async fn located_users(&self) -> Result<Vec<UserLocation>> {
        let rows: Vec<(i64, String, f64, f64, Option<String>)> = sqlx::query_as(
            "SELECT id, username, lat, lon, city FROM users \
             WHERE lat IS NOT NULL AND lon IS NOT NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user_id, username, lat, lon, city)| UserLocation {
                user_id,
                username,
                location: Location { lat, lon, city },
            })
            .collect())
    }

    async fn insert_message(&self, user_id: UserId, text: &str) -> Result<ChatMessage> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO messages (user_id, text, timestamp) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(user_id)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        self.fetch_message(id).await
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<ChatMessage>> {
        let rows: Vec<MessageRow> =
            sqlx::query_as(&format!("{} ORDER BY m.id DESC LIMIT ?", MESSAGE_SELECT))
                .bind(sql_limit(limit))
                .fetch_all(&self.pool)
                .await?;

        let mut messages: Vec<ChatMessage> = rows.into_iter().map(ChatMessage::from).collect();
        messages.reverse();
        Ok(messages)
    }
}
