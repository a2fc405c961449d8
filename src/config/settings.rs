use serde::{Deserialize, Serialize};
use config::{Config, ConfigError, File};
use std::path::{Path, PathBuf};

use crate::scoring::GameRules;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub app: AppSettings,
    pub game: GameRules,
    pub database: DatabaseSettings,
    pub server: ServerSettings,
    pub session: SessionSettings,
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub name: String,
    pub version: String,
    pub log_level: String,
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub connect_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub upload_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub max_upload_size_mb: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    pub cookie_name: String,
    pub ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSettings {
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: "Clicker".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                log_level: "info".to_string(),
                environment: Environment::Development,
            },
            game: GameRules::default(),
            database: DatabaseSettings {
                url: "sqlite://clicker.db".to_string(),
                max_connections: 5,
                connect_timeout_seconds: 30,
            },
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 5000,
                upload_dir: PathBuf::from("uploads"),
                cors_origins: vec!["*".to_string()],
                max_upload_size_mb: 5,
            },
            session: SessionSettings {
                cookie_name: "clicker_session".to_string(),
                ttl_seconds: 7 * 24 * 60 * 60, // 1 week
                cleanup_interval_seconds: 300,
            },
            chat: ChatSettings {
                channel_capacity: 100,
            },
        }
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CLICKER").separator("__"))
            .build()?;

        s.try_deserialize()
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(Config::try_from(&Settings::default())?)
            .add_source(File::from(path.as_ref()))
            .build()?;

        s.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        self.game.validate()?;

        if self.database.max_connections == 0 {
            return Err("Database pool needs at least one connection".to_string());
        }

        if self.session.cookie_name.is_empty() || self.session.ttl_seconds == 0 {
            return Err("Session cookie name and TTL must be set".to_string());
        }

        if self.chat.channel_capacity == 0 {
            return Err("Chat channel capacity must be positive".to_string());
        }

        if self.app.environment == Environment::Production
            && self.server.cors_origins.iter().any(|o| o == "*")
        {
            return Err("Wildcard CORS origin is not allowed in production".to_string());
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
