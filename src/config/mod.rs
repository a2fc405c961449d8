pub mod settings;

pub use settings::{Settings, Environment, DatabaseSettings, ServerSettings, SessionSettings, ChatSettings};
