pub mod store;
pub mod sqlite;

pub use store::GameStore;
pub use sqlite::SqliteStore;

#[cfg(test)]
pub use store::MockGameStore;
