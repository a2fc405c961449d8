pub mod store;
pub mod password;

pub use store::{new_session_token, MemorySessionStore, SessionStore};
pub use password::{hash_password, verify_password};
