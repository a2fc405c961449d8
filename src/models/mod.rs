pub mod user;
pub mod chat;
pub mod error;

pub use user::*;
pub use chat::*;
pub use error::*;
