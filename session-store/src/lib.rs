//! Chat history for the web chat: turns, validated session ids and a
//! file-backed cache keyed by session id.

mod error;
mod id;
mod store;
mod turn;

pub use error::SessionError;
pub use id::SessionId;
pub use store::{Session, SessionStore};
pub use turn::{ChatTurn, Role};
