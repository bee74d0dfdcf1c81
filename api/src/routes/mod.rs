pub mod chat_page;
pub mod health;
pub mod sessions;
