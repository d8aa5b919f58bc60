pub mod chat;
pub mod types;
