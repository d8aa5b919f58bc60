pub mod chat_api;
pub mod publisher;
