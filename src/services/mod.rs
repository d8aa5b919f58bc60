pub mod catalog;
pub mod chat_api_http;
pub mod credentials;
pub mod pacer;
pub mod probe_runner;
pub mod settings;
pub mod text;
