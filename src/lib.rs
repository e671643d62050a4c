pub mod chat;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod error;
pub mod llm;
pub mod resolver;
pub mod server;
