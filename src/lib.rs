pub mod analytics;
pub mod config;
pub mod error;
pub mod images;
pub mod server;
pub mod storage;
pub mod types;
