pub mod app;
pub mod cache;
pub mod config;
pub mod error;
pub mod geo;
pub mod github;
pub mod quotes;
pub mod storage;
pub mod types;
pub mod visitors;
