pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod probe;
pub mod report;
