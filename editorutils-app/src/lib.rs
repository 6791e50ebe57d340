pub mod app;
pub mod build;
pub mod config;
pub mod foreground;
pub mod host;
pub mod logging;
pub mod notification;
