// Common library for the feed relay: feed polling, change detection and chat delivery

pub mod bootstrap;
pub mod config;
pub mod errors;
pub mod feed;
pub mod message;
pub mod models;
pub mod notifier;
pub mod telemetry;
pub mod watcher;
