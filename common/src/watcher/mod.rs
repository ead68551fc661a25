// Watcher module for new-item detection and notification

pub mod engine;

pub use engine::{
    compare_head, CheckOutcome, HeadChange, TestNotifyError, WatchStatus, Watcher, WatcherConfig,
    WatcherEngine,
};
