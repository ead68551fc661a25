// Watcher engine: poll the feed, compare the head, notify on change

use crate::errors::{FeedError, NotifyError};
use crate::feed::FeedSource;
use crate::message::MessageFormatter;
use crate::models::{ChannelInfo, Feed, FeedItem};
use crate::notifier::Notifier;
use crate::telemetry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};

/// Configuration for the watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// How often to poll the feed (in seconds)
    pub poll_interval_seconds: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 300,
        }
    }
}

/// Result of one fetch-compare-notify sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    /// The feed has no items; nothing recorded
    EmptyFeed,
    /// No prior head was known; the current head is now recorded as seen
    Primed { item_id: String },
    /// The head matches the recorded one
    Unchanged { item_id: String },
    /// A new head was recorded and the notification was delivered
    Notified { item_id: String, url: String },
    /// A new head was recorded but delivery failed
    NotifyFailed { item_id: String, error: String },
}

impl CheckOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmptyFeed => "empty_feed",
            Self::Primed { .. } => "primed",
            Self::Unchanged { .. } => "unchanged",
            Self::Notified { .. } => "notified",
            Self::NotifyFailed { .. } => "notify_failed",
        }
    }
}

/// Pure comparison of the feed head with the last seen id
///
/// Absence of prior state is never treated as new.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadChange {
    Empty,
    Prime,
    Same,
    New,
}

pub fn compare_head(last_item_id: Option<&str>, head: Option<&FeedItem>) -> HeadChange {
    match (last_item_id, head) {
        (_, None) => HeadChange::Empty,
        (None, Some(_)) => HeadChange::Prime,
        (Some(last), Some(item)) if last == item.id => HeadChange::Same,
        (Some(_), Some(_)) => HeadChange::New,
    }
}

/// Observable watcher state; only `last_item_id` drives behaviour
#[derive(Debug, Clone, Default, Serialize)]
pub struct WatchStatus {
    pub last_item_id: Option<String>,
    pub channel: Option<ChannelInfo>,
    pub last_checked_at: Option<DateTime<Utc>>,
    pub last_notified_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub checks: u64,
    pub notifications_sent: u64,
}

/// Watcher trait for the polling lifecycle
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Start the polling loop; returns when stopped
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Stop the polling loop
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Run one fetch-compare-notify sequence
    async fn check_for_new_item(&self) -> Result<CheckOutcome, FeedError>;
}

/// Main watcher engine implementation
pub struct WatcherEngine {
    config: WatcherConfig,
    source: Arc<dyn FeedSource>,
    notifier: Arc<dyn Notifier>,
    formatter: MessageFormatter,
    status: RwLock<WatchStatus>,
    // Serialises checks triggered by the timer and by the HTTP surface
    check_lock: Mutex<()>,
    shutdown_tx: broadcast::Sender<()>,
}

impl WatcherEngine {
    /// Create a new watcher engine
    pub fn new(
        config: WatcherConfig,
        source: Arc<dyn FeedSource>,
        notifier: Arc<dyn Notifier>,
        formatter: MessageFormatter,
    ) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

        Self {
            config,
            source,
            notifier,
            formatter,
            status: RwLock::new(WatchStatus::default()),
            check_lock: Mutex::new(()),
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Snapshot of the current state
    pub async fn status(&self) -> WatchStatus {
        self.status.read().await.clone()
    }

    pub async fn last_item_id(&self) -> Option<String> {
        self.status.read().await.last_item_id.clone()
    }

    /// Resolve the channel and record the current feed head without notifying
    ///
    /// Failures are logged; the loop still starts and the first successful
    /// check primes the state instead.
    #[instrument(skip(self))]
    pub async fn initialize(&self) {
        if let Err(e) = self.ensure_channel().await {
            error!(error = %e, "Could not fetch notification channel");
        }

        let _guard = self.check_lock.lock().await;
        match self.source.fetch().await {
            Ok(feed) => {
                telemetry::update_items_last_seen(feed.items.len());
                let mut status = self.status.write().await;
                status.last_checked_at = Some(Utc::now());
                match feed.head() {
                    Some(head) => {
                        info!(item_id = %head.id, title = %head.title, "Initialized with latest item");
                        status.last_item_id = Some(head.id.clone());
                    }
                    None => info!("Feed is empty; first item seen will be recorded without notifying"),
                }
            }
            Err(e) => {
                telemetry::record_fetch_failure();
                error!(error = %e, "Error initializing from feed");
                self.status.write().await.last_error = Some(e.to_string());
            }
        }
    }

    /// Send a notification for the current feed head without recording it
    #[instrument(skip(self))]
    pub async fn send_test_notification(&self) -> Result<Option<FeedItem>, TestNotifyError> {
        let feed = self.source.fetch().await.map_err(TestNotifyError::Feed)?;
        let Some(head) = feed.head().cloned() else {
            return Ok(None);
        };

        self.notify(&head, &feed)
            .await
            .map_err(TestNotifyError::Notify)?;
        info!(item_id = %head.id, "Test notification sent");
        Ok(Some(head))
    }

    /// Resolve the channel once; later calls reuse the cached value
    async fn ensure_channel(&self) -> Result<ChannelInfo, NotifyError> {
        if let Some(channel) = self.status.read().await.channel.clone() {
            return Ok(channel);
        }

        let channel = self.notifier.resolve_channel().await?;
        info!(
            channel_id = %channel.id,
            channel_name = %channel.display_name(),
            "Connected to notification channel"
        );
        self.status.write().await.channel = Some(channel.clone());
        Ok(channel)
    }

    async fn notify(&self, item: &FeedItem, feed: &Feed) -> Result<String, NotifyError> {
        self.ensure_channel().await?;

        let message = self.formatter.format(item, feed);
        self.notifier.send(&message).await?;

        let mut status = self.status.write().await;
        status.last_notified_at = Some(Utc::now());
        status.notifications_sent += 1;
        Ok(self.formatter.item_url(item))
    }
}

/// Failure of a test notification
#[derive(Debug, thiserror::Error)]
pub enum TestNotifyError {
    #[error(transparent)]
    Feed(FeedError),
    #[error(transparent)]
    Notify(NotifyError),
}

#[async_trait]
impl Watcher for WatcherEngine {
    /// Start the polling loop
    ///
    /// The first tick fires one full interval after start; `initialize`
    /// covers the state at startup.
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let period = Duration::from_secs(self.config.poll_interval_seconds);
        info!(
            poll_interval_seconds = self.config.poll_interval_seconds,
            "Starting feed polling"
        );

        let first_tick = Instant::now()
            .checked_add(period)
            .ok_or("poll interval too large for the platform timer")?;
        let mut poll_interval = interval_at(first_tick, period);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            tokio::select! {
                _ = poll_interval.tick() => {
                    debug!("Polling feed");

                    match self.check_for_new_item().await {
                        Ok(outcome) => debug!(outcome = outcome.label(), "Feed check finished"),
                        Err(e) => error!(error = %e, "Error checking for new items"),
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping watcher");
                    break;
                }
            }
        }

        info!("Watcher stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Stopping watcher");
        let _ = self.shutdown_tx.send(());
        Ok(())
    }

    #[instrument(skip(self))]
    async fn check_for_new_item(&self) -> Result<CheckOutcome, FeedError> {
        let _guard = self.check_lock.lock().await;

        let feed = match self.source.fetch().await {
            Ok(feed) => feed,
            Err(e) => {
                telemetry::record_fetch_failure();
                let mut status = self.status.write().await;
                status.checks += 1;
                status.last_checked_at = Some(Utc::now());
                status.last_error = Some(e.to_string());
                return Err(e);
            }
        };
        telemetry::update_items_last_seen(feed.items.len());

        // Decide and record under one write lock, send after releasing it
        let new_item = {
            let mut status = self.status.write().await;
            status.checks += 1;
            status.last_checked_at = Some(Utc::now());
            status.last_error = None;

            let head = feed.head();
            match (compare_head(status.last_item_id.as_deref(), head), head) {
                (HeadChange::Empty, _) | (_, None) => {
                    warn!("No items found in feed");
                    None
                }
                (HeadChange::Prime, Some(item)) => {
                    info!(item_id = %item.id, "No previous item recorded, priming without notification");
                    status.last_item_id = Some(item.id.clone());
                    telemetry::record_check("primed");
                    return Ok(CheckOutcome::Primed {
                        item_id: item.id.clone(),
                    });
                }
                (HeadChange::Same, Some(item)) => {
                    debug!(item_id = %item.id, "No new items");
                    telemetry::record_check("unchanged");
                    return Ok(CheckOutcome::Unchanged {
                        item_id: item.id.clone(),
                    });
                }
                (HeadChange::New, Some(item)) => {
                    info!(item_id = %item.id, title = %item.title, "New item detected");
                    status.last_item_id = Some(item.id.clone());
                    Some(item.clone())
                }
            }
        };

        let Some(item) = new_item else {
            telemetry::record_check("empty_feed");
            return Ok(CheckOutcome::EmptyFeed);
        };

        let outcome = match self.notify(&item, &feed).await {
            Ok(url) => {
                telemetry::record_notification_sent();
                info!(item_id = %item.id, url = %url, "Notification sent");
                CheckOutcome::Notified {
                    item_id: item.id,
                    url,
                }
            }
            Err(e) => {
                let reason = match e {
                    NotifyError::ChannelUnavailable => "channel_unavailable",
                    NotifyError::Rejected { .. } => "rejected",
                    _ => "request",
                };
                telemetry::record_notification_failed(reason);
                error!(item_id = %item.id, error = %e, "Error sending notification");
                self.status.write().await.last_error = Some(e.to_string());
                CheckOutcome::NotifyFailed {
                    item_id: item.id,
                    error: e.to_string(),
                }
            }
        };

        telemetry::record_check(outcome.label());
        Ok(outcome)
    }
}
