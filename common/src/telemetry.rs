// Telemetry module for structured logging, metrics, and tracing

use crate::config::{LogFormat, ObservabilityConfig};
use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    trace::{RandomIdGenerator, Sampler, TracerProvider},
    Resource,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const SERVICE_NAME: &str = "feed-relay";

/// Initialize logging from the observability settings
///
/// `RUST_LOG` takes precedence over the configured level. JSON output carries
/// the current span so log lines can be correlated with a check.
pub fn init_logging(config: &ObservabilityConfig) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = || build_env_filter(rust_log.as_deref(), &config.log_level);

    let fmt_layer = match config.log_format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_thread_ids(true)
            .with_filter(env_filter()?)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_target(false)
            .with_filter(env_filter()?)
            .boxed(),
    };

    let registry = tracing_subscriber::registry().with(fmt_layer);

    if let Some(endpoint) = config.tracing_endpoint.as_deref() {
        let tracer = init_tracer(endpoint)?;
        let telemetry_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        registry
            .with(telemetry_layer)
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    } else {
        registry
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;
    }

    tracing::info!(
        log_level = %config.log_level,
        log_format = ?config.log_format,
        tracing_endpoint = config.tracing_endpoint.as_deref(),
        "Logging initialized"
    );

    Ok(())
}

/// Filter from `RUST_LOG` when it parses, otherwise from the configured level
fn build_env_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter> {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .map(Ok)
        .unwrap_or_else(|| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))
}

/// Initialize OpenTelemetry tracer with OTLP exporter
fn init_tracer(endpoint: &str) -> Result<opentelemetry_sdk::trace::Tracer> {
    use opentelemetry_sdk::runtime::Tokio;

    let exporter = opentelemetry_otlp::new_exporter()
        .tonic()
        .with_endpoint(endpoint)
        .build_span_exporter()
        .map_err(|e| anyhow::anyhow!("Failed to build span exporter: {}", e))?;

    let tracer_provider = TracerProvider::builder()
        .with_batch_exporter(exporter, Tokio)
        .with_config(
            opentelemetry_sdk::trace::Config::default()
                .with_sampler(Sampler::AlwaysOn)
                .with_id_generator(RandomIdGenerator::default())
                .with_resource(Resource::new(vec![
                    KeyValue::new("service.name", SERVICE_NAME),
                    KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
                ])),
        )
        .build();

    global::set_tracer_provider(tracer_provider.clone());

    Ok(tracer_provider.tracer(SERVICE_NAME))
}

/// Flush remaining spans on shutdown
pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
}

/// Install the Prometheus recorder and describe all relay metrics
///
/// The returned handle renders the exposition text for the `/metrics` route.
pub fn init_metrics() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {}", e))?;

    describe_counter!("feed_checks_total", "Feed checks by outcome");
    describe_counter!(
        "feed_fetch_failures_total",
        "Feed checks that failed to fetch or parse the feed"
    );
    describe_counter!(
        "notifications_sent_total",
        "Notifications accepted by the chat API"
    );
    describe_counter!(
        "notifications_failed_total",
        "Notifications that could not be delivered"
    );
    describe_gauge!(
        "feed_items_last_seen",
        "Number of items in the most recently fetched feed"
    );

    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}

#[inline]
pub fn record_check(outcome: &'static str) {
    counter!("feed_checks_total", "outcome" => outcome).increment(1);
}

#[inline]
pub fn record_fetch_failure() {
    counter!("feed_fetch_failures_total").increment(1);
}

#[inline]
pub fn record_notification_sent() {
    counter!("notifications_sent_total").increment(1);
}

#[inline]
pub fn record_notification_failed(reason: &'static str) {
    counter!("notifications_failed_total", "reason" => reason).increment(1);
}

#[inline]
pub fn update_items_last_seen(count: usize) {
    gauge!("feed_items_last_seen").set(count as f64);
}
