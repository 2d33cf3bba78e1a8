use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::cache::metric_names::{
    METRIC_CACHE_BACKEND_ERROR_TOTAL, METRIC_CACHE_CLEAR_TOTAL, METRIC_CACHE_EVICT_TOTAL,
    METRIC_CACHE_HIT_TOTAL, METRIC_CACHE_INVALIDATED_TOTAL, METRIC_CACHE_MISS_TOTAL,
    METRIC_CACHE_STALE_FILL_TOTAL,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

/// Register descriptions for every cache counter with the installed recorder.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_CACHE_HIT_TOTAL,
            Unit::Count,
            "List requests answered from the response cache."
        );
        describe_counter!(
            METRIC_CACHE_MISS_TOTAL,
            Unit::Count,
            "List requests that had to query the store."
        );
        describe_counter!(
            METRIC_CACHE_INVALIDATED_TOTAL,
            Unit::Count,
            "Cache entries removed by tag invalidation."
        );
        describe_counter!(
            METRIC_CACHE_CLEAR_TOTAL,
            Unit::Count,
            "Full cache clears triggered by category writes."
        );
        describe_counter!(
            METRIC_CACHE_STALE_FILL_TOTAL,
            Unit::Count,
            "Populates skipped because an invalidation raced the store query."
        );
        describe_counter!(
            METRIC_CACHE_BACKEND_ERROR_TOTAL,
            Unit::Count,
            "Cache backend failures degraded to misses."
        );
        describe_counter!(
            METRIC_CACHE_EVICT_TOTAL,
            Unit::Count,
            "Entries evicted from the in-memory backend due to capacity."
        );
    });
}
