use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

pub const DECKS_MATERIALIZED_TOTAL: &str = "taskdeck_decks_materialized_total";
pub const ARTIFACTS_WRITTEN_TOTAL: &str = "taskdeck_artifacts_written_total";
pub const ARTIFACT_WRITE_FAILURES_TOTAL: &str = "taskdeck_artifact_write_failures_total";

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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            DECKS_MATERIALIZED_TOTAL,
            Unit::Count,
            "Total number of deck bundles materialized."
        );
        describe_counter!(
            ARTIFACTS_WRITTEN_TOTAL,
            Unit::Count,
            "Total number of per-deck HTML artifacts written."
        );
        describe_counter!(
            ARTIFACT_WRITE_FAILURES_TOTAL,
            Unit::Count,
            "Total number of per-deck HTML artifacts that could not be written."
        );
    });
}
