//! Logging and metrics setup, plus a rolling anomaly detector used to flag
//! unusual rates (e.g. DLQ growth, rate-limit rejections) for operational
//! alerting — never to gate an authorization decision.

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::subscriber::set_global_default;
use tracing_subscriber::{layer::SubscriberExt, Registry};

pub mod anomalies;

pub use anomalies::AnomalyDetector;

/// Installs the JSON-structured tracing subscriber and the Prometheus
/// metrics recorder. Call once at process startup.
pub fn init_telemetry() -> anyhow::Result<()> {
    let subscriber = Registry::default().with(tracing_subscriber::fmt::layer().json());
    set_global_default(subscriber).map_err(|e| anyhow::anyhow!(e))?;

    let builder = PrometheusBuilder::new();
    builder.install().map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}
