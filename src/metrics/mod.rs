//! Metrics infrastructure for the log aggregation job
//!
//! Counters are incremented through the injected [`CounterSink`]; this module
//! owns naming, registration and the optional Prometheus exporter.

pub mod core;
pub mod counters;
pub mod job;
pub mod registry;

pub use counters::{CounterSink, JobCounter, JobCounters, NoopCounters, ReporterCounters};
pub use job::JobMetrics;

use std::net::SocketAddr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Initialize the global metrics infrastructure
///
/// Idempotent. Installs a Prometheus recorder with an HTTP listener when an
/// address is given; without one, the `metrics` macros stay no-ops. All
/// phase metrics are registered either way so the catalogue is validated.
pub fn init_metrics(addr: Option<SocketAddr>) {
    INIT.call_once(|| {
        if let Some(addr) = addr {
            let builder =
                metrics_exporter_prometheus::PrometheusBuilder::new().with_http_listener(addr);
            match builder.install() {
                Ok(()) => {
                    info!("Prometheus HTTP exporter started at http://{}/metrics", addr);
                }
                Err(e) => {
                    warn!("Failed to install Prometheus exporter on {}: {}", addr, e);
                }
            }
        }

        registry::register_all_metrics();
    });
}

/// Trait for phase-specific metrics collections
///
/// Each phase provides registration at startup, a phase name used as the
/// metric prefix, and documentation for everything it records.
pub trait PhaseMetrics {
    fn register_metrics();

    fn phase_name() -> &'static str;

    fn metrics_documentation() -> Vec<MetricDoc>;
}

/// Documentation for a single metric
#[derive(Debug, Clone)]
pub struct MetricDoc {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub help: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Histogram,
}

/// Builds metric names following the convention
/// `weblog_{phase}_{metric_name}[_total]`
macro_rules! phase_metric {
    (counter, $phase:literal, $name:literal) => {
        concat!("weblog_", $phase, "_", $name, "_total")
    };
    (histogram, $phase:literal, $name:literal) => {
        concat!("weblog_", $phase, "_", $name)
    };
}

pub(crate) use phase_metric;
