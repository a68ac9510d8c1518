//! Metrics registry
//!
//! Registers every phase's metrics and detects naming conflicts early.

use crate::metrics::{MetricDoc, PhaseMetrics};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Register all metrics from all phases
pub fn register_all_metrics() -> HashMap<String, MetricDoc> {
    let mut all_metrics = HashMap::new();

    register_phase_metrics::<super::job::JobMetrics>(&mut all_metrics);

    info!("Registered {} total metrics", all_metrics.len());

    if std::env::var("WEBLOG_METRICS_DEBUG").is_ok() {
        log_metrics_summary(&all_metrics);
    }
    all_metrics
}

/// Register metrics for a specific phase and detect conflicts
fn register_phase_metrics<T: PhaseMetrics>(all_metrics: &mut HashMap<String, MetricDoc>) {
    T::register_metrics();
    let phase_docs = T::metrics_documentation();
    let phase_name = T::phase_name();

    debug!(
        "Registering {} metrics for phase '{}'",
        phase_docs.len(),
        phase_name
    );

    for doc in phase_docs {
        if all_metrics.contains_key(doc.name) {
            warn!(
                "Metric name conflict detected: '{}' registered twice (phase '{}')",
                doc.name, phase_name
            );
        } else {
            all_metrics.insert(doc.name.to_string(), doc);
        }
    }
}

/// Sorted catalogue lines: `name (type): help`
pub fn catalogue() -> Vec<String> {
    let mut docs: Vec<MetricDoc> = register_all_metrics().into_values().collect();
    docs.sort_by_key(|d| d.name);
    docs.into_iter()
        .map(|d| format!("{} ({:?}): {}", d.name, d.metric_type, d.help))
        .collect()
}

fn log_metrics_summary(all_metrics: &HashMap<String, MetricDoc>) {
    info!("=== Metrics Registry Summary ===");

    let mut by_phase: HashMap<&str, Vec<&MetricDoc>> = HashMap::new();
    for doc in all_metrics.values() {
        by_phase
            .entry(extract_phase_from_metric_name(doc.name))
            .or_default()
            .push(doc);
    }

    for (phase, metrics) in by_phase {
        info!("Phase '{}': {} metrics", phase, metrics.len());
        for metric in metrics {
            info!("  - {} ({:?}): {}", metric.name, metric.metric_type, metric.help);
        }
    }

    info!("=== End Metrics Summary ===");
}

/// Extract phase name from metric name (e.g., "weblog_job_runs_total" -> "job")
fn extract_phase_from_metric_name(metric_name: &str) -> &str {
    if let Some(stripped) = metric_name.strip_prefix("weblog_") {
        if let Some(next_underscore) = stripped.find('_') {
            return &stripped[..next_underscore];
        }
    }
    "unknown"
}
