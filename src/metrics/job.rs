//! Job phase metrics
//!
//! Counter totals come from [`JobCounter`]; this adds the task timing
//! histograms recorded by the local runner.

use crate::metrics::counters::JobCounter;
use crate::metrics::{phase_metric, MetricDoc, MetricType, PhaseMetrics};

pub struct JobMetrics;

/// Which side of the shuffle a task ran on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Map,
    Reduce,
}

impl JobMetrics {
    /// Record a finished task and how long it took
    pub fn record_task_finished(kind: TaskKind, duration_secs: f64) {
        match kind {
            TaskKind::Map => {
                ::metrics::counter!(phase_metric!(counter, "job", "map_tasks")).increment(1);
                ::metrics::histogram!(phase_metric!(histogram, "job", "map_task_duration_seconds"))
                    .record(duration_secs);
            }
            TaskKind::Reduce => {
                ::metrics::counter!(phase_metric!(counter, "job", "reduce_tasks")).increment(1);
                ::metrics::histogram!(phase_metric!(
                    histogram,
                    "job",
                    "reduce_task_duration_seconds"
                ))
                .record(duration_secs);
            }
        }
    }

    /// Record a completed run
    pub fn record_run_success(duration_secs: f64) {
        ::metrics::counter!(phase_metric!(counter, "job", "runs")).increment(1);
        ::metrics::histogram!(phase_metric!(histogram, "job", "run_duration_seconds"))
            .record(duration_secs);
    }
}

impl PhaseMetrics for JobMetrics {
    fn register_metrics() {
        use ::metrics::{counter, describe_counter, describe_histogram, histogram};

        for doc in Self::metrics_documentation() {
            match doc.metric_type {
                MetricType::Counter => {
                    let _ = counter!(doc.name);
                    describe_counter!(doc.name, doc.help);
                }
                MetricType::Histogram => {
                    let _ = histogram!(doc.name);
                    describe_histogram!(doc.name, doc.help);
                }
            }
        }
    }

    fn phase_name() -> &'static str {
        "job"
    }

    fn metrics_documentation() -> Vec<MetricDoc> {
        let mut docs: Vec<MetricDoc> = JobCounter::ALL
            .iter()
            .map(|c| MetricDoc {
                name: c.metric_name(),
                metric_type: MetricType::Counter,
                help: c.help(),
            })
            .collect();

        docs.extend([
            MetricDoc {
                name: phase_metric!(counter, "job", "map_tasks"),
                metric_type: MetricType::Counter,
                help: "Map tasks completed",
            },
            MetricDoc {
                name: phase_metric!(counter, "job", "reduce_tasks"),
                metric_type: MetricType::Counter,
                help: "Reduce tasks completed",
            },
            MetricDoc {
                name: phase_metric!(counter, "job", "runs"),
                metric_type: MetricType::Counter,
                help: "Local runs completed successfully",
            },
            MetricDoc {
                name: phase_metric!(histogram, "job", "map_task_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of one map task in seconds",
            },
            MetricDoc {
                name: phase_metric!(histogram, "job", "reduce_task_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of one reduce task in seconds",
            },
            MetricDoc {
                name: phase_metric!(histogram, "job", "run_duration_seconds"),
                metric_type: MetricType::Histogram,
                help: "Wall time of a full local run in seconds",
            },
        ]);
        docs
    }
}
