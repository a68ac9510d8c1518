//! Fan-out of one log entry into its metric keys

use crate::metrics::{CounterSink, JobCounter};
use crate::types::{Count, LogEntry, MetricKey};

/// Unit contribution of a single entry to each of its keys
pub const UNIT: Count = 1;

/// Derives the six metric keys of an entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricEmitter;

impl MetricEmitter {
    pub fn new() -> Self {
        Self
    }

    /// One `(key, 1)` pair per category, in category order.
    ///
    /// Payloads are copied verbatim; values differing only by case are
    /// distinct keys.
    pub fn emit(&self, entry: &LogEntry, counters: &dyn CounterSink) -> [(MetricKey, Count); 6] {
        counters.increment(JobCounter::LogsProcessed, 1);
        [
            (
                MetricKey::Action {
                    action: entry.action.clone(),
                },
                UNIT,
            ),
            (
                MetricKey::Page {
                    page: entry.page.clone(),
                },
                UNIT,
            ),
            (
                MetricKey::Hour {
                    hour: entry.hour.clone(),
                },
                UNIT,
            ),
            (
                MetricKey::ActionPage {
                    action: entry.action.clone(),
                    page: entry.page.clone(),
                },
                UNIT,
            ),
            (
                MetricKey::Session {
                    session_id: entry.session_id.clone(),
                },
                UNIT,
            ),
            (
                MetricKey::HourAction {
                    hour: entry.hour.clone(),
                    action: entry.action.clone(),
                },
                UNIT,
            ),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::JobCounters;
    use crate::types::MetricCategory;

    fn entry() -> LogEntry {
        LogEntry {
            action: "Click".to_string(),
            page: "/home_page".to_string(),
            session_id: "abc".to_string(),
            timestamp: "2024-01-15T09:10:00".to_string(),
            hour: "09".to_string(),
        }
    }

    #[test]
    fn test_emits_one_key_per_category() {
        let counters = JobCounters::new();
        let pairs = MetricEmitter::new().emit(&entry(), &counters);

        let categories: Vec<MetricCategory> = pairs.iter().map(|(k, _)| k.category()).collect();
        assert_eq!(categories, MetricCategory::ALL.to_vec());
        assert!(pairs.iter().all(|(_, v)| *v == 1));
        assert_eq!(counters.get(JobCounter::LogsProcessed), 1);
    }

    #[test]
    fn test_payloads_are_verbatim() {
        let pairs = MetricEmitter::new().emit(&entry(), &JobCounters::new());
        assert_eq!(
            pairs[0].0,
            MetricKey::Action {
                action: "Click".to_string()
            }
        );
        assert_eq!(
            pairs[3].0,
            MetricKey::ActionPage {
                action: "Click".to_string(),
                page: "/home_page".to_string()
            }
        );
        assert_eq!(
            pairs[4].0,
            MetricKey::Session {
                session_id: "abc".to_string()
            }
        );
        assert_eq!(
            pairs[5].0,
            MetricKey::HourAction {
                hour: "09".to_string(),
                action: "Click".to_string()
            }
        );
    }

    #[test]
    fn test_case_is_significant() {
        let emitter = MetricEmitter::new();
        let counters = JobCounters::new();
        let mut lower = entry();
        lower.action = "click".to_string();

        let upper_keys = emitter.emit(&entry(), &counters);
        let lower_keys = emitter.emit(&lower, &counters);
        assert_ne!(upper_keys[0].0, lower_keys[0].0);
        assert_eq!(counters.get(JobCounter::LogsProcessed), 2);
    }
}
