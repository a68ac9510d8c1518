//! The three extension points a map/combine/reduce runtime calls into,
//! and their implementation for web-activity logs.

pub mod local;
pub mod streaming;

use std::hash::Hash;

use crate::aggregator::merge;
use crate::emitter::MetricEmitter;
use crate::formatter::format_key;
use crate::metrics::{CounterSink, JobCounter};
use crate::parser::{JsonLineParser, Parser};
use crate::types::{Count, MetricCategory, MetricKey, OutputRecord};

/// A job as seen by a partitioned batch runtime.
///
/// `combine` may run zero or more times on any subset of a key's values
/// before `reduce` sees all of them, so both must agree however the values
/// were grouped.
pub trait MapReduceJob: Send + Sync {
    type Key: Clone + Ord + Hash + Send + 'static;

    fn map(&self, line: &str, counters: &dyn CounterSink) -> Vec<(Self::Key, Count)>;

    fn combine(&self, key: &Self::Key, values: Vec<Count>) -> Count;

    fn reduce(&self, key: &Self::Key, values: Vec<Count>, counters: &dyn CounterSink)
        -> OutputRecord;
}

/// Parse, fan out, merge and format web-activity logs
#[derive(Debug, Default, Clone, Copy)]
pub struct WebLogJob {
    parser: JsonLineParser,
    emitter: MetricEmitter,
}

impl WebLogJob {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MapReduceJob for WebLogJob {
    type Key = MetricKey;

    fn map(&self, line: &str, counters: &dyn CounterSink) -> Vec<(MetricKey, Count)> {
        counters.increment(JobCounter::InputLines, 1);
        let out: Vec<(MetricKey, Count)> = self
            .parser
            .parse(line, counters)
            .iter()
            .flat_map(|entry| self.emitter.emit(entry, counters))
            .collect();
        counters.increment(JobCounter::MapOutputRecords, out.len() as u64);
        out
    }

    fn combine(&self, key: &MetricKey, values: Vec<Count>) -> Count {
        merge(key, values)
    }

    fn reduce(&self, key: &MetricKey, values: Vec<Count>, counters: &dyn CounterSink) -> OutputRecord {
        let count = merge(key, values);

        let distinct = match key.category() {
            MetricCategory::Action => Some(JobCounter::UniqueActions),
            MetricCategory::Page => Some(JobCounter::UniquePages),
            MetricCategory::Session => Some(JobCounter::UniqueSessions),
            _ => None,
        };
        if let Some(counter) = distinct {
            counters.increment(counter, 1);
        }
        counters.increment(JobCounter::ReduceOutputRecords, 1);

        OutputRecord::new(format_key(key, count), count)
    }
}
