//! Job counters
//!
//! Observations made while mapping and reducing (records processed, parse
//! errors, distinct keys per category). Core components receive a
//! `&dyn CounterSink` and only ever increment it; reading totals is the
//! business of whoever drives the job.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::constants::COUNTER_GROUP;
use crate::metrics::phase_metric;

const COUNTER_COUNT: usize = 9;

/// Every counter the job reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum JobCounter {
    InputLines,
    LogsProcessed,
    ParseErrors,
    MapOutputRecords,
    CombineOutputRecords,
    ReduceOutputRecords,
    UniqueActions,
    UniquePages,
    UniqueSessions,
}

impl JobCounter {
    pub const ALL: [JobCounter; COUNTER_COUNT] = [
        JobCounter::InputLines,
        JobCounter::LogsProcessed,
        JobCounter::ParseErrors,
        JobCounter::MapOutputRecords,
        JobCounter::CombineOutputRecords,
        JobCounter::ReduceOutputRecords,
        JobCounter::UniqueActions,
        JobCounter::UniquePages,
        JobCounter::UniqueSessions,
    ];

    /// Hadoop-style counter name
    pub fn name(&self) -> &'static str {
        match self {
            JobCounter::InputLines => "INPUT_LINES",
            JobCounter::LogsProcessed => "LOGS_PROCESSED",
            JobCounter::ParseErrors => "PARSE_ERRORS",
            JobCounter::MapOutputRecords => "MAP_OUTPUT_RECORDS",
            JobCounter::CombineOutputRecords => "COMBINE_OUTPUT_RECORDS",
            JobCounter::ReduceOutputRecords => "REDUCE_OUTPUT_RECORDS",
            JobCounter::UniqueActions => "UNIQUE_ACTIONS",
            JobCounter::UniquePages => "UNIQUE_PAGES",
            JobCounter::UniqueSessions => "UNIQUE_SESSIONS",
        }
    }

    /// Name under which the counter is exported through the `metrics` facade
    pub fn metric_name(&self) -> &'static str {
        match self {
            JobCounter::InputLines => phase_metric!(counter, "job", "input_lines"),
            JobCounter::LogsProcessed => phase_metric!(counter, "job", "logs_processed"),
            JobCounter::ParseErrors => phase_metric!(counter, "job", "parse_errors"),
            JobCounter::MapOutputRecords => phase_metric!(counter, "job", "map_output_records"),
            JobCounter::CombineOutputRecords => {
                phase_metric!(counter, "job", "combine_output_records")
            }
            JobCounter::ReduceOutputRecords => {
                phase_metric!(counter, "job", "reduce_output_records")
            }
            JobCounter::UniqueActions => phase_metric!(counter, "job", "unique_actions"),
            JobCounter::UniquePages => phase_metric!(counter, "job", "unique_pages"),
            JobCounter::UniqueSessions => phase_metric!(counter, "job", "unique_sessions"),
        }
    }

    pub fn help(&self) -> &'static str {
        match self {
            JobCounter::InputLines => "Raw input lines handed to the mapper",
            JobCounter::LogsProcessed => "Log entries fanned out into metric keys",
            JobCounter::ParseErrors => "Input lines skipped because they were not valid JSON",
            JobCounter::MapOutputRecords => "Key/count pairs emitted by the mapper",
            JobCounter::CombineOutputRecords => "Key/count pairs left after map-side combining",
            JobCounter::ReduceOutputRecords => "Formatted result lines written",
            JobCounter::UniqueActions => "Distinct actions seen by the reducers",
            JobCounter::UniquePages => "Distinct pages seen by the reducers",
            JobCounter::UniqueSessions => "Distinct sessions seen by the reducers",
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Append-only observation accumulator
pub trait CounterSink: Send + Sync {
    fn increment(&self, counter: JobCounter, by: u64);

    /// Publish observations a sink has been holding back.
    ///
    /// Called once by a driver when a phase ends. Sinks that publish on
    /// every increment keep the default.
    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Discards every observation
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopCounters;

impl CounterSink for NoopCounters {
    fn increment(&self, _counter: JobCounter, _by: u64) {}
}

/// In-process totals, also forwarded to the `metrics` recorder
#[derive(Debug, Default)]
pub struct JobCounters {
    totals: [AtomicU64; COUNTER_COUNT],
}

impl JobCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, counter: JobCounter) -> u64 {
        self.totals[counter.index()].load(Ordering::Relaxed)
    }

    /// Current totals keyed by counter name
    pub fn snapshot(&self) -> BTreeMap<&'static str, u64> {
        JobCounter::ALL
            .iter()
            .map(|c| (c.name(), self.get(*c)))
            .collect()
    }
}

impl CounterSink for JobCounters {
    fn increment(&self, counter: JobCounter, by: u64) {
        if by == 0 {
            return;
        }
        self.totals[counter.index()].fetch_add(by, Ordering::Relaxed);
        ::metrics::counter!(counter.metric_name()).increment(by);
    }
}

/// Reports counters with the Hadoop Streaming stderr protocol:
/// `reporter:counter:<group>,<counter>,<amount>`
///
/// Increments only accumulate. `flush` writes one line per counter that grew
/// since the previous flush, so a task reports a handful of lines however
/// many records it handled.
pub struct ReporterCounters<W: Write + Send> {
    totals: JobCounters,
    reported: [AtomicU64; COUNTER_COUNT],
    writer: Mutex<W>,
}

impl<W: Write + Send> ReporterCounters<W> {
    pub fn new(writer: W) -> Self {
        Self {
            totals: JobCounters::new(),
            reported: Default::default(),
            writer: Mutex::new(writer),
        }
    }

    /// Totals accumulated so far, reported or not
    pub fn totals(&self) -> &JobCounters {
        &self.totals
    }

    pub fn into_inner(self) -> W {
        match self.writer.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> CounterSink for ReporterCounters<W> {
    fn increment(&self, counter: JobCounter, by: u64) {
        self.totals.increment(counter, by);
    }

    fn flush(&self) -> io::Result<()> {
        let mut writer = match self.writer.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };
        for counter in JobCounter::ALL {
            let total = self.totals.get(counter);
            let previous = self.reported[counter.index()].swap(total, Ordering::Relaxed);
            let delta = total.saturating_sub(previous);
            if delta > 0 {
                writeln!(
                    writer,
                    "reporter:counter:{},{},{}",
                    COUNTER_GROUP,
                    counter.name(),
                    delta
                )?;
            }
        }
        writer.flush()
    }
}
