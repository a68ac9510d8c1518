pub mod aggregator;
pub mod config;
pub mod constants;
pub mod emitter;
pub mod error;
pub mod formatter;
pub mod generator;
pub mod io;
pub mod job;
pub mod logging;
pub mod metrics;
pub mod parser;
pub mod types;

pub use aggregator::{merge, MergePolicy};
pub use emitter::MetricEmitter;
pub use error::{JobError, Result};
pub use formatter::format_key;
pub use job::local::{JobSummary, LocalRunner};
pub use job::{MapReduceJob, WebLogJob};
pub use parser::{JsonLineParser, Parser};
pub use types::{Count, LogEntry, MetricCategory, MetricKey, OutputRecord};
