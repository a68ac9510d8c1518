//! Hadoop Streaming style adapter
//!
//! `map` reads raw log lines and writes `<key>\t<count>`, where `<key>` is
//! the JSON form of a [`MetricKey`]. `combine` and `reduce` read those lines
//! sorted by key and merge each run of equal keys. JSON escaping keeps tabs
//! and newlines out of the key, so the first tab always ends it.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{JobError, Result};
use crate::job::{MapReduceJob, WebLogJob};
use crate::metrics::CounterSink;
use crate::types::{Count, MetricKey};

/// Encode an intermediate pair as one line (without newline)
pub fn encode_pair(key: &MetricKey, count: Count) -> Result<String> {
    Ok(format!("{}\t{}", serde_json::to_string(key)?, count))
}

/// Decode an intermediate line; `line_no` is one-based and used in errors
pub fn decode_pair(line: &str, line_no: usize) -> Result<(MetricKey, Count)> {
    let (raw_key, raw_count) = line.split_once('\t').ok_or_else(|| JobError::Codec {
        line: line_no,
        message: "missing tab separator".to_string(),
    })?;
    let key = serde_json::from_str(raw_key).map_err(|e| JobError::Codec {
        line: line_no,
        message: format!("bad key: {}", e),
    })?;
    let count = raw_count.trim().parse().map_err(|e| JobError::Codec {
        line: line_no,
        message: format!("bad count '{}': {}", raw_count.trim(), e),
    })?;
    Ok((key, count))
}

/// Map every input line to encoded intermediate pairs
pub fn run_map<R, W>(job: &WebLogJob, input: R, mut output: W, counters: &dyn CounterSink) -> Result<u64>
where
    R: BufRead,
    W: Write,
{
    let mut written = 0;
    for line in input.lines() {
        let line = line?;
        for (key, count) in job.map(&line, counters) {
            writeln!(output, "{}", encode_pair(&key, count)?)?;
            written += 1;
        }
    }
    output.flush()?;
    counters.flush()?;
    debug!("Streaming map wrote {} pair(s)", written);
    Ok(written)
}

/// Merge runs of equal keys and re-emit them as intermediate pairs
pub fn run_combine<R, W>(job: &WebLogJob, input: R, mut output: W) -> Result<u64>
where
    R: BufRead,
    W: Write,
{
    let mut written = 0;
    for_each_group(input, |key, values| {
        let merged = job.combine(&key, values);
        writeln!(output, "{}", encode_pair(&key, merged)?)?;
        written += 1;
        Ok(())
    })?;
    output.flush()?;
    debug!("Streaming combine wrote {} pair(s)", written);
    Ok(written)
}

/// Merge runs of equal keys into formatted `label\tcount` lines
pub fn run_reduce<R, W>(
    job: &WebLogJob,
    input: R,
    mut output: W,
    counters: &dyn CounterSink,
) -> Result<u64>
where
    R: BufRead,
    W: Write,
{
    let mut written = 0;
    for_each_group(input, |key, values| {
        let record = job.reduce(&key, values, counters);
        writeln!(output, "{}", record)?;
        written += 1;
        Ok(())
    })?;
    output.flush()?;
    counters.flush()?;
    debug!("Streaming reduce wrote {} record(s)", written);
    Ok(written)
}

/// Call `f` once per run of consecutive equal keys.
///
/// Input is expected to be sorted; an unsorted stream splits a key into
/// several runs, each handled on its own.
fn for_each_group<R, F>(input: R, mut f: F) -> Result<()>
where
    R: BufRead,
    F: FnMut(MetricKey, Vec<Count>) -> Result<()>,
{
    let mut current: Option<(MetricKey, Vec<Count>)> = None;

    for (idx, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let (key, count) = decode_pair(&line, idx + 1)?;
        if let Some((cur_key, values)) = current.as_mut() {
            if *cur_key == key {
                values.push(count);
                continue;
            }
        }
        if let Some((done_key, values)) = current.replace((key, vec![count])) {
            f(done_key, values)?;
        }
    }

    if let Some((key, values)) = current {
        f(key, values)?;
    }
    Ok(())
}
