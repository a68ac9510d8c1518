//! Synthetic web-activity logs, shaped like the collection front-end's output

use std::io::Write;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

use crate::error::{JobError, Result};

const ACTIONS: &[&str] = &[
    "page_view",
    "button_click",
    "form_submit",
    "scroll",
    "hover",
    "search",
    "download",
];

const PAGES: &[&str] = &["/", "/products", "/about", "/contact", "/cart", "/checkout"];

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64)",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_0)",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X)",
];

/// 2024-01-15T00:00:00Z
const DEFAULT_BASE_EPOCH_SECS: i64 = 1_705_276_800;
const SECONDS_PER_DAY: i64 = 86_400;

#[derive(Debug, Clone)]
pub struct GeneratorOptions {
    pub count: usize,
    /// Fixed seed for reproducible output; random when unset
    pub seed: Option<u64>,
    /// Records per line; 1 writes bare objects, more writes JSON arrays
    pub batch: usize,
    /// Size of the session id pool; 0 gives every record its own session
    pub sessions: usize,
    /// Start of the day the timestamps fall in, as Unix seconds
    pub base_epoch_secs: i64,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            count: 100,
            seed: None,
            batch: 1,
            sessions: 0,
            base_epoch_secs: DEFAULT_BASE_EPOCH_SECS,
        }
    }
}

pub struct LogGenerator {
    rng: StdRng,
    options: GeneratorOptions,
    session_pool: Vec<String>,
}

impl LogGenerator {
    pub fn new(options: GeneratorOptions) -> Self {
        let mut rng = match options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session_pool = (0..options.sessions)
            .map(|_| random_uuid(&mut rng))
            .collect();
        Self {
            rng,
            options,
            session_pool,
        }
    }

    /// One synthetic log record
    pub fn next_record(&mut self) -> Result<Value> {
        let offset = self.rng.gen_range(0..SECONDS_PER_DAY);
        let timestamp = DateTime::<Utc>::from_timestamp(self.options.base_epoch_secs + offset, 0)
            .ok_or_else(|| {
                JobError::Config(format!(
                    "base time {} is out of range",
                    self.options.base_epoch_secs
                ))
            })?
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let session_id = match self.session_pool.choose(&mut self.rng) {
            Some(id) => id.clone(),
            None => random_uuid(&mut self.rng),
        };

        Ok(json!({
            "timestamp": timestamp,
            "sessionId": session_id,
            "action": pick(&mut self.rng, ACTIONS),
            "userAgent": pick(&mut self.rng, USER_AGENTS),
            "ip": format!("10.0.{}.{}", self.rng.gen_range(0..=255), self.rng.gen_range(1..=254)),
            "page": pick(&mut self.rng, PAGES),
            "duration": self.rng.gen_range(0..5000),
            "metadata": { "testData": true },
        }))
    }

    /// Write `count` records, `batch` per line. Returns the lines written.
    pub fn write_to<W: Write>(&mut self, mut out: W) -> Result<usize> {
        let batch = self.options.batch.max(1);
        let mut remaining = self.options.count;
        let mut lines = 0;

        while remaining > 0 {
            let take = remaining.min(batch);
            if batch == 1 {
                let record = self.next_record()?;
                writeln!(out, "{}", serde_json::to_string(&record)?)?;
            } else {
                let records = (0..take)
                    .map(|_| self.next_record())
                    .collect::<Result<Vec<_>>>()?;
                writeln!(out, "{}", serde_json::to_string(&records)?)?;
            }
            remaining -= take;
            lines += 1;
        }
        out.flush()?;
        Ok(lines)
    }
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn random_uuid(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.gen()).into_uuid().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{MapReduceJob, WebLogJob};
    use crate::metrics::{JobCounter, JobCounters};
    use uuid::Uuid;

    fn options(count: usize, batch: usize) -> GeneratorOptions {
        GeneratorOptions {
            count,
            seed: Some(7),
            batch,
            ..GeneratorOptions::default()
        }
    }

    #[test]
    fn test_seeded_output_is_reproducible() {
        let mut a = Vec::new();
        let mut b = Vec::new();
        LogGenerator::new(options(20, 1)).write_to(&mut a).unwrap();
        LogGenerator::new(options(20, 1)).write_to(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_batches_become_arrays() {
        let mut out = Vec::new();
        let lines = LogGenerator::new(options(10, 4)).write_to(&mut out).unwrap();
        assert_eq!(lines, 3);

        let text = String::from_utf8(out).unwrap();
        let sizes: Vec<usize> = text
            .lines()
            .map(|l| serde_json::from_str::<Vec<Value>>(l).unwrap().len())
            .collect();
        assert_eq!(sizes, vec![4, 4, 2]);
    }

    #[test]
    fn test_records_parse_with_known_hour() {
        let mut out = Vec::new();
        LogGenerator::new(options(25, 5)).write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let job = WebLogJob::new();
        let counters = JobCounters::new();
        for line in text.lines() {
            for (key, _) in job.map(line, &counters) {
                if let crate::types::MetricKey::Hour { hour } = key {
                    assert_ne!(hour, "unknown");
                    assert_eq!(hour.len(), 2);
                }
            }
        }
        assert_eq!(counters.get(JobCounter::LogsProcessed), 25);
        assert_eq!(counters.get(JobCounter::ParseErrors), 0);
    }

    #[test]
    fn test_session_pool_limits_distinct_sessions() {
        let mut generator = LogGenerator::new(GeneratorOptions {
            count: 50,
            seed: Some(1),
            sessions: 3,
            ..GeneratorOptions::default()
        });
        let mut ids = std::collections::HashSet::new();
        for _ in 0..50 {
            let record = generator.next_record().unwrap();
            ids.insert(record["sessionId"].as_str().unwrap().to_string());
        }
        assert!(ids.len() <= 3);
        assert!(Uuid::parse_str(ids.iter().next().unwrap()).is_ok());
    }
}
