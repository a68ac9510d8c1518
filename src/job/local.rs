//! In-process map -> combine -> shuffle -> reduce over local files

use std::collections::{BTreeMap, HashMap};
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use fnv::FnvHasher;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, Instrument};

use crate::config::JobConfig;
use crate::error::{JobError, Result};
use crate::io::{self as job_io, InputSplit};
use crate::job::MapReduceJob;
use crate::metrics::core::TaskTimer;
use crate::metrics::job::{JobMetrics, TaskKind};
use crate::metrics::{CounterSink, JobCounter, JobCounters};
use crate::types::Count;

/// Reduce partition of a key
pub fn partition_for<K: Hash>(key: &K, reducers: usize) -> usize {
    let mut hasher = FnvHasher::default();
    key.hash(&mut hasher);
    (hasher.finish() % reducers.max(1) as u64) as usize
}

/// Outcome of a local run
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub input_files: usize,
    pub map_tasks: usize,
    pub reduce_tasks: usize,
    pub output_records: usize,
    pub part_files: Vec<PathBuf>,
    pub counters: BTreeMap<&'static str, u64>,
    pub duration_ms: u64,
}

/// Map-side output, already routed to reduce partitions
type Partitioned<K> = Vec<Vec<(K, Count)>>;

pub struct LocalRunner {
    config: JobConfig,
    counters: Arc<JobCounters>,
}

impl LocalRunner {
    pub fn new(config: JobConfig) -> Self {
        Self {
            config,
            counters: Arc::new(JobCounters::new()),
        }
    }

    pub fn counters(&self) -> Arc<JobCounters> {
        Arc::clone(&self.counters)
    }

    /// Run `job` over `input` (a file or directory) into the `output` directory
    pub async fn run<J>(&self, job: Arc<J>, input: &Path, output: &Path) -> Result<JobSummary>
    where
        J: MapReduceJob + 'static,
    {
        let span = info_span!("job", input = %input.display(), output = %output.display());
        self.run_inner(job, input, output).instrument(span).await
    }

    async fn run_inner<J>(&self, job: Arc<J>, input: &Path, output: &Path) -> Result<JobSummary>
    where
        J: MapReduceJob + 'static,
    {
        self.config.validate()?;
        let started = Instant::now();
        job_io::prepare_output_dir(output)?;
        let files = job_io::discover_inputs(input)?;
        info!(
            "Starting job: {} input file(s), {} reducer(s), combine={}",
            files.len(),
            self.config.reducers,
            self.config.combine
        );

        let mut splits = Vec::new();
        for file in &files {
            splits.extend(job_io::read_splits(file, self.config.split_lines)?);
        }
        let map_tasks = splits.len();

        let map_outputs = self.run_map_phase(Arc::clone(&job), splits).await?;
        let buckets = shuffle(map_outputs, self.config.reducers);
        let (part_files, output_records) =
            self.run_reduce_phase(job, buckets, output.to_path_buf()).await?;

        job_io::write_success_marker(output)?;

        let elapsed = started.elapsed();
        JobMetrics::record_run_success(elapsed.as_secs_f64());
        let summary = JobSummary {
            input_files: files.len(),
            map_tasks,
            reduce_tasks: self.config.reducers,
            output_records,
            part_files,
            counters: self.counters.snapshot(),
            duration_ms: elapsed.as_millis() as u64,
        };
        info!(
            "Job finished: maps={} reduces={} input_lines={} output_records={} parse_errors={} in {}ms",
            summary.map_tasks,
            summary.reduce_tasks,
            self.counters.get(JobCounter::InputLines),
            summary.output_records,
            self.counters.get(JobCounter::ParseErrors),
            summary.duration_ms
        );
        Ok(summary)
    }

    async fn run_map_phase<J>(
        &self,
        job: Arc<J>,
        splits: Vec<InputSplit>,
    ) -> Result<Vec<Partitioned<J::Key>>>
    where
        J: MapReduceJob + 'static,
    {
        let mut tasks = JoinSet::new();
        for (task_id, split) in splits.into_iter().enumerate() {
            let job = Arc::clone(&job);
            let counters = Arc::clone(&self.counters);
            let reducers = self.config.reducers;
            let combine = self.config.combine;
            tasks.spawn_blocking(move || {
                run_map_task(task_id, job.as_ref(), split, counters.as_ref(), reducers, combine)
            });
        }

        let mut outputs = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let output = joined.map_err(|e| JobError::Task(format!("map task: {}", e)))?;
            outputs.push(output);
        }
        Ok(outputs)
    }

    async fn run_reduce_phase<J>(
        &self,
        job: Arc<J>,
        buckets: Vec<Vec<(J::Key, Count)>>,
        output: PathBuf,
    ) -> Result<(Vec<PathBuf>, usize)>
    where
        J: MapReduceJob + 'static,
    {
        let mut tasks = JoinSet::new();
        for (partition, bucket) in buckets.into_iter().enumerate() {
            let job = Arc::clone(&job);
            let counters = Arc::clone(&self.counters);
            let output = output.clone();
            tasks.spawn_blocking(move || {
                run_reduce_task(partition, job.as_ref(), bucket, counters.as_ref(), &output)
            });
        }

        let mut parts = Vec::new();
        let mut records = 0;
        while let Some(joined) = tasks.join_next().await {
            let (path, written) =
                joined.map_err(|e| JobError::Task(format!("reduce task: {}", e)))??;
            parts.push(path);
            records += written;
        }
        parts.sort();
        Ok((parts, records))
    }
}

/// Map every line of a split, optionally combine per key, route to partitions
fn run_map_task<J: MapReduceJob>(
    task_id: usize,
    job: &J,
    split: InputSplit,
    counters: &dyn CounterSink,
    reducers: usize,
    combine: bool,
) -> Partitioned<J::Key> {
    let timer = TaskTimer::start(TaskKind::Map);
    let mut emitted = Vec::new();
    for line in &split.lines {
        emitted.extend(job.map(line, counters));
    }

    let records = if combine {
        let mut grouped: HashMap<J::Key, Vec<Count>> = HashMap::new();
        for (key, value) in emitted {
            grouped.entry(key).or_default().push(value);
        }
        let combined: Vec<(J::Key, Count)> = grouped
            .into_iter()
            .map(|(key, values)| {
                let merged = job.combine(&key, values);
                (key, merged)
            })
            .collect();
        counters.increment(JobCounter::CombineOutputRecords, combined.len() as u64);
        combined
    } else {
        emitted
    };

    let mut partitions: Partitioned<J::Key> = vec![Vec::new(); reducers];
    for (key, value) in records {
        partitions[partition_for(&key, reducers)].push((key, value));
    }

    debug!(
        "Map task {} done: file={} first_line={} lines={} in {:?}",
        task_id,
        split.file.display(),
        split.first_line,
        split.lines.len(),
        timer.finish()
    );
    partitions
}

/// Route every map output to its reduce partition
fn shuffle<K>(map_outputs: Vec<Partitioned<K>>, reducers: usize) -> Vec<Vec<(K, Count)>> {
    let mut buckets: Vec<Vec<(K, Count)>> = (0..reducers).map(|_| Vec::new()).collect();
    for output in map_outputs {
        for (partition, pairs) in output.into_iter().enumerate() {
            buckets[partition].extend(pairs);
        }
    }
    buckets
}

/// Group one partition by key in sorted order, reduce and write its part file
fn run_reduce_task<J: MapReduceJob>(
    partition: usize,
    job: &J,
    bucket: Vec<(J::Key, Count)>,
    counters: &dyn CounterSink,
    output: &Path,
) -> Result<(PathBuf, usize)> {
    let timer = TaskTimer::start(TaskKind::Reduce);
    let mut grouped: BTreeMap<J::Key, Vec<Count>> = BTreeMap::new();
    for (key, value) in bucket {
        grouped.entry(key).or_default().push(value);
    }

    let records: Vec<_> = grouped
        .into_iter()
        .map(|(key, values)| job.reduce(&key, values, counters))
        .collect();
    let path = job_io::write_part_file(output, partition, &records)?;

    debug!(
        "Reduce task {} wrote {} record(s) to {} in {:?}",
        partition,
        records.len(),
        path.display(),
        timer.finish()
    );
    Ok((path, records.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::WebLogJob;
    use crate::types::MetricKey;

    #[test]
    fn test_partition_is_stable_and_in_range() {
        let key = MetricKey::Action {
            action: "click".to_string(),
        };
        let first = partition_for(&key, 5);
        assert!(first < 5);
        for _ in 0..10 {
            assert_eq!(partition_for(&key, 5), first);
        }
        assert_eq!(partition_for(&key, 1), 0);
    }

    #[test]
    fn test_map_task_combines_within_split() {
        let job = WebLogJob::new();
        let counters = JobCounters::new();
        let line = r#"{"action":"click","page":"/","sessionId":"s1","timestamp":"2024-01-15T09:00:00"}"#;
        let split = InputSplit {
            file: PathBuf::from("mem"),
            first_line: 0,
            lines: vec![line.to_string(); 3],
        };

        let partitions = run_map_task(0, &job, split, &counters, 1, true);
        assert_eq!(partitions.len(), 1);
        assert_eq!(partitions[0].len(), 6);

        let action = partitions[0]
            .iter()
            .find(|(k, _)| matches!(k, MetricKey::Action { .. }))
            .unwrap();
        assert_eq!(action.1, 3);
        let session = partitions[0]
            .iter()
            .find(|(k, _)| matches!(k, MetricKey::Session { .. }))
            .unwrap();
        assert_eq!(session.1, 1);

        assert_eq!(counters.get(JobCounter::MapOutputRecords), 18);
        assert_eq!(counters.get(JobCounter::CombineOutputRecords), 6);
    }

    #[test]
    fn test_map_task_without_combine_keeps_units() {
        let job = WebLogJob::new();
        let split = InputSplit {
            file: PathBuf::from("mem"),
            first_line: 0,
            lines: vec![r#"{"action":"a"}"#.to_string(); 2],
        };
        let partitions = run_map_task(0, &job, split, &JobCounters::new(), 3, false);
        let total: usize = partitions.iter().map(Vec::len).sum();
        assert_eq!(partitions.len(), 3);
        assert_eq!(total, 12);
    }

    #[test]
    fn test_shuffle_merges_map_outputs_by_partition() {
        let a: Partitioned<&str> = vec![vec![("x", 1)], vec![("y", 2)]];
        let b: Partitioned<&str> = vec![vec![("x", 3)], vec![]];
        let buckets = shuffle(vec![a, b], 2);
        assert_eq!(buckets[0], vec![("x", 1), ("x", 3)]);
        assert_eq!(buckets[1], vec![("y", 2)]);
    }
}
