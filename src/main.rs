use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use weblog_metrics::config::JobConfig;
use weblog_metrics::generator::{GeneratorOptions, LogGenerator};
use weblog_metrics::job::streaming;
use weblog_metrics::metrics::{self, ReporterCounters};
use weblog_metrics::{logging, LocalRunner, WebLogJob};

#[derive(Parser)]
#[command(name = "weblog_metrics")]
#[command(about = "Aggregate web-activity logs into per-dimension counts")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (default: ./weblog_metrics.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the whole job locally over a file or directory
    Run {
        input: PathBuf,
        /// Output directory; must not exist
        output: PathBuf,
        /// Number of reduce partitions
        #[arg(long)]
        reducers: Option<usize>,
        /// Maximum lines per map task
        #[arg(long)]
        split_lines: Option<usize>,
        /// Skip the map-side combine pass
        #[arg(long)]
        no_combine: bool,
        /// Print the job summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Streaming mapper: raw log lines on stdin, key/count pairs on stdout
    Map,
    /// Streaming combiner: sorted key/count pairs in, merged pairs out
    Combine,
    /// Streaming reducer: sorted key/count pairs in, labelled counts out
    Reduce,
    /// Write synthetic log lines
    Generate {
        #[arg(long, default_value_t = 100)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
        /// Records per line (arrays when greater than 1)
        #[arg(long, default_value_t = 1)]
        batch: usize,
        /// Size of the session id pool (0: one session per record)
        #[arg(long, default_value_t = 0)]
        sessions: usize,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the metric catalogue
    Metrics,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let mut config = JobConfig::load(cli.config.as_deref()).context("loading configuration")?;
    let _log_guard = logging::init_logging(config.log_dir.as_deref());
    metrics::init_metrics(config.metrics_addr);

    match cli.command {
        Commands::Run {
            input,
            output,
            reducers,
            split_lines,
            no_combine,
            json,
        } => {
            if let Some(r) = reducers {
                config.reducers = r;
            }
            if let Some(n) = split_lines {
                config.split_lines = n;
            }
            if no_combine {
                config.combine = false;
            }

            let runner = LocalRunner::new(config);
            match runner.run(Arc::new(WebLogJob::new()), &input, &output).await {
                Ok(summary) if json => {
                    println!("{}", serde_json::to_string_pretty(&summary)?);
                }
                Ok(summary) => {
                    println!("Job completed: {}", output.display());
                    println!("   Map tasks: {}", summary.map_tasks);
                    println!("   Reduce tasks: {}", summary.reduce_tasks);
                    println!("   Output records: {}", summary.output_records);
                    for (name, value) in &summary.counters {
                        println!("   {}: {}", name, value);
                    }
                }
                Err(e) => {
                    error!("Job failed: {}", e);
                    return Err(e).context("running job");
                }
            }
        }
        Commands::Map => {
            let counters = ReporterCounters::new(io::stderr());
            let written = streaming::run_map(
                &WebLogJob::new(),
                io::stdin().lock(),
                BufWriter::new(io::stdout().lock()),
                &counters,
            )
            .context("streaming map")?;
            info!("map emitted {} pair(s)", written);
        }
        Commands::Combine => {
            streaming::run_combine(
                &WebLogJob::new(),
                io::stdin().lock(),
                BufWriter::new(io::stdout().lock()),
            )
            .context("streaming combine")?;
        }
        Commands::Reduce => {
            let counters = ReporterCounters::new(io::stderr());
            streaming::run_reduce(
                &WebLogJob::new(),
                io::stdin().lock(),
                BufWriter::new(io::stdout().lock()),
                &counters,
            )
            .context("streaming reduce")?;
        }
        Commands::Generate {
            count,
            seed,
            batch,
            sessions,
            output,
        } => {
            let mut generator = LogGenerator::new(GeneratorOptions {
                count,
                seed,
                batch,
                sessions,
                ..GeneratorOptions::default()
            });
            let lines = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("creating {}", path.display()))?;
                    generator.write_to(BufWriter::new(file))?
                }
                None => generator.write_to(BufWriter::new(io::stdout().lock()))?,
            };
            info!("generated {} record(s) on {} line(s)", count, lines);
        }
        Commands::Metrics => {
            for line in metrics::registry::catalogue() {
                println!("{}", line);
            }
        }
    }
    Ok(())
}
