use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::Level;

use partition_reassign::config::ReassignConfig;
use partition_reassign::plan::{load_plan, write_plan};
use partition_reassign::{decompose, generate, reassign_with_config};

#[derive(Debug, Parser)]
#[command(name = "partition-reassign", version)]
#[command(about = "Plan and run Kafka partition reassignments in throttled batches")]
struct Cli {
    /// Enable debug logs.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print a batched plan that spreads leadership over the replica pool.
    Generate(GenerateArgs),
    /// Split a from/to plan into single-replica steps.
    Decompose(DecomposeArgs),
    /// Execute a plan batch by batch.
    Reassign(ReassignArgs),
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[arg(long)]
    topic: String,
    /// Partitions to place, e.g. `0,1,2`.
    #[arg(long, value_delimiter = ',', required_unless_present = "partition_count")]
    partitions: Vec<u32>,
    /// Place partitions `0..N` instead of an explicit list.
    #[arg(long, conflicts_with = "partitions")]
    partition_count: Option<u32>,
    /// Replica pool, e.g. `11,12,13`.
    #[arg(long, value_delimiter = ',', required = true)]
    replicas: Vec<i32>,
    /// Partitions per batch.
    #[arg(long, default_value_t = 1)]
    parallelism: usize,
}

#[derive(Debug, Args)]
struct DecomposeArgs {
    /// Plan whose assignments carry both `from` and `to`.
    plan: PathBuf,
    /// Index of the first batch that still needs migrating.
    #[arg(long, default_value_t = 0)]
    start_index: usize,
}

#[derive(Debug, Args)]
struct ReassignArgs {
    /// File containing the partition assignment plan.
    plan: PathBuf,
    /// Optional TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Root directory of the Kafka installation.
    #[arg(long)]
    kafka_home: Option<PathBuf>,
    /// ZooKeeper connection string. Read from the Kafka config file if not given.
    #[arg(long)]
    zookeeper: Option<String>,
    /// Replication throttles in B/s, e.g. `10000,20000`. If not given the
    /// throttle file is loaded before every batch.
    #[arg(long)]
    throttle: Option<String>,
    /// Seconds to wait between two completion checks.
    #[arg(long)]
    retry_after: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Generate(args) => {
            let partitions = match args.partition_count {
                Some(n) => (0..n).collect(),
                None => args.partitions,
            };
            let plan = generate(&args.topic, &partitions, &args.replicas, args.parallelism)?;
            write_plan(&plan, std::io::stdout().lock())?;
        }
        Commands::Decompose(args) => {
            let plan = load_plan(&args.plan)
                .with_context(|| format!("could not load {}", args.plan.display()))?;
            let steps = decompose(&plan, args.start_index)?;
            write_plan(&steps, std::io::stdout().lock())?;
        }
        Commands::Reassign(args) => {
            let mut config = ReassignConfig::load(args.config.as_deref())?;
            if let Some(kafka_home) = args.kafka_home {
                config.kafka_home = kafka_home;
            }
            if args.zookeeper.is_some() {
                config.zookeeper = args.zookeeper;
            }
            if args.throttle.is_some() {
                config.throttle = args.throttle;
            }
            if let Some(secs) = args.retry_after {
                config.retry_after_secs = secs;
            }

            let plan = load_plan(&args.plan)
                .with_context(|| format!("could not load {}", args.plan.display()))?;
            let label = args
                .plan
                .file_name()
                .map(|x| x.to_string_lossy().to_string())
                .unwrap_or_else(|| "reassignment".to_string());
            let summary = reassign_with_config(&config, &label, &plan).await?;
            tracing::info!(
                already_completed = summary.already_completed,
                migrated = summary.migrated,
                "done"
            );
        }
    }
    Ok(())
}
