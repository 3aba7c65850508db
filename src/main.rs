use anyhow::{Context, Result};
use audit_relay::audit::sinks::FileSink;
use audit_relay::audit::{RecordFilter, RecordKind};
use audit_relay::monitoring::{init_logging, LogConfig};
use audit_relay::relay::{AuditRelay, RelayConfig};
use audit_relay::stream::StreamBatch;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "audit-relay",
    version,
    about = "Turns key-value table change streams into durable audit records",
    long_about = "Reads a batch of change notifications, derives one audit record per \
                  change and writes it to the configured sink. Configuration comes from \
                  the environment: `region` and `target_table` are required. Records go \
                  to the DynamoDB table `target_table` unless `AUDIT_SINK` says otherwise."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one stream event and print the batch report
    Process {
        /// Stream event JSON file (stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Stop starting new writes after this many milliseconds
        #[arg(long, env = "AUDIT_DEADLINE_MS")]
        deadline_ms: Option<u64>,
    },

    /// Query and verify a file sink
    Inspect {
        /// Audit JSONL file
        #[arg(short, long)]
        file: PathBuf,
        /// Only records for this item key
        #[arg(short, long)]
        key: Option<String>,
        /// Only records of this kind (insert or update)
        #[arg(long)]
        kind: Option<RecordKind>,
        /// Maximum number of records
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::from_env().context("Invalid logging configuration")?;
    init_logging(&log_config)?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { input, deadline_ms } => process(input, deadline_ms).await,
        Commands::Inspect {
            file,
            key,
            kind,
            limit,
        } => inspect(file, key, kind, limit).await,
        Commands::Config => {
            let config = RelayConfig::from_env().context("Invalid relay configuration")?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn process(input: Option<PathBuf>, deadline_ms: Option<u64>) -> Result<()> {
    // Config resolves before any input is read.
    let config = RelayConfig::from_env().context("Invalid relay configuration")?;
    let relay = AuditRelay::from_config(&config).await?;

    let json = match input {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };
    let batch = StreamBatch::from_json(&json).context("Failed to parse stream event")?;

    let report = match deadline_ms {
        Some(ms) => {
            let deadline = tokio::time::Instant::now() + Duration::from_millis(ms);
            relay.process_batch_until(&batch, deadline).await
        }
        None => relay.process_batch(&batch).await,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn inspect(
    file: PathBuf,
    key: Option<String>,
    kind: Option<RecordKind>,
    limit: Option<usize>,
) -> Result<()> {
    let sink = FileSink::from_path(file);

    let mut filter = RecordFilter::new();
    if let Some(key) = key {
        filter = filter.by_item_key(&key);
    }
    if let Some(kind) = kind {
        filter = filter.by_kind(kind);
    }
    if let Some(limit) = limit {
        filter = filter.with_limit(limit);
    }

    let stored = sink.read_all().await?;
    let mut shown = 0;
    let mut tampered = 0;
    for entry in stored
        .iter()
        .filter(|s| filter.matches(&s.record))
        .take(filter.limit.unwrap_or(usize::MAX))
    {
        let status = if entry.is_intact() {
            "ok"
        } else {
            tampered += 1;
            "CHECKSUM MISMATCH"
        };
        let record = &entry.record;
        println!(
            "{} {} {:<6} {} [{}]",
            record.modification_time.to_rfc3339(),
            record.id,
            record.kind().to_string(),
            record.item_key,
            status
        );
        shown += 1;
    }

    println!("{} records, {} failed verification", shown, tampered);
    if tampered > 0 {
        anyhow::bail!("{} records failed checksum verification", tampered);
    }
    Ok(())
}
