use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use ferrous_analytics_domain::{CliOverrides, Granularity, OutcomeRecord, ReportFilter};
use tracing::info;

mod bootstrap;
mod commands;
mod di;
mod time_args;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(name = "ferrous-analytics")]
#[command(version)]
#[command(about = "Ferrous Analytics - time-windowed request outcome reports")]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Database path
    #[arg(long, global = true)]
    database: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Seconds between aggregation sweeps
    #[arg(long)]
    aggregation_interval: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the aggregation and cache maintenance jobs until Ctrl-C
    Serve,
    /// Run a single aggregation sweep and exit
    Aggregate,
    /// Print a time-bucketed report as JSON
    Report {
        #[command(flatten)]
        window: WindowArgs,

        /// Bucket width: hour, day or month
        #[arg(short, long, default_value = "hour")]
        granularity: Granularity,

        /// Equality predicates, e.g. `client=alice,path=/api`
        #[arg(short, long, default_value = "")]
        filter: ReportFilter,
    },
    /// Print the dashboard overview as JSON
    Overview {
        #[command(flatten)]
        window: WindowArgs,
    },
    /// Store one request outcome
    Record(RecordArgs),
    /// Print one page of raw outcome records as JSON
    Records {
        #[command(flatten)]
        window: WindowArgs,

        #[arg(short, long, default_value = "")]
        filter: ReportFilter,

        #[arg(short, long, default_value_t = 50)]
        limit: u32,

        /// Id of the last record of the previous page
        #[arg(long)]
        cursor: Option<i64>,
    },
}

#[derive(Args)]
struct RecordArgs {
    /// Request path
    #[arg(long)]
    path: String,

    /// Client identifier
    #[arg(long)]
    client: String,

    /// HTTP status code; omit for requests that got no response
    #[arg(long)]
    status: Option<u16>,

    #[arg(long)]
    latency_ms: Option<u64>,

    /// Node that served the request
    #[arg(long)]
    node: Option<String>,

    /// Error message for failed requests
    #[arg(long)]
    error: Option<String>,

    /// When the request happened, defaults to now
    #[arg(long, value_parser = time_args::parse_instant)]
    at: Option<DateTime<Utc>>,
}

impl RecordArgs {
    fn into_record(self) -> OutcomeRecord {
        let mut record = OutcomeRecord::new(
            self.at.unwrap_or_else(Utc::now),
            &self.path,
            &self.client,
            self.status,
        );
        if let Some(node) = self.node.as_deref() {
            record = record.with_node(node);
        }
        if let Some(latency_ms) = self.latency_ms {
            record = record.with_latency(latency_ms);
        }
        if let Some(message) = self.error.as_deref() {
            record = record.with_error(message);
        }
        record
    }
}

#[derive(Args)]
struct WindowArgs {
    /// Window start (RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`)
    #[arg(long, value_parser = time_args::parse_instant)]
    from: Option<DateTime<Utc>>,

    /// Window end, defaults to now
    #[arg(long, value_parser = time_args::parse_instant)]
    to: Option<DateTime<Utc>>,

    /// Window length in hours when `--from` is not given
    #[arg(long, default_value_t = 24)]
    hours: i64,
}

impl WindowArgs {
    fn resolve(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        time_args::resolve_window(self.from, self.to, self.hours, Utc::now())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let cli_overrides = CliOverrides {
        database_path: cli.database.clone(),
        log_level: cli.log_level.clone(),
        log_json: cli.log_json.then_some(true),
        aggregation_interval_secs: cli.aggregation_interval,
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;

    bootstrap::init_logging(&config.logging);

    info!("Starting Ferrous Analytics v{}", env!("CARGO_PKG_VERSION"));

    let (write_pool, read_pool) = bootstrap::init_database(&config.database).await?;

    let repos = di::Repositories::new(write_pool, read_pool, &config.database);
    let use_cases = di::UseCases::new(&repos, &config.analytics);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => commands::serve(&config, &use_cases).await,
        Command::Aggregate => commands::aggregate(&use_cases).await,
        Command::Report {
            window,
            granularity,
            filter,
        } => {
            let (from, to) = window.resolve();
            commands::report(&use_cases, from, to, granularity, &filter).await
        }
        Command::Overview { window } => {
            let (from, to) = window.resolve();
            commands::overview(&use_cases, from, to).await
        }
        Command::Record(args) => commands::record(&repos, &use_cases, args.into_record()).await,
        Command::Records {
            window,
            filter,
            limit,
            cursor,
        } => {
            let (from, to) = window.resolve();
            commands::records(&use_cases, from, to, &filter, limit, cursor).await
        }
    }
}
