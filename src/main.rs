use clap::{Parser, Subcommand};
use review_queue_forecaster::analytics::{build_insights, build_report, ReportParams};
use review_queue_forecaster::config::Config;
use review_queue_forecaster::history::{resolve_dsn, PgRunStore, RunContext, RunStore};
use review_queue_forecaster::{ingest, output};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "review-queue-forecaster")]
#[command(version)]
#[command(about = "Latency, trend, and backlog-clearance analytics for review workflows")]
#[command(after_help = "CSV columns required: application_id, stage, submitted_at, reviewed_at, reviewer_id\n\
Date formats accepted: RFC 3339, YYYY-MM-DD, YYYY-MM-DD HH:MM:SS")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a report from review events and an optional queue snapshot
    Report {
        /// Path to the review events CSV
        #[arg(short, long, default_value = "data/sample-events.csv")]
        input: String,

        /// Path to the pending queue CSV
        #[arg(short, long)]
        queue: Option<String>,

        /// SLA threshold in days
        #[arg(long)]
        sla_days: Option<i64>,

        /// Window in days for throughput metrics
        #[arg(long)]
        throughput_days: Option<i64>,

        /// As-of instant for windowing (defaults to the latest reviewed_at)
        #[arg(long)]
        as_of: Option<String>,

        /// Fraction of SLA days considered due soon
        #[arg(long)]
        due_soon_ratio: Option<f64>,

        /// Emit JSON instead of console text
        #[arg(long)]
        json: bool,

        /// Write CSV summaries using this path prefix or directory
        #[arg(long)]
        csv_out: Option<String>,

        /// Top reviewers to show by throughput
        #[arg(long)]
        reviewer_top: Option<usize>,

        /// Persist this run to the history store
        #[arg(long)]
        save: bool,

        /// Postgres connection string for the history store
        #[arg(long, env = "RQF_DATABASE_URL")]
        db_url: Option<String>,

        /// Schema holding the run-history table
        #[arg(long)]
        db_schema: Option<String>,
    },

    /// List recently persisted runs, newest first
    History {
        /// Runs to list
        #[arg(short, long, default_value_t = 5)]
        limit: i64,

        /// Postgres connection string
        #[arg(long, env = "RQF_DATABASE_URL")]
        db_url: Option<String>,

        /// Schema holding the run-history table
        #[arg(long)]
        db_schema: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "review_queue_forecaster=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!("failed to load configuration: {err}; using defaults");
        Config::default()
    });

    let cli = Cli::parse();
    match cli.command {
        Commands::Report {
            input,
            queue,
            sla_days,
            throughput_days,
            as_of,
            due_soon_ratio,
            json,
            csv_out,
            reviewer_top,
            save,
            db_url,
            db_schema,
        } => {
            run_report(ReportArgs {
                config,
                input,
                queue,
                sla_days,
                throughput_days,
                as_of,
                due_soon_ratio,
                json,
                csv_out,
                reviewer_top,
                save,
                db_url,
                db_schema,
            })
            .await
        }
        Commands::History {
            limit,
            db_url,
            db_schema,
        } => run_history(config, limit, db_url, db_schema).await,
    }
}

struct ReportArgs {
    config: Config,
    input: String,
    queue: Option<String>,
    sla_days: Option<i64>,
    throughput_days: Option<i64>,
    as_of: Option<String>,
    due_soon_ratio: Option<f64>,
    json: bool,
    csv_out: Option<String>,
    reviewer_top: Option<usize>,
    save: bool,
    db_url: Option<String>,
    db_schema: Option<String>,
}

async fn run_report(args: ReportArgs) -> anyhow::Result<()> {
    let events = ingest::load_events(&args.input)?;
    tracing::info!(count = events.len(), input = %args.input, "loaded events");

    let queue_items = match args.queue.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => {
            let items = ingest::load_queue(path)?;
            tracing::info!(count = items.len(), queue = %path, "loaded queue snapshot");
            items
        }
        _ => Vec::new(),
    };

    let as_of = args
        .as_of
        .as_deref()
        .map(|raw| {
            ingest::parse_timestamp(raw)
                .map_err(|err| anyhow::anyhow!("invalid --as-of value: {err}"))
        })
        .transpose()?;

    let params = ReportParams {
        sla_days: args.sla_days.unwrap_or(args.config.report.sla_days),
        throughput_window_days: args
            .throughput_days
            .unwrap_or(args.config.report.throughput_window_days),
        as_of,
        due_soon_ratio: args
            .due_soon_ratio
            .unwrap_or(args.config.report.due_soon_ratio),
    };

    let report = build_report(&events, &queue_items, &params)?;

    if let Some(csv_out) = args.csv_out.as_deref().map(str::trim) {
        if !csv_out.is_empty() {
            output::write_csv_reports(&report, csv_out).await?;
            tracing::info!(base = %csv_out, "wrote csv summaries");
        }
    }

    if args.save {
        let dsn = resolve_dsn(args.db_url.as_deref(), args.config.database.url.as_deref())?;
        let schema = args
            .db_schema
            .unwrap_or_else(|| args.config.database.schema.clone());
        let store = PgRunStore::connect(&dsn, &schema).await?;
        let ctx = RunContext {
            input_path: args.input.clone(),
            queue_path: args.queue.clone(),
            sla_days: params.sla_days,
            throughput_days: params.throughput_window_days,
        };
        let run_id = store.save(&report, &ctx).await?;
        tracing::info!(run_id, "run persisted");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let insights = build_insights(&report);
        output::print_report(
            &report,
            &insights,
            args.reviewer_top.unwrap_or(args.config.report.reviewer_top),
        );
    }
    Ok(())
}

async fn run_history(
    config: Config,
    limit: i64,
    db_url: Option<String>,
    db_schema: Option<String>,
) -> anyhow::Result<()> {
    let dsn = resolve_dsn(db_url.as_deref(), config.database.url.as_deref())?;
    let schema = db_schema.unwrap_or_else(|| config.database.schema.clone());
    let store = PgRunStore::connect(&dsn, &schema).await?;

    if store.seed_if_empty().await? {
        tracing::info!("seeded run history with a sample run");
    }

    let runs = store.recent(limit).await?;
    println!("Run History (latest {})", runs.len());
    for run in runs {
        println!(
            "- #{} | created {} | generated {} | events {} | sla {}d | window {}d",
            run.id,
            run.created_at.to_rfc3339(),
            run.generated_at.to_rfc3339(),
            run.total_events,
            run.sla_days,
            run.throughput_days,
        );
        if let (Some(pending), Some(assigned), Some(overdue)) =
            (run.queue_pending, run.queue_assigned, run.queue_overdue)
        {
            println!(
                "  queue: {pending} pending | {assigned} assigned | {overdue} overdue"
            );
        }
    }
    Ok(())
}
