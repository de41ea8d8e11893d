mod decay;
mod fetch;
mod filter;
mod kurs;
mod kurs_bi;
mod kurs_pajak;
mod models;
mod ngram;
mod orchestrator;
mod render;
mod score;
mod select;
mod sources;
mod stats;
mod text;
mod topics;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

use filter::ItemFilter;
use orchestrator::{run, run_kurs, KursSource, RunOptions};
use sources::{builtin_sources, load_sources, FeedSource};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Kurs Saldo - Indonesian financial news with trending topics
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// JSON file with feed sources (overrides KURS_SALDO_SOURCES)
    #[arg(long)]
    sources: Option<PathBuf>,

    /// Only list items from this source ("Semua" for all)
    #[arg(long)]
    source: Option<String>,

    /// Only list items whose title or description contains this text
    #[arg(short, long)]
    search: Option<String>,

    /// First publish day to list (YYYY-MM-DD)
    #[arg(long, requires = "until")]
    since: Option<NaiveDate>,

    /// Last publish day to list, inclusive (YYYY-MM-DD)
    #[arg(long, requires = "since")]
    until: Option<NaiveDate>,

    /// Maximum number of items to list
    #[arg(short, long)]
    limit: Option<usize>,

    /// Request timeout in seconds (overrides KURS_SALDO_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Print the API-style JSON envelope instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Fail when any source cannot be fetched
    #[arg(long)]
    strict: bool,

    /// Drop items that repeat the same link and title
    #[arg(long)]
    dedupe: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bank Indonesia transaction rates (jual, beli, tengah)
    KursBi,
    /// Kemenkeu tax exchange rates for the current week
    KursPajak {
        /// Skip TLS certificate verification for fiskal.kemenkeu.go.id
        #[arg(long)]
        insecure: bool,
    },
}

fn resolve_sources(cli: Option<&PathBuf>) -> Result<Vec<FeedSource>> {
    // CLI > KURS_SALDO_SOURCES > built-in list
    let path = match cli {
        Some(p) => Some(p.clone()),
        None => std::env::var("KURS_SALDO_SOURCES").ok().map(PathBuf::from),
    };
    match path {
        Some(p) => load_sources(&p),
        None => {
            debug!("Using built-in feed sources");
            Ok(builtin_sources())
        }
    }
}

fn resolve_timeout(cli: Option<u64>) -> Result<Duration> {
    let secs = match cli {
        Some(s) => s,
        None => match std::env::var("KURS_SALDO_TIMEOUT_SECS") {
            Ok(v) => v
                .trim()
                .parse()
                .with_context(|| format!("KURS_SALDO_TIMEOUT_SECS is not a number: {}", v))?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        },
    };
    Ok(Duration::from_secs(secs.max(1)))
}

#[tokio::main]
async fn main() -> Result<()> {
    // stderr keeps stdout clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();

    let args = Args::parse();
    info!("Starting kurs-saldo");

    if let Some(command) = args.command {
        // rate pages keep their own default timeouts unless one is given on the command line
        let timeout = args.timeout_secs.map(|s| Duration::from_secs(s.max(1)));
        let source = match command {
            Command::KursBi => KursSource::Bi,
            Command::KursPajak { insecure } => KursSource::Pajak { insecure },
        };
        return run_kurs(source, timeout, args.json).await;
    }

    let sources = resolve_sources(args.sources.as_ref())?;
    let timeout = resolve_timeout(args.timeout_secs)?;
    debug!(
        "Sources: {}",
        sources.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let filter = ItemFilter {
        source: args.source,
        query: args.search,
        start: args.since,
        end: args.until,
    };

    run(RunOptions {
        sources,
        timeout,
        filter,
        limit: args.limit,
        json: args.json,
        strict: args.strict,
        dedupe: args.dedupe,
    })
    .await
}
