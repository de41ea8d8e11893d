use anyhow::{bail, Result};
use chrono::Utc;
use reqwest::Client;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::fetch::{fetch_all, normalize_items};
use crate::filter::{date_range, ItemFilter};
use crate::kurs::KursEnvelope;
use crate::kurs_bi::{self, fetch_kurs_bi};
use crate::kurs_pajak::{self, fetch_kurs_pajak};
use crate::render::{
    render_items_text, render_kurs_bi_text, render_kurs_pajak_text, render_topics_text, FeedsEnvelope,
};
use crate::sources::FeedSource;
use crate::text::default_stopwords;
use crate::topics::compute_top_keywords;

const USER_AGENT: &str = "Mozilla/5.0";

pub struct RunOptions {
    pub sources: Vec<FeedSource>,
    pub timeout: Duration,
    pub filter: ItemFilter,
    pub limit: Option<usize>,
    pub json: bool,
    pub strict: bool,
    pub dedupe: bool,
}

/// Unreachable feeds only fail the run under `strict`; otherwise the run goes on with what it has,
/// even when that is nothing.
fn check_failures(failed: &[String], total: usize, strict: bool) -> Result<()> {
    if failed.is_empty() {
        return Ok(());
    }
    if strict {
        bail!("Feeds unavailable: {}", failed.join(", "));
    }
    if failed.len() == total {
        warn!("No feeds available - checked {}, listing is empty", failed.join(", "));
    } else {
        warn!("Continuing without {} source(s): {}", failed.len(), failed.join(", "));
    }
    Ok(())
}

pub async fn run(opts: RunOptions) -> Result<()> {
    let pipeline_start = std::time::Instant::now();
    info!("Pipeline started - sources={}, timeout={}s", opts.sources.len(), opts.timeout.as_secs());

    let client = Client::builder()
        .timeout(opts.timeout)
        .user_agent(USER_AGENT)
        .build()?;

    // 1) fetch every source concurrently
    let fetch_start = std::time::Instant::now();
    let (fetched, failed) = fetch_all(&client, &opts.sources).await;
    check_failures(&failed, opts.sources.len(), opts.strict)?;
    info!(
        "Feed fetch completed - duration={:.2}s, items={}",
        fetch_start.elapsed().as_secs_f32(),
        fetched.len()
    );

    // 2) merge, newest first
    let items = normalize_items(fetched, opts.dedupe);
    let undated = items.iter().filter(|i| i.published_at.is_none()).count();
    if undated > 0 {
        debug!("Items without a parsable date - count={}, weighted as stale", undated);
    }

    // 3) topics over the full snapshot, not the filtered listing
    let topic_start = std::time::Instant::now();
    let topics = compute_top_keywords(&items, Utc::now(), default_stopwords());
    info!(
        "Topic extraction completed - duration={:.3}s, documents={}, topics={}",
        topic_start.elapsed().as_secs_f32(),
        items.len(),
        topics.len()
    );

    // 4) filter + render
    let range = date_range(&items);
    let mut shown = opts.filter.apply(&items);
    if let Some(n) = opts.limit {
        shown.truncate(n);
    }
    debug!("Listing - matched={}, total={}", shown.len(), items.len());

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if opts.json {
        let env = FeedsEnvelope {
            success: true,
            count: shown.len(),
            date_range: range,
            topics: &topics,
            failed_sources: &failed,
            data: shown,
        };
        serde_json::to_writer_pretty(&mut out, &env)?;
        writeln!(out)?;
    } else {
        write!(out, "{}", render_topics_text(&topics))?;
        write!(out, "{}", render_items_text(&shown, range.as_ref()))?;
    }

    info!(
        "Pipeline completed successfully - total_duration={:.2}s, items={}, topics={}",
        pipeline_start.elapsed().as_secs_f32(),
        items.len(),
        topics.len()
    );
    Ok(())
}

/// Which rate table to scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KursSource {
    Bi,
    Pajak { insecure: bool },
}

pub async fn run_kurs(source: KursSource, timeout: Option<Duration>, json: bool) -> Result<()> {
    let start = std::time::Instant::now();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let rows = match source {
        KursSource::Bi => {
            let client = kurs_bi::build_client(timeout.unwrap_or(kurs_bi::DEFAULT_TIMEOUT))?;
            let kurs = fetch_kurs_bi(&client).await?;
            write_kurs(&mut out, &kurs, json, render_kurs_bi_text)?;
            kurs.data.len()
        }
        KursSource::Pajak { insecure } => {
            let client = kurs_pajak::build_client(timeout.unwrap_or(kurs_pajak::DEFAULT_TIMEOUT), insecure)?;
            let kurs = fetch_kurs_pajak(&client).await?;
            write_kurs(&mut out, &kurs, json, render_kurs_pajak_text)?;
            kurs.data.len()
        }
    };

    info!(
        "Rates completed - source={:?}, duration={:.2}s, currencies={}",
        source,
        start.elapsed().as_secs_f32(),
        rows
    );
    Ok(())
}

fn write_kurs<T: Serialize>(
    out: &mut impl Write,
    kurs: &T,
    json: bool,
    text: fn(&T) -> String,
) -> Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, &KursEnvelope { success: true, body: kurs })?;
        writeln!(out)?;
    } else {
        write!(out, "{}", text(kurs))?;
    }
    Ok(())
}
