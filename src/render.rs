// src/render.rs
use chrono_tz::Asia::Jakarta;
use itertools::Itertools;
use serde::Serialize;

use crate::kurs_bi::KursBiResponse;
use crate::kurs_pajak::KursPajakResponse;
use crate::models::{DateRange, Keyword, NewsItem};

/// Same shape as the `/api/feeds` response of the web backend, plus the topics.
#[derive(Debug, Serialize)]
pub struct FeedsEnvelope<'a> {
    pub success: bool,
    pub count: usize,
    #[serde(rename = "dateRange", skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    pub topics: &'a [Keyword],
    #[serde(rename = "failedSources", skip_serializing_if = "no_failures")]
    pub failed_sources: &'a [String],
    pub data: Vec<&'a NewsItem>,
}

fn no_failures(failed: &&[String]) -> bool {
    failed.is_empty()
}

pub fn render_topics_text(topics: &[Keyword]) -> String {
    if topics.is_empty() {
        return String::new();
    }
    let chips = topics
        .iter()
        .map(|k| format!("#{} ({})", k.word, k.count))
        .join("  ");
    format!("Topik Populer ({})\n{}\n", topics.len(), chips)
}

fn format_date(item: &NewsItem) -> String {
    match item.published_at {
        Some(ts) => ts.with_timezone(&Jakarta).format("%d %b %Y %H:%M WIB").to_string(),
        None if item.pub_date.is_empty() => "-".to_string(),
        None => item.pub_date.clone(),
    }
}

pub fn render_items_text(items: &[&NewsItem], date_range: Option<&DateRange>) -> String {
    let mut out = String::new();
    match date_range {
        Some(r) => out.push_str(&format!("\nBerita ({}) {} s/d {}\n", items.len(), r.min, r.max)),
        None => out.push_str(&format!("\nBerita ({})\n", items.len())),
    }

    for it in items {
        out.push_str(&format!("- [{}] {} | {}\n", it.source, format_date(it), it.title));
        if !it.link.is_empty() {
            out.push_str(&format!("  {}\n", it.link));
        }
    }
    out
}

pub fn render_kurs_bi_text(kurs: &KursBiResponse) -> String {
    let mut out = format!("Kurs Transaksi BI {} ({})\n", kurs.tanggal, kurs.tanggal_format);
    out.push_str(&format!(
        "{:<6} {:>6} {:>14} {:>14} {:>14}\n",
        "Mata", "Nilai", "Jual", "Beli", "Tengah"
    ));
    for k in &kurs.data {
        out.push_str(&format!(
            "{:<6} {:>6} {:>14} {:>14} {:>14}\n",
            k.mata_uang, k.nilai, k.kurs_jual, k.kurs_beli, k.kurs_tengah
        ));
    }
    out
}

pub fn render_kurs_pajak_text(kurs: &KursPajakResponse) -> String {
    let mut out = format!(
        "Kurs Pajak {} s/d {}\n",
        kurs.tanggal_format_mulai, kurs.tanggal_format_selesai
    );
    for k in &kurs.data {
        out.push_str(&format!(
            "{:<4} {:>4} {:>14} {:>10}  {}\n",
            k.mata_uang, k.nilai, k.kurs, k.perubahan, k.mata_uang_name
        ));
    }
    out
}
