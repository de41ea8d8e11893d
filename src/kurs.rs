use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Selector};
use serde::Serialize;
use tracing::{debug, info};

pub const BULAN: [&str; 12] = [
    "Januari", "Februari", "Maret", "April", "Mei", "Juni", "Juli", "Agustus", "September",
    "Oktober", "November", "Desember",
];

// leading numeric prefix, like a lenient float reader
static NUMBER_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?").unwrap());

/// Wraps a rate payload as `{"success": true, ...}`.
#[derive(Debug, Serialize)]
pub struct KursEnvelope<'a, T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub body: &'a T,
}

/// "10.939,54" -> 10939.54. Dots group thousands, the first comma is the decimal mark.
/// Anything unreadable is 0.
pub fn parse_indonesian_number(raw: &str) -> f64 {
    let normalized = raw.trim().replace('.', "").replacen(',', ".", 1);
    NUMBER_PREFIX_RE
        .find(&normalized)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Two decimals, `.` between thousands, `,` before the cents: 10939.54 -> "10.939,54".
pub fn format_indonesian(n: f64) -> String {
    let fixed = format!("{:.2}", n.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let negative = n < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    format!("{}{},{}", if negative { "-" } else { "" }, grouped, frac)
}

/// "13 Februari 2026" -> "13/02/2026". Anything that is not three words comes back unchanged;
/// an unknown month becomes "00".
pub fn convert_tanggal(tanggal: &str) -> String {
    let parts: Vec<&str> = tanggal.trim().split(' ').collect();
    let [dd, bulan, yyyy] = parts.as_slice() else {
        return tanggal.to_string();
    };
    let mm = BULAN
        .iter()
        .position(|b| b == bulan)
        .map(|i| format!("{:02}", i + 1))
        .unwrap_or_else(|| "00".to_string());
    format!("{:0>2}/{}/{}", dd, mm, yyyy)
}

pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("Invalid selector {}: {:?}", css, e))
}

/// Concatenated text of an element with non-breaking spaces folded, trimmed.
pub fn cell_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().replace('\u{a0}', " ").trim().to_string()
}

pub async fn fetch_html(client: &Client, name: &str, url: &str) -> Result<String> {
    let start = std::time::Instant::now();
    debug!("Fetching rate page - source={}, url={}", name, url);

    let body = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Request failed for {}", url))?
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", url))?
        .text()
        .await
        .with_context(|| format!("Reading body of {}", url))?;

    info!(
        "Rate page fetched - source={}, duration={:.2}s, bytes={}",
        name,
        start.elapsed().as_secs_f32(),
        body.len()
    );
    Ok(body)
}
