use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::kurs::{cell_text, convert_tanggal, fetch_html, format_indonesian, parse_indonesian_number, selector};

pub const PAJAK_URL: &str = "https://fiskal.kemenkeu.go.id/informasi-publik/kurs-pajak";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const USER_AGENT: &str = "Mozilla/5.0";
const TANGGAL_LABEL: &str = "Tanggal Berlaku:";

static CODE_IN_PARENS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([A-Za-z0-9_]{3})\)").unwrap());
static TRAILING_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([A-Z]{3})$").unwrap());
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KursPajakItem {
    pub mata_uang: String,      // "USD"
    pub mata_uang_name: String, // "Dolar Amerika Serikat"
    pub nilai: String,          // "100" for JPY, otherwise "1"
    pub kurs: String,           // "16.211,00"
    pub perubahan: String,      // "0,00" or "-123,45"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KursPajakResponse {
    pub tanggal: String, // "18 Februari 2026 - 24 Februari 2026"
    pub tanggal_mulai: String,
    pub tanggal_selesai: String,
    pub tanggal_format_mulai: String, // "18/02/2026"
    pub tanggal_format_selesai: String,
    pub data: Vec<KursPajakItem>,
}

/// The Kemenkeu site has served broken certificate chains; `insecure` skips verification.
pub fn build_client(timeout: Duration, insecure: bool) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    if insecure {
        warn!("TLS certificate verification disabled for {}", PAJAK_URL);
    }

    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .danger_accept_invalid_certs(insecure)
        .build()?)
}

pub async fn fetch_kurs_pajak(client: &Client) -> Result<KursPajakResponse> {
    let body = fetch_html(client, "Kurs Pajak", PAJAK_URL).await?;
    parse_kurs_pajak(&body)
}

/// (mulai, selesai, format mulai, format selesai). A string that is not "a - b" fills all four.
fn split_range(range: &str) -> (String, String, String, String) {
    let parts: Vec<&str> = range.split(" - ").map(str::trim).collect();
    match parts.as_slice() {
        [mulai, selesai] => (
            mulai.to_string(),
            selesai.to_string(),
            convert_tanggal(mulai),
            convert_tanggal(selesai),
        ),
        _ => (range.to_string(), range.to_string(), range.to_string(), range.to_string()),
    }
}

/// Currency code from "Dolar Amerika Serikat (USD)" or "Dolar Amerika Serikat USD", and the bare name.
fn split_currency(full_name: &str) -> Option<(String, String)> {
    let code = CODE_IN_PARENS_RE
        .captures(full_name)
        .or_else(|| TRAILING_CODE_RE.captures(full_name))
        .map(|c| c[1].to_string())?;

    let name = CODE_IN_PARENS_RE.replace(full_name, "");
    let name = TRAILING_CODE_RE.replace(&name, "");
    let name = SPACES_RE.replace_all(&name, " ").trim().to_string();
    Some((code, name))
}

pub fn parse_kurs_pajak(html: &str) -> Result<KursPajakResponse> {
    let doc = Html::parse_document(html);

    let mut tanggal = String::new();
    for el in doc.select(&selector(".text-muted")?) {
        let text = cell_text(el);
        if text.contains(TANGGAL_LABEL) {
            tanggal = text.replacen(TANGGAL_LABEL, "", 1).trim().to_string();
        }
    }
    if tanggal.is_empty() {
        bail!("Tanggal berlaku tidak ditemukan");
    }
    let (tanggal_mulai, tanggal_selesai, tanggal_format_mulai, tanggal_format_selesai) =
        split_range(&tanggal);

    let Some(table) = doc.select(&selector(".table")?).next() else {
        bail!("Tabel kurs pajak tidak ditemukan. Struktur halaman mungkin berubah.");
    };

    let td = selector("td")?;
    let mut data = Vec::new();
    for row in table.select(&selector("tr")?).skip(1) {
        let cols: Vec<String> = row.select(&td).map(cell_text).collect();
        // numbered tables carry a leading "No" column
        let (full_name, kurs_raw, perubahan_raw) = match cols.as_slice() {
            [_, name, kurs, perubahan, ..] => (name, kurs, perubahan),
            [name, kurs, perubahan] => (name, kurs, perubahan),
            _ => continue,
        };
        if full_name.is_empty() || kurs_raw.is_empty() {
            continue;
        }
        let Some((mata_uang, mata_uang_name)) = split_currency(full_name) else {
            debug!("Kurs Pajak row without currency code skipped - name={}", full_name);
            continue;
        };

        data.push(KursPajakItem {
            nilai: (if mata_uang == "JPY" { "100" } else { "1" }).to_string(),
            mata_uang,
            mata_uang_name,
            kurs: format_indonesian(parse_indonesian_number(kurs_raw)),
            perubahan: format_indonesian(parse_indonesian_number(perubahan_raw)),
        });
    }
    debug!("Kurs Pajak parsed - tanggal={}, rows={}", tanggal, data.len());

    if data.is_empty() {
        bail!("Tidak ada data kurs yang berhasil diparse. Struktur tabel mungkin berubah.");
    }

    Ok(KursPajakResponse {
        tanggal,
        tanggal_mulai,
        tanggal_selesai,
        tanggal_format_mulai,
        tanggal_format_selesai,
        data,
    })
}
