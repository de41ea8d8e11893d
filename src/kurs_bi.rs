use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::kurs::{cell_text, convert_tanggal, fetch_html, format_indonesian, parse_indonesian_number, selector};

pub const BI_URL: &str = "https://www.bi.go.id/id/statistik/informasi-kurs/transaksi-bi/default.aspx";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";
const TABLE_SELECTOR: &str = "#ctl00_PlaceHolderMain_g_6c89d4ad_107f_437d_bd54_8fda17b556bf_ctl00_GridView1";

static TANGGAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(\d{1,2}\s(?:Januari|Februari|Maret|April|Mei|Juni|Juli|Agustus|September|Oktober|November|Desember)\s\d{4})",
    )
    .unwrap()
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KursBiItem {
    pub mata_uang: String, // currency code, "USD"
    pub nilai: String,     // unit, "1" or "100"
    pub kurs_jual: String,
    pub kurs_beli: String,
    pub kurs_tengah: String, // (jual + beli) / 2, Indonesian format
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KursBiResponse {
    pub tanggal: String,        // "13 Februari 2026"
    pub tanggal_format: String, // "13/02/2026"
    pub data: Vec<KursBiItem>,
}

pub fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("id-ID,id;q=0.9,en;q=0.8"));

    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .build()?)
}

pub async fn fetch_kurs_bi(client: &Client) -> Result<KursBiResponse> {
    let body = fetch_html(client, "Kurs BI", BI_URL).await?;
    parse_kurs_bi(&body)
}

/// Rates table of the BI transaction-rate page.
pub fn parse_kurs_bi(html: &str) -> Result<KursBiResponse> {
    let doc = Html::parse_document(html);

    // "Update Terakhir 13 Februari 2026"; the last matching span wins, then any date in the body
    let mut tanggal = String::new();
    for span in doc.select(&selector("div.text-left span")?) {
        if let Some(m) = TANGGAL_RE.find(&cell_text(span)) {
            tanggal = m.as_str().to_string();
        }
    }
    if tanggal.is_empty() {
        let body_text: String = doc
            .select(&selector("body")?)
            .flat_map(|b| b.text())
            .collect();
        if let Some(m) = TANGGAL_RE.find(&body_text) {
            tanggal = m.as_str().to_string();
        }
    }
    if tanggal.is_empty() {
        warn!("Kurs BI date not found on page");
    }

    let Some(table) = doc.select(&selector(TABLE_SELECTOR)?).next() else {
        bail!("Tabel kurs BI tidak ditemukan. Struktur halaman mungkin berubah.");
    };

    let td = selector("td")?;
    let mut data = Vec::new();
    for row in table.select(&selector("tr")?).skip(1) {
        let cols: Vec<String> = row.select(&td).map(cell_text).collect();
        let [mata_uang, nilai, kurs_jual, kurs_beli, ..] = cols.as_slice() else {
            continue;
        };
        if mata_uang.is_empty() {
            continue;
        }

        let tengah = (parse_indonesian_number(kurs_jual) + parse_indonesian_number(kurs_beli)) / 2.0;
        data.push(KursBiItem {
            mata_uang: mata_uang.clone(),
            nilai: nilai.clone(),
            kurs_jual: kurs_jual.clone(),
            kurs_beli: kurs_beli.clone(),
            kurs_tengah: format_indonesian(tengah),
        });
    }
    debug!("Kurs BI parsed - tanggal={}, rows={}", tanggal, data.len());

    Ok(KursBiResponse {
        tanggal_format: convert_tanggal(&tanggal),
        tanggal,
        data,
    })
}
