use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Asia::Jakarta;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use rss::{Channel, Item};
use std::collections::HashSet;
use tracing::{debug, info, warn};
use xxhash_rust::xxh3::xxh3_64;

use crate::models::NewsItem;
use crate::sources::{FeedSource, ImageStrategy};

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static DEC_ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(\d+);").unwrap());
static HEX_ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#[xX]([0-9a-fA-F]+);").unwrap());
static IMG_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)<img[^>]+src\s*=\s*["']([^"']+)["']"#).unwrap());

fn make_item_id(link: &str, title: &str) -> String {
    format!("{:016x}", xxh3_64(format!("{}|{}", link, title).as_bytes()))
}

/// Fetch one feed. Network, HTTP and XML failures surface as errors for the caller to log.
pub async fn fetch_feed(client: &Client, source: &FeedSource) -> Result<Vec<NewsItem>> {
    let start = std::time::Instant::now();
    debug!("Fetching feed - source={}, url={}", source.name, source.url);

    let resp = client
        .get(&source.url)
        .send()
        .await
        .with_context(|| format!("Request failed for {}", source.url))?;

    let resp = resp
        .error_for_status()
        .with_context(|| format!("HTTP error for {}", source.url))?;

    let body = resp
        .bytes()
        .await
        .with_context(|| format!("Reading body of {}", source.url))?;

    let items = parse_feed(&body, source)?;

    info!(
        "Feed fetch completed - source={}, duration={:.2}s, items={}",
        source.name,
        start.elapsed().as_secs_f32(),
        items.len()
    );
    Ok(items)
}

/// Fetch all sources concurrently. A failing source is logged and contributes nothing.
pub async fn fetch_all(client: &Client, sources: &[FeedSource]) -> (Vec<NewsItem>, Vec<String>) {
    let tasks = sources.iter().map(|s| fetch_feed(client, s));
    let results = futures::future::join_all(tasks).await;

    let mut items = Vec::new();
    let mut failed = Vec::new();
    for (source, result) in sources.iter().zip(results) {
        match result {
            Ok(mut v) => items.append(&mut v),
            Err(e) => {
                warn!("Feed unavailable - source={}, error={:#}", source.name, e);
                failed.push(source.name.clone());
            }
        }
    }
    (items, failed)
}

pub fn parse_feed(body: &[u8], source: &FeedSource) -> Result<Vec<NewsItem>> {
    let channel = Channel::read_from(body)
        .with_context(|| format!("Decoding RSS for {}", source.name))?;

    // rss drops non-namespaced elements it does not know, so <item><img> needs a second pass
    let item_imgs = match source.image {
        ImageStrategy::ItemImg => item_img_elements(body),
        _ => Vec::new(),
    };

    Ok(channel
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let img = item_imgs.get(i).cloned().flatten();
            to_news_item(item, img, source)
        })
        .collect())
}

/// `<img>` child of every `<item>`, in document order. Text content first, then a `src` or `url` attribute.
fn item_img_elements(body: &[u8]) -> Vec<Option<String>> {
    let doc = match std::str::from_utf8(body).ok().map(roxmltree::Document::parse) {
        Some(Ok(doc)) => doc,
        Some(Err(e)) => {
            debug!("Item images unavailable - error={}", e);
            return Vec::new();
        }
        None => return Vec::new(),
    };

    doc.descendants()
        .filter(|n| n.has_tag_name("item"))
        .map(|item| {
            let img = item
                .children()
                .find(|c| c.is_element() && c.tag_name().name().eq_ignore_ascii_case("img"))?;
            img.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .or_else(|| img.attribute("src"))
                .or_else(|| img.attribute("url"))
                .map(|u| u.trim().to_string())
        })
        .collect()
}

fn to_news_item(item: &Item, item_img: Option<String>, source: &FeedSource) -> NewsItem {
    let title = decode_html_entities(item.title().unwrap_or_default()).trim().to_string();
    let link = item.link().unwrap_or_default().trim().to_string();
    let raw_description = item.description().unwrap_or_default();
    let pub_date = item.pub_date().unwrap_or_default().trim().to_string();

    NewsItem {
        id: make_item_id(&link, &title),
        description: strip_html(raw_description),
        published_at: parse_pub_date(&pub_date),
        image: item_img
            .filter(|u| !u.is_empty())
            .or_else(|| item_image(item, raw_description, source.image))
            .unwrap_or_default(),
        source: source.name.clone(),
        language: source.language.clone(),
        title,
        link,
        pub_date,
    }
}

fn item_image(item: &Item, description: &str, strategy: ImageStrategy) -> Option<String> {
    let enclosure = || item.enclosure().map(|e| e.url().to_string());
    let media = || {
        item.extensions()
            .get("media")
            .and_then(|m| m.get("content"))
            .and_then(|v| v.first())
            .and_then(|ext| ext.attrs().get("url").cloned())
    };
    let inline = || {
        IMG_SRC_RE
            .captures(description)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    let found = match strategy {
        ImageStrategy::Enclosure => enclosure(),
        ImageStrategy::EnclosureOrMedia => enclosure().or_else(media),
        ImageStrategy::DescriptionImg | ImageStrategy::ItemImg => inline().or_else(enclosure),
    };
    found.filter(|u| !u.is_empty())
}

/// RFC-822 first (what RSS uses), then ISO8601, then a bare local timestamp in WIB.
pub fn parse_pub_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()?;
            Jakarta
                .from_local_datetime(&naive)
                .single()
                .map(|dt| dt.with_timezone(&Utc))
        })
}

/// CDATA titles reach us still escaped ("Antam &amp; PTBA").
pub fn decode_html_entities(s: &str) -> String {
    let named = s
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'");

    let dec = DEC_ENTITY_RE.replace_all(&named, |c: &regex::Captures| {
        c[1].parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });
    HEX_ENTITY_RE
        .replace_all(&dec, |c: &regex::Captures| {
            u32::from_str_radix(&c[1], 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}

pub fn strip_html(html: &str) -> String {
    let text = TAG_RE.replace_all(html, " ");
    decode_html_entities(&text.replace("&nbsp;", " "))
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Order newest first, undated last. With `dedupe`, exact duplicates (same link and title) go first.
pub fn normalize_items(mut items: Vec<NewsItem>, dedupe: bool) -> Vec<NewsItem> {
    if dedupe {
        let before = items.len();
        let mut seen: HashSet<String> = HashSet::new();
        items.retain(|it| seen.insert(it.id.clone()));

        let removed = before - items.len();
        if removed > 0 {
            info!("Deduplication - removed={} duplicates, retained={} items", removed, items.len());
        }
    }

    items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::builtin_sources;

    const CNBC_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>CNBC Indonesia Market</title>
    <link>https://www.cnbcindonesia.com/market</link>
    <description>Market</description>
    <item>
      <title><![CDATA[Saham Antam &amp; PTBA Menguat]]></title>
      <link>https://www.cnbcindonesia.com/market/1</link>
      <description><![CDATA[<p>IHSG <b>naik</b>&nbsp;tipis</p>]]></description>
      <pubDate>Sun, 18 Oct 2026 09:30:00 +0700</pubDate>
      <media:content url="https://cdn.example.com/antam.jpg" medium="image" />
    </item>
    <item>
      <title>Rupiah Melemah</title>
      <link>https://www.cnbcindonesia.com/market/2</link>
      <description>Dolar perkasa</description>
      <pubDate>bukan tanggal</pubDate>
      <enclosure url="https://cdn.example.com/rupiah.jpg" length="0" type="image/jpeg" />
    </item>
  </channel>
</rss>"#;

    const TEMPO_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Tempo Bisnis</title>
    <link>https://tempo.co</link>
    <description>Bisnis</description>
    <item>
      <title>Harga Emas Naik</title>
      <link>https://tempo.co/bisnis/1</link>
      <description><![CDATA[<img src="https://statik.tempo.co/inline.jpg" /> Emas Antam naik]]></description>
      <img>https://statik.tempo.co/emas.jpg</img>
      <pubDate>2026-10-18T02:00:00Z</pubDate>
    </item>
    <item>
      <title>Saham Bank Turun</title>
      <link>https://tempo.co/bisnis/2</link>
      <description>Tanpa gambar</description>
      <pubDate>2026-10-17T02:00:00Z</pubDate>
    </item>
    <item>
      <title>Kurs Rupiah Stabil</title>
      <link>https://tempo.co/bisnis/3</link>
      <description><![CDATA[<img src="https://statik.tempo.co/rupiah.jpg" /> Rupiah stabil]]></description>
      <pubDate>2026-10-16T02:00:00Z</pubDate>
    </item>
  </channel>
</rss>"#;

    fn source(name: &str) -> FeedSource {
        builtin_sources().into_iter().find(|s| s.name == name).unwrap()
    }

    #[test]
    fn parses_cnbc_items() {
        let items = parse_feed(CNBC_XML.as_bytes(), &source("CNBC Indonesia")).unwrap();
        assert_eq!(items.len(), 2);

        let first = &items[0];
        assert_eq!(first.title, "Saham Antam & PTBA Menguat");
        assert_eq!(first.description, "IHSG naik tipis");
        assert_eq!(first.image, "https://cdn.example.com/antam.jpg");
        assert_eq!(first.source, "CNBC Indonesia");
        assert_eq!(
            first.published_at.unwrap().to_rfc3339(),
            "2026-10-18T02:30:00+00:00"
        );
        assert_eq!(first.id.len(), 16);

        let second = &items[1];
        assert_eq!(second.image, "https://cdn.example.com/rupiah.jpg");
        assert_eq!(second.pub_date, "bukan tanggal");
        assert!(second.published_at.is_none());
    }

    #[test]
    fn tempo_image_comes_from_item_img_element() {
        let items = parse_feed(TEMPO_XML.as_bytes(), &source("Tempo")).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].image, "https://statik.tempo.co/emas.jpg");
        assert_eq!(items[0].description, "Emas Antam naik");
        assert!(items[0].published_at.is_some());
        // no <img> element: nothing, or the description's image
        assert_eq!(items[1].image, "");
        assert_eq!(items[2].image, "https://statik.tempo.co/rupiah.jpg");
    }

    #[test]
    fn description_strategy_ignores_item_img() {
        let mut src = source("Tempo");
        src.image = ImageStrategy::DescriptionImg;
        let items = parse_feed(TEMPO_XML.as_bytes(), &src).unwrap();
        assert_eq!(items[0].image, "https://statik.tempo.co/inline.jpg");
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(parse_feed(b"<html>nope</html>", &source("Detik")).is_err());
    }

    #[test]
    fn decodes_entities() {
        assert_eq!(decode_html_entities("Antam &amp; PTBA"), "Antam & PTBA");
        assert_eq!(decode_html_entities("&#8220;Kurs&#8221; &#x41;"), "\u{201c}Kurs\u{201d} A");
        assert_eq!(decode_html_entities("a &lt;b&gt; &quot;c&quot; &apos;d&#39;"), "a <b> \"c\" 'd'");
    }

    #[test]
    fn parses_date_formats() {
        let rfc822 = parse_pub_date("Sun, 18 Oct 2026 09:30:00 +0700").unwrap();
        let iso = parse_pub_date("2026-10-18T02:30:00Z").unwrap();
        let local = parse_pub_date("2026-10-18 09:30:00").unwrap();
        assert_eq!(rfc822, iso);
        assert_eq!(local, iso);
        assert!(parse_pub_date("").is_none());
        assert!(parse_pub_date("kemarin sore").is_none());
    }

    fn merged_with_repeat() -> Vec<NewsItem> {
        let mut items = parse_feed(CNBC_XML.as_bytes(), &source("CNBC Indonesia")).unwrap();
        items.extend(parse_feed(TEMPO_XML.as_bytes(), &source("Tempo")).unwrap());
        items.push(items[0].clone());
        items
    }

    #[test]
    fn normalize_keeps_duplicates_and_sorts_newest_first() {
        let out = normalize_items(merged_with_repeat(), false);
        let titles: Vec<&str> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Saham Antam & PTBA Menguat",
                "Saham Antam & PTBA Menguat",
                "Harga Emas Naik",
                "Saham Bank Turun",
                "Kurs Rupiah Stabil",
                "Rupiah Melemah",
            ]
        );
    }

    #[test]
    fn normalize_dedupes_when_asked() {
        let out = normalize_items(merged_with_repeat(), true);
        let titles: Vec<&str> = out.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Saham Antam & PTBA Menguat",
                "Harga Emas Naik",
                "Saham Bank Turun",
                "Kurs Rupiah Stabil",
                "Rupiah Melemah",
            ]
        );
    }
}
