use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use url::Url;

/// Where a feed keeps its thumbnail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImageStrategy {
    #[default]
    Enclosure,
    EnclosureOrMedia, // <enclosure url> then <media:content url>
    DescriptionImg,   // first <img src> inside the description
    ItemImg,          // <img> child of <item>, then the description
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub image: ImageStrategy,
}

fn default_language() -> String {
    "Indonesia".to_string()
}

pub fn builtin_sources() -> Vec<FeedSource> {
    vec![
        FeedSource {
            name: "Detik".into(),
            url: "https://finance.detik.com/rss".into(),
            language: default_language(),
            image: ImageStrategy::Enclosure,
        },
        FeedSource {
            name: "Tempo".into(),
            url: "https://rss.tempo.co/bisnis".into(),
            language: default_language(),
            image: ImageStrategy::ItemImg,
        },
        FeedSource {
            name: "CNBC Indonesia".into(),
            url: "https://www.cnbcindonesia.com/market/rss/".into(),
            language: default_language(),
            image: ImageStrategy::EnclosureOrMedia,
        },
    ]
}

/// Parse and validate a JSON array of sources.
pub fn parse_sources(json: &str) -> Result<Vec<FeedSource>> {
    let sources: Vec<FeedSource> = serde_json::from_str(json).context("Decoding sources JSON")?;
    if sources.is_empty() {
        bail!("Sources list is empty");
    }
    for s in &sources {
        if s.name.trim().is_empty() {
            bail!("Source with url {} has an empty name", s.url);
        }
        let u = Url::parse(&s.url).with_context(|| format!("Invalid url for source {}", s.name))?;
        if !matches!(u.scheme(), "http" | "https") {
            bail!("Source {} must use http(s), got {}", s.name, u.scheme());
        }
    }
    Ok(sources)
}

pub fn load_sources(path: &Path) -> Result<Vec<FeedSource>> {
    debug!("Loading feed sources from: {}", path.display());
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Reading sources file {}", path.display()))?;
    parse_sources(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_sources_are_valid() {
        let json = serde_json::to_string(&builtin_sources()).unwrap();
        let parsed = parse_sources(&json).unwrap();
        assert_eq!(parsed, builtin_sources());
        assert_eq!(parsed.len(), 3);
    }

    #[test]
    fn defaults_fill_optional_fields() {
        let parsed = parse_sources(r#"[{"name":"Kontan","url":"https://www.kontan.co.id/rss"}]"#).unwrap();
        assert_eq!(parsed[0].language, "Indonesia");
        assert_eq!(parsed[0].image, ImageStrategy::Enclosure);

        let tempo = parse_sources(r#"[{"name":"Tempo","url":"https://rss.tempo.co/bisnis","image":"item_img"}]"#).unwrap();
        assert_eq!(tempo[0].image, ImageStrategy::ItemImg);
    }

    #[test]
    fn rejects_bad_urls_and_empty_lists() {
        assert!(parse_sources("[]").is_err());
        assert!(parse_sources(r#"[{"name":"X","url":"not a url"}]"#).is_err());
        assert!(parse_sources(r#"[{"name":"X","url":"ftp://example.com/rss"}]"#).is_err());
        assert!(parse_sources(r#"[{"name":" ","url":"https://example.com/rss"}]"#).is_err());
    }
}
