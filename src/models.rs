use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub id: String, // xxh3(link|title), hex
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: String, // raw feed value, RFC-822 or ISO8601
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image: String,
    pub source: String,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermKind {
    Unigram,
    Bigram,
}

impl TermKind {
    /// Frequency and score multiplier; phrases count 30% more than single words.
    pub fn weight(self) -> f64 {
        match self {
            TermKind::Unigram => 1.0,
            TermKind::Bigram => 1.3,
        }
    }

    /// `weight() * decay` in hundredths; exact for every decay step (100/70/40/20).
    pub fn frequency_centi(self, decay_centi: u64) -> u64 {
        match self {
            TermKind::Unigram => decay_centi,
            TermKind::Bigram => decay_centi * 13 / 10,
        }
    }
}

/// Accumulated in integer hundredths so totals are exact whatever the document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermStats {
    pub frequency_centi: u64, // sum of decay-weighted occurrences
    pub recency_centi: u64,   // sum of raw decay weights
    pub kind: TermKind,
}

impl TermStats {
    pub fn new(kind: TermKind) -> Self {
        Self {
            frequency_centi: 0,
            recency_centi: 0,
            kind,
        }
    }

    pub fn term_frequency(&self) -> f64 {
        self.frequency_centi as f64 / 100.0
    }

    pub fn total_recency_weight(&self) -> f64 {
        self.recency_centi as f64 / 100.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredTerm {
    pub term: String,
    pub score: f64,
}

/// One "Topik Populer" chip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword {
    pub word: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub min: String, // YYYY-MM-DD
    pub max: String,
}
