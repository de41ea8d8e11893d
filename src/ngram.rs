use std::collections::{BTreeSet, HashSet};

use crate::models::TermKind;

pub const UNIGRAM_LEN: std::ops::RangeInclusive<usize> = 4..=15;
pub const BIGRAM_WORD_LEN: std::ops::RangeInclusive<usize> = 3..=15;

/// One occurrence of a term in a document, already decay-weighted (hundredths).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub term: String,
    pub kind: TermKind,
    pub frequency: u64,
    pub recency: u64,
}

#[derive(Debug, Default)]
pub struct DocumentTerms {
    pub contributions: Vec<Contribution>, // every occurrence
    pub distinct: BTreeSet<String>,       // for document frequency
}

/// Unigrams and adjacent-pair bigrams of one document's tokens.
pub fn extract_terms(tokens: &[String], weight: u64, stop_words: &HashSet<String>) -> DocumentTerms {
    let mut doc = DocumentTerms::default();

    for tok in tokens {
        if UNIGRAM_LEN.contains(&tok.len()) && !stop_words.contains(tok) {
            doc.push(tok.clone(), TermKind::Unigram, weight);
        }
    }

    for pair in tokens.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if stop_words.contains(a) || stop_words.contains(b) {
            continue;
        }
        if BIGRAM_WORD_LEN.contains(&a.len()) && BIGRAM_WORD_LEN.contains(&b.len()) {
            doc.push(format!("{} {}", a, b), TermKind::Bigram, weight);
        }
    }

    doc
}

impl DocumentTerms {
    fn push(&mut self, term: String, kind: TermKind, weight: u64) {
        self.distinct.insert(term.clone());
        self.contributions.push(Contribution {
            term,
            kind,
            frequency: kind.frequency_centi(weight),
            recency: weight,
        });
    }
}
