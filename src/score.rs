use tracing::debug;

use crate::models::{ScoredTerm, TermStats};
use crate::stats::CorpusStats;

/// `ln(N / (df + 1))`. Goes negative once a term sits in nearly every document.
pub fn idf(total_documents: usize, document_frequency: usize) -> f64 {
    (total_documents as f64 / (document_frequency as f64 + 1.0)).ln()
}

/// Share of a term's weight that came from recent items; divisor floored at 1.
pub fn recency_bonus(stats: &TermStats) -> f64 {
    stats.total_recency_weight() / stats.term_frequency().max(1.0)
}

pub fn term_score(stats: &TermStats, total_documents: usize, document_frequency: usize) -> f64 {
    let tfidf = stats.term_frequency() * idf(total_documents, document_frequency);
    tfidf * (1.0 + recency_bonus(stats)) * stats.kind.weight()
}

/// Score every aggregated term. Empty corpus and non-finite scores yield nothing.
pub fn score_terms(corpus: &CorpusStats) -> Vec<ScoredTerm> {
    let total = corpus.total_documents();
    if total == 0 {
        return Vec::new();
    }

    let mut skipped = 0usize;
    let scored: Vec<ScoredTerm> = corpus
        .terms
        .iter()
        .filter_map(|(term, stats)| {
            let score = term_score(stats, total, corpus.document_frequency(term));
            if score.is_finite() {
                Some(ScoredTerm { term: term.clone(), score })
            } else {
                skipped += 1;
                None
            }
        })
        .collect();

    if skipped > 0 {
        debug!("Scoring skipped non-finite terms - skipped={}", skipped);
    }
    scored
}
