use itertools::Itertools;

use crate::models::ScoredTerm;
use crate::text::term_words;

pub const MAX_KEYWORDS: usize = 10;

fn overlaps(a: &str, b: &str) -> bool {
    let words_a = term_words(a);
    term_words(b).iter().any(|w| words_a.contains(w))
}

/// Greedy pick of the best-scoring terms such that no two share a word.
///
/// Scores sort descending; exact ties fall back to lexical term order so the
/// result is deterministic.
pub fn select_diverse(scored: Vec<ScoredTerm>, limit: usize) -> Vec<ScoredTerm> {
    let mut selected: Vec<ScoredTerm> = Vec::with_capacity(limit);

    let ranked = scored
        .into_iter()
        .sorted_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.term.cmp(&b.term)));

    for candidate in ranked {
        if selected.len() >= limit {
            break;
        }
        if selected.iter().any(|s| overlaps(&s.term, &candidate.term)) {
            continue;
        }
        selected.push(candidate);
    }

    selected
}
