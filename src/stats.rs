use std::collections::{BTreeSet, HashMap};

use crate::ngram::DocumentTerms;
use crate::models::TermStats;

/// Corpus-wide accumulators, rebuilt from scratch for every ranking.
#[derive(Debug, Default)]
pub struct CorpusStats {
    pub terms: HashMap<String, TermStats>,
    pub documents: Vec<BTreeSet<String>>,
    pub document_frequency: HashMap<String, usize>,
}

impl CorpusStats {
    /// Fold one document in. Totals do not depend on the order documents arrive.
    pub fn add_document(&mut self, doc: DocumentTerms) {
        for c in doc.contributions {
            let entry = self
                .terms
                .entry(c.term)
                .or_insert_with(|| TermStats::new(c.kind));
            entry.frequency_centi += c.frequency;
            entry.recency_centi += c.recency;
        }
        for term in &doc.distinct {
            *self.document_frequency.entry(term.clone()).or_insert(0) += 1;
        }
        self.documents.push(doc.distinct);
    }

    pub fn total_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn document_frequency(&self, term: &str) -> usize {
        self.document_frequency.get(term).copied().unwrap_or(0)
    }
}
