use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::debug;

use crate::decay::time_weight_centi;
use crate::models::{Keyword, NewsItem, ScoredTerm};
use crate::ngram::extract_terms;
use crate::score::score_terms;
use crate::select::{select_diverse, MAX_KEYWORDS};
use crate::stats::CorpusStats;
use crate::text::normalize_title;

/// Aggregate every headline into term statistics.
pub fn build_corpus(items: &[NewsItem], now: DateTime<Utc>, stop_words: &HashSet<String>) -> CorpusStats {
    let mut corpus = CorpusStats::default();
    for item in items {
        let weight = time_weight_centi(item.published_at, now);
        let tokens = normalize_title(&item.title, stop_words);
        corpus.add_document(extract_terms(&tokens, weight, stop_words));
    }
    corpus
}

/// Selected terms with their scores, best first.
pub fn rank_topics(
    items: &[NewsItem],
    now: DateTime<Utc>,
    stop_words: &HashSet<String>,
) -> (CorpusStats, Vec<ScoredTerm>) {
    let corpus = build_corpus(items, now, stop_words);
    let scored = score_terms(&corpus);
    let candidates = scored.len();
    let selected = select_diverse(scored, MAX_KEYWORDS);

    debug!(
        "Topic ranking - documents={}, terms={}, selected={}",
        corpus.total_documents(),
        candidates,
        selected.len()
    );
    (corpus, selected)
}

/// "Topik Populer": up to ten non-overlapping keywords, counts are rounded weighted frequency.
///
/// Pure and recomputed from scratch on every call; the caller passes a fixed `now`.
pub fn compute_top_keywords(
    items: &[NewsItem],
    now: DateTime<Utc>,
    stop_words: &HashSet<String>,
) -> Vec<Keyword> {
    let (corpus, selected) = rank_topics(items, now, stop_words);
    selected
        .into_iter()
        .map(|s| {
            let tf = corpus
                .terms
                .get(&s.term)
                .map(|t| t.term_frequency())
                .unwrap_or(0.0);
            Keyword {
                word: s.term,
                count: tf.round() as i64,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ngram::{BIGRAM_WORD_LEN, UNIGRAM_LEN};
    use crate::score::idf;
    use crate::text::{default_stopwords, term_words};
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn item(title: &str, hours_ago: i64) -> NewsItem {
        NewsItem {
            id: String::new(),
            title: title.to_string(),
            description: String::new(),
            link: String::new(),
            pub_date: String::new(),
            published_at: Some(now() - Duration::hours(hours_ago)),
            image: String::new(),
            source: "Detik".to_string(),
            language: "Indonesia".to_string(),
        }
    }

    fn scores(items: &[NewsItem]) -> HashMap<String, f64> {
        let corpus = build_corpus(items, now(), default_stopwords());
        score_terms(&corpus).into_iter().map(|s| (s.term, s.score)).collect()
    }

    fn market_day() -> Vec<NewsItem> {
        vec![
            item("Harga Emas Antam Naik Tajam Hari Ini", 0),
            item("Emas Antam Naik Tajam Pagi Ini", 1),
            item("Rupiah Melemah Terhadap Dolar AS", 2),
            item("IHSG Ditutup Menguat, Saham Bank Jadi Penopang", 3),
            item("Bank Indonesia Tahan Suku Bunga Acuan", 5),
            item("Saham Teknologi Anjlok Usai Rilis Laporan Keuangan", 7),
            item("Investor Asing Borong Obligasi Negara", 8),
            item("Ekspor Batubara Turun Drastis", 13),
            item("Harga Minyak Dunia Melonjak", 14),
            item("Rupiah Menguat Tipis di Pasar Spot", 20),
            item("Kripto Bitcoin Cetak Rekor Baru", 26),
            item("Bank Digital Tumbuh Pesat Tahun Ini", 30),
            item("Suku Bunga The Fed Diprediksi Turun", 31),
            item("<![CDATA[Saham Energi Menguat Tajam]]>", 40),
            item("Inflasi Oktober Terkendali, Daya Beli Naik", 50),
        ]
    }

    #[test]
    fn empty_collection_yields_no_keywords() {
        assert!(compute_top_keywords(&[], now(), default_stopwords()).is_empty());
    }

    #[test]
    fn titles_without_terms_yield_no_keywords() {
        let items = vec![item("Ini Dan Itu", 0), item("!!! ???", 0)];
        assert!(compute_top_keywords(&items, now(), default_stopwords()).is_empty());
    }

    #[test]
    fn repeated_phrase_outranks_single_document_words() {
        let mut items = vec![
            item("Harga Emas Antam Naik Tajam Hari Ini", 0),
            item("Emas Antam Naik Tajam Pagi Ini", 0),
            item("Emas Antam Naik Tajam Siang Ini", 0),
        ];
        for t in [
            "Rupiah Melemah Terhadap Dolar",
            "IHSG Ditutup Menguat Sore",
            "Bank Sentral Tahan Suku Bunga",
            "Ekspor Batubara Turun Drastis",
            "Investor Asing Borong Obligasi",
        ] {
            items.push(item(t, 0));
        }

        let (corpus, selected) = rank_topics(&items, now(), default_stopwords());
        let top = &selected[0];
        assert!(["emas antam", "antam naik", "naik tajam"].contains(&top.term.as_str()));

        let all = scores(&items);
        for (term, score) in &all {
            if corpus.document_frequency(term) == 1 {
                assert!(top.score > *score, "{} should not beat {}", term, top.term);
            }
        }
    }

    #[test]
    fn recent_item_beats_stale_item() {
        let items = vec![
            item("Kripto", 30),
            item("Saham", 1),
            item("Rupiah Melemah Tajam", 0),
            item("Ekspor Batubara Turun", 0),
        ];
        let s = scores(&items);
        assert!(s["saham"] > s["kripto"]);
    }

    #[test]
    fn universal_term_gets_negative_idf_and_stays_out() {
        let items = vec![
            item("Ekonomi Tumbuh Pesat", 0),
            item("Ekonomi Global Melambat", 0),
            item("Ekonomi Digital Berkembang", 0),
            item("Ekonomi Syariah Menguat", 0),
            item("Ekonomi Daerah Pulih", 0),
        ];
        assert!(idf(5, 5) < 0.0);
        let s = scores(&items);
        assert!(s["ekonomi"] < 0.0);
        assert!(s.iter().filter(|(t, _)| t.as_str() != "ekonomi").all(|(_, v)| *v > s["ekonomi"]));

        let out = compute_top_keywords(&items, now(), default_stopwords());
        assert!(!out.is_empty());
        assert!(out.iter().all(|k| k.word != "ekonomi"));
    }

    #[test]
    fn single_document_still_produces_topics() {
        // every term has df == N here, so all scores are negative but finite
        let out = compute_top_keywords(&[item("Rupiah Melemah Tajam", 0)], now(), default_stopwords());
        assert!(!out.is_empty());
    }

    #[test]
    fn undated_items_count_as_stale() {
        let mut old = item("Obligasi", 0);
        old.published_at = None;
        let items = vec![old, item("Dividen", 0), item("Rupiah Tajam", 0), item("Ekspor Turun", 0)];
        let s = scores(&items);
        assert!(s["dividen"] > s["obligasi"]);
    }

    #[test]
    fn count_is_rounded_weighted_frequency() {
        let items = vec![
            item("Emas Antam Melonjak", 0),
            item("Emas Antam Stabil", 0),
            item("Emas Antam Koreksi", 0),
            item("Rupiah Melemah", 0),
            item("Ekspor Turun", 0),
            item("Suku Bunga", 0),
            item("Obligasi Negara", 0),
            item("Saham Bank", 0),
        ];
        let out = compute_top_keywords(&items, now(), default_stopwords());
        let kw = out.iter().find(|k| k.word == "emas antam").expect("emas antam selected");
        assert_eq!(kw.count, 4); // 3 x 1.3
    }

    #[test]
    fn output_invariants_hold_on_a_market_day() {
        let items = market_day();
        let stop = default_stopwords();
        let (_, selected) = rank_topics(&items, now(), stop);
        let out = compute_top_keywords(&items, now(), stop);

        assert!(out.len() <= MAX_KEYWORDS);
        assert_eq!(out.len(), selected.len());
        assert!(selected.windows(2).all(|w| w[0].score >= w[1].score));

        for (i, a) in out.iter().enumerate() {
            for b in &out[i + 1..] {
                assert!(term_words(&a.word).is_disjoint(&term_words(&b.word)), "{} vs {}", a.word, b.word);
            }
        }

        for k in &out {
            let words: Vec<&str> = k.word.split(' ').collect();
            assert!(words.iter().all(|w| !stop.contains(*w)));
            match words.len() {
                1 => assert!(UNIGRAM_LEN.contains(&words[0].len())),
                2 => assert!(words.iter().all(|w| BIGRAM_WORD_LEN.contains(&w.len()))),
                n => panic!("unexpected {}-gram {}", n, k.word),
            }
            assert!(!k.word.contains("cdata"));
        }
    }

    #[test]
    fn ranking_is_deterministic() {
        let items = market_day();
        let first = compute_top_keywords(&items, now(), default_stopwords());
        for _ in 0..5 {
            assert_eq!(compute_top_keywords(&items, now(), default_stopwords()), first);
        }
    }

    #[test]
    fn equal_weighted_totals_tie_break_lexically_in_any_order() {
        // alfa and beta both total 0.7 + 1.0 + 0.4, reached in different orders
        let mut items = vec![
            item("Beta", 8),
            item("Alfa", 0),
            item("Beta", 13),
            item("Alfa", 13),
            item("Beta", 0),
            item("Alfa", 8),
        ];
        for t in ["Kripto", "Obligasi", "Dividen", "Ekspor", "Inflasi", "Rupiah"] {
            items.push(item(t, 0));
        }
        let mut reversed = items.clone();
        reversed.reverse();

        let a = compute_top_keywords(&items, now(), default_stopwords());
        let b = compute_top_keywords(&reversed, now(), default_stopwords());
        assert_eq!(a, b);
        assert_eq!(a[0], Keyword { word: "alfa".into(), count: 2 });
        assert_eq!(a[1], Keyword { word: "beta".into(), count: 2 });

        let s = scores(&items);
        assert_eq!(s["alfa"], s["beta"]);
    }

    #[test]
    fn document_order_does_not_matter() {
        let items = market_day();
        let mut reversed = items.clone();
        reversed.reverse();
        let a = compute_top_keywords(&items, now(), default_stopwords());
        let b = compute_top_keywords(&reversed, now(), default_stopwords());
        let words = |v: &[Keyword]| v.iter().map(|k| k.word.clone()).collect::<Vec<_>>();
        assert_eq!(words(&a), words(&b));
    }
}
