use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static CDATA_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<!\[CDATA\[|\]\]>").unwrap());
static NON_WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9_\s]").unwrap());

/// Tokens of this length or shorter never reach the n-gram extractor.
pub const MIN_TOKEN_LEN: usize = 3;

/// Split a headline into lowercase ASCII word tokens, dropping short tokens and stop words.
///
/// Anything outside `[A-Za-z0-9_]` acts as a separator, so accented letters split words.
pub fn normalize_title(title: &str, stop_words: &HashSet<String>) -> Vec<String> {
    let lowered = title.to_lowercase();
    let stripped = CDATA_RE.replace_all(&lowered, "");
    let spaced = NON_WORD_RE.replace_all(&stripped, " ");

    spaced
        .split_whitespace()
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !stop_words.contains(*t))
        .map(str::to_string)
        .collect()
}

/// Fillers common in Indonesian business headlines, plus short English glue words.
pub fn default_stopwords() -> &'static HashSet<String> {
    static SET: Lazy<HashSet<String>> = Lazy::new(|| {
        let words = [
            // headline fillers
            "gara", "juta", "video", "jadi", "tembus", "harga",
            // indonesian
            "yang", "dan", "di", "ke", "dari", "ini", "itu", "dengan", "untuk", "pada",
            "adalah", "akan", "telah", "atau", "bisa", "dapat", "sudah", "juga", "oleh",
            "dalam", "tidak", "ada", "hal", "saat", "lebih", "seperti", "antara", "karena",
            "sebagai", "tersebut", "bahwa", "saya", "kami",
            "soal", "buka", "suara", "kata", "beri", "usai", "kali", "per", "hingga",
            "agar", "atas", "bagi", "pun", "kini", "masih", "sekitar", "bila", "meski",
            // english
            "the", "and", "for", "are", "but", "not", "you", "all", "can", "her", "was",
            "one", "our", "out", "day", "get", "has", "him", "his", "how", "man", "new",
            "now", "old", "see", "two", "way", "who", "boy", "did", "its", "let", "put",
            "say", "she", "too", "use",
        ];
        words.iter().map(|s| s.to_string()).collect()
    });
    &SET
}

/// Space-separated words of a term, as a set.
pub fn term_words(term: &str) -> HashSet<&str> {
    term.split(' ').filter(|w| !w.is_empty()).collect()
}
