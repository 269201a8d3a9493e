use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    /// Maximal runs of letters and digits. Everything else, punctuation included, is a boundary.
    pub(crate) static ref WORD_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","cannot","could",
            "did","do","does","doing","down","during",
            "each","few","for","from","further",
            "had","has","have","having","he","her","here","hers","herself","him","himself","his","how",
            "i","if","in","into","is","it","its","itself",
            "me","more","most","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","should","so","some","such",
            "than","that","the","their","theirs","them","themselves","then","there","these","they","this","those","through","to","too",
            "under","until","up","very",
            "was","we","were","what","when","where","which","while","who","whom","why","with","would",
            "you","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
}

pub fn is_stopword(token: &str) -> bool { STOPWORDS.contains(token) }

/// Optional stages layered on top of the base normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenizerOptions {
    /// Reduce terms to their Snowball English stem.
    pub stem: bool,
    /// Drop common English function words.
    pub remove_stopwords: bool,
}

/// Turns raw text into index terms. Indexing, querying and snippet matching
/// must share one instance so that terms line up.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tokenizer {
    options: TokenizerOptions,
}

impl Tokenizer {
    pub fn new(options: TokenizerOptions) -> Self { Self { options } }

    pub fn options(&self) -> TokenizerOptions { self.options }

    /// NFKC normalize, lowercase, split on non-alphanumeric characters, then apply the optional stages.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = normalize(text);
        WORD_RE
            .find_iter(&normalized)
            .filter_map(|m| self.finish_term(m.as_str()))
            .collect()
    }

    /// Normalize a single word as it would appear in the index, or `None` if it is dropped.
    pub fn normalize_term(&self, word: &str) -> Option<String> {
        let normalized = normalize(word);
        let word = WORD_RE.find(&normalized)?.as_str();
        self.finish_term(word)
    }

    fn finish_term(&self, token: &str) -> Option<String> {
        if token.is_empty() { return None; }
        if self.options.remove_stopwords && is_stopword(token) { return None; }
        if self.options.stem {
            Some(STEMMER.stem(token).into_owned())
        } else {
            Some(token.to_string())
        }
    }
}

pub(crate) fn normalize(text: &str) -> String {
    text.nfkc().collect::<String>().to_lowercase()
}

/// Tokenize with the default options: no stemming, no stopword removal.
pub fn tokenize(text: &str) -> Vec<String> {
    Tokenizer::default().tokenize(text)
}
