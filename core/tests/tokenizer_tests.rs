use citesearch_core::tokenizer::{tokenize, Tokenizer, TokenizerOptions};

#[test]
fn it_normalizes_and_splits_on_punctuation() {
    let words = tokenize("Running Runners RUN! The café's menu.");
    assert_eq!(words, vec!["running", "runners", "run", "the", "café", "s", "menu"]);
}

#[test]
fn it_applies_nfkc_normalization() {
    // Full-width letters and the "ﬁ" ligature fold to plain ASCII.
    assert_eq!(tokenize("ＲＵＳＴ ﬁle"), vec!["rust", "file"]);
}

#[test]
fn it_is_deterministic() {
    let text = "B+ Trees are balanced; B-trees, too.";
    assert_eq!(tokenize(text), tokenize(text));
    assert_eq!(tokenize(text), vec!["b", "trees", "are", "balanced", "b", "trees", "too"]);
}

#[test]
fn it_filters_stopwords_and_stems_when_asked() {
    let t = Tokenizer::new(TokenizerOptions { stem: true, remove_stopwords: true });
    let words = t.tokenize("The quick brown fox and the lazy dogs");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert!(words.contains(&"dog".to_string()));
}
