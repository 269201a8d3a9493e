use citesearch_core::tokenizer::tokenize;
use citesearch_core::{CorpusSource, EngineConfig, IndexSnapshot, NewDocument};
use criterion::{criterion_group, criterion_main, Criterion};

const WORDS: &[&str] = &[
    "trie", "tree", "graph", "search", "index", "merge", "sort", "hash", "table", "node", "edge", "rank",
    "query", "term", "token", "document", "prefix", "balanced", "storage", "retrieval",
];

fn corpus(n: usize) -> Vec<NewDocument> {
    (0..n)
        .map(|i| {
            let body: Vec<&str> = (0..200).map(|j| WORDS[(i * 7 + j * 13) % WORDS.len()]).collect();
            let cite = format!(" see https://bench.local/{}", (i * 31) % n);
            NewDocument::new(
                format!("{} {}", WORDS[i % WORDS.len()], WORDS[(i / 3) % WORDS.len()]),
                format!("https://bench.local/{i}"),
                body.join(" ") + &cite,
            )
        })
        .collect()
}

fn bench_tokenize(c: &mut Criterion) {
    let text = corpus(1).remove(0).content;
    c.bench_function("tokenize_document", |b| b.iter(|| tokenize(&text)));
}

fn bench_build(c: &mut Criterion) {
    let docs = corpus(500);
    c.bench_function("build_500_docs", |b| {
        b.iter(|| IndexSnapshot::build(CorpusSource::Documents(docs.clone()), EngineConfig::default()))
    });
}

fn bench_search(c: &mut Criterion) {
    let snap = IndexSnapshot::build(CorpusSource::Documents(corpus(1000)), EngineConfig::default()).expect("corpus builds");
    c.bench_function("search_two_terms", |b| b.iter(|| snap.search("merge tree", 10)));
    c.bench_function("autocomplete_prefix", |b| b.iter(|| snap.autocomplete("t", 5)));
}

criterion_group!(benches, bench_tokenize, bench_build, bench_search);
criterion_main!(benches);
