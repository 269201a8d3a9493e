use crate::engine::IndexSnapshot;
use crate::snippet::{build_snippet, Snippet};
use crate::DocId;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub url: String,
    pub title: String,
    pub snippet: Snippet,
    /// Relevance blended with authority; the sort key.
    pub score: f64,
    pub relevance: f64,
    pub authority: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchPage {
    /// Matching documents before truncation to `top_k`.
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
}

/// `relevance * (1 + weight * authority * num_docs)`. Scaling by the corpus size makes an
/// average document (authority `1/N`) get a boost of exactly `1 + weight`.
pub fn combined_score(relevance: f64, authority: f64, num_docs: usize, weight: f64) -> f64 {
    relevance * (1.0 + weight * authority * num_docs as f64)
}

impl IndexSnapshot {
    /// Ranked documents for `query`, at most `top_k` of them.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        self.search_page(query, top_k).hits
    }

    /// Like [`search`](Self::search) but also reports how many documents matched.
    pub fn search_page(&self, query: &str, top_k: usize) -> SearchPage {
        let terms = self.query_terms(query);
        if terms.is_empty() {
            return SearchPage::default();
        }

        // relevance = sum over distinct query terms of tf(t, d) / |d|
        let mut relevance: HashMap<DocId, f64> = HashMap::new();
        for term in &terms {
            for p in self.index().lookup(term) {
                let len = self.document(p.doc_id).map_or(1, |d| d.len().max(1));
                *relevance.entry(p.doc_id).or_insert(0.0) += p.frequency as f64 / len as f64;
            }
        }

        let num_docs = self.documents().len();
        let weight = self.config.authority_weight;
        let mut ranked: Vec<(DocId, f64, f64, f64)> = relevance
            .into_iter()
            .map(|(doc_id, rel)| {
                let auth = self.authority().get(doc_id);
                (doc_id, combined_score(rel, auth, num_docs, weight), rel, auth)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        let total_hits = ranked.len();
        ranked.truncate(top_k);

        let term_set: HashSet<String> = terms.into_iter().collect();
        let hits = ranked
            .into_iter()
            .filter_map(|(doc_id, score, relevance, authority)| {
                let doc = self.document(doc_id)?;
                let snippet = build_snippet(
                    &doc.content,
                    &term_set,
                    &self.tokenizer,
                    self.config.snippet_chars,
                    self.config.snippet_lead_chars,
                );
                Some(SearchHit { doc_id, url: doc.url.clone(), title: doc.title.clone(), snippet, score, relevance, authority })
            })
            .collect();
        SearchPage { total_hits, hits }
    }

    /// Distinct query terms in first-occurrence order.
    fn query_terms(&self, query: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.tokenizer
            .tokenize(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect()
    }
}
