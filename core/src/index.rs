use crate::store::Document;
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub frequency: u32,
}

/// Term to postings map. Postings are sorted by doc_id because documents are visited in id order.
#[derive(Debug, Default)]
pub struct InvertedIndex {
    postings: HashMap<String, Vec<Posting>>,
    num_docs: u32,
}

impl InvertedIndex {
    pub fn build(docs: &[Document]) -> Self {
        let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
        for doc in docs {
            let mut seen: HashSet<&str> = HashSet::with_capacity(doc.term_freqs.len());
            for term in &doc.tokens {
                if !seen.insert(term.as_str()) { continue; }
                let frequency = doc.term_frequency(term);
                postings.entry(term.clone()).or_default().push(Posting { doc_id: doc.id, frequency });
            }
        }
        Self { postings, num_docs: docs.len() as u32 }
    }

    /// Postings for `term`; empty when the term is unknown.
    pub fn lookup(&self, term: &str) -> &[Posting] {
        self.postings.get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document_frequency(&self, term: &str) -> usize { self.lookup(term).len() }

    /// Total occurrences of `term` across the corpus.
    pub fn collection_frequency(&self, term: &str) -> u64 {
        self.lookup(term).iter().map(|p| p.frequency as u64).sum()
    }

    /// Every term with its collection frequency, in no particular order.
    pub fn vocabulary(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.postings
            .iter()
            .map(|(term, list)| (term.as_str(), list.iter().map(|p| p.frequency as u64).sum()))
    }

    pub fn num_terms(&self) -> usize { self.postings.len() }

    pub fn num_docs(&self) -> u32 { self.num_docs }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NewDocument;
    use crate::store::DocumentStore;
    use crate::tokenizer::Tokenizer;

    fn store() -> DocumentStore {
        DocumentStore::from_documents(
            vec![
                NewDocument::new("Rust", "u0", "rust is great, rust systems programming"),
                NewDocument::new("Learning", "u1", "learning rust"),
                NewDocument::new("Other", "u2", "nothing here"),
            ],
            &Tokenizer::default(),
        )
    }

    #[test]
    fn postings_are_in_doc_order_with_frequencies() {
        let store = store();
        let index = InvertedIndex::build(store.documents());
        assert_eq!(
            index.lookup("rust"),
            &[Posting { doc_id: 0, frequency: 3 }, Posting { doc_id: 1, frequency: 1 }]
        );
        assert_eq!(index.document_frequency("rust"), 2);
        assert_eq!(index.collection_frequency("rust"), 4);
        assert_eq!(index.num_docs(), 3);
    }

    #[test]
    fn unknown_term_is_empty() {
        let store = store();
        let index = InvertedIndex::build(store.documents());
        assert!(index.lookup("nonexistent_term_xyz").is_empty());
        assert_eq!(index.collection_frequency("missing"), 0);
    }

    #[test]
    fn vocabulary_covers_every_term() {
        let store = store();
        let index = InvertedIndex::build(store.documents());
        let total: u64 = index.vocabulary().map(|(_, w)| w).sum();
        let tokens: usize = store.documents().iter().map(|d| d.len()).sum();
        assert_eq!(total, tokens as u64);
        assert_eq!(index.vocabulary().count(), index.num_terms());
    }
}
