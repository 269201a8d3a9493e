//! Citation edges between documents.
//!
//! An edge `s -> t` (s != t) is derived from document content by two fixed rules:
//!
//! * **reference**: one of `s`'s outbound links names `t`'s url (trailing `/` ignored,
//!   fragment dropped from absolute urls). Corpus-relative urls keep their fragment, which
//!   tells records of one JSON file apart; a relative link whose fragment names no document
//!   falls back to the page without it;
//! * **title mention**: `t`'s title has at least `min_title_terms` significant terms
//!   (`min_term_len` chars or longer, not stopwords) and at least `title_coverage` of
//!   them occur in `s`.
//!
//! A pair matching both rules gets a single `Reference` edge. Authority scores depend
//! entirely on these rules, so the thresholds live in [`CitationRules`].

use crate::store::Document;
use crate::tokenizer::{is_stopword, Tokenizer};
use crate::DocId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    Reference,
    TitleMention,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CitationEdge {
    pub source: DocId,
    pub target: DocId,
    pub kind: CitationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationRules {
    pub explicit_references: bool,
    pub title_mentions: bool,
    pub min_title_terms: usize,
    /// Fraction in `(0, 1]` of the target's significant title terms the source must contain.
    pub title_coverage: f64,
    pub min_term_len: usize,
}

impl Default for CitationRules {
    fn default() -> Self {
        Self { explicit_references: true, title_mentions: true, min_title_terms: 1, title_coverage: 1.0, min_term_len: 3 }
    }
}

impl CitationRules {
    pub fn validate(&self) -> Result<(), String> {
        if !(self.title_coverage > 0.0 && self.title_coverage <= 1.0) {
            return Err(format!("citation.title_coverage must be in (0, 1], got {}", self.title_coverage));
        }
        if self.min_title_terms == 0 {
            return Err("citation.min_title_terms must be at least 1".into());
        }
        Ok(())
    }
}

/// Directed graph over every document id in `0..num_nodes`, isolated ones included.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CitationGraph {
    num_nodes: usize,
    edges: Vec<CitationEdge>,
    outgoing: Vec<Vec<DocId>>,
}

impl CitationGraph {
    pub fn build(docs: &[Document], rules: &CitationRules, tokenizer: &Tokenizer) -> Self {
        let mut by_url: HashMap<String, Vec<DocId>> = HashMap::new();
        if rules.explicit_references {
            for doc in docs {
                by_url.entry(normalize_url(&doc.url)).or_default().push(doc.id);
            }
        }
        let title_terms: Vec<BTreeSet<String>> = docs
            .iter()
            .map(|d| significant_terms(&d.title, rules, tokenizer))
            .collect();

        let mut edges = Vec::new();
        for source in docs {
            let mut cited: BTreeMap<DocId, CitationKind> = BTreeMap::new();
            if rules.explicit_references {
                for link in &source.links {
                    let Some(targets) = lookup(&by_url, link) else { continue };
                    for &t in targets.iter().filter(|&&t| t != source.id) {
                        cited.insert(t, CitationKind::Reference);
                    }
                }
            }
            if rules.title_mentions {
                for (target, terms) in docs.iter().zip(&title_terms) {
                    if target.id == source.id || terms.len() < rules.min_title_terms { continue; }
                    let present = terms.iter().filter(|t| source.term_freqs.contains_key(t.as_str())).count();
                    if present as f64 >= rules.title_coverage * terms.len() as f64 {
                        cited.entry(target.id).or_insert(CitationKind::TitleMention);
                    }
                }
            }
            edges.extend(cited.into_iter().map(|(target, kind)| CitationEdge { source: source.id, target, kind }));
        }
        Self::from_edges(docs.len(), edges)
    }

    /// Graph from explicit edges. Self-loops, duplicate pairs and out-of-range ids are dropped.
    pub fn from_edges(num_nodes: usize, edges: impl IntoIterator<Item = CitationEdge>) -> Self {
        let mut outgoing: Vec<Vec<DocId>> = vec![Vec::new(); num_nodes];
        let mut kept = Vec::new();
        for e in edges {
            let (s, t) = (e.source as usize, e.target as usize);
            if s == t || s >= num_nodes || t >= num_nodes || outgoing[s].contains(&e.target) { continue; }
            outgoing[s].push(e.target);
            kept.push(e);
        }
        Self { num_nodes, edges: kept, outgoing }
    }

    pub fn num_nodes(&self) -> usize { self.num_nodes }

    pub fn num_edges(&self) -> usize { self.edges.len() }

    pub fn edges(&self) -> &[CitationEdge] { &self.edges }

    pub fn outgoing(&self, id: DocId) -> &[DocId] {
        self.outgoing.get(id as usize).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn out_degree(&self, id: DocId) -> usize { self.outgoing(id).len() }

    /// Number of documents citing `id`.
    pub fn in_degree(&self, id: DocId) -> usize {
        self.edges.iter().filter(|e| e.target == id).count()
    }
}

fn significant_terms(title: &str, rules: &CitationRules, tokenizer: &Tokenizer) -> BTreeSet<String> {
    title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= rules.min_term_len && !is_stopword(&w.to_lowercase()))
        .filter_map(|w| tokenizer.normalize_term(w))
        .collect()
}

fn normalize_url(raw: &str) -> String {
    let raw = raw.trim();
    match Url::parse(raw) {
        Ok(mut u) => {
            u.set_fragment(None);
            u.to_string().trim_end_matches('/').to_string()
        }
        Err(_) => match raw.split_once('#') {
            Some((page, frag)) => format!("{}#{}", page.trim_end_matches('/'), frag),
            None => raw.trim_end_matches('/').to_string(),
        },
    }
}

fn lookup<'a>(by_url: &'a HashMap<String, Vec<DocId>>, link: &str) -> Option<&'a Vec<DocId>> {
    let key = normalize_url(link);
    by_url
        .get(&key)
        .or_else(|| key.split_once('#').and_then(|(page, _)| by_url.get(page)))
}
