use crate::authority::{self, AuthorityScores};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::graph::CitationGraph;
use crate::index::InvertedIndex;
use crate::query::SearchHit;
use crate::store::{CorpusSource, Document, DocumentStore, LoadReport};
use crate::tokenizer::Tokenizer;
use crate::trie::Trie;
use crate::DocId;
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use time::format_description::well_known::Rfc3339;

/// A fully built, read-only view of the corpus. Every query runs against one snapshot.
#[derive(Debug)]
pub struct IndexSnapshot {
    pub(crate) config: EngineConfig,
    pub(crate) tokenizer: Tokenizer,
    store: DocumentStore,
    index: InvertedIndex,
    trie: Trie,
    graph: CitationGraph,
    authority: AuthorityScores,
    report: LoadReport,
    built_at: String,
    build_secs: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStats {
    pub num_docs: usize,
    pub num_terms: usize,
    pub num_edges: usize,
    pub skipped_docs: usize,
    pub authority_iterations: usize,
    pub authority_converged: bool,
    pub authority_delta: f64,
    pub built_at: String,
    pub build_secs: f64,
}

impl IndexSnapshot {
    /// Run the whole build phase. The term indexes and the citation graph are built side by side.
    pub fn build(source: CorpusSource, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let start = Instant::now();
        let tokenizer = Tokenizer::new(config.tokenizer);
        let (store, report) = DocumentStore::load(source, &config.load, &tokenizer)?;
        tracing::info!(num_docs = store.len(), skipped = report.skipped.len(), "loaded corpus");

        let docs = store.documents();
        let ((index, trie), (graph, authority)) = rayon::join(
            || {
                let index = InvertedIndex::build(docs);
                let trie = Trie::build(index.vocabulary());
                (index, trie)
            },
            || {
                let graph = CitationGraph::build(docs, &config.citation, &tokenizer);
                let authority = authority::score(&graph, &config.pagerank);
                (graph, authority)
            },
        );

        let build_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            num_docs = store.len(),
            num_terms = index.num_terms(),
            num_edges = graph.num_edges(),
            iterations = authority.iterations,
            converged = authority.converged,
            build_secs,
            "index build complete"
        );
        let built_at = time::OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
        Ok(Self { config, tokenizer, store, index, trie, graph, authority, report, built_at, build_secs })
    }

    /// Completions for `prefix`, most frequent terms first.
    pub fn autocomplete(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.trie.suggest(prefix, limit)
    }

    pub fn document(&self, id: DocId) -> Option<&Document> { self.store.get(id) }

    pub fn documents(&self) -> &[Document] { self.store.documents() }

    pub fn index(&self) -> &InvertedIndex { &self.index }

    pub fn trie(&self) -> &Trie { &self.trie }

    pub fn graph(&self) -> &CitationGraph { &self.graph }

    pub fn authority(&self) -> &AuthorityScores { &self.authority }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn load_report(&self) -> &LoadReport { &self.report }

    pub fn stats(&self) -> SnapshotStats {
        SnapshotStats {
            num_docs: self.store.len(),
            num_terms: self.index.num_terms(),
            num_edges: self.graph.num_edges(),
            skipped_docs: self.report.skipped.len(),
            authority_iterations: self.authority.iterations,
            authority_converged: self.authority.converged,
            authority_delta: self.authority.delta,
            built_at: self.built_at.clone(),
            build_secs: self.build_secs,
        }
    }
}

/// Publishes the current [`IndexSnapshot`]. Readers grab an `Arc` and never block a rebuild.
#[derive(Debug)]
pub struct SearchEngine {
    config: EngineConfig,
    current: RwLock<Arc<IndexSnapshot>>,
}

impl SearchEngine {
    pub fn initialize(source: CorpusSource, config: EngineConfig) -> Result<Self> {
        let snapshot = IndexSnapshot::build(source, config.clone())?;
        Ok(Self { config, current: RwLock::new(Arc::new(snapshot)) })
    }

    pub fn snapshot(&self) -> Arc<IndexSnapshot> { self.current.read().clone() }

    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        self.snapshot().search(query, top_k)
    }

    pub fn autocomplete(&self, prefix: &str, limit: usize) -> Vec<String> {
        self.snapshot().autocomplete(prefix, limit)
    }

    /// Build a new snapshot off to the side and publish it in one step.
    /// On error the previous snapshot stays in place.
    pub fn rebuild(&self, source: CorpusSource) -> Result<Arc<IndexSnapshot>> {
        let fresh = Arc::new(IndexSnapshot::build(source, self.config.clone())?);
        *self.current.write() = fresh.clone();
        Ok(fresh)
    }

    pub fn config(&self) -> &EngineConfig { &self.config }
}
