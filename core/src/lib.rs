//! In-memory document search engine: term index, prefix autocomplete, and
//! citation-graph authority scores blended into ranked full-text search.
//!
//! Everything is built once into an immutable [`IndexSnapshot`]. A
//! [`SearchEngine`] publishes the current snapshot and swaps in a new one on
//! rebuild.

pub mod authority;
pub mod config;
pub mod engine;
pub mod error;
pub mod format;
pub mod graph;
pub mod index;
pub mod query;
pub mod snippet;
pub mod store;
pub mod tokenizer;
pub mod trie;

pub type DocId = u32;

pub use authority::{AuthorityScores, PageRankParams};
pub use config::EngineConfig;
pub use engine::{IndexSnapshot, SearchEngine, SnapshotStats};
pub use error::EngineError;
pub use format::{DocumentFormat, NewDocument};
pub use graph::{CitationEdge, CitationGraph, CitationKind, CitationRules};
pub use index::{InvertedIndex, Posting};
pub use query::{SearchHit, SearchPage};
pub use snippet::Snippet;
pub use store::{CorpusSource, Document, DocumentStore, LoadOptions, LoadPolicy, LoadReport};
pub use tokenizer::{tokenize, Tokenizer, TokenizerOptions};
pub use trie::Trie;
