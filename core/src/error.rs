use std::path::PathBuf;

/// Build-phase failures. Query-phase operations never fail; they return empty results instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to load document {path}: {reason}")]
    CorpusLoad { path: PathBuf, reason: String },
    #[error("corpus contains no loadable documents")]
    EmptyCorpus,
    #[error("invalid engine configuration: {0}")]
    InvalidConfig(String),
    #[error("cannot read corpus at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    pub(crate) fn corpus_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        EngineError::CorpusLoad { path: path.into(), reason: reason.to_string() }
    }
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
