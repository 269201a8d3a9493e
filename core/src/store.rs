use crate::error::{EngineError, Result};
use crate::format::{self, DocumentFormat, NewDocument, ParseContext};
use crate::tokenizer::Tokenizer;
use crate::DocId;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Where the corpus comes from.
#[derive(Debug, Clone)]
pub enum CorpusSource {
    /// A file or a directory walked recursively; files are visited in name order.
    Directory(PathBuf),
    /// Documents already in memory, in id order.
    Documents(Vec<NewDocument>),
}

/// What to do with a document that cannot be read or parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPolicy {
    /// Log it, record it in the [`LoadReport`], keep loading.
    #[default]
    Skip,
    /// Abort the load with [`EngineError::CorpusLoad`].
    FailFast,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    pub policy: LoadPolicy,
    /// Prefix for urls of documents that do not declare one.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: Vec<SkippedDocument>,
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub url: String,
    pub title: String,
    pub content: String,
    pub links: Vec<String>,
    pub format: DocumentFormat,
    /// Title tokens followed by content tokens.
    pub tokens: Vec<String>,
    pub term_freqs: HashMap<String, u32>,
}

impl Document {
    fn new(id: DocId, doc: NewDocument, tokenizer: &Tokenizer) -> Self {
        let mut tokens = tokenizer.tokenize(&doc.title);
        tokens.extend(tokenizer.tokenize(&doc.content));
        let mut term_freqs: HashMap<String, u32> = HashMap::new();
        for t in &tokens {
            *term_freqs.entry(t.clone()).or_insert(0) += 1;
        }
        Self {
            id,
            url: doc.url,
            title: doc.title,
            content: doc.content,
            links: doc.links,
            format: doc.format,
            tokens,
            term_freqs,
        }
    }

    /// Number of tokens, the length used to normalize term frequency.
    pub fn len(&self) -> usize { self.tokens.len() }

    pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

    pub fn term_frequency(&self, term: &str) -> u32 {
        self.term_freqs.get(term).copied().unwrap_or(0)
    }
}

#[derive(Debug, Default)]
pub struct DocumentStore {
    docs: Vec<Document>,
}

impl DocumentStore {
    /// Read the corpus, assign ids in discovery order and tokenize every document.
    pub fn load(source: CorpusSource, options: &LoadOptions, tokenizer: &Tokenizer) -> Result<(Self, LoadReport)> {
        let mut report = LoadReport::default();
        let mut accepted = Vec::new();
        let entries = match source {
            CorpusSource::Directory(root) => read_directory(&root, options, &mut report)?,
            CorpusSource::Documents(docs) => docs
                .into_iter()
                .enumerate()
                .map(|(i, d)| (PathBuf::from(format!("<memory>#{i}")), d))
                .collect(),
        };
        for (path, doc) in entries {
            if doc.is_blank() {
                reject(options.policy, &mut report, path, "document has neither title nor content")?;
                continue;
            }
            accepted.push(doc);
        }
        if accepted.is_empty() {
            return Err(EngineError::EmptyCorpus);
        }
        report.loaded = accepted.len();
        Ok((Self::from_documents(accepted, tokenizer), report))
    }

    /// Tokenize documents in parallel; ids follow the input order.
    pub fn from_documents(docs: Vec<NewDocument>, tokenizer: &Tokenizer) -> Self {
        let docs = docs
            .into_par_iter()
            .enumerate()
            .map(|(i, d)| Document::new(i as DocId, d, tokenizer))
            .collect();
        Self { docs }
    }

    pub fn get(&self, id: DocId) -> Option<&Document> { self.docs.get(id as usize) }

    pub fn documents(&self) -> &[Document] { &self.docs }

    pub fn len(&self) -> usize { self.docs.len() }

    pub fn is_empty(&self) -> bool { self.docs.is_empty() }
}

fn reject(policy: LoadPolicy, report: &mut LoadReport, path: PathBuf, reason: impl ToString) -> Result<()> {
    let reason = reason.to_string();
    match policy {
        LoadPolicy::FailFast => Err(EngineError::corpus_load(path, reason)),
        LoadPolicy::Skip => {
            tracing::warn!(path = %path.display(), %reason, "skipping document");
            report.skipped.push(SkippedDocument { path, reason });
            Ok(())
        }
    }
}

fn read_directory(root: &Path, options: &LoadOptions, report: &mut LoadReport) -> Result<Vec<(PathBuf, NewDocument)>> {
    let meta = fs::metadata(root).map_err(|source| EngineError::Io { path: root.to_path_buf(), source })?;
    let base = if meta.is_dir() { root } else { root.parent().unwrap_or(root) };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        match entry {
            Ok(e) if e.file_type().is_file() => files.push(e.into_path()),
            Ok(_) => {}
            Err(err) => {
                let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                reject(options.policy, report, path, err)?;
            }
        }
    }

    let mut out = Vec::new();
    for path in files {
        let Some(format) = DocumentFormat::from_path(&path) else {
            tracing::debug!(path = %path.display(), "ignoring file with unknown extension");
            continue;
        };
        let raw = match fs::read(&path).map_err(|e| e.to_string()).and_then(|b| String::from_utf8(b).map_err(|_| "not valid UTF-8".to_string())) {
            Ok(raw) => raw,
            Err(reason) => {
                reject(options.policy, report, path, reason)?;
                continue;
            }
        };
        let rel_path = path.strip_prefix(base).unwrap_or(&path).to_string_lossy().replace('\\', "/");
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let ctx = ParseContext { rel_path: &rel_path, stem: &stem, base_url: options.base_url.as_deref() };
        match format::parse(format, &raw, &ctx) {
            Ok(records) => {
                for record in records {
                    match record {
                        Ok(doc) => out.push((path.clone(), doc)),
                        Err(reason) => reject(options.policy, report, path.clone(), reason)?,
                    }
                }
            }
            Err(reason) => reject(options.policy, report, path, reason)?,
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn ids_follow_file_name_order() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "Second\nbeta words").unwrap();
        fs::write(dir.path().join("a.txt"), "First\nalpha words").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();
        let (store, report) =
            DocumentStore::load(CorpusSource::Directory(dir.path().into()), &LoadOptions::default(), &Tokenizer::default()).unwrap();
        assert_eq!(report.loaded, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(store.get(0).unwrap().title, "First");
        assert_eq!(store.get(1).unwrap().title, "Second");
        assert_eq!(store.get(0).unwrap().tokens, vec!["first", "alpha", "words"]);
        assert_eq!(store.get(0).unwrap().term_frequency("words"), 1);
    }

    #[test]
    fn skip_policy_reports_bad_documents() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{ not json").unwrap();
        fs::write(dir.path().join("binary.txt"), [0xffu8, 0xfe, 0x00]).unwrap();
        fs::write(dir.path().join("good.txt"), "Good\ncontent").unwrap();
        let (store, report) =
            DocumentStore::load(CorpusSource::Directory(dir.path().into()), &LoadOptions::default(), &Tokenizer::default()).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(report.skipped.len(), 2);
    }

    #[test]
    fn fail_fast_policy_aborts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.json"), "[1, 2]").unwrap();
        fs::write(dir.path().join("b.txt"), "Good\ncontent").unwrap();
        let options = LoadOptions { policy: LoadPolicy::FailFast, base_url: None };
        let err = DocumentStore::load(CorpusSource::Directory(dir.path().into()), &options, &Tokenizer::default()).unwrap_err();
        assert!(matches!(err, EngineError::CorpusLoad { .. }));
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let dir = tempdir().unwrap();
        let err = DocumentStore::load(CorpusSource::Directory(dir.path().into()), &LoadOptions::default(), &Tokenizer::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyCorpus));

        let blank = vec![NewDocument::new("  ", "u", "")];
        let err = DocumentStore::load(CorpusSource::Documents(blank), &LoadOptions::default(), &Tokenizer::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyCorpus));
    }

    #[test]
    fn missing_root_is_io_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = DocumentStore::load(CorpusSource::Directory(missing), &LoadOptions::default(), &Tokenizer::default()).unwrap_err();
        assert!(matches!(err, EngineError::Io { .. }));
    }
}
