use crate::authority::PageRankParams;
use crate::error::{EngineError, Result};
use crate::graph::CitationRules;
use crate::store::LoadOptions;
use crate::tokenizer::TokenizerOptions;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Everything that shapes a build. Missing JSON fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tokenizer: TokenizerOptions,
    pub load: LoadOptions,
    pub citation: CitationRules,
    pub pagerank: PageRankParams,
    /// How strongly authority lifts relevance: `relevance * (1 + w * authority * N)`.
    pub authority_weight: f64,
    pub snippet_chars: usize,
    pub snippet_lead_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerOptions::default(),
            load: LoadOptions::default(),
            citation: CitationRules::default(),
            pagerank: PageRankParams::default(),
            authority_weight: 0.5,
            snippet_chars: 150,
            snippet_lead_chars: 50,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let mut f = File::open(path).with_context(|| format!("reading config {}", path.display()))?;
        let mut buf = String::new();
        f.read_to_string(&mut buf).with_context(|| format!("reading config {}", path.display()))?;
        let config: EngineConfig =
            serde_json::from_str(&buf).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.pagerank.validate()?;
        self.citation.validate().map_err(EngineError::InvalidConfig)?;
        if !(self.authority_weight >= 0.0 && self.authority_weight.is_finite()) {
            return Err(EngineError::InvalidConfig(format!("authority_weight must be a finite non-negative number, got {}", self.authority_weight)));
        }
        if self.snippet_chars == 0 {
            return Err(EngineError::InvalidConfig("snippet_chars must be at least 1".into()));
        }
        if self.snippet_lead_chars >= self.snippet_chars {
            return Err(EngineError::InvalidConfig(format!(
                "snippet_lead_chars ({}) must be smaller than snippet_chars ({})",
                self.snippet_lead_chars, self.snippet_chars
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "pagerank": { "damping": 0.9 }, "load": { "policy": "fail_fast" } }"#).unwrap();
        assert_eq!(config.pagerank.damping, 0.9);
        assert_eq!(config.pagerank.max_iterations, 100);
        assert_eq!(config.load.policy, crate::store::LoadPolicy::FailFast);
        assert_eq!(config.snippet_chars, 150);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let bad = EngineConfig { authority_weight: -1.0, ..Default::default() };
        assert!(matches!(bad.validate(), Err(EngineError::InvalidConfig(_))));
        let mut bad = EngineConfig::default();
        bad.citation.title_coverage = 0.0;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn snippet_lead_must_fit_inside_the_window() {
        let bad = EngineConfig { snippet_chars: 40, snippet_lead_chars: 40, ..Default::default() };
        assert!(matches!(bad.validate(), Err(EngineError::InvalidConfig(msg)) if msg.contains("snippet_lead_chars")));
        let ok = EngineConfig { snippet_chars: 40, snippet_lead_chars: 39, ..Default::default() };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn config_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = EngineConfig::from_json_file(&missing).unwrap_err();
        assert!(format!("{err}").contains("missing.json"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let err = EngineConfig::from_json_file(&broken).unwrap_err();
        assert!(format!("{err}").contains("broken.json"));
    }
}
