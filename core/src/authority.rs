//! PageRank over the citation graph.

use crate::error::{EngineError, Result};
use crate::graph::CitationGraph;
use crate::DocId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankParams {
    /// Probability of following a citation rather than jumping to a random document.
    pub damping: f64,
    pub max_iterations: usize,
    /// Convergence threshold on the L1 distance between successive score vectors.
    pub epsilon: f64,
}

impl Default for PageRankParams {
    fn default() -> Self {
        Self { damping: 0.85, max_iterations: 100, epsilon: 1e-6 }
    }
}

impl PageRankParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.damping) {
            return Err(EngineError::InvalidConfig(format!("pagerank.damping must be in [0, 1), got {}", self.damping)));
        }
        if !(self.epsilon > 0.0) {
            return Err(EngineError::InvalidConfig(format!("pagerank.epsilon must be positive, got {}", self.epsilon)));
        }
        if self.max_iterations == 0 {
            return Err(EngineError::InvalidConfig("pagerank.max_iterations must be at least 1".into()));
        }
        Ok(())
    }
}

/// One score per document, summing to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorityScores {
    scores: Vec<f64>,
    pub iterations: usize,
    /// L1 distance between the last two iterates.
    pub delta: f64,
    /// False when `max_iterations` was reached first; the scores are then the last iterate.
    pub converged: bool,
}

impl AuthorityScores {
    /// Score of `id`, 0.0 for an unknown id.
    pub fn get(&self, id: DocId) -> f64 { self.scores.get(id as usize).copied().unwrap_or(0.0) }

    pub fn as_slice(&self) -> &[f64] { &self.scores }

    pub fn len(&self) -> usize { self.scores.len() }

    pub fn is_empty(&self) -> bool { self.scores.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, f64)> + '_ {
        self.scores.iter().enumerate().map(|(i, &s)| (i as DocId, s))
    }

    /// The `n` highest scored documents, ties by id.
    pub fn top(&self, n: usize) -> Vec<(DocId, f64)> {
        let mut all: Vec<(DocId, f64)> = self.iter().collect();
        all.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        all.truncate(n);
        all
    }
}

/// Power iteration from the uniform vector.
///
/// Each round every node gets `(1 - d) / N`, a document with citations passes `d` times its
/// score evenly to the documents it cites, and the scores of documents citing nothing are
/// spread over all N nodes. Total mass stays 1.
pub fn score(graph: &CitationGraph, params: &PageRankParams) -> AuthorityScores {
    let n = graph.num_nodes();
    if n == 0 {
        return AuthorityScores { scores: Vec::new(), iterations: 0, delta: 0.0, converged: true };
    }
    let nf = n as f64;
    let d = params.damping;
    let teleport = (1.0 - d) / nf;

    let mut current = vec![1.0 / nf; n];
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut delta = f64::INFINITY;
    let mut converged = false;

    while iterations < params.max_iterations {
        iterations += 1;
        let dangling: f64 = (0..n)
            .filter(|&i| graph.out_degree(i as DocId) == 0)
            .map(|i| current[i])
            .sum();
        next.fill(teleport + d * dangling / nf);
        for (src, &mass) in current.iter().enumerate() {
            let targets = graph.outgoing(src as DocId);
            if targets.is_empty() { continue; }
            let share = d * mass / targets.len() as f64;
            for &t in targets {
                next[t as usize] += share;
            }
        }
        delta = current.iter().zip(&next).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut current, &mut next);
        if delta < params.epsilon {
            converged = true;
            break;
        }
    }

    // Absorb floating point drift so the published vector sums to 1.
    let total: f64 = current.iter().sum();
    if total > 0.0 {
        current.iter_mut().for_each(|s| *s /= total);
    }
    if !converged {
        tracing::warn!(iterations, delta, "authority scores did not converge");
    }
    AuthorityScores { scores: current, iterations, delta, converged }
}
