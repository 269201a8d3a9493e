use crate::tokenizer::normalize;
use std::collections::BTreeMap;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Default)]
struct TrieNode {
    key: Option<char>,
    parent: Option<NodeId>,
    children: BTreeMap<char, NodeId>,
    /// Set when a term ends here.
    weight: Option<u64>,
}

/// Prefix tree over weighted terms. Nodes live in one arena and refer to each other by index.
#[derive(Debug)]
pub struct Trie {
    nodes: Vec<TrieNode>,
    len: usize,
}

impl Default for Trie {
    fn default() -> Self { Self::new() }
}

impl Trie {
    pub fn new() -> Self {
        Self { nodes: vec![TrieNode::default()], len: 0 }
    }

    /// Build from `(term, weight)` pairs. A term given twice accumulates its weights.
    pub fn build<I, S>(vocabulary: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let mut trie = Self::new();
        for (term, weight) in vocabulary {
            trie.insert(term.as_ref(), weight);
        }
        trie
    }

    fn insert(&mut self, term: &str, weight: u64) {
        if term.is_empty() { return; }
        let mut node = ROOT;
        for ch in term.chars() {
            node = match self.nodes[node].children.get(&ch).copied() {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(TrieNode { key: Some(ch), parent: Some(node), ..Default::default() });
                    self.nodes[node].children.insert(ch, child);
                    child
                }
            };
        }
        let slot = &mut self.nodes[node].weight;
        if slot.is_none() { self.len += 1; }
        *slot = Some(slot.unwrap_or(0) + weight);
    }

    fn find(&self, prefix: &str) -> Option<NodeId> {
        prefix.chars().try_fold(ROOT, |node, ch| self.nodes[node].children.get(&ch).copied())
    }

    pub fn weight(&self, term: &str) -> Option<u64> {
        self.find(term).and_then(|n| self.nodes[n].weight)
    }

    pub fn contains(&self, term: &str) -> bool { self.weight(term).is_some() }

    /// Number of distinct terms.
    pub fn len(&self) -> usize { self.len }

    pub fn is_empty(&self) -> bool { self.len == 0 }

    /// Up to `limit` terms starting with `prefix`, heaviest first, ties in lexicographic order.
    ///
    /// The prefix is trimmed and normalized like index terms. An empty prefix or one that
    /// matches nothing yields an empty list.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Vec<String> {
        let prefix = normalize(prefix.trim());
        if prefix.is_empty() || limit == 0 { return Vec::new(); }
        let Some(start) = self.find(&prefix) else { return Vec::new() };

        let mut found: Vec<(u64, String)> = Vec::new();
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            let n = &self.nodes[node];
            if let Some(w) = n.weight {
                found.push((w, self.term_at(node)));
            }
            stack.extend(n.children.values().copied());
        }
        found.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
        found.truncate(limit);
        found.into_iter().map(|(_, term)| term).collect()
    }

    /// Rebuild the term ending at `node` by walking parent links up to the root.
    fn term_at(&self, mut node: NodeId) -> String {
        let mut chars = Vec::new();
        while let Some(ch) = self.nodes[node].key {
            chars.push(ch);
            node = match self.nodes[node].parent {
                Some(p) => p,
                None => break,
            };
        }
        chars.iter().rev().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_by_weight_then_term() {
        let trie = Trie::build([("search", 10), ("set", 3), ("seattle", 7), ("other", 50)]);
        assert_eq!(trie.suggest("se", 3), vec!["search", "seattle", "set"]);
        assert_eq!(trie.suggest("se", 2), vec!["search", "seattle"]);
    }

    #[test]
    fn equal_weights_break_ties_alphabetically() {
        let trie = Trie::build([("tree", 2), ("trie", 2), ("trees", 2), ("tries", 5)]);
        assert_eq!(trie.suggest("tr", 10), vec!["tries", "tree", "trees", "trie"]);
    }

    #[test]
    fn limit_larger_than_matches_returns_all() {
        let trie = Trie::build([("graph", 1), ("graphs", 1)]);
        assert_eq!(trie.suggest("gra", 100), vec!["graph", "graphs"]);
    }

    #[test]
    fn empty_or_absent_prefix_is_empty() {
        let trie = Trie::build([("alpha", 1)]);
        assert!(trie.suggest("", 5).is_empty());
        assert!(trie.suggest("   ", 5).is_empty());
        assert!(trie.suggest("zz", 5).is_empty());
        assert!(trie.suggest("alpha", 0).is_empty());
    }

    #[test]
    fn prefix_is_normalized() {
        let trie = Trie::build([("merge", 4)]);
        assert_eq!(trie.suggest("  MER ", 5), vec!["merge"]);
        assert_eq!(trie.suggest("merge", 5), vec!["merge"]);
    }

    #[test]
    fn duplicate_terms_accumulate() {
        let trie = Trie::build([("sort", 2), ("sort", 3)]);
        assert_eq!(trie.weight("sort"), Some(5));
        assert_eq!(trie.len(), 1);
        assert!(!trie.contains("sor"));
    }
}
