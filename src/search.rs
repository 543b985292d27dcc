use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use serde_json::Value;
use tracing::debug;

use crate::config::SearchConfig;
use crate::graph::{Graph, Node};

pub type MatchSet = Arc<HashSet<String>>;

#[derive(Clone, Debug)]
struct IndexEntry {
    id: String,
    label: String,
    search_text: String,
}

impl IndexEntry {
    fn from_node(node: &Node) -> Self {
        let mut text = String::with_capacity(node.name.len() + node.id.len() + 32);
        for part in [&node.name, &node.id, &node.node_type, &node.category] {
            push_lowercase(&mut text, part);
        }
        for value in node.properties.values() {
            push_scalars(&mut text, value);
        }

        Self {
            id: node.id.clone(),
            label: node.display_label(),
            search_text: text,
        }
    }
}

fn push_lowercase(text: &mut String, part: &str) {
    if part.is_empty() {
        return;
    }
    if !text.is_empty() {
        // Separator keeps a query from matching across two fields.
        text.push('\u{1f}');
    }
    text.extend(part.chars().flat_map(char::to_lowercase));
}

fn push_scalars(text: &mut String, value: &Value) {
    match value {
        Value::String(inner) => push_lowercase(text, inner),
        Value::Number(number) => push_lowercase(text, &number.to_string()),
        Value::Bool(flag) => push_lowercase(text, if *flag { "true" } else { "false" }),
        Value::Array(items) => items.iter().for_each(|item| push_scalars(text, item)),
        Value::Object(map) => map.values().for_each(|item| push_scalars(text, item)),
        Value::Null => {}
    }
}

/// Immutable, fully built per-node text index for one graph revision.
#[derive(Clone, Debug, Default)]
pub struct SearchIndex {
    revision: u64,
    entries: Vec<IndexEntry>,
}

impl SearchIndex {
    pub fn build(graph: &Graph, revision: u64) -> Self {
        Self {
            revision,
            entries: graph.nodes().iter().map(IndexEntry::from_node).collect(),
        }
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids whose searchable text contains `term`, ignoring case. A blank term matches nothing.
    pub fn query(&self, term: &str) -> HashSet<String> {
        let needle = normalize_query(term);
        if needle.is_empty() {
            return HashSet::new();
        }

        self.entries
            .iter()
            .filter(|entry| entry.search_text.contains(&needle))
            .map(|entry| entry.id.clone())
            .collect()
    }
}

fn normalize_query(term: &str) -> String {
    term.trim().chars().flat_map(char::to_lowercase).collect()
}

/// Builds a [`SearchIndex`] a chunk of nodes at a time so large graphs do not stall a frame.
pub struct SearchIndexBuilder {
    graph: Arc<Graph>,
    revision: u64,
    next: usize,
    entries: Vec<IndexEntry>,
}

impl SearchIndexBuilder {
    pub fn new(graph: Arc<Graph>, revision: u64) -> Self {
        let capacity = graph.node_count();
        Self {
            graph,
            revision,
            next: 0,
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Indexes up to `chunk` more nodes. Returns the finished index once every node is covered.
    pub fn step(&mut self, chunk: usize) -> Option<SearchIndex> {
        let nodes = self.graph.nodes();
        let end = (self.next + chunk.max(1)).min(nodes.len());
        self.entries
            .extend(nodes[self.next..end].iter().map(IndexEntry::from_node));
        self.next = end;

        (self.next >= nodes.len()).then(|| SearchIndex {
            revision: self.revision,
            entries: std::mem::take(&mut self.entries),
        })
    }

    pub fn progress(&self) -> f32 {
        let total = self.graph.node_count();
        if total == 0 {
            1.0
        } else {
            self.next as f32 / total as f32
        }
    }
}

struct CachedMatches {
    revision: u64,
    matches: MatchSet,
}

/// Least-recently-used map from lowercased query to its match set.
pub struct QueryCache {
    capacity: usize,
    entries: HashMap<String, CachedMatches>,
    order: VecDeque<String>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &str, revision: u64) -> Option<MatchSet> {
        let cached = self.entries.get(key)?;
        if cached.revision != revision {
            return None;
        }
        let matches = Arc::clone(&cached.matches);
        self.touch(key);
        Some(matches)
    }

    fn insert(&mut self, key: String, revision: u64, matches: MatchSet) {
        if self.entries.contains_key(&key) {
            self.touch(&key);
        } else {
            while self.entries.len() >= self.capacity {
                let Some(oldest) = self.order.pop_front() else {
                    break;
                };
                self.entries.remove(&oldest);
            }
            self.order.push_back(key.clone());
        }
        self.entries.insert(key, CachedMatches { revision, matches });
    }

    fn touch(&mut self, key: &str) {
        if let Some(position) = self.order.iter().position(|entry| entry == key)
            && let Some(entry) = self.order.remove(position)
        {
            self.order.push_back(entry);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    pub id: String,
    pub label: String,
    pub score: i64,
}

/// Owns the published index snapshot, an in-progress rebuild and the query cache.
///
/// Queries always read the last fully built snapshot. While a rebuild is running, results come
/// from the previous snapshot and are not cached.
pub struct Searcher {
    snapshot: Arc<SearchIndex>,
    pending: Option<SearchIndexBuilder>,
    cache: QueryCache,
    matcher: SkimMatcherV2,
    chunk: usize,
}

impl Searcher {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            snapshot: Arc::new(SearchIndex::default()),
            pending: None,
            cache: QueryCache::new(config.cache_capacity),
            matcher: SkimMatcherV2::default(),
            chunk: config.index_chunk.max(1),
        }
    }

    /// Starts indexing a new graph. Cached results are dropped immediately.
    pub fn rebuild(&mut self, graph: Arc<Graph>, revision: u64) {
        debug!(revision, nodes = graph.node_count(), "search index rebuild started");
        self.cache.clear();
        self.pending = Some(SearchIndexBuilder::new(graph, revision));
    }

    /// Indexes a graph synchronously and publishes it.
    pub fn rebuild_now(&mut self, graph: &Graph, revision: u64) {
        self.cache.clear();
        self.pending = None;
        self.snapshot = Arc::new(SearchIndex::build(graph, revision));
    }

    /// Advances a pending rebuild by one chunk. Returns true when a new snapshot was published.
    pub fn step(&mut self) -> bool {
        let Some(builder) = self.pending.as_mut() else {
            return false;
        };
        let Some(index) = builder.step(self.chunk) else {
            return false;
        };

        debug!(revision = index.revision(), entries = index.len(), "search index published");
        self.snapshot = Arc::new(index);
        self.pending = None;
        self.cache.clear();
        true
    }

    pub fn is_building(&self) -> bool {
        self.pending.is_some()
    }

    pub fn build_progress(&self) -> f32 {
        self.pending
            .as_ref()
            .map_or(1.0, SearchIndexBuilder::progress)
    }

    pub fn cached_queries(&self) -> usize {
        self.cache.len()
    }

    /// Matching ids for `term`, served from the cache when possible.
    pub fn query(&mut self, term: &str) -> MatchSet {
        let key = normalize_query(term);
        if key.is_empty() {
            return Arc::new(HashSet::new());
        }

        let revision = self.snapshot.revision();
        if let Some(hit) = self.cache.get(&key, revision) {
            return hit;
        }

        let matches = Arc::new(self.snapshot.query(&key));
        if self.pending.is_none() {
            self.cache.insert(key, revision, Arc::clone(&matches));
        }
        matches
    }

    /// Substring matches ordered by fuzzy score on their display label, best first.
    pub fn ranked(&mut self, term: &str, limit: usize) -> Vec<Suggestion> {
        let matches = self.query(term);
        if matches.is_empty() {
            return Vec::new();
        }

        let query = term.trim();
        let mut suggestions = self
            .snapshot
            .entries
            .iter()
            .filter(|entry| matches.contains(&entry.id))
            .map(|entry| Suggestion {
                id: entry.id.clone(),
                label: entry.label.clone(),
                score: fuzzy_match_score(&self.matcher, &entry.label, query).unwrap_or(0),
            })
            .collect::<Vec<_>>();
        suggestions.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.label.cmp(&b.label)));
        suggestions.truncate(limit);
        suggestions
    }
}

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

/// Holds back the latest input until it has been stable for the configured interval.
#[derive(Debug)]
pub struct SearchDebouncer {
    interval: Duration,
    pending: Option<(String, Instant)>,
    applied: String,
}

impl SearchDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
            applied: String::new(),
        }
    }

    pub fn input(&mut self, term: &str, now: Instant) {
        if term == self.applied {
            self.pending = None;
            return;
        }
        self.pending = Some((term.to_string(), now));
    }

    /// Returns the new term once it has settled, at most once per change.
    pub fn poll(&mut self, now: Instant) -> Option<&str> {
        let (_, since) = self.pending.as_ref()?;
        if now.duration_since(*since) < self.interval {
            return None;
        }

        let (term, _) = self.pending.take()?;
        self.applied = term;
        Some(&self.applied)
    }

    /// Applies the pending term right away, e.g. on Enter.
    pub fn flush(&mut self) -> Option<&str> {
        let (term, _) = self.pending.take()?;
        self.applied = term;
        Some(&self.applied)
    }

    pub fn applied(&self) -> &str {
        &self.applied
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::normalize;

    fn graph() -> Graph {
        normalize(&json!({
            "nodes": [
                {"id": "a", "name": "Alice Cooper", "node_type": "Person", "city": "Detroit"},
                {"id": "b", "name": "Bob", "properties": {"employer": "Acme Corp"}},
                {"id": "c", "name": "Carol", "amount": 1200},
            ],
        }))
    }

    #[test]
    fn blank_terms_match_nothing() {
        let index = SearchIndex::build(&graph(), 1);
        assert!(index.query("").is_empty());
        assert!(index.query("   ").is_empty());
    }

    #[test]
    fn queries_cover_names_types_and_property_values() {
        let index = SearchIndex::build(&graph(), 1);
        assert_eq!(index.query("ALICE"), HashSet::from(["a".to_string()]));
        assert_eq!(index.query("person").len(), 3);
        assert_eq!(index.query("detroit"), HashSet::from(["a".to_string()]));
        assert_eq!(index.query("acme"), HashSet::from(["b".to_string()]));
        assert_eq!(index.query("1200"), HashSet::from(["c".to_string()]));
    }

    #[test]
    fn cache_serves_repeated_queries_and_evicts_oldest() {
        let mut searcher = Searcher::new(&SearchConfig {
            cache_capacity: 2,
            ..SearchConfig::default()
        });
        searcher.rebuild_now(&graph(), 1);

        let first = searcher.query("alice");
        let again = searcher.query("  Alice ");
        assert!(Arc::ptr_eq(&first, &again));

        searcher.query("bob");
        searcher.query("carol");
        assert_eq!(searcher.cached_queries(), 2);
        let refreshed = searcher.query("alice");
        assert!(!Arc::ptr_eq(&first, &refreshed));
    }

    #[test]
    fn chunked_rebuild_keeps_previous_snapshot_until_published() {
        let mut searcher = Searcher::new(&SearchConfig {
            index_chunk: 1,
            ..SearchConfig::default()
        });
        searcher.rebuild_now(&graph(), 1);

        let replacement = Arc::new(normalize(&json!({"nodes": [{"id": "z", "name": "Zed"}, {"id": "y"}]})));
        searcher.rebuild(replacement, 2);
        assert!(searcher.query("zed").is_empty());
        assert_eq!(searcher.query("alice").len(), 1);

        assert!(!searcher.step());
        assert!(searcher.step());
        assert!(!searcher.is_building());
        assert_eq!(searcher.query("zed").len(), 1);
        assert!(searcher.query("alice").is_empty());
    }

    #[test]
    fn ranked_suggestions_prefer_closer_labels() {
        let mut searcher = Searcher::new(&SearchConfig::default());
        let graph = normalize(&json!({
            "nodes": [
                {"id": "1", "name": "Health Ministry Fund"},
                {"id": "2", "name": "Health"},
                {"id": "3", "name": "Unrelated"},
            ],
        }));
        searcher.rebuild_now(&graph, 1);

        let suggestions = searcher.ranked("health", 5);
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.iter().all(|suggestion| suggestion.id != "3"));
        assert!(suggestions[0].score >= suggestions[1].score);
    }

    #[test]
    fn debouncer_waits_for_stable_input() {
        let start = Instant::now();
        let mut debouncer = SearchDebouncer::new(Duration::from_millis(150));
        debouncer.input("al", start);
        debouncer.input("ali", start + Duration::from_millis(100));
        assert_eq!(debouncer.poll(start + Duration::from_millis(200)), None);
        assert_eq!(
            debouncer.poll(start + Duration::from_millis(260)),
            Some("ali")
        );
        assert_eq!(debouncer.poll(start + Duration::from_millis(400)), None);
        assert_eq!(debouncer.applied(), "ali");
    }
}
