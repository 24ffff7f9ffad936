use dashmap::DashMap;
use moka::{policy::EvictionPolicy, sync::Cache};

use crate::Embedding;

/// Concurrent embedding caches keyed by record tag and by query content hash.
///
/// Record vectors live as long as the record is indexed. Query vectors and the vectors pinned
/// for pending feedback are each bounded by the query capacity and evict least recently used
/// entries, so a fresh query is always cached.
pub struct EmbeddingCache {
	records: DashMap<String, Embedding>,
	queries: Cache<String, Embedding>,
	pinned: Cache<String, Embedding>,
}
impl EmbeddingCache {
	pub fn new(query_capacity: usize) -> Self {
		Self {
			records: DashMap::new(),
			queries: bounded(query_capacity),
			pinned: bounded(query_capacity),
		}
	}

	pub fn record(&self, tag: &str) -> Option<Embedding> {
		self.records.get(tag).map(|entry| entry.value().clone())
	}

	pub fn contains_record(&self, tag: &str) -> bool {
		self.records.contains_key(tag)
	}

	pub fn insert_record(&self, tag: &str, embedding: Embedding) {
		self.records.insert(tag.to_string(), embedding);
	}

	pub fn remove_record(&self, tag: &str) -> bool {
		self.records.remove(tag).is_some()
	}

	pub fn record_count(&self) -> usize {
		self.records.len()
	}

	pub fn tags(&self) -> Vec<String> {
		self.records.iter().map(|entry| entry.key().clone()).collect()
	}

	pub fn query(&self, hash: &str) -> Option<Embedding> {
		self.queries.get(hash)
	}

	pub fn insert_query(&self, hash: &str, embedding: Embedding) {
		self.queries.insert(hash.to_string(), embedding);
	}

	pub fn query_count(&self) -> usize {
		self.queries.run_pending_tasks();

		self.queries.entry_count() as usize
	}

	/// Keeps the embedding of a query that has pending feedback.
	pub fn pin_query(&self, hash: &str, embedding: Embedding) {
		self.pinned.insert(hash.to_string(), embedding);
	}

	pub fn pinned_query(&self, hash: &str) -> Option<Embedding> {
		self.pinned.get(hash)
	}

	pub fn unpin_query(&self, hash: &str) {
		self.pinned.invalidate(hash);
	}

	pub fn pinned_count(&self) -> usize {
		self.pinned.run_pending_tasks();

		self.pinned.entry_count() as usize
	}
}

fn bounded(capacity: usize) -> Cache<String, Embedding> {
	Cache::builder()
		.max_capacity(capacity as u64)
		.eviction_policy(EvictionPolicy::lru())
		.build()
}
