//! Feedback accumulated between retraining runs.

use std::{
	collections::{HashMap, HashSet},
	sync::Mutex,
};

use ccdr_domain::Outcome;

#[derive(Debug, Clone)]
pub struct FeedbackEntry {
	pub seq: u64,
	pub tag: String,
	pub outcome: Outcome,
}

/// Consistent copy of the accumulator at one point in time.
#[derive(Debug, Clone)]
pub struct FeedbackSnapshot {
	pub by_query: HashMap<String, Vec<FeedbackEntry>>,
}
impl FeedbackSnapshot {
	pub fn len(&self) -> usize {
		self.by_query.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

/// Result of dropping consumed feedback.
#[derive(Debug, Default)]
pub struct Pruned {
	pub entries: usize,
	/// Query hashes left without any pending feedback.
	pub drained: Vec<String>,
}

#[derive(Default)]
struct FeedbackLog {
	next_seq: u64,
	by_query: HashMap<String, Vec<FeedbackEntry>>,
}

#[derive(Default)]
pub struct FeedbackAccumulator {
	inner: Mutex<FeedbackLog>,
}
impl FeedbackAccumulator {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&self, query_hash: &str, tag: &str, outcome: Outcome) {
		let mut log = self.inner.lock().unwrap_or_else(|err| err.into_inner());
		let seq = log.next_seq;

		log.next_seq += 1;
		log.by_query
			.entry(query_hash.to_string())
			.or_default()
			.push(FeedbackEntry { seq, tag: tag.to_string(), outcome });
	}

	pub fn snapshot(&self) -> FeedbackSnapshot {
		let log = self.inner.lock().unwrap_or_else(|err| err.into_inner());

		FeedbackSnapshot { by_query: log.by_query.clone() }
	}

	/// Drops the entries whose sequence number is in `consumed`. Everything else is kept.
	pub fn prune_consumed(&self, consumed: &HashSet<u64>) -> Pruned {
		let mut log = self.inner.lock().unwrap_or_else(|err| err.into_inner());
		let mut pruned = Pruned::default();

		log.by_query.retain(|hash, entries| {
			let before = entries.len();

			entries.retain(|entry| !consumed.contains(&entry.seq));
			pruned.entries += before - entries.len();

			if entries.is_empty() {
				pruned.drained.push(hash.clone());

				return false;
			}

			true
		});

		pruned
	}

	pub fn contains_query(&self, query_hash: &str) -> bool {
		let log = self.inner.lock().unwrap_or_else(|err| err.into_inner());

		log.by_query.contains_key(query_hash)
	}

	pub fn len(&self) -> usize {
		let log = self.inner.lock().unwrap_or_else(|err| err.into_inner());

		log.by_query.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
