//! Top-level driver wiring the record store, matcher, retrieval, and ranking together.

use std::sync::Arc;

use serde::Serialize;

use ccdr_config::Config;
use ccdr_domain::{Outcome, Query, Record};
use ccdr_storage::feedback_log::FeedbackLogEntry;

use crate::{
	EmbeddingProvider, Error, RecordStore, Result,
	matcher::{EcmMatcher, Matcher},
	ranking::{RankingService, RankingSettings, ScoredTag, scorer::DiagonalTrainer},
	retrieval::{CandidateRetrieval, CandidateSource},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
	pub indexed: usize,
	pub skipped: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
	pub query_hash: String,
	pub tags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScoredSearch {
	pub query_hash: String,
	pub generation: u64,
	pub source: CandidateSource,
	pub items: Vec<ScoredTag>,
}

pub struct Index {
	store: Arc<dyn RecordStore>,
	matcher: Arc<dyn Matcher>,
	retrieval: CandidateRetrieval,
	ranking: Arc<RankingService>,
}
impl Index {
	pub fn new(
		store: Arc<dyn RecordStore>,
		matcher: Arc<dyn Matcher>,
		retrieval: CandidateRetrieval,
		ranking: Arc<RankingService>,
	) -> Self {
		Self { store, matcher, retrieval, ranking }
	}

	pub fn from_config(
		cfg: &Config,
		store: Arc<dyn RecordStore>,
		embedder: Arc<dyn EmbeddingProvider>,
	) -> Result<Self> {
		let retrieval = CandidateRetrieval::from_config(&cfg.retrieval)?;
		let ranking = RankingService::new(
			embedder,
			Arc::new(DiagonalTrainer::new(&cfg.ranking.training)),
			RankingSettings::from_config(cfg),
		);

		Ok(Self::new(
			store,
			Arc::new(EcmMatcher::new(cfg.matcher.distance_threshold)),
			retrieval,
			Arc::new(ranking),
		))
	}

	pub fn ranking(&self) -> &Arc<RankingService> {
		&self.ranking
	}

	/// Indexes every record in the store. Records that fail to decode or embed are skipped.
	pub async fn init_from_store(&self) -> Result<InitReport> {
		let stored = self.store.all().await?;
		let mut report = InitReport::default();

		for entry in stored {
			let outcome = match entry.record {
				Ok(record) => self.index_record(&entry.tag, &record).await,
				Err(err) => Err(Error::from(err)),
			};

			match outcome {
				Ok(()) => report.indexed += 1,
				Err(err) => {
					tracing::warn!(tag = %entry.tag, error = %err, "Skipping record during initial indexing.");

					report.skipped += 1;
				},
			}
		}

		tracing::info!(indexed = report.indexed, skipped = report.skipped, "Initial indexing finished.");

		Ok(report)
	}

	pub async fn add_record(&self, tag: &str) -> Result<()> {
		let record = self.store.get(tag).await?;

		self.index_record(tag, &record).await?;

		tracing::info!(tag, "Record indexed.");

		Ok(())
	}

	/// Re-reads the record and replaces its embedding and cluster placement.
	pub async fn update_record(&self, tag: &str) -> Result<()> {
		let record = self.store.get(tag).await?;

		self.index_record(tag, &record).await?;

		tracing::info!(tag, "Record reindexed.");

		Ok(())
	}

	pub fn remove_record(&self, tag: &str) -> Result<()> {
		let cached = self.ranking.on_record_removed(tag);
		let clustered = self.matcher.remove(tag);

		if !cached && !clustered {
			return Err(Error::NotFound { message: format!("record {tag} is not indexed") });
		}

		tracing::info!(tag, "Record removed from the index.");

		Ok(())
	}

	/// Returns tags ordered by descending relevance. A zero `limit` returns every candidate.
	pub async fn search(&self, query: &str, limit: usize) -> Result<SearchResults> {
		let scored = self.search_scored(query, limit).await?;

		Ok(SearchResults {
			query_hash: scored.query_hash,
			tags: scored.items.into_iter().map(|item| item.tag).collect(),
		})
	}

	pub async fn search_scored(&self, query: &str, limit: usize) -> Result<ScoredSearch> {
		let query = Query::new(query);

		if query.normalized.is_empty() {
			return Err(Error::InvalidRequest { message: "Query must be non-empty.".to_string() });
		}

		let candidates = self.retrieval.candidates(&query, self.matcher.as_ref());
		let mut ranked = self.ranking.rank(&query, &candidates.tags).await?;

		if limit > 0 {
			ranked.items.truncate(limit);
		}

		tracing::debug!(
			query_hash = %query.hash,
			candidates = candidates.tags.len(),
			results = ranked.items.len(),
			generation = ranked.generation,
			"Search served."
		);

		Ok(ScoredSearch {
			query_hash: query.hash,
			generation: ranked.generation,
			source: candidates.source,
			items: ranked.items,
		})
	}

	pub fn feedback(&self, query_hash: &str, tag: &str, outcome: Outcome) -> Result<()> {
		if !self.ranking.is_cached(tag) {
			return Err(Error::NotFound { message: format!("record {tag} is not indexed") });
		}

		self.ranking.record_feedback(query_hash, tag, outcome)
	}

	/// Replays a feedback log recorded by an earlier run. Returns the number of accepted items.
	pub async fn replay_feedback(&self, entries: &[FeedbackLogEntry]) -> usize {
		let mut accepted = 0;

		for entry in entries {
			let query = Query::new(entry.query.as_str());

			if let Err(err) = self.ranking.prime_query(&query).await {
				tracing::warn!(query = %entry.query, error = %err, "Skipping feedback log entry.");

				continue;
			}

			for item in &entry.feedbacks {
				match self.feedback(&query.hash, &item.equipment_id, item.outcome) {
					Ok(()) => accepted += 1,
					Err(err) => {
						tracing::warn!(
							tag = %item.equipment_id,
							error = %err,
							"Skipping feedback log item."
						);
					},
				}
			}
		}

		tracing::info!(accepted, "Feedback log replayed.");

		accepted
	}

	async fn index_record(&self, tag: &str, record: &Record) -> Result<()> {
		let embedding = self.ranking.on_record_added(tag, record).await?;

		self.matcher.index(tag, &record.kind, &embedding);

		Ok(())
	}
}
