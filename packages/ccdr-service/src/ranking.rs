//! Embedding-based ranking with online feedback and hot-swapped models.
//!
//! The serving model sits behind a read-write lock that is held only long enough to clone an
//! `Arc`, so a ranking call scores every candidate against one model even if a swap lands while
//! it runs. Retraining builds the replacement off to the side and publishes it with a single
//! write, and at most one retraining run is in flight at a time.

pub mod cache;
pub mod feedback;
pub mod scorer;

use std::{
	collections::HashSet,
	sync::{
		Arc, RwLock,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration,
};

use serde::Serialize;

use ccdr_config::Config;
use ccdr_domain::{Outcome, Query, Record, render};

use crate::{
	Embedding, EmbeddingProvider, Error, Result,
	ranking::{
		cache::EmbeddingCache,
		feedback::FeedbackAccumulator,
		scorer::{CosineScorer, Scorer, ScorerTrainer, TrainingExample, TrainingSnapshot},
	},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackRetention {
	Retain,
	Prune,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
	Click,
	Relevance,
}
impl OutcomeKind {
	pub fn label(self) -> &'static str {
		match self {
			Self::Click => "click",
			Self::Relevance => "relevance",
		}
	}
}

#[derive(Debug, Clone)]
pub struct RankingSettings {
	pub embed_timeout: Duration,
	pub retention: FeedbackRetention,
	pub outcome: OutcomeKind,
	pub query_cache_capacity: usize,
}
impl RankingSettings {
	pub fn from_config(cfg: &Config) -> Self {
		let retention = match cfg.ranking.feedback_retention.as_str() {
			"prune" => FeedbackRetention::Prune,
			_ => FeedbackRetention::Retain,
		};
		let outcome = match cfg.ranking.outcome.as_str() {
			"relevance" => OutcomeKind::Relevance,
			_ => OutcomeKind::Click,
		};

		Self {
			embed_timeout: Duration::from_millis(cfg.providers.embedding.timeout_ms),
			retention,
			outcome,
			query_cache_capacity: cfg.ranking.query_cache_capacity as usize,
		}
	}
}
impl Default for RankingSettings {
	fn default() -> Self {
		Self {
			embed_timeout: Duration::from_secs(5),
			retention: FeedbackRetention::Retain,
			outcome: OutcomeKind::Click,
			query_cache_capacity: 10_000,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredTag {
	pub tag: String,
	pub score: f32,
}

/// Candidates ordered by descending score, with the model generation that scored them.
#[derive(Debug, Clone)]
pub struct RankedCandidates {
	pub generation: u64,
	pub items: Vec<ScoredTag>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetrainOutcome {
	Swapped { generation: u64, examples: usize },
	/// Another run held the retraining slot.
	Skipped,
	/// No feedback could be joined with cached embeddings.
	NoFeedback,
	/// The previous model keeps serving.
	Failed { message: String },
}

struct ServingModel {
	generation: u64,
	scorer: Arc<dyn Scorer>,
}

pub struct RankingService {
	embedder: Arc<dyn EmbeddingProvider>,
	trainer: Arc<dyn ScorerTrainer>,
	settings: RankingSettings,
	cache: EmbeddingCache,
	feedback: FeedbackAccumulator,
	model: RwLock<Arc<ServingModel>>,
	next_generation: AtomicU64,
	retrain_slot: tokio::sync::Mutex<()>,
}
impl RankingService {
	pub fn new(
		embedder: Arc<dyn EmbeddingProvider>,
		trainer: Arc<dyn ScorerTrainer>,
		settings: RankingSettings,
	) -> Self {
		Self {
			embedder,
			trainer,
			cache: EmbeddingCache::new(settings.query_cache_capacity),
			settings,
			feedback: FeedbackAccumulator::new(),
			model: RwLock::new(Arc::new(ServingModel { generation: 0, scorer: Arc::new(CosineScorer) })),
			next_generation: AtomicU64::new(1),
			retrain_slot: tokio::sync::Mutex::new(()),
		}
	}

	pub fn generation(&self) -> u64 {
		self.current_model().generation
	}

	pub fn cached_records(&self) -> usize {
		self.cache.record_count()
	}

	pub fn is_cached(&self, tag: &str) -> bool {
		self.cache.contains_record(tag)
	}

	pub fn pending_feedback(&self) -> usize {
		self.feedback.len()
	}

	pub fn cached_queries(&self) -> usize {
		self.cache.query_count()
	}

	/// Number of query embeddings held for pending feedback.
	pub fn pinned_queries(&self) -> usize {
		self.cache.pinned_count()
	}

	/// Renders and embeds the record, replacing any cached vector for the tag.
	pub async fn on_record_added(&self, tag: &str, record: &Record) -> Result<Embedding> {
		let text = render(record);
		let embedding = self.embed_text(text).await?;

		self.cache.insert_record(tag, embedding.clone());

		Ok(embedding)
	}

	pub fn on_record_removed(&self, tag: &str) -> bool {
		self.cache.remove_record(tag)
	}

	/// Scores candidates against one model snapshot. Candidates without a cached vector are
	/// dropped and ties keep their input order.
	pub async fn rank(&self, query: &Query, candidates: &[String]) -> Result<RankedCandidates> {
		if candidates.is_empty() {
			return Ok(RankedCandidates { generation: self.generation(), items: Vec::new() });
		}

		let query_embedding = self.query_embedding(query).await?;
		let model = self.current_model();
		let mut items = Vec::with_capacity(candidates.len());

		for tag in candidates {
			match self.candidate_embedding(tag) {
				Ok(embedding) => items.push(ScoredTag {
					tag: tag.clone(),
					score: model.scorer.score(&query_embedding, &embedding),
				}),
				Err(err) => tracing::warn!(error = %err, "Dropping candidate from ranking."),
			}
		}

		items.sort_by(|a, b| cmp_f32_desc(a.score, b.score));

		Ok(RankedCandidates { generation: model.generation, items })
	}

	pub fn record_feedback(&self, query_hash: &str, tag: &str, outcome: Outcome) -> Result<()> {
		if outcome.kind() != self.settings.outcome.label() {
			return Err(Error::InvalidRequest {
				message: format!(
					"Expected a {} outcome but received {}.",
					self.settings.outcome.label(),
					outcome.kind()
				),
			});
		}
		if let Outcome::Relevance(score) = outcome
			&& !score.is_finite()
		{
			return Err(Error::InvalidRequest {
				message: "Relevance outcome must be a finite number.".to_string(),
			});
		}

		self.feedback.record(query_hash, tag, outcome);

		if self.cache.pinned_query(query_hash).is_none() {
			match self.cache.query(query_hash) {
				Some(embedding) => self.cache.pin_query(query_hash, embedding),
				None => tracing::warn!(
					query_hash,
					"Feedback refers to a query without a cached embedding. It will not train until the query is seen."
				),
			}
		}

		Ok(())
	}

	/// Embeds `query` so feedback recorded against its hash can be trained on.
	pub async fn prime_query(&self, query: &Query) -> Result<()> {
		let embedding = self.query_embedding(query).await?;

		self.cache.pin_query(&query.hash, embedding);

		Ok(())
	}

	/// Trains a replacement model from the current feedback and swaps it in.
	///
	/// Never returns an error: failures are logged and the serving model is kept.
	pub async fn retrain_and_swap(&self) -> RetrainOutcome {
		let Ok(_slot) = self.retrain_slot.try_lock() else {
			tracing::debug!("Retraining already in progress. Skipping.");

			return RetrainOutcome::Skipped;
		};

		match self.retrain().await {
			Ok(outcome) => outcome,
			Err(err) => {
				tracing::error!(error = %err, "Retraining failed. Keeping the serving model.");

				RetrainOutcome::Failed { message: err.to_string() }
			},
		}
	}

	async fn retrain(&self) -> Result<RetrainOutcome> {
		let feedback = self.feedback.snapshot();
		let mut examples = Vec::with_capacity(feedback.len());
		let mut consumed = HashSet::new();
		let mut hashes = feedback.by_query.keys().collect::<Vec<_>>();

		hashes.sort();

		for hash in hashes {
			let Some(query) = self.training_query(hash) else {
				continue;
			};

			for entry in &feedback.by_query[hash] {
				let Some(candidate) = self.cache.record(&entry.tag) else {
					continue;
				};

				examples.push(TrainingExample {
					query: query.clone(),
					candidate,
					target: entry.outcome.target(),
				});
				consumed.insert(entry.seq);
			}
		}

		if examples.is_empty() {
			tracing::debug!(pending = feedback.len(), "No trainable feedback. Skipping retraining.");

			return Ok(RetrainOutcome::NoFeedback);
		}

		let example_count = examples.len();

		tracing::info!(examples = example_count, "Retraining started.");

		let snapshot = Arc::new(TrainingSnapshot { examples, tags: self.cache.tags() });
		let scorer = self
			.trainer
			.train(snapshot)
			.await
			.map_err(|err| Error::RetrainFailed { message: err.to_string() })?;
		let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);

		{
			let mut model = self.model.write().unwrap_or_else(|err| err.into_inner());

			*model = Arc::new(ServingModel { generation, scorer });
		}

		if self.settings.retention == FeedbackRetention::Prune {
			let pruned = self.feedback.prune_consumed(&consumed);

			for hash in &pruned.drained {
				self.cache.unpin_query(hash);
			}

			tracing::debug!(
				pruned = pruned.entries,
				released = pruned.drained.len(),
				"Pruned consumed feedback."
			);
		}

		tracing::info!(generation, examples = example_count, "Swapped in retrained model.");

		Ok(RetrainOutcome::Swapped { generation, examples: example_count })
	}

	fn current_model(&self) -> Arc<ServingModel> {
		self.model.read().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn candidate_embedding(&self, tag: &str) -> Result<Embedding> {
		self.cache.record(tag).ok_or_else(|| Error::UnknownCandidate { tag: tag.to_string() })
	}

	fn training_query(&self, hash: &str) -> Option<Embedding> {
		self.cache.pinned_query(hash).or_else(|| self.cache.query(hash))
	}

	/// Serves the query embedding from the cache or the embedder. A query that has pending
	/// feedback but lost its pinned embedding gets it back here.
	async fn query_embedding(&self, query: &Query) -> Result<Embedding> {
		let embedding = match self.cache.query(&query.hash) {
			Some(embedding) => embedding,
			None => {
				let embedding = self.embed_text(query.normalized.clone()).await?;

				self.cache.insert_query(&query.hash, embedding.clone());

				embedding
			},
		};

		if self.cache.pinned_query(&query.hash).is_none() && self.feedback.contains_query(&query.hash)
		{
			self.cache.pin_query(&query.hash, embedding.clone());
		}

		Ok(embedding)
	}

	async fn embed_text(&self, text: String) -> Result<Embedding> {
		let texts = [text];
		let timeout = self.settings.embed_timeout;
		let vectors = tokio::time::timeout(timeout, self.embedder.embed(&texts))
			.await
			.map_err(|_| Error::EmbeddingTimeout { timeout_ms: timeout.as_millis() as u64 })?
			.map_err(|err| Error::EmbeddingUnavailable { message: err.to_string() })?;
		let Some(vector) = vectors.into_iter().next() else {
			return Err(Error::EmbeddingUnavailable {
				message: "Provider returned no vectors.".to_string(),
			});
		};

		if vector.is_empty() {
			return Err(Error::EmbeddingUnavailable {
				message: "Provider returned an empty vector.".to_string(),
			});
		}

		Ok(Arc::from(vector))
	}
}

pub fn cmp_f32_desc(a: f32, b: f32) -> std::cmp::Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => std::cmp::Ordering::Equal,
		(true, false) => std::cmp::Ordering::Greater,
		(false, true) => std::cmp::Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(std::cmp::Ordering::Equal),
	}
}
