#![allow(dead_code)]

use std::{
	env,
	path::PathBuf,
	sync::{
		Arc,
		atomic::{AtomicU64, AtomicUsize, Ordering},
	},
	time::Duration,
};

use ccdr_config::KeywordRule;
use ccdr_domain::{Area, Record};
use ccdr_service::{
	BoxFuture, CandidateRetrieval, EcmMatcher, EmbeddingProvider, Index, KeywordTable,
	RankingService, RankingSettings, Scorer, ScorerTrainer, ranking::scorer::TrainingSnapshot,
};
use ccdr_storage::records::MemoryRecordStore;

static NEXT_PATH: AtomicU64 = AtomicU64::new(0);

/// Embeds text by topic so related records and queries land close together.
pub struct TopicEmbedding {
	pub calls: AtomicUsize,
}
impl TopicEmbedding {
	pub fn new() -> Self {
		Self { calls: AtomicUsize::new(0) }
	}
}
impl EmbeddingProvider for TopicEmbedding {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let vectors = texts.iter().map(|text| topic_vector(text)).collect();

		Box::pin(async move { Ok(vectors) })
	}
}

pub fn topic_vector(text: &str) -> Vec<f32> {
	let text = text.to_lowercase();
	let hit = |needle: &str| if text.contains(needle) { 1.0 } else { 0.0 };

	vec![hit("stadium"), hit("hospital"), hit("school"), 0.1]
}

pub struct SlowEmbedding {
	pub delay: Duration,
}
impl EmbeddingProvider for SlowEmbedding {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			Ok(texts.iter().map(|_| vec![1.0]).collect())
		})
	}
}

pub struct FailingEmbedding;
impl EmbeddingProvider for FailingEmbedding {
	fn embed<'a>(&'a self, _texts: &'a [String]) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("Provider is down.")) })
	}
}

pub struct ConstantScorer(pub f32);
impl Scorer for ConstantScorer {
	fn score(&self, _query: &[f32], _candidate: &[f32]) -> f32 {
		self.0
	}
}

/// Waits before returning a constant scorer, to hold a retraining run open.
pub struct SlowTrainer {
	pub delay: Duration,
	pub score: f32,
	pub runs: AtomicUsize,
}
impl SlowTrainer {
	pub fn new(delay: Duration, score: f32) -> Self {
		Self { delay, score, runs: AtomicUsize::new(0) }
	}
}
impl ScorerTrainer for SlowTrainer {
	fn train(&self, _snapshot: Arc<TrainingSnapshot>) -> BoxFuture<'_, color_eyre::Result<Arc<dyn Scorer>>> {
		self.runs.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			tokio::time::sleep(self.delay).await;

			Ok(Arc::new(ConstantScorer(self.score)) as Arc<dyn Scorer>)
		})
	}
}

pub struct FailingTrainer;
impl ScorerTrainer for FailingTrainer {
	fn train(&self, _snapshot: Arc<TrainingSnapshot>) -> BoxFuture<'_, color_eyre::Result<Arc<dyn Scorer>>> {
		Box::pin(async move { Err(color_eyre::eyre::eyre!("Optimizer exploded.")) })
	}
}

pub fn stadium() -> Record {
	Record::new(Area::Sport, "stadium", "City Stadium").description("Football stadium.")
}

pub fn hospital() -> Record {
	Record::new(Area::Health, "hospital", "General Hospital").description("Regional hospital.")
}

pub fn school() -> Record {
	Record::new(Area::Education, "school", "Riverside School").description("Primary school.")
}

pub fn keyword_rules(keywords: &[&str]) -> Vec<KeywordRule> {
	keywords
		.iter()
		.map(|keyword| KeywordRule { keyword: keyword.to_string(), aliases: Vec::new() })
		.collect()
}

pub fn ranking_service(
	embedder: Arc<dyn EmbeddingProvider>,
	trainer: Arc<dyn ScorerTrainer>,
	settings: RankingSettings,
) -> Arc<RankingService> {
	Arc::new(RankingService::new(embedder, trainer, settings))
}

pub fn seeded_store() -> Arc<MemoryRecordStore> {
	let store = MemoryRecordStore::new();

	store.insert("stadium", stadium());
	store.insert("hospital", hospital());
	store.insert("school", school());

	Arc::new(store)
}

pub fn index_with(
	store: Arc<MemoryRecordStore>,
	keywords: &[&str],
	ranking: Arc<RankingService>,
) -> Index {
	let table = KeywordTable::new(&keyword_rules(keywords)).expect("Failed to build keyword table.");

	Index::new(
		store,
		Arc::new(EcmMatcher::new(0.25)),
		CandidateRetrieval::new(table, None),
		ranking,
	)
}

pub fn temp_path(name: &str) -> PathBuf {
	let id = NEXT_PATH.fetch_add(1, Ordering::SeqCst);

	env::temp_dir().join(format!("ccdr-service-{}-{id}-{name}", std::process::id()))
}
