pub mod index;
pub mod matcher;
pub mod ranking;
pub mod retrain;
pub mod retrieval;

mod error;

pub use error::{Error, Result};
pub use index::{Index, InitReport, ScoredSearch, SearchResults};
pub use matcher::{EcmMatcher, Matcher};
pub use ranking::{
	FeedbackRetention, OutcomeKind, RankedCandidates, RankingService, RankingSettings,
	RetrainOutcome, ScoredTag,
	scorer::{CosineScorer, DiagonalScorer, DiagonalTrainer, Scorer, ScorerTrainer},
};
pub use retrain::{RetrainHandle, spawn_retrain_loop};
pub use retrieval::{CandidateRetrieval, CandidateSource, Candidates, KeywordTable};

use std::{future::Future, pin::Pin, sync::Arc};

use ccdr_domain::Record;
use ccdr_providers::embedding::HttpEmbedder;
use ccdr_storage::records::{JsonRecordStore, MemoryRecordStore, StoredRecord};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Dense vector shared between the caches, the matcher, and training snapshots.
pub type Embedding = Arc<[f32]>;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

impl EmbeddingProvider for HttpEmbedder {
	fn embed<'a>(&'a self, texts: &'a [String]) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(HttpEmbedder::embed(self, texts))
	}
}

/// Read side of the external record store.
pub trait RecordStore
where
	Self: Send + Sync,
{
	fn get<'a>(&'a self, tag: &'a str) -> BoxFuture<'a, ccdr_storage::Result<Record>>;

	fn all(&self) -> BoxFuture<'_, ccdr_storage::Result<Vec<StoredRecord>>>;
}

impl RecordStore for JsonRecordStore {
	fn get<'a>(&'a self, tag: &'a str) -> BoxFuture<'a, ccdr_storage::Result<Record>> {
		Box::pin(JsonRecordStore::get(self, tag))
	}

	fn all(&self) -> BoxFuture<'_, ccdr_storage::Result<Vec<StoredRecord>>> {
		Box::pin(JsonRecordStore::all(self))
	}
}

impl RecordStore for MemoryRecordStore {
	fn get<'a>(&'a self, tag: &'a str) -> BoxFuture<'a, ccdr_storage::Result<Record>> {
		Box::pin(async move { MemoryRecordStore::get(self, tag) })
	}

	fn all(&self) -> BoxFuture<'_, ccdr_storage::Result<Vec<StoredRecord>>> {
		Box::pin(async move { Ok(MemoryRecordStore::all(self)) })
	}
}
