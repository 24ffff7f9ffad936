use std::sync::Arc;

use ccdr_config::Config;
use ccdr_providers::embedding::HttpEmbedder;
use ccdr_service::Index;
use ccdr_storage::{feedback_log, records::JsonRecordStore};

#[derive(Clone)]
pub struct AppState {
	pub index: Arc<Index>,
}
impl AppState {
	/// Builds the index from the record document and replays the feedback log when configured.
	pub async fn new(config: &Config) -> color_eyre::Result<Self> {
		let embedder = HttpEmbedder::new(&config.providers.embedding)?;
		let store = JsonRecordStore::new(&config.store.records_path);
		let index = Index::from_config(config, Arc::new(store), Arc::new(embedder))?;

		index.init_from_store().await?;

		if let Some(path) = config.store.feedback_log_path.as_deref() {
			match feedback_log::read_feedback_log(path).await {
				Ok(entries) => {
					index.replay_feedback(&entries).await;
				},
				Err(err) => {
					tracing::warn!(error = %err, "Feedback log unavailable. Starting without replay.");
				},
			}
		}

		Ok(Self::from_index(index))
	}

	pub fn from_index(index: Index) -> Self {
		Self { index: Arc::new(index) }
	}
}
