use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub store: Store,
	pub providers: Providers,
	#[serde(default)]
	pub matcher: Matcher,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
	pub records_path: PathBuf,
	/// Optional. Feedback log replayed into the ranking service at startup.
	pub feedback_log_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Matcher {
	pub distance_threshold: f32,
}
impl Default for Matcher {
	fn default() -> Self {
		Self { distance_threshold: 5.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	/// Upper bound on the no-match fallback enumeration. Zero keeps total recall.
	pub fallback_cap: u32,
	pub keywords: Vec<KeywordRule>,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self { fallback_cap: 0, keywords: default_keywords() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeywordRule {
	pub keyword: String,
	#[serde(default)]
	pub aliases: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub retrain_interval_seconds: u64,
	/// One of "retain" or "prune". Pruning drops feedback consumed by a successful swap.
	pub feedback_retention: String,
	/// One of "click" or "relevance".
	pub outcome: String,
	pub query_cache_capacity: u32,
	pub training: Training,
}
impl Default for Ranking {
	fn default() -> Self {
		Self {
			retrain_interval_seconds: 10,
			feedback_retention: "retain".to_string(),
			outcome: "click".to_string(),
			query_cache_capacity: 10_000,
			training: Training::default(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Training {
	pub epochs: u32,
	pub learning_rate: f32,
}
impl Default for Training {
	fn default() -> Self {
		Self { epochs: 8, learning_rate: 0.05 }
	}
}

pub fn default_keywords() -> Vec<KeywordRule> {
	[
		("estádio", &[][..]),
		("escola", &[][..]),
		("universidade", &["colégio"][..]),
		("teatro", &[][..]),
		("centro de dia", &[][..]),
		("centro hospitalar", &[][..]),
	]
	.into_iter()
	.map(|(keyword, aliases)| KeywordRule {
		keyword: keyword.to_string(),
		aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
	})
	.collect()
}
