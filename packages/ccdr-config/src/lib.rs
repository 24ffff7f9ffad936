mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, KeywordRule, Matcher, Providers, Ranking, Retrieval, Service,
	Store, Training, default_keywords,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.store.records_path.as_os_str().is_empty() {
		return Err(Error::Validation {
			message: "store.records_path must be non-empty.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if !cfg.matcher.distance_threshold.is_finite() {
		return Err(Error::Validation {
			message: "matcher.distance_threshold must be a finite number.".to_string(),
		});
	}
	if cfg.matcher.distance_threshold <= 0.0 {
		return Err(Error::Validation {
			message: "matcher.distance_threshold must be greater than zero.".to_string(),
		});
	}

	for rule in &cfg.retrieval.keywords {
		if rule.keyword.trim().is_empty() {
			return Err(Error::Validation {
				message: "retrieval.keywords.keyword must be non-empty.".to_string(),
			});
		}
		if rule.aliases.iter().any(|alias| alias.trim().is_empty()) {
			return Err(Error::Validation {
				message: format!(
					"retrieval.keywords aliases for {:?} must be non-empty.",
					rule.keyword
				),
			});
		}
	}

	if cfg.ranking.retrain_interval_seconds == 0 {
		return Err(Error::Validation {
			message: "ranking.retrain_interval_seconds must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.ranking.feedback_retention.as_str(), "retain" | "prune") {
		return Err(Error::Validation {
			message: "ranking.feedback_retention must be one of retain or prune.".to_string(),
		});
	}
	if !matches!(cfg.ranking.outcome.as_str(), "click" | "relevance") {
		return Err(Error::Validation {
			message: "ranking.outcome must be one of click or relevance.".to_string(),
		});
	}
	if cfg.ranking.query_cache_capacity == 0 {
		return Err(Error::Validation {
			message: "ranking.query_cache_capacity must be greater than zero.".to_string(),
		});
	}
	if cfg.ranking.training.epochs == 0 {
		return Err(Error::Validation {
			message: "ranking.training.epochs must be greater than zero.".to_string(),
		});
	}
	if !cfg.ranking.training.learning_rate.is_finite() {
		return Err(Error::Validation {
			message: "ranking.training.learning_rate must be a finite number.".to_string(),
		});
	}
	if cfg.ranking.training.learning_rate <= 0.0 {
		return Err(Error::Validation {
			message: "ranking.training.learning_rate must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg
		.store
		.feedback_log_path
		.as_deref()
		.map(|path| path.as_os_str().is_empty())
		.unwrap_or(false)
	{
		cfg.store.feedback_log_path = None;
	}

	cfg.providers.embedding.api_key = cfg.providers.embedding.api_key.trim().to_string();

	for rule in &mut cfg.retrieval.keywords {
		rule.keyword = rule.keyword.trim().to_string();
	}
}
