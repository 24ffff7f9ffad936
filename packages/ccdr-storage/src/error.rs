use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read {path:?}.")]
	Io { path: PathBuf, source: std::io::Error },
	#[error("Invalid JSON document at {path:?}: {source}")]
	Json { path: PathBuf, source: serde_json::Error },
	#[error("Invalid record {tag}: {source}")]
	InvalidRecord { tag: String, source: serde_json::Error },
	#[error("Not found: {0}")]
	NotFound(String),
}
