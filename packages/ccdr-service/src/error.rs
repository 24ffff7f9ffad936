pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Candidate {tag} has no cached embedding.")]
	UnknownCandidate { tag: String },
	#[error("Embedding timed out after {timeout_ms} ms.")]
	EmbeddingTimeout { timeout_ms: u64 },
	#[error("Embedding unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Retraining failed: {message}")]
	RetrainFailed { message: String },
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Invalid record {tag}: {message}")]
	InvalidRecord { tag: String, message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<ccdr_storage::Error> for Error {
	fn from(err: ccdr_storage::Error) -> Self {
		match err {
			ccdr_storage::Error::NotFound(message) => Self::NotFound { message },
			ccdr_storage::Error::InvalidRecord { tag, source } =>
				Self::InvalidRecord { tag, message: source.to_string() },
			other => Self::Storage { message: other.to_string() },
		}
	}
}
