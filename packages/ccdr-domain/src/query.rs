use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// A free-text search query with its content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
	pub text: String,
	pub normalized: String,
	pub hash: String,
}
impl Query {
	pub fn new(text: impl Into<String>) -> Self {
		let text = text.into();
		let normalized = fold(&text);
		let hash = hash_normalized(&normalized);

		Self { text, normalized, hash }
	}
}

/// Case-folds, strips diacritics, and collapses whitespace.
pub fn fold(text: &str) -> String {
	let stripped: String = text.nfkd().filter(|ch| !is_combining_mark(*ch)).collect();

	stripped.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Stable digest of the folded query text.
pub fn content_hash(text: &str) -> String {
	hash_normalized(&fold(text))
}

fn hash_normalized(normalized: &str) -> String {
	blake3::hash(normalized.as_bytes()).to_hex().to_string()
}
