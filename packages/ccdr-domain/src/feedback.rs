use serde::{Deserialize, Serialize};

/// Feedback signal attached to a (query, candidate) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
	Click(bool),
	Relevance(f32),
}
impl Outcome {
	/// Training target in `[0, 1]` for clicks, raw score for relevance.
	pub fn target(self) -> f32 {
		match self {
			Self::Click(true) => 1.0,
			Self::Click(false) => 0.0,
			Self::Relevance(score) => score,
		}
	}

	pub fn kind(self) -> &'static str {
		match self {
			Self::Click(_) => "click",
			Self::Relevance(_) => "relevance",
		}
	}
}
impl Default for Outcome {
	fn default() -> Self {
		Self::Click(true)
	}
}
