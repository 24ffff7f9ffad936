//! Reader for the externally owned feedback log.

use std::path::Path;

use serde::{Deserialize, Serialize};

use ccdr_domain::Outcome;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLogEntry {
	pub query: String,
	#[serde(default)]
	pub feedbacks: Vec<FeedbackLogItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackLogItem {
	#[serde(rename = "equipmentId")]
	pub equipment_id: String,
	#[serde(default)]
	pub outcome: Outcome,
}

pub async fn read_feedback_log(path: &Path) -> Result<Vec<FeedbackLogEntry>> {
	let raw = tokio::fs::read(path)
		.await
		.map_err(|err| Error::Io { path: path.to_path_buf(), source: err })?;

	serde_json::from_slice(&raw).map_err(|err| Error::Json { path: path.to_path_buf(), source: err })
}
