//! Record documents owned by the external store.
//!
//! The JSON store reads the document on every call so edits made by the owner of the file are
//! visible to the next add or update without a restart.

use std::{
	path::{Path, PathBuf},
	sync::RwLock,
};

use serde::Deserialize;
use serde_json::Value;

use ccdr_domain::Record;

use crate::{Error, Result};

#[derive(Debug, Deserialize)]
struct StoredEntry {
	tag: String,
	record: Value,
}

/// A record as read from the store. Decoding failures are kept per record.
#[derive(Debug)]
pub struct StoredRecord {
	pub tag: String,
	pub record: Result<Record>,
}

pub struct JsonRecordStore {
	path: PathBuf,
}
impl JsonRecordStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub async fn get(&self, tag: &str) -> Result<Record> {
		let entries = read_entries(&self.path).await?;
		let Some(entry) = entries.into_iter().rev().find(|entry| entry.tag == tag) else {
			return Err(Error::NotFound(format!("record {tag}")));
		};

		decode(entry)
	}

	pub async fn all(&self) -> Result<Vec<StoredRecord>> {
		let entries = read_entries(&self.path).await?;

		Ok(entries
			.into_iter()
			.map(|entry| StoredRecord { tag: entry.tag.clone(), record: decode(entry) })
			.collect())
	}
}

/// In-process store, used when records are pushed rather than read from a document.
#[derive(Default)]
pub struct MemoryRecordStore {
	records: RwLock<Vec<(String, Record)>>,
}
impl MemoryRecordStore {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&self, tag: impl Into<String>, record: Record) {
		let tag = tag.into();
		let mut records = self.records.write().unwrap_or_else(|err| err.into_inner());

		match records.iter_mut().find(|(existing, _)| *existing == tag) {
			Some((_, slot)) => *slot = record,
			None => records.push((tag, record)),
		}
	}

	pub fn remove(&self, tag: &str) -> Option<Record> {
		let mut records = self.records.write().unwrap_or_else(|err| err.into_inner());
		let position = records.iter().position(|(existing, _)| existing == tag)?;

		Some(records.remove(position).1)
	}

	pub fn get(&self, tag: &str) -> Result<Record> {
		let records = self.records.read().unwrap_or_else(|err| err.into_inner());

		records
			.iter()
			.find(|(existing, _)| existing == tag)
			.map(|(_, record)| record.clone())
			.ok_or_else(|| Error::NotFound(format!("record {tag}")))
	}

	pub fn all(&self) -> Vec<StoredRecord> {
		let records = self.records.read().unwrap_or_else(|err| err.into_inner());

		records
			.iter()
			.map(|(tag, record)| StoredRecord { tag: tag.clone(), record: Ok(record.clone()) })
			.collect()
	}
}

async fn read_entries(path: &Path) -> Result<Vec<StoredEntry>> {
	let raw = tokio::fs::read(path)
		.await
		.map_err(|err| Error::Io { path: path.to_path_buf(), source: err })?;

	serde_json::from_slice(&raw).map_err(|err| Error::Json { path: path.to_path_buf(), source: err })
}

fn decode(entry: StoredEntry) -> Result<Record> {
	serde_json::from_value(entry.record)
		.map_err(|err| Error::InvalidRecord { tag: entry.tag, source: err })
}
