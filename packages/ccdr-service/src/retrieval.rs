//! Candidate retrieval: keyword classification with a total-recall fallback.

use regex::Regex;

use ccdr_config::{KeywordRule, Retrieval};
use ccdr_domain::{Query, fold};

use crate::{Error, Result, matcher::Matcher};

struct CompiledRule {
	keyword: String,
	folded: String,
	aliases: Vec<Regex>,
}
impl CompiledRule {
	fn matches(&self, normalized: &str) -> bool {
		normalized.contains(&self.folded) || self.aliases.iter().any(|alias| alias.is_match(normalized))
	}
}

/// Ordered keyword table. The first rule that matches wins.
pub struct KeywordTable {
	rules: Vec<CompiledRule>,
}
impl KeywordTable {
	pub fn new(rules: &[KeywordRule]) -> Result<Self> {
		let mut compiled = Vec::with_capacity(rules.len());

		for rule in rules {
			let mut aliases = Vec::with_capacity(rule.aliases.len());

			for alias in &rule.aliases {
				// Aliases only match at the start of the query.
				let pattern = format!("^(?:{})", fold(alias));
				let regex = Regex::new(&pattern).map_err(|err| Error::InvalidRequest {
					message: format!("Invalid alias {alias:?} for keyword {:?}: {err}", rule.keyword),
				})?;

				aliases.push(regex);
			}

			compiled.push(CompiledRule {
				keyword: rule.keyword.clone(),
				folded: fold(&rule.keyword),
				aliases,
			});
		}

		Ok(Self { rules: compiled })
	}

	pub fn is_empty(&self) -> bool {
		self.rules.is_empty()
	}

	/// Returns the keyword whose text or alias matches the folded query.
	pub fn classify(&self, query: &Query) -> Option<&str> {
		self.rules
			.iter()
			.find(|rule| rule.matches(&query.normalized))
			.map(|rule| rule.keyword.as_str())
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
	Keyword(String),
	Fallback,
}

#[derive(Debug, Clone)]
pub struct Candidates {
	pub source: CandidateSource,
	pub tags: Vec<String>,
}

pub struct CandidateRetrieval {
	keywords: KeywordTable,
	fallback_cap: Option<usize>,
}
impl CandidateRetrieval {
	pub fn new(keywords: KeywordTable, fallback_cap: Option<usize>) -> Self {
		Self { keywords, fallback_cap }
	}

	pub fn from_config(cfg: &Retrieval) -> Result<Self> {
		let fallback_cap = (cfg.fallback_cap > 0).then_some(cfg.fallback_cap as usize);

		Ok(Self::new(KeywordTable::new(&cfg.keywords)?, fallback_cap))
	}

	/// A keyword hit returns exactly the tags of that type, even when there are none. Otherwise
	/// every clustered tag is returned, truncated to the fallback cap when one is set.
	pub fn candidates(&self, query: &Query, matcher: &dyn Matcher) -> Candidates {
		if let Some(keyword) = self.keywords.classify(query) {
			let tags = matcher.tags_of_type(keyword);

			tracing::debug!(keyword, candidates = tags.len(), "Keyword matched query.");

			return Candidates { source: CandidateSource::Keyword(keyword.to_string()), tags };
		}

		let mut tags = Vec::new();

		for cluster_id in matcher.cluster_ids() {
			tags.extend(matcher.tags_in_cluster(cluster_id));

			if let Some(cap) = self.fallback_cap
				&& tags.len() >= cap
			{
				tags.truncate(cap);

				break;
			}
		}

		tracing::debug!(candidates = tags.len(), "No keyword matched. Falling back to every cluster.");

		Candidates { source: CandidateSource::Fallback, tags }
	}
}
