use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, details::Details};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
	Equipment,
	Infra,
}
impl Group {
	pub fn label(self) -> &'static str {
		match self {
			Self::Equipment => "equipment",
			Self::Infra => "infra",
		}
	}
}
impl fmt::Display for Group {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Canonical area of a record. Source labels in Portuguese are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Area {
	Social,
	#[serde(alias = "cultura")]
	Culture,
	#[serde(alias = "educacao", alias = "educação")]
	Education,
	#[serde(alias = "desporto")]
	Sport,
	#[serde(alias = "saude", alias = "saúde")]
	Health,
	#[serde(alias = "energia")]
	Energy,
	#[serde(alias = "comunicacao", alias = "comunicação")]
	Communication,
}
impl Area {
	pub fn label(self) -> &'static str {
		match self {
			Self::Social => "social",
			Self::Culture => "culture",
			Self::Education => "education",
			Self::Sport => "sport",
			Self::Health => "health",
			Self::Energy => "energy",
			Self::Communication => "communication",
		}
	}

	/// Portuguese name used in rendered record text.
	pub fn source_label(self) -> &'static str {
		match self {
			Self::Social => "social",
			Self::Culture => "cultura",
			Self::Education => "educação",
			Self::Sport => "desporto",
			Self::Health => "saúde",
			Self::Energy => "energia",
			Self::Communication => "comunicação",
		}
	}

	pub fn group(self) -> Group {
		match self {
			Self::Energy | Self::Communication => Group::Infra,
			_ => Group::Equipment,
		}
	}
}
impl fmt::Display for Area {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
	pub latitude: f64,
	pub longitude: f64,
}
impl fmt::Display for Location {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.latitude, self.longitude)
	}
}

/// Free-form annotation. Names are not required to be unique and order is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extra {
	pub name: String,
	pub value: Value,
}
impl fmt::Display for Extra {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.value {
			Value::String(text) => write!(f, "{} {text}", self.name),
			other => write!(f, "{} {other}", self.name),
		}
	}
}

/// An equipment or infrastructure record.
///
/// `area` and `details` are private so the area always agrees with the stored detail variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RecordRepr", into = "RecordRepr")]
pub struct Record {
	area: Area,
	details: Option<Details>,
	/// Canonical type used for exact type lookups, e.g. "Estádio".
	pub kind: String,
	pub name: String,
	pub description: String,
	pub extras: Vec<Extra>,
	pub location: Option<Location>,
	pub schedule_info: Option<String>,
	pub unit_count: Option<u32>,
}
impl Record {
	pub fn new(area: Area, kind: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			area,
			details: None,
			kind: kind.into(),
			name: name.into(),
			description: String::new(),
			extras: Vec::new(),
			location: None,
			schedule_info: None,
			unit_count: None,
		}
	}

	/// Builds a record whose area is taken from the detail variant.
	pub fn with_details(
		kind: impl Into<String>,
		name: impl Into<String>,
		details: Details,
	) -> Self {
		let mut record = Self::new(details.area(), kind, name);

		record.details = Some(details);

		record
	}

	pub fn description(mut self, description: impl Into<String>) -> Self {
		self.description = description.into();

		self
	}

	pub fn location(mut self, latitude: f64, longitude: f64) -> Self {
		self.location = Some(Location { latitude, longitude });

		self
	}

	pub fn extra(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.extras.push(Extra { name: name.into(), value: value.into() });

		self
	}

	pub fn area(&self) -> Area {
		self.area
	}

	pub fn group(&self) -> Group {
		self.area.group()
	}

	pub fn details(&self) -> Option<&Details> {
		self.details.as_ref()
	}
}

#[derive(Serialize, Deserialize)]
struct RecordRepr {
	#[serde(default)]
	group: Option<Group>,
	area: Area,
	kind: String,
	name: String,
	#[serde(default)]
	description: String,
	#[serde(default)]
	extras: Vec<Extra>,
	#[serde(default)]
	location: Option<Location>,
	#[serde(default)]
	schedule_info: Option<String>,
	#[serde(default)]
	unit_count: Option<u32>,
	#[serde(default)]
	details: Option<Details>,
}
impl TryFrom<RecordRepr> for Record {
	type Error = Error;

	fn try_from(repr: RecordRepr) -> Result<Self, Self::Error> {
		if let Some(group) = repr.group
			&& group != repr.area.group()
		{
			return Err(Error::GroupMismatch { area: repr.area, expected: repr.area.group(), group });
		}
		if let Some(details) = repr.details.as_ref()
			&& details.area() != repr.area
		{
			return Err(Error::AreaMismatch {
				area: repr.area,
				expected: details.area(),
				details: details.type_label(),
			});
		}

		Ok(Self {
			area: repr.area,
			details: repr.details,
			kind: repr.kind,
			name: repr.name,
			description: repr.description,
			extras: repr.extras,
			location: repr.location,
			schedule_info: repr.schedule_info,
			unit_count: repr.unit_count,
		})
	}
}
impl From<Record> for RecordRepr {
	fn from(record: Record) -> Self {
		Self {
			group: Some(record.area.group()),
			area: record.area,
			kind: record.kind,
			name: record.name,
			description: record.description,
			extras: record.extras,
			location: record.location,
			schedule_info: record.schedule_info,
			unit_count: record.unit_count,
			details: record.details,
		}
	}
}
