//! Area-specific detail payloads.
//!
//! Every field is optional and absence is kept distinct from any default value.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::record::{Area, Location};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Details {
	Social(SocialDetails),
	Culture(CultureDetails),
	Education(EducationDetails),
	Sport(SportDetails),
	GeneralHealth(GeneralHealthDetails),
	Hospital(HospitalDetails),
	Gas(GasDetails),
	Light(LightDetails),
	Telephone(TelephoneDetails),
	Internet(InternetDetails),
	Mail(MailDetails),
	Tv(TvDetails),
}
impl Details {
	pub fn area(&self) -> Area {
		match self {
			Self::Social(_) => Area::Social,
			Self::Culture(_) => Area::Culture,
			Self::Education(_) => Area::Education,
			Self::Sport(_) => Area::Sport,
			Self::GeneralHealth(_) | Self::Hospital(_) => Area::Health,
			Self::Gas(_) | Self::Light(_) => Area::Energy,
			Self::Telephone(_) | Self::Internet(_) | Self::Mail(_) | Self::Tv(_) =>
				Area::Communication,
		}
	}

	/// Secondary discriminant for the areas that carry more than one payload shape.
	pub fn subtype(&self) -> Option<&'static str> {
		match self {
			Self::GeneralHealth(_) => Some("general"),
			Self::Hospital(_) => Some("hospital"),
			Self::Gas(_) => Some("gas"),
			Self::Light(_) => Some("light"),
			Self::Telephone(_) => Some("telephone"),
			Self::Internet(_) => Some("internet"),
			Self::Mail(_) => Some("mail"),
			Self::Tv(_) => Some("tv"),
			Self::Social(_) | Self::Culture(_) | Self::Education(_) | Self::Sport(_) => None,
		}
	}

	pub fn type_label(&self) -> &'static str {
		match self {
			Self::Social(_) => "social",
			Self::Culture(_) => "culture",
			Self::Education(_) => "education",
			Self::Sport(_) => "sport",
			Self::GeneralHealth(_) => "general_health",
			Self::Hospital(_) => "hospital",
			Self::Gas(_) => "gas",
			Self::Light(_) => "light",
			Self::Telephone(_) => "telephone",
			Self::Internet(_) => "internet",
			Self::Mail(_) => "mail",
			Self::Tv(_) => "tv",
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialDetails {
	pub for_profit: Option<bool>,
	pub capacity: Option<u32>,
	pub user_count: Option<u32>,
	pub organization: Option<Organization>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
	pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CultureDetails {
	pub free_access: Option<bool>,
	pub reduced_mobility_access: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SportDetails {
	pub lit: Option<bool>,
	pub reduced_mobility_practice: Option<bool>,
	pub reduced_mobility_assistance: Option<bool>,
	pub capacity: Option<u32>,
	pub support_facilities: Option<Vec<SupportFacility>>,
	pub floor_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportFacility {
	pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EducationDetails {
	pub schools: Option<Vec<School>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct School {
	pub level: Option<String>,
	pub capacity: Option<u32>,
	pub enrolled: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralHealthDetails {
	pub capacity: Option<u32>,
	pub health_center_count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HospitalDetails {
	pub health_group: Option<String>,
	pub hospital_center: Option<String>,
	pub services: Option<Vec<String>>,
	pub specialties: Option<Vec<String>>,
	pub units: Option<Vec<HospitalUnit>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalUnit {
	pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GasDetails {
	pub consumers: Option<Vec<Located<u64>>>,
	pub consumption: Option<Vec<Located<f64>>>,
	pub access_points: Option<Vec<Located<u64>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightDetails {
	pub consumers_by_activity: Option<Vec<Located<ActivityConsumers>>>,
	pub consumption_by_activity: Option<Vec<Located<ActivityConsumption>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelephoneDetails {
	pub stations: Option<Vec<Located<u64>>>,
	pub accesses: Option<Vec<Located<Access>>>,
	pub accesses_per_100: Option<Vec<Located<f64>>>,
	pub public_stations: Option<Vec<Located<u64>>>,
	pub clients: Option<Vec<Located<ClientCount>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InternetDetails {
	pub broadband_clients: Option<Vec<Labeled<u64>>>,
	pub broadband_accesses_per_100: Option<Vec<Labeled<f64>>>,
	pub broadband_accesses: Option<Vec<Located<Access>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailDetails {
	pub companies: Option<Vec<Located<MailCompany>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TvDetails {
	pub subscriptions: Option<Vec<Located<u64>>>,
	pub clients: Option<Vec<Labeled<u64>>>,
}

/// A value measured at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Located<T> {
	pub location: Location,
	pub value: T,
}
impl<T> fmt::Display for Located<T>
where
	T: fmt::Display,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.location, self.value)
	}
}

/// A value keyed by a free-text label such as an operator name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labeled<T> {
	pub label: String,
	pub value: T,
}
impl<T> fmt::Display for Labeled<T>
where
	T: fmt::Display,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.label, self.value)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConsumers {
	pub activity: String,
	pub consumers: u64,
}
impl fmt::Display for ActivityConsumers {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.activity, self.consumers)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityConsumption {
	pub activity: String,
	pub consumption: f64,
}
impl fmt::Display for ActivityConsumption {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.activity, self.consumption)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Access {
	pub kind: String,
	pub count: u64,
}
impl fmt::Display for Access {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.kind, self.count)
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientCount {
	pub kind: String,
	pub count: u64,
}
impl fmt::Display for ClientCount {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.kind, self.count)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MailCompany {
	pub stations: Vec<Labeled<u64>>,
	pub posts: Vec<Labeled<u64>>,
}
impl fmt::Display for MailCompany {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("estações")?;

		for station in &self.stations {
			write!(f, " {station}")?;
		}

		f.write_str(" postos")?;

		for post in &self.posts {
			write!(f, " {post}")?;
		}

		Ok(())
	}
}
