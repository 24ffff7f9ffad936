pub mod details;
pub mod feedback;
pub mod query;
pub mod record;
pub mod stringify;

mod error;

pub use details::{
	Access, ActivityConsumers, ActivityConsumption, ClientCount, CultureDetails, Details,
	EducationDetails, GasDetails, GeneralHealthDetails, HospitalDetails, HospitalUnit,
	InternetDetails, Labeled, LightDetails, Located, MailCompany, MailDetails, Organization,
	School, SocialDetails, SportDetails, SupportFacility, TelephoneDetails, TvDetails,
};
pub use error::{Error, Result};
pub use feedback::Outcome;
pub use query::{Query, content_hash, fold};
pub use record::{Area, Extra, Group, Location, Record};
pub use stringify::render;
