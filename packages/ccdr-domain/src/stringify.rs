//! Deterministic text rendering of records, the only input handed to the embedder.
//!
//! The layout is `name, location. description. details. extras`. Absent optional fields add
//! nothing to the output. Changing any template here invalidates previously computed
//! embeddings for the affected area.

use std::fmt::Display;

use crate::{
	details::{
		CultureDetails, Details, EducationDetails, GasDetails, GeneralHealthDetails,
		HospitalDetails, InternetDetails, LightDetails, MailDetails, School, SocialDetails,
		SportDetails, TelephoneDetails, TvDetails,
	},
	record::{Extra, Record},
};

const LIST_SEPARATOR: &str = "\n";

pub fn render(record: &Record) -> String {
	let location = record.location.map(|location| format!(", {location}")).unwrap_or_default();
	let details = render_details(record);
	let extras = render_extras(&record.extras);

	format!("{}{location}. {}. {details}.{extras}", record.name, record.description)
		.trim()
		.to_string()
}

/// Renders a present value with a leading space and an absent one as the empty string.
pub fn guard<T>(value: Option<T>, render: impl FnOnce(T) -> String) -> String {
	value.map(|value| format!(" {}", render(value))).unwrap_or_default()
}

fn flag(value: Option<bool>, present: &str, absent: &str) -> String {
	guard(value, |value| (if value { present } else { absent }).to_string())
}

fn join<T>(items: &[T], separator: &str) -> String
where
	T: Display,
{
	items.iter().map(ToString::to_string).collect::<Vec<_>>().join(separator)
}

fn labeled_list<T>(label: &str, items: Option<&Vec<T>>) -> String
where
	T: Display,
{
	guard(items, |items| {
		if items.is_empty() {
			return label.to_string();
		}

		format!("{label} {}", join(items, LIST_SEPARATOR))
	})
}

/// Renders a non-empty list with a leading space. Absent and empty lists render nothing.
fn joined<T>(items: Option<&Vec<T>>, separator: &str, render: impl Fn(&T) -> String) -> String {
	guard(items.filter(|items| !items.is_empty()), |items| {
		items.iter().map(render).collect::<Vec<_>>().join(separator)
	})
}

fn render_details(record: &Record) -> String {
	let area = record.area().source_label();
	let body = match record.details() {
		None => String::new(),
		Some(Details::Social(details)) => social(details),
		Some(Details::Culture(details)) => culture(details),
		Some(Details::Education(details)) => education(details),
		Some(Details::Sport(details)) => sport(details),
		Some(Details::GeneralHealth(details)) => general_health(details),
		Some(Details::Hospital(details)) => hospital(details),
		Some(Details::Gas(details)) => gas(details),
		Some(Details::Light(details)) => light(details),
		Some(Details::Telephone(details)) => telephone(details),
		Some(Details::Internet(details)) => internet(details),
		Some(Details::Mail(details)) => mail(details),
		Some(Details::Tv(details)) => tv(details),
	};

	format!("{area}{body}")
}

fn render_extras(extras: &[Extra]) -> String {
	if extras.is_empty() {
		return String::new();
	}

	format!(" {}", join(extras, LIST_SEPARATOR))
}

fn social(details: &SocialDetails) -> String {
	[
		flag(details.for_profit, "para fins lucrativos", "sem fins lucrativos"),
		guard(details.capacity, |capacity| format!("capacidade {capacity}")),
		guard(details.user_count, |users| format!("utentes {users}")),
		guard(details.organization.as_ref(), |organization| organization.name.clone()),
	]
	.concat()
}

fn culture(details: &CultureDetails) -> String {
	[
		flag(details.free_access, "grátis", "pago"),
		flag(
			details.reduced_mobility_access,
			"acesso mobilidade reduzida",
			"sem acesso mobilidade reduzida",
		),
	]
	.concat()
}

fn sport(details: &SportDetails) -> String {
	[
		flag(details.lit, "iluminado", "não iluminado"),
		flag(
			details.reduced_mobility_practice,
			"prática mobilidade reduzida",
			"não possível prática mobilidade reduzida",
		),
		flag(
			details.reduced_mobility_assistance,
			"assistência a mobilidade reduzida",
			"sem assistência a mobilidade reduzida",
		),
		guard(details.capacity, |capacity| format!("com capacidade {capacity}")),
		joined(details.support_facilities.as_ref(), LIST_SEPARATOR, |facility| {
			facility.name.clone()
		}),
		guard(details.floor_type.as_ref(), |floor| format!("piso {floor}")),
	]
	.concat()
}

fn education(details: &EducationDetails) -> String {
	joined(details.schools.as_ref(), LIST_SEPARATOR, school)
}

fn school(school: &School) -> String {
	let text = [
		guard(school.level.as_ref(), |level| level.clone()),
		guard(school.capacity, |capacity| format!("com capacidade {capacity}")),
		guard(school.enrolled, |enrolled| format!("alunos inscritos {enrolled}")),
	]
	.concat();

	text.trim_start().to_string()
}

fn general_health(details: &GeneralHealthDetails) -> String {
	[
		guard(details.capacity, |capacity| format!("capacidade {capacity}")),
		guard(details.health_center_count, |count| format!("{count} centros de saúde")),
	]
	.concat()
}

fn hospital(details: &HospitalDetails) -> String {
	[
		guard(details.health_group.as_ref(), |group| group.clone()),
		guard(details.hospital_center.as_ref(), |center| center.clone()),
		joined(details.services.as_ref(), ",", Clone::clone),
		joined(details.specialties.as_ref(), ",", Clone::clone),
		joined(details.units.as_ref(), LIST_SEPARATOR, |unit| unit.name.clone()),
	]
	.concat()
}

fn gas(details: &GasDetails) -> String {
	[
		labeled_list("consumidores de gás", details.consumers.as_ref()),
		labeled_list("consumo de gás", details.consumption.as_ref()),
		labeled_list("pontos de acesso de gás", details.access_points.as_ref()),
	]
	.concat()
}

fn light(details: &LightDetails) -> String {
	[
		labeled_list(
			"consumidores de eletricidade por atividade",
			details.consumers_by_activity.as_ref(),
		),
		labeled_list(
			"consumo de eletricidade por atividade",
			details.consumption_by_activity.as_ref(),
		),
	]
	.concat()
}

fn telephone(details: &TelephoneDetails) -> String {
	[
		labeled_list("postos telefónicos", details.stations.as_ref()),
		labeled_list("acessos telefónicos", details.accesses.as_ref()),
		labeled_list("acessos telefónicos por 100 habitantes", details.accesses_per_100.as_ref()),
		labeled_list("postos telefónicos públicos", details.public_stations.as_ref()),
		labeled_list("clientes telefónicos", details.clients.as_ref()),
	]
	.concat()
}

fn internet(details: &InternetDetails) -> String {
	[
		labeled_list("clientes de banda larga", details.broadband_clients.as_ref()),
		labeled_list(
			"acessos de banda larga por 100 habitantes",
			details.broadband_accesses_per_100.as_ref(),
		),
		labeled_list("acessos de banda larga", details.broadband_accesses.as_ref()),
	]
	.concat()
}

fn mail(details: &MailDetails) -> String {
	labeled_list("empresas de correio", details.companies.as_ref())
}

fn tv(details: &TvDetails) -> String {
	[
		labeled_list("subscrições de televisão", details.subscriptions.as_ref()),
		labeled_list("clientes de televisão", details.clients.as_ref()),
	]
	.concat()
}
