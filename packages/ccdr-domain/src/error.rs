use crate::record::{Area, Group};

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Details of type {details} belong to area {expected}, not {area}.")]
	AreaMismatch { area: Area, expected: Area, details: &'static str },
	#[error("Area {area} belongs to group {expected}, not {group}.")]
	GroupMismatch { area: Area, expected: Group, group: Group },
}
