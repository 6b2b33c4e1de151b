//! Read-only data source definitions.

pub mod contact_group;
pub mod monitoring_locations;
