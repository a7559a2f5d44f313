// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Request input helpers.

use std::str::FromStr;

use rampart_server_db::ScopeFilter;

use crate::error::ServerError;

/// Parse a path or body id, reporting `what` in the 400 message.
pub fn parse_id<T: FromStr>(value: &str, what: &str) -> Result<T, ServerError> {
	value
		.trim()
		.parse()
		.map_err(|_| ServerError::BadRequest(format!("invalid {what}: '{value}'")))
}

pub fn parse_opt_id<T: FromStr>(value: Option<&str>, what: &str) -> Result<Option<T>, ServerError> {
	value.map(|v| parse_id(v, what)).transpose()
}

/// Parse a `device_id` listing filter. `global` selects entries that belong
/// to no device.
pub fn parse_scope(value: Option<&str>) -> Result<ScopeFilter, ServerError> {
	match value.map(str::trim) {
		None => Ok(ScopeFilter::Any),
		Some(v) if v.eq_ignore_ascii_case("global") => Ok(ScopeFilter::Global),
		Some(v) => Ok(ScopeFilter::Device(parse_id(v, "device id")?)),
	}
}

/// Reject blank required text fields.
pub fn require_non_empty(value: &str, field: &str) -> Result<(), ServerError> {
	if value.trim().is_empty() {
		return Err(ServerError::BadRequest(format!("{field} must not be empty")));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use rampart_server_db::DeviceId;

	#[test]
	fn parses_uuid_ids() {
		let id = DeviceId::generate();
		let parsed: DeviceId = parse_id(&id.to_string(), "device id").unwrap();
		assert_eq!(parsed, id);
	}

	#[test]
	fn bad_id_is_bad_request() {
		let err = parse_id::<DeviceId>("fw-01", "device id").unwrap_err();
		assert!(matches!(err, ServerError::BadRequest(ref m) if m.contains("device id")));
	}

	#[test]
	fn optional_ids() {
		assert!(parse_opt_id::<DeviceId>(None, "device id").unwrap().is_none());
		assert!(parse_opt_id::<DeviceId>(Some("nope"), "device id").is_err());
	}

	#[test]
	fn scope_filters() {
		let id = DeviceId::generate();
		assert_eq!(parse_scope(None).unwrap(), ScopeFilter::Any);
		assert_eq!(parse_scope(Some("global")).unwrap(), ScopeFilter::Global);
		assert_eq!(
			parse_scope(Some(&id.to_string())).unwrap(),
			ScopeFilter::Device(id)
		);
		assert!(parse_scope(Some("fw-01")).is_err());
	}

	#[test]
	fn blank_fields_are_rejected() {
		assert!(require_non_empty("  ", "name").is_err());
		assert!(require_non_empty("edge-01", "name").is_ok());
	}
}
