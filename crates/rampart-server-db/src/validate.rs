// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Value checks for network and service objects.

use std::net::IpAddr;

use crate::types::{NetworkObjectKind, ServiceProtocol};

/// Check that `value` is well formed for `kind`.
///
/// - `host`: a single IPv4 or IPv6 address
/// - `network`: `address/prefix` with a prefix valid for the family
/// - `range`: `first-last`, same family, `first <= last`
/// - `fqdn`: a dotted DNS name, optionally `*.` wildcarded
pub fn validate_network_value(kind: NetworkObjectKind, value: &str) -> Result<(), String> {
	let value = value.trim();
	if value.is_empty() {
		return Err("value must not be empty".to_string());
	}

	match kind {
		NetworkObjectKind::Host => value
			.parse::<IpAddr>()
			.map(|_| ())
			.map_err(|_| format!("'{value}' is not an IP address")),
		NetworkObjectKind::Network => validate_cidr(value),
		NetworkObjectKind::Range => validate_range(value),
		NetworkObjectKind::Fqdn => validate_fqdn(value),
	}
}

fn validate_cidr(value: &str) -> Result<(), String> {
	let (addr, prefix) = value
		.split_once('/')
		.ok_or_else(|| format!("'{value}' is not in address/prefix form"))?;
	let addr: IpAddr = addr
		.parse()
		.map_err(|_| format!("'{addr}' is not an IP address"))?;
	let prefix: u8 = prefix
		.parse()
		.map_err(|_| format!("'{prefix}' is not a prefix length"))?;

	let max = if addr.is_ipv4() { 32 } else { 128 };
	if prefix > max {
		return Err(format!("prefix /{prefix} exceeds /{max}"));
	}
	Ok(())
}

fn validate_range(value: &str) -> Result<(), String> {
	let (first, last) = value
		.split_once('-')
		.ok_or_else(|| format!("'{value}' is not in first-last form"))?;
	let first: IpAddr = first
		.trim()
		.parse()
		.map_err(|_| format!("'{}' is not an IP address", first.trim()))?;
	let last: IpAddr = last
		.trim()
		.parse()
		.map_err(|_| format!("'{}' is not an IP address", last.trim()))?;

	match (first, last) {
		(IpAddr::V4(a), IpAddr::V4(b)) if a <= b => Ok(()),
		(IpAddr::V6(a), IpAddr::V6(b)) if a <= b => Ok(()),
		(IpAddr::V4(_), IpAddr::V4(_)) | (IpAddr::V6(_), IpAddr::V6(_)) => {
			Err("range start is after range end".to_string())
		}
		_ => Err("range mixes IPv4 and IPv6".to_string()),
	}
}

fn validate_fqdn(value: &str) -> Result<(), String> {
	let name = value.strip_suffix('.').unwrap_or(value);
	let name = name.strip_prefix("*.").unwrap_or(name);

	if name.len() > 253 {
		return Err("name is longer than 253 characters".to_string());
	}
	if name.parse::<IpAddr>().is_ok() {
		return Err(format!("'{value}' is an IP address, not a name"));
	}
	if !name.contains('.') {
		return Err(format!("'{value}' is not a fully qualified name"));
	}
	if name
		.rsplit('.')
		.next()
		.is_some_and(|tld| tld.bytes().all(|b| b.is_ascii_digit()))
	{
		return Err(format!("'{value}' ends in a numeric label"));
	}

	for label in name.split('.') {
		let valid = !label.is_empty()
			&& label.len() <= 63
			&& !label.starts_with('-')
			&& !label.ends_with('-')
			&& label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
		if !valid {
			return Err(format!("'{label}' is not a valid DNS label"));
		}
	}
	Ok(())
}

/// Normalise and check a protocol/port pair.
///
/// ICMP carries no ports. For the other protocols `port_start` is required
/// and `port_end` defaults to it; both must lie in `1..=65535` with
/// `start <= end`.
pub fn validate_service_ports(
	protocol: ServiceProtocol,
	port_start: Option<u16>,
	port_end: Option<u16>,
) -> Result<(Option<u16>, Option<u16>), String> {
	if protocol == ServiceProtocol::Icmp {
		if port_start.is_some() || port_end.is_some() {
			return Err("icmp services do not take ports".to_string());
		}
		return Ok((None, None));
	}

	let start = port_start.ok_or_else(|| format!("{protocol} services require port_start"))?;
	let end = port_end.unwrap_or(start);

	if start == 0 || end == 0 {
		return Err("port 0 is not a valid service port".to_string());
	}
	if start > end {
		return Err(format!("port range {start}-{end} is inverted"));
	}
	Ok((Some(start), Some(end)))
}
