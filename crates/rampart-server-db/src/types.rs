// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Inventory record types shared by the repositories and the HTTP layer.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use rampart_common_secret::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DbError;

macro_rules! define_id_type {
	($name:ident, $doc:expr) => {
		#[doc = $doc]
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
		#[serde(transparent)]
		pub struct $name(Uuid);

		impl $name {
			pub fn new(id: Uuid) -> Self {
				Self(id)
			}

			pub fn generate() -> Self {
				Self(Uuid::new_v4())
			}

			pub fn as_uuid(&self) -> &Uuid {
				&self.0
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				write!(f, "{}", self.0)
			}
		}

		impl From<Uuid> for $name {
			fn from(id: Uuid) -> Self {
				Self(id)
			}
		}

		impl std::str::FromStr for $name {
			type Err = uuid::Error;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Uuid::parse_str(s).map(Self)
			}
		}
	};
}

define_id_type!(DeviceId, "Unique identifier for a managed firewall.");
define_id_type!(ObjectId, "Unique identifier for a network or service object.");
define_id_type!(GroupId, "Unique identifier for a network or service group.");
define_id_type!(PolicyId, "Unique identifier for a security policy rule.");
define_id_type!(HitCountId, "Unique identifier for a policy hit-count sample.");
define_id_type!(ChangeId, "Unique identifier for a change-log entry.");
define_id_type!(NotificationId, "Unique identifier for a notification.");

/// Lower-case string enums stored as TEXT columns.
macro_rules! string_enum {
	(
		$(#[$meta:meta])*
		$name:ident, $what:literal {
			$($variant:ident => $text:literal),+ $(,)?
		}
	) => {
		$(#[$meta])*
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
		#[serde(rename_all = "snake_case")]
		pub enum $name {
			$($variant),+
		}

		impl $name {
			pub const ALL: &'static [$name] = &[$($name::$variant),+];

			pub fn as_str(&self) -> &'static str {
				match self {
					$($name::$variant => $text),+
				}
			}
		}

		impl fmt::Display for $name {
			fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
				f.write_str(self.as_str())
			}
		}

		impl std::str::FromStr for $name {
			type Err = String;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				match s {
					$($text => Ok($name::$variant),)+
					_ => Err(format!(concat!("unknown ", $what, ": {}"), s)),
				}
			}
		}
	};
}

string_enum! {
	/// Firewall vendor / platform family.
	Vendor, "vendor" {
		PaloAlto => "palo_alto",
		Fortinet => "fortinet",
		CheckPoint => "check_point",
		CiscoAsa => "cisco_asa",
		JuniperSrx => "juniper_srx",
		Sophos => "sophos",
	}
}

string_enum! {
	/// What a network object's `value` denotes.
	NetworkObjectKind, "network object kind" {
		Host => "host",
		Network => "network",
		Range => "range",
		Fqdn => "fqdn",
	}
}

string_enum! {
	ServiceProtocol, "protocol" {
		Tcp => "tcp",
		Udp => "udp",
		Sctp => "sctp",
		Icmp => "icmp",
	}
}

string_enum! {
	PolicyAction, "policy action" {
		Allow => "allow",
		Deny => "deny",
		Drop => "drop",
		Reject => "reject",
	}
}

string_enum! {
	/// Kind of inventory entity a change-log entry refers to.
	EntityType, "entity type" {
		Device => "device",
		NetworkObject => "network_object",
		ServiceObject => "service_object",
		NetworkGroup => "network_group",
		ServiceGroup => "service_group",
		Policy => "policy",
	}
}

string_enum! {
	ChangeAction, "change action" {
		Created => "created",
		Updated => "updated",
		Deleted => "deleted",
	}
}

string_enum! {
	Severity, "severity" {
		Info => "info",
		Warning => "warning",
		Critical => "critical",
	}
}

/// Device scope of an object or group listing.
///
/// `Global` selects rows with no device; `Device` selects one device's rows
/// and excludes the global ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScopeFilter {
	#[default]
	Any,
	Global,
	Device(DeviceId),
}

impl ScopeFilter {
	/// Bind values for `(?any OR device_id IS ?device)`.
	pub(crate) fn binds(self) -> (bool, Option<String>) {
		match self {
			ScopeFilter::Any => (true, None),
			ScopeFilter::Global => (false, None),
			ScopeFilter::Device(id) => (false, Some(id.to_string())),
		}
	}
}

/// Which object table a group draws its members from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
	Network,
	Service,
}

impl GroupKind {
	pub(crate) fn groups_table(&self) -> &'static str {
		match self {
			GroupKind::Network => "network_groups",
			GroupKind::Service => "service_groups",
		}
	}

	pub(crate) fn members_table(&self) -> &'static str {
		match self {
			GroupKind::Network => "network_group_members",
			GroupKind::Service => "service_group_members",
		}
	}

	pub(crate) fn objects_table(&self) -> &'static str {
		match self {
			GroupKind::Network => "network_objects",
			GroupKind::Service => "service_objects",
		}
	}

	pub fn entity_type(&self) -> EntityType {
		match self {
			GroupKind::Network => EntityType::NetworkGroup,
			GroupKind::Service => EntityType::ServiceGroup,
		}
	}
}

// =============================================================================
// Devices
// =============================================================================

/// A managed firewall. Credential values are never part of this record; only
/// whether each one is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
	pub id: DeviceId,
	pub name: String,
	pub vendor: Vendor,
	pub hostname: String,
	pub management_ip: Option<String>,
	pub port: u16,
	pub username: String,
	pub has_password: bool,
	pub has_api_key: bool,
	pub has_enable_secret: bool,
	pub description: Option<String>,
	pub enabled: bool,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

/// Input for [`crate::DeviceRepository::create_device`]. Credentials arrive in
/// plaintext and are encrypted by the repository before the insert.
#[derive(Debug, Clone)]
pub struct NewDevice {
	pub name: String,
	pub vendor: Vendor,
	pub hostname: String,
	pub management_ip: Option<String>,
	pub port: u16,
	pub username: String,
	pub password: SecretString,
	pub api_key: Option<SecretString>,
	pub enable_secret: Option<SecretString>,
	pub description: Option<String>,
	pub enabled: bool,
}

/// Partial device update. `None` leaves a field unchanged; an empty credential
/// clears it.
#[derive(Debug, Clone, Default)]
pub struct DeviceUpdate {
	pub name: Option<String>,
	pub vendor: Option<Vendor>,
	pub hostname: Option<String>,
	pub management_ip: Option<String>,
	pub port: Option<u16>,
	pub username: Option<String>,
	pub password: Option<SecretString>,
	pub api_key: Option<SecretString>,
	pub enable_secret: Option<SecretString>,
	pub description: Option<String>,
	pub enabled: Option<bool>,
}

impl DeviceUpdate {
	pub fn touches_credentials(&self) -> bool {
		self.password.is_some() || self.api_key.is_some() || self.enable_secret.is_some()
	}
}

/// Decrypted login material for a device.
#[derive(Debug, Clone)]
pub struct DeviceCredentials {
	pub device_id: DeviceId,
	pub username: String,
	pub password: SecretString,
	pub api_key: Option<SecretString>,
	pub enable_secret: Option<SecretString>,
}

// =============================================================================
// Objects and groups
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkObject {
	pub id: ObjectId,
	pub device_id: Option<DeviceId>,
	pub name: String,
	pub kind: NetworkObjectKind,
	pub value: String,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNetworkObject {
	pub device_id: Option<DeviceId>,
	pub name: String,
	pub kind: NetworkObjectKind,
	pub value: String,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NetworkObjectUpdate {
	pub name: Option<String>,
	pub kind: Option<NetworkObjectKind>,
	pub value: Option<String>,
	pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceObject {
	pub id: ObjectId,
	pub device_id: Option<DeviceId>,
	pub name: String,
	pub protocol: ServiceProtocol,
	pub port_start: Option<u16>,
	pub port_end: Option<u16>,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewServiceObject {
	pub device_id: Option<DeviceId>,
	pub name: String,
	pub protocol: ServiceProtocol,
	pub port_start: Option<u16>,
	pub port_end: Option<u16>,
	pub description: Option<String>,
}

/// Partial service-object update. Ports are replaced as a pair whenever
/// `protocol` or either port is supplied.
#[derive(Debug, Clone, Default)]
pub struct ServiceObjectUpdate {
	pub name: Option<String>,
	pub protocol: Option<ServiceProtocol>,
	pub port_start: Option<u16>,
	pub port_end: Option<u16>,
	pub description: Option<String>,
}

/// A named set of network objects or service objects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectGroup {
	pub id: GroupId,
	pub kind: GroupKind,
	pub device_id: Option<DeviceId>,
	pub name: String,
	pub description: Option<String>,
	pub member_count: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewObjectGroup {
	pub device_id: Option<DeviceId>,
	pub name: String,
	pub description: Option<String>,
}

/// Rename or re-describe a group. The device scope is fixed at creation.
#[derive(Debug, Clone, Default)]
pub struct ObjectGroupUpdate {
	pub name: Option<String>,
	pub description: Option<String>,
}

// =============================================================================
// Policies
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
	pub id: PolicyId,
	pub device_id: DeviceId,
	pub name: String,
	pub position: i64,
	pub source_zones: Vec<String>,
	pub destination_zones: Vec<String>,
	pub source_addresses: Vec<String>,
	pub destination_addresses: Vec<String>,
	pub services: Vec<String>,
	pub action: PolicyAction,
	pub enabled: bool,
	pub logging: bool,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPolicy {
	pub device_id: DeviceId,
	pub name: String,
	pub position: i64,
	pub source_zones: Vec<String>,
	pub destination_zones: Vec<String>,
	pub source_addresses: Vec<String>,
	pub destination_addresses: Vec<String>,
	pub services: Vec<String>,
	pub action: PolicyAction,
	pub enabled: bool,
	pub logging: bool,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PolicyUpdate {
	pub name: Option<String>,
	pub position: Option<i64>,
	pub source_zones: Option<Vec<String>>,
	pub destination_zones: Option<Vec<String>>,
	pub source_addresses: Option<Vec<String>>,
	pub destination_addresses: Option<Vec<String>>,
	pub services: Option<Vec<String>>,
	pub action: Option<PolicyAction>,
	pub enabled: Option<bool>,
	pub logging: Option<bool>,
	pub description: Option<String>,
}

/// One observation of a policy's hit counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HitCountSample {
	pub id: HitCountId,
	pub policy_id: PolicyId,
	pub hit_count: i64,
	pub first_hit_at: Option<DateTime<Utc>>,
	pub last_hit_at: Option<DateTime<Utc>>,
	pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHitCount {
	pub hit_count: i64,
	pub first_hit_at: Option<DateTime<Utc>>,
	pub last_hit_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Change log and notifications
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEntry {
	pub id: ChangeId,
	pub entity_type: EntityType,
	pub entity_id: String,
	pub action: ChangeAction,
	pub actor: Option<String>,
	pub summary: String,
	pub details: serde_json::Value,
	pub created_at: DateTime<Utc>,
}

/// Input for [`crate::ChangeLogRepository::record_change`]. `details` must not
/// carry credential values.
#[derive(Debug, Clone)]
pub struct NewChange {
	pub entity_type: EntityType,
	pub entity_id: String,
	pub action: ChangeAction,
	pub actor: Option<String>,
	pub summary: String,
	pub details: serde_json::Value,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeFilter {
	pub entity_type: Option<EntityType>,
	pub entity_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
	pub id: NotificationId,
	pub device_id: Option<DeviceId>,
	pub severity: Severity,
	pub title: String,
	pub message: String,
	pub created_at: DateTime<Utc>,
	pub acknowledged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
	pub device_id: Option<DeviceId>,
	pub severity: Severity,
	pub title: String,
	pub message: String,
}

// =============================================================================
// Row helpers
// =============================================================================

/// Current time in the fixed-width form stored in every timestamp column.
pub(crate) fn now_timestamp() -> String {
	format_timestamp(&Utc::now())
}

pub(crate) fn format_timestamp(ts: &DateTime<Utc>) -> String {
	ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(value: &str, column: &str) -> Result<DateTime<Utc>, DbError> {
	DateTime::parse_from_rfc3339(value)
		.map(|dt| dt.with_timezone(&Utc))
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn parse_opt_timestamp(
	value: Option<String>,
	column: &str,
) -> Result<Option<DateTime<Utc>>, DbError> {
	value.map(|v| parse_timestamp(&v, column)).transpose()
}

pub(crate) fn parse_id<T: std::str::FromStr>(value: &str, column: &str) -> Result<T, DbError>
where
	T::Err: fmt::Display,
{
	value
		.parse()
		.map_err(|e| DbError::Internal(format!("Invalid {column}: {e}")))
}

pub(crate) fn parse_opt_id<T: std::str::FromStr>(
	value: Option<String>,
	column: &str,
) -> Result<Option<T>, DbError>
where
	T::Err: fmt::Display,
{
	value.map(|v| parse_id(&v, column)).transpose()
}

pub(crate) fn parse_port(value: Option<i64>, column: &str) -> Result<Option<u16>, DbError> {
	value
		.map(|v| {
			u16::try_from(v).map_err(|_| DbError::Internal(format!("Invalid {column}: {v}")))
		})
		.transpose()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use std::str::FromStr;

	#[test]
	fn vendor_strings_roundtrip() {
		for vendor in Vendor::ALL {
			assert_eq!(Vendor::from_str(vendor.as_str()).unwrap(), *vendor);
		}
		assert_eq!(Vendor::CheckPoint.to_string(), "check_point");
	}

	#[test]
	fn unknown_variant_is_rejected_with_context() {
		let err = PolicyAction::from_str("permit").unwrap_err();
		assert_eq!(err, "unknown policy action: permit");
	}

	#[test]
	fn serde_uses_snake_case() {
		let json = serde_json::to_string(&EntityType::NetworkGroup).unwrap();
		assert_eq!(json, "\"network_group\"");
		let parsed: Vendor = serde_json::from_str("\"juniper_srx\"").unwrap();
		assert_eq!(parsed, Vendor::JuniperSrx);
	}

	#[test]
	fn group_kind_maps_to_entity_type() {
		assert_eq!(GroupKind::Network.entity_type(), EntityType::NetworkGroup);
		assert_eq!(GroupKind::Service.entity_type(), EntityType::ServiceGroup);
	}

	#[test]
	fn ids_parse_and_display() {
		let id = DeviceId::generate();
		let parsed: DeviceId = id.to_string().parse().unwrap();
		assert_eq!(id, parsed);
		assert!("not-a-uuid".parse::<DeviceId>().is_err());
	}

	#[test]
	fn timestamps_sort_lexically() {
		let earlier = Utc::now();
		let later = earlier + chrono::Duration::milliseconds(1);
		assert!(format_timestamp(&earlier) < format_timestamp(&later));
	}

	#[test]
	fn update_reports_credential_changes() {
		assert!(!DeviceUpdate::default().touches_credentials());
		let update = DeviceUpdate {
			enable_secret: Some(SecretString::from("")),
			..Default::default()
		};
		assert!(update.touches_credentials());
	}

	proptest! {
		#[test]
		fn timestamp_format_parses_back(secs in 0i64..4_000_000_000, micros in 0u32..1_000_000) {
			let ts = DateTime::from_timestamp(secs, micros * 1000).unwrap();
			let parsed = parse_timestamp(&format_timestamp(&ts), "created_at").unwrap();
			prop_assert_eq!(parsed, ts);
		}
	}
}
