// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

use chrono::{DateTime, Utc};
use rampart_common_secret::SecretString;
use rampart_server_db::{Device, DeviceCredentials, DeviceUpdate, NewDevice, Vendor};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

fn default_port() -> u16 {
	443
}

fn default_true() -> bool {
	true
}

/// A managed firewall. Credentials are reported only as presence flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DeviceResponse {
	pub id: String,
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

impl From<Device> for DeviceResponse {
	fn from(device: Device) -> Self {
		Self {
			id: device.id.to_string(),
			name: device.name,
			vendor: device.vendor,
			hostname: device.hostname,
			management_ip: device.management_ip,
			port: device.port,
			username: device.username,
			has_password: device.has_password,
			has_api_key: device.has_api_key,
			has_enable_secret: device.has_enable_secret,
			description: device.description,
			enabled: device.enabled,
			created_at: device.created_at,
			updated_at: device.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListDevicesResponse {
	pub devices: Vec<DeviceResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListDevicesQuery {
	/// Only return devices of this vendor.
	pub vendor: Option<Vendor>,
	/// Exact device name. Matches at most one device.
	pub name: Option<String>,
}

/// Request to register a device. Credentials are encrypted before storage.
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateDeviceRequest {
	pub name: String,
	pub vendor: Vendor,
	pub hostname: String,
	pub management_ip: Option<String>,
	/// Management port, 443 when omitted.
	#[serde(default = "default_port")]
	pub port: u16,
	pub username: String,
	#[serde(default)]
	#[cfg_attr(feature = "openapi", schema(value_type = String))]
	pub password: SecretString,
	#[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
	pub api_key: Option<SecretString>,
	#[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
	pub enable_secret: Option<SecretString>,
	pub description: Option<String>,
	#[serde(default = "default_true")]
	pub enabled: bool,
}

impl From<CreateDeviceRequest> for NewDevice {
	fn from(req: CreateDeviceRequest) -> Self {
		NewDevice {
			name: req.name,
			vendor: req.vendor,
			hostname: req.hostname,
			management_ip: req.management_ip,
			port: req.port,
			username: req.username,
			password: req.password,
			api_key: req.api_key,
			enable_secret: req.enable_secret,
			description: req.description,
			enabled: req.enabled,
		}
	}
}

/// Partial device update. Omitted fields are left unchanged; an empty string
/// clears an optional credential.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateDeviceRequest {
	pub name: Option<String>,
	pub vendor: Option<Vendor>,
	pub hostname: Option<String>,
	pub management_ip: Option<String>,
	pub port: Option<u16>,
	pub username: Option<String>,
	#[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
	pub password: Option<SecretString>,
	#[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
	pub api_key: Option<SecretString>,
	#[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
	pub enable_secret: Option<SecretString>,
	pub description: Option<String>,
	pub enabled: Option<bool>,
}

impl UpdateDeviceRequest {
	/// Names of the fields this request touches, credentials included by name
	/// only. Used as change-log detail.
	pub fn changed_fields(&self) -> Vec<&'static str> {
		let mut fields = Vec::new();
		let flags = [
			("name", self.name.is_some()),
			("vendor", self.vendor.is_some()),
			("hostname", self.hostname.is_some()),
			("management_ip", self.management_ip.is_some()),
			("port", self.port.is_some()),
			("username", self.username.is_some()),
			("password", self.password.is_some()),
			("api_key", self.api_key.is_some()),
			("enable_secret", self.enable_secret.is_some()),
			("description", self.description.is_some()),
			("enabled", self.enabled.is_some()),
		];
		for (field, set) in flags {
			if set {
				fields.push(field);
			}
		}
		fields
	}
}

impl From<UpdateDeviceRequest> for DeviceUpdate {
	fn from(req: UpdateDeviceRequest) -> Self {
		DeviceUpdate {
			name: req.name,
			vendor: req.vendor,
			hostname: req.hostname,
			management_ip: req.management_ip,
			port: req.port,
			username: req.username,
			password: req.password,
			api_key: req.api_key,
			enable_secret: req.enable_secret,
			description: req.description,
			enabled: req.enabled,
		}
	}
}

/// Decrypted login material. Only returned by the dedicated credentials
/// endpoint.
#[derive(Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct DeviceCredentialsResponse {
	pub device_id: String,
	pub username: String,
	pub password: String,
	pub api_key: Option<String>,
	pub enable_secret: Option<String>,
}

impl fmt::Debug for DeviceCredentialsResponse {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("DeviceCredentialsResponse")
			.field("device_id", &self.device_id)
			.field("username", &self.username)
			.field("password", &rampart_common_secret::REDACTED)
			.field("api_key", &self.api_key.as_ref().map(|_| rampart_common_secret::REDACTED))
			.field(
				"enable_secret",
				&self.enable_secret.as_ref().map(|_| rampart_common_secret::REDACTED),
			)
			.finish()
	}
}

impl From<DeviceCredentials> for DeviceCredentialsResponse {
	fn from(creds: DeviceCredentials) -> Self {
		Self {
			device_id: creds.device_id.to_string(),
			username: creds.username,
			password: creds.password.into_inner(),
			api_key: creds.api_key.map(|k| k.into_inner()),
			enable_secret: creds.enable_secret.map(|s| s.into_inner()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_request_defaults() {
		let req: CreateDeviceRequest = serde_json::from_value(serde_json::json!({
			"name": "edge-01",
			"vendor": "fortinet",
			"hostname": "edge-01.example.net",
			"username": "admin",
			"password": "Sup3rSecret!"
		}))
		.unwrap();

		assert_eq!(req.port, 443);
		assert!(req.enabled);
		assert_eq!(req.password.expose(), "Sup3rSecret!");
		assert!(!format!("{req:?}").contains("Sup3rSecret!"));
	}

	#[test]
	fn update_lists_changed_fields() {
		let req: UpdateDeviceRequest = serde_json::from_value(serde_json::json!({
			"hostname": "edge-02.example.net",
			"api_key": ""
		}))
		.unwrap();
		assert_eq!(req.changed_fields(), vec!["hostname", "api_key"]);
	}

	#[test]
	fn credentials_debug_is_redacted() {
		let resp = DeviceCredentialsResponse {
			device_id: "d".to_string(),
			username: "admin".to_string(),
			password: "Sup3rSecret!".to_string(),
			api_key: Some("LUFRPT1".to_string()),
			enable_secret: None,
		};
		let debug = format!("{resp:?}");
		assert!(!debug.contains("Sup3rSecret!"));
		assert!(!debug.contains("LUFRPT1"));
		assert!(debug.contains("admin"));
	}
}
