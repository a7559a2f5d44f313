// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use rampart_server_db::{
	NetworkObject, NetworkObjectKind, NetworkObjectUpdate, ServiceObject, ServiceObjectUpdate,
	ServiceProtocol,
};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// An address object: host, network, range or FQDN.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NetworkObjectResponse {
	pub id: String,
	/// Owning device, or `None` for a shared object.
	pub device_id: Option<String>,
	pub name: String,
	pub kind: NetworkObjectKind,
	pub value: String,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<NetworkObject> for NetworkObjectResponse {
	fn from(object: NetworkObject) -> Self {
		Self {
			id: object.id.to_string(),
			device_id: object.device_id.map(|d| d.to_string()),
			name: object.name,
			kind: object.kind,
			value: object.value,
			description: object.description,
			created_at: object.created_at,
			updated_at: object.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListNetworkObjectsResponse {
	pub objects: Vec<NetworkObjectResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListNetworkObjectsQuery {
	/// A device id, or `global` for shared entries only.
	pub device_id: Option<String>,
	pub kind: Option<NetworkObjectKind>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateNetworkObjectRequest {
	pub device_id: Option<String>,
	pub name: String,
	pub kind: NetworkObjectKind,
	/// `10.0.0.1`, `10.0.0.0/24`, `10.0.0.1-10.0.0.9` or `host.example.com`
	/// depending on `kind`.
	pub value: String,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateNetworkObjectRequest {
	pub name: Option<String>,
	pub kind: Option<NetworkObjectKind>,
	pub value: Option<String>,
	pub description: Option<String>,
}

impl From<UpdateNetworkObjectRequest> for NetworkObjectUpdate {
	fn from(req: UpdateNetworkObjectRequest) -> Self {
		NetworkObjectUpdate {
			name: req.name,
			kind: req.kind,
			value: req.value,
			description: req.description,
		}
	}
}

/// A protocol with an optional port range.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ServiceObjectResponse {
	pub id: String,
	pub device_id: Option<String>,
	pub name: String,
	pub protocol: ServiceProtocol,
	pub port_start: Option<u16>,
	pub port_end: Option<u16>,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<ServiceObject> for ServiceObjectResponse {
	fn from(object: ServiceObject) -> Self {
		Self {
			id: object.id.to_string(),
			device_id: object.device_id.map(|d| d.to_string()),
			name: object.name,
			protocol: object.protocol,
			port_start: object.port_start,
			port_end: object.port_end,
			description: object.description,
			created_at: object.created_at,
			updated_at: object.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListServiceObjectsResponse {
	pub objects: Vec<ServiceObjectResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListServiceObjectsQuery {
	/// A device id, or `global` for shared entries only.
	pub device_id: Option<String>,
	pub protocol: Option<ServiceProtocol>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateServiceObjectRequest {
	pub device_id: Option<String>,
	pub name: String,
	pub protocol: ServiceProtocol,
	pub port_start: Option<u16>,
	/// Defaults to `port_start`.
	pub port_end: Option<u16>,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateServiceObjectRequest {
	pub name: Option<String>,
	pub protocol: Option<ServiceProtocol>,
	pub port_start: Option<u16>,
	pub port_end: Option<u16>,
	pub description: Option<String>,
}

impl From<UpdateServiceObjectRequest> for ServiceObjectUpdate {
	fn from(req: UpdateServiceObjectRequest) -> Self {
		ServiceObjectUpdate {
			name: req.name,
			protocol: req.protocol,
			port_start: req.port_start,
			port_end: req.port_end,
			description: req.description,
		}
	}
}
