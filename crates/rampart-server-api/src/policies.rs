// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use rampart_server_db::{HitCountSample, NewHitCount, Policy, PolicyAction, PolicyUpdate};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

fn default_true() -> bool {
	true
}

/// A security rule. Zones, addresses and services are object or group names
/// as they appear on the device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct PolicyResponse {
	pub id: String,
	pub device_id: String,
	pub name: String,
	/// Evaluation order on the device, lowest first.
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

impl From<Policy> for PolicyResponse {
	fn from(policy: Policy) -> Self {
		Self {
			id: policy.id.to_string(),
			device_id: policy.device_id.to_string(),
			name: policy.name,
			position: policy.position,
			source_zones: policy.source_zones,
			destination_zones: policy.destination_zones,
			source_addresses: policy.source_addresses,
			destination_addresses: policy.destination_addresses,
			services: policy.services,
			action: policy.action,
			enabled: policy.enabled,
			logging: policy.logging,
			description: policy.description,
			created_at: policy.created_at,
			updated_at: policy.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListPoliciesResponse {
	pub policies: Vec<PolicyResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListPoliciesQuery {
	/// Policies are always listed per device.
	pub device_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreatePolicyRequest {
	pub device_id: String,
	pub name: String,
	pub position: i64,
	#[serde(default)]
	pub source_zones: Vec<String>,
	#[serde(default)]
	pub destination_zones: Vec<String>,
	#[serde(default)]
	pub source_addresses: Vec<String>,
	#[serde(default)]
	pub destination_addresses: Vec<String>,
	#[serde(default)]
	pub services: Vec<String>,
	pub action: PolicyAction,
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default)]
	pub logging: bool,
	pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdatePolicyRequest {
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

impl From<UpdatePolicyRequest> for PolicyUpdate {
	fn from(req: UpdatePolicyRequest) -> Self {
		PolicyUpdate {
			name: req.name,
			position: req.position,
			source_zones: req.source_zones,
			destination_zones: req.destination_zones,
			source_addresses: req.source_addresses,
			destination_addresses: req.destination_addresses,
			services: req.services,
			action: req.action,
			enabled: req.enabled,
			logging: req.logging,
			description: req.description,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct HitCountResponse {
	pub id: String,
	pub policy_id: String,
	pub hit_count: i64,
	pub first_hit_at: Option<DateTime<Utc>>,
	pub last_hit_at: Option<DateTime<Utc>>,
	pub recorded_at: DateTime<Utc>,
}

impl From<HitCountSample> for HitCountResponse {
	fn from(sample: HitCountSample) -> Self {
		Self {
			id: sample.id.to_string(),
			policy_id: sample.policy_id.to_string(),
			hit_count: sample.hit_count,
			first_hit_at: sample.first_hit_at,
			last_hit_at: sample.last_hit_at,
			recorded_at: sample.recorded_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListHitCountsResponse {
	pub samples: Vec<HitCountResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RecordHitCountRequest {
	pub hit_count: i64,
	pub first_hit_at: Option<DateTime<Utc>>,
	pub last_hit_at: Option<DateTime<Utc>>,
}

impl From<RecordHitCountRequest> for NewHitCount {
	fn from(req: RecordHitCountRequest) -> Self {
		NewHitCount {
			hit_count: req.hit_count,
			first_hit_at: req.first_hit_at,
			last_hit_at: req.last_hit_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UnusedPoliciesResponse {
	pub device_id: String,
	pub policies: Vec<PolicyResponse>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn create_request_list_defaults() {
		let req: CreatePolicyRequest = serde_json::from_value(serde_json::json!({
			"device_id": "6f1c3c1e-0000-4000-8000-000000000001",
			"name": "allow-web",
			"position": 10,
			"action": "allow",
			"services": ["https"]
		}))
		.unwrap();

		assert!(req.source_zones.is_empty());
		assert_eq!(req.services, vec!["https"]);
		assert!(req.enabled);
		assert!(!req.logging);
	}

	#[test]
	fn unknown_action_is_rejected() {
		let result: Result<CreatePolicyRequest, _> = serde_json::from_value(serde_json::json!({
			"device_id": "x",
			"name": "n",
			"position": 1,
			"action": "permit"
		}));
		assert!(result.is_err());
	}
}
