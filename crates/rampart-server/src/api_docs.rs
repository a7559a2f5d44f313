// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for rampart-server, served raw at
//! `/api/openapi.json`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
	info(
		title = "Rampart Server API",
		version = "1.0.0",
		description = "Firewall inventory and change tracking. Devices, address and service objects, groups, policy rules with hit counts, an append-only change log and operator notifications.",
		license(name = "Proprietary")
	),
	servers((url = "/", description = "Local server")),
	tags(
		(name = "health", description = "Database and credential codec health"),
		(name = "devices", description = "Managed firewalls and their encrypted credentials"),
		(name = "objects", description = "Network (address) objects and service objects"),
		(name = "groups", description = "Network and service groups and their membership"),
		(name = "policies", description = "Policy rules, hit-count samples and unused-rule reports"),
		(name = "changes", description = "Append-only inventory change log"),
		(name = "notifications", description = "Operator notifications")
	),
	paths(
		crate::routes::health::health_check,
		// Devices
		crate::routes::devices::list_devices,
		crate::routes::devices::create_device,
		crate::routes::devices::get_device,
		crate::routes::devices::update_device,
		crate::routes::devices::delete_device,
		crate::routes::devices::get_device_credentials,
		// Objects
		crate::routes::objects::list_network_objects,
		crate::routes::objects::create_network_object,
		crate::routes::objects::get_network_object,
		crate::routes::objects::update_network_object,
		crate::routes::objects::delete_network_object,
		crate::routes::objects::list_service_objects,
		crate::routes::objects::create_service_object,
		crate::routes::objects::get_service_object,
		crate::routes::objects::update_service_object,
		crate::routes::objects::delete_service_object,
		// Groups
		crate::routes::groups::list_network_groups,
		crate::routes::groups::create_network_group,
		crate::routes::groups::get_network_group,
		crate::routes::groups::update_network_group,
		crate::routes::groups::delete_network_group,
		crate::routes::groups::list_network_group_members,
		crate::routes::groups::add_network_group_member,
		crate::routes::groups::remove_network_group_member,
		crate::routes::groups::list_service_groups,
		crate::routes::groups::create_service_group,
		crate::routes::groups::get_service_group,
		crate::routes::groups::update_service_group,
		crate::routes::groups::delete_service_group,
		crate::routes::groups::list_service_group_members,
		crate::routes::groups::add_service_group_member,
		crate::routes::groups::remove_service_group_member,
		// Policies
		crate::routes::policies::list_policies,
		crate::routes::policies::create_policy,
		crate::routes::policies::get_policy,
		crate::routes::policies::update_policy,
		crate::routes::policies::delete_policy,
		crate::routes::policies::list_hit_counts,
		crate::routes::policies::record_hit_count,
		crate::routes::policies::list_unused_policies,
		// Change log and notifications
		crate::routes::changes::list_changes,
		crate::routes::notifications::list_notifications,
		crate::routes::notifications::create_notification,
		crate::routes::notifications::acknowledge_notification,
		crate::routes::notifications::delete_notification,
	),
	components(schemas(
		rampart_server_api::ErrorResponse,
		rampart_server_api::SuccessResponse,
		rampart_server_api::HealthResponse,
		rampart_server_api::HealthStatus,
		rampart_server_api::ComponentHealth,
		rampart_server_api::DeviceResponse,
		rampart_server_api::ListDevicesResponse,
		rampart_server_api::CreateDeviceRequest,
		rampart_server_api::UpdateDeviceRequest,
		rampart_server_api::DeviceCredentialsResponse,
		rampart_server_api::NetworkObjectResponse,
		rampart_server_api::ListNetworkObjectsResponse,
		rampart_server_api::CreateNetworkObjectRequest,
		rampart_server_api::UpdateNetworkObjectRequest,
		rampart_server_api::ServiceObjectResponse,
		rampart_server_api::ListServiceObjectsResponse,
		rampart_server_api::CreateServiceObjectRequest,
		rampart_server_api::UpdateServiceObjectRequest,
		rampart_server_api::GroupResponse,
		rampart_server_api::ListGroupsResponse,
		rampart_server_api::CreateGroupRequest,
		rampart_server_api::UpdateGroupRequest,
		rampart_server_api::AddGroupMemberRequest,
		rampart_server_api::GroupMembersResponse,
		rampart_server_api::PolicyResponse,
		rampart_server_api::ListPoliciesResponse,
		rampart_server_api::CreatePolicyRequest,
		rampart_server_api::UpdatePolicyRequest,
		rampart_server_api::HitCountResponse,
		rampart_server_api::ListHitCountsResponse,
		rampart_server_api::RecordHitCountRequest,
		rampart_server_api::UnusedPoliciesResponse,
		rampart_server_api::ChangeResponse,
		rampart_server_api::ListChangesResponse,
		rampart_server_api::NotificationResponse,
		rampart_server_api::ListNotificationsResponse,
		rampart_server_api::CreateNotificationRequest,
		rampart_server_db::Vendor,
		rampart_server_db::NetworkObjectKind,
		rampart_server_db::ServiceProtocol,
		rampart_server_db::PolicyAction,
		rampart_server_db::EntityType,
		rampart_server_db::ChangeAction,
		rampart_server_db::Severity,
	))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn openapi_document_serializes() {
		let json = serde_json::to_string_pretty(&ApiDoc::openapi()).unwrap();
		assert!(json.contains("\"openapi\""));
		assert!(json.contains("Rampart Server API"));
	}

	#[test]
	fn openapi_document_has_all_tags() {
		let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
		for tag in [
			"health",
			"devices",
			"objects",
			"groups",
			"policies",
			"changes",
			"notifications",
		] {
			assert!(json.contains(&format!("\"{tag}\"")), "missing tag {tag}");
		}
	}

	#[test]
	fn openapi_document_has_inventory_paths() {
		let doc = ApiDoc::openapi();
		for path in [
			"/health",
			"/api/devices",
			"/api/devices/{id}",
			"/api/devices/{id}/credentials",
			"/api/devices/{id}/unused-policies",
			"/api/network-objects/{id}",
			"/api/service-objects",
			"/api/network-groups/{id}/members/{member_id}",
			"/api/service-groups/{id}/members",
			"/api/policies/{id}/hit-counts",
			"/api/changes",
			"/api/notifications/{id}/acknowledge",
		] {
			assert!(doc.paths.paths.contains_key(path), "missing path {path}");
		}
	}

	#[test]
	fn credential_schema_is_documented_as_plain_strings() {
		let json = serde_json::to_value(ApiDoc::openapi()).unwrap();
		let create = &json["components"]["schemas"]["CreateDeviceRequest"]["properties"];
		assert_eq!(create["password"]["type"], "string");
	}
}
