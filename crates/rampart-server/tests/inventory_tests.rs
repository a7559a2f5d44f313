// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for objects, groups, policies and notifications.

mod common;

use axum::http::{Method, StatusCode};
use common::{setup_test_app, TestApp};
use serde_json::{json, Value};

async fn create_network_object(
	app: &TestApp,
	device_id: Option<&str>,
	name: &str,
	value: &str,
) -> String {
	let (status, body) = app
		.post(
			"/api/network-objects",
			json!({ "device_id": device_id, "name": name, "kind": "host", "value": value }),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED, "{body}");
	body["id"].as_str().unwrap().to_string()
}

async fn create_policy(
	app: &TestApp,
	device_id: &str,
	name: &str,
	position: i64,
	enabled: bool,
) -> String {
	let (status, body) = app
		.post(
			"/api/policies",
			json!({
				"device_id": device_id,
				"name": name,
				"position": position,
				"source_zones": ["trust"],
				"destination_zones": ["untrust"],
				"services": ["https"],
				"action": "allow",
				"enabled": enabled,
			}),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED, "{body}");
	body["id"].as_str().unwrap().to_string()
}

fn names(list: &Value) -> Vec<String> {
	list.as_array()
		.unwrap()
		.iter()
		.map(|p| p["name"].as_str().unwrap().to_string())
		.collect()
}

// ============================================================================
// Objects
// ============================================================================

#[tokio::test]
async fn network_object_crud() {
	let app = setup_test_app().await;
	let device = app.create_device("fw").await;

	let (status, body) = app
		.post(
			"/api/network-objects",
			json!({
				"device_id": device,
				"name": "web-servers",
				"kind": "network",
				"value": "10.1.0.0/24",
				"description": "DMZ web tier",
			}),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["device_id"], device.as_str());
	assert_eq!(body["kind"], "network");
	let id = body["id"].as_str().unwrap().to_string();

	let (status, body) = app
		.patch(
			&format!("/api/network-objects/{id}"),
			json!({ "value": "10.1.0.0/23" }),
		)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["value"], "10.1.0.0/23");

	let (status, body) = app
		.patch(
			&format!("/api/network-objects/{id}"),
			json!({ "kind": "fqdn" }),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

	let (status, body) = app
		.get(&format!("/api/network-objects?device_id={device}"))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 1);

	let (status, _) = app.delete(&format!("/api/network-objects/{id}")).await;
	assert_eq!(status, StatusCode::OK);
	let (status, _) = app.get(&format!("/api/network-objects/{id}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (_, body) = app.get("/api/changes?entity_type=network_object").await;
	// The rejected kind change is not recorded.
	assert_eq!(body["total"], 3);
	assert_eq!(body["changes"][0]["action"], "deleted");
	assert_eq!(body["changes"][1]["action"], "updated");
	assert_eq!(body["changes"][2]["action"], "created");
}

#[tokio::test]
async fn host_address_cannot_become_fqdn() {
	let app = setup_test_app().await;
	let id = create_network_object(&app, None, "srv", "10.0.0.5").await;
	let uri = format!("/api/network-objects/{id}");

	let (status, body) = app.patch(&uri, json!({ "kind": "fqdn" })).await;
	assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

	let (status, _) = app
		.post(
			"/api/network-objects",
			json!({ "name": "bogus", "kind": "fqdn", "value": "999.1.2.3" }),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) = app
		.patch(&uri, json!({ "kind": "fqdn", "value": "srv.example.net" }))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["kind"], "fqdn");
}

#[tokio::test]
async fn listings_filter_by_scope() {
	let app = setup_test_app().await;
	let device = app.create_device("fw-scope").await;
	create_network_object(&app, Some(&device), "local", "10.3.0.1").await;
	create_network_object(&app, None, "shared-a", "10.0.0.1").await;
	create_network_object(&app, None, "shared-b", "10.0.0.2").await;
	app.post("/api/network-groups", json!({ "name": "shared" })).await;
	app.post(
		"/api/network-groups",
		json!({ "device_id": device, "name": "local" }),
	)
	.await;

	let (_, body) = app.get("/api/network-objects").await;
	assert_eq!(body["total"], 3);

	let (status, body) = app.get("/api/network-objects?device_id=global").await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 2);
	assert_eq!(body["objects"][0]["name"], "shared-a");
	assert!(body["objects"][0]["device_id"].is_null());

	let (_, body) = app
		.get(&format!("/api/network-objects?device_id={device}"))
		.await;
	assert_eq!(body["total"], 1);
	assert_eq!(body["objects"][0]["name"], "local");

	let (_, body) = app.get("/api/network-groups?device_id=global").await;
	assert_eq!(body["total"], 1);
	assert_eq!(body["groups"][0]["name"], "shared");

	let (status, _) = app.get("/api/service-objects?device_id=everywhere").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn network_object_validation() {
	let app = setup_test_app().await;

	let (status, body) = app
		.post(
			"/api/network-objects",
			json!({ "name": "bad", "kind": "network", "value": "10.0.0.300/24" }),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "bad_request");

	let (status, _) = app
		.post(
			"/api/network-objects",
			json!({
				"device_id": "00000000-0000-4000-8000-000000000000",
				"name": "orphan",
				"kind": "host",
				"value": "10.0.0.1",
			}),
		)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	create_network_object(&app, None, "dns", "10.0.0.53").await;
	let (status, _) = app
		.post(
			"/api/network-objects",
			json!({ "name": "dns", "kind": "host", "value": "10.0.0.54" }),
		)
		.await;
	assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn service_objects() {
	let app = setup_test_app().await;

	let (status, body) = app
		.post(
			"/api/service-objects",
			json!({ "name": "https", "protocol": "tcp", "port_start": 443 }),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["port_start"], 443);
	assert_eq!(body["port_end"], 443);

	let (status, body) = app
		.post(
			"/api/service-objects",
			json!({ "name": "ping", "protocol": "icmp" }),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert!(body["port_start"].is_null());

	let (status, _) = app
		.post(
			"/api/service-objects",
			json!({ "name": "icmp-port", "protocol": "icmp", "port_start": 1 }),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, _) = app
		.post(
			"/api/service-objects",
			json!({ "name": "backwards", "protocol": "udp", "port_start": 2000, "port_end": 1000 }),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (_, body) = app.get("/api/service-objects?protocol=tcp").await;
	assert_eq!(body["total"], 1);
	assert_eq!(body["objects"][0]["name"], "https");
}

// ============================================================================
// Groups
// ============================================================================

#[tokio::test]
async fn network_group_membership() {
	let app = setup_test_app().await;
	let device = app.create_device("fw-a").await;
	let other = app.create_device("fw-b").await;

	let local = create_network_object(&app, Some(&device), "app-01", "10.2.0.1").await;
	let shared = create_network_object(&app, None, "ntp", "10.0.0.123").await;
	let foreign = create_network_object(&app, Some(&other), "app-99", "10.9.0.1").await;

	let (status, group) = app
		.post(
			"/api/network-groups",
			json!({ "device_id": device, "name": "app-tier" }),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	let group_id = group["id"].as_str().unwrap().to_string();
	let members_uri = format!("/api/network-groups/{group_id}/members");

	let (status, body) = app.post(&members_uri, json!({ "object_id": local })).await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["members"], json!([local]));

	let (status, _) = app.post(&members_uri, json!({ "object_id": local })).await;
	assert_eq!(status, StatusCode::OK);

	let (status, body) = app.post(&members_uri, json!({ "object_id": shared })).await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["members"], json!([local, shared]));

	let (status, _) = app.post(&members_uri, json!({ "object_id": foreign })).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, _) = app
		.post(
			&members_uri,
			json!({ "object_id": "00000000-0000-4000-8000-000000000000" }),
		)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (_, body) = app.get(&format!("/api/network-groups/{group_id}")).await;
	assert_eq!(body["member_count"], 2);

	// Deleting an object drops its memberships.
	app.delete(&format!("/api/network-objects/{shared}")).await;
	let (_, body) = app.get(&members_uri).await;
	assert_eq!(body["members"], json!([local]));

	let (status, _) = app.delete(&format!("{members_uri}/{local}")).await;
	assert_eq!(status, StatusCode::OK);
	let (status, _) = app.delete(&format!("{members_uri}/{local}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (_, body) = app
		.get(&format!("/api/changes?entity_type=network_group&entity_id={group_id}"))
		.await;
	// created, two additions, one removal
	assert_eq!(body["total"], 4);
}

#[tokio::test]
async fn service_groups_only_hold_service_objects() {
	let app = setup_test_app().await;
	let network = create_network_object(&app, None, "host-a", "10.0.0.1").await;
	let (_, svc) = app
		.post(
			"/api/service-objects",
			json!({ "name": "ssh", "protocol": "tcp", "port_start": 22 }),
		)
		.await;
	let svc = svc["id"].as_str().unwrap().to_string();

	let (status, group) = app
		.post("/api/service-groups", json!({ "name": "mgmt" }))
		.await;
	assert_eq!(status, StatusCode::CREATED);
	let group_id = group["id"].as_str().unwrap().to_string();
	let members_uri = format!("/api/service-groups/{group_id}/members");

	let (status, _) = app.post(&members_uri, json!({ "object_id": network })).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, _) = app.post(&members_uri, json!({ "object_id": svc })).await;
	assert_eq!(status, StatusCode::CREATED);

	// The network group routes do not see service groups.
	let (status, _) = app.get(&format!("/api/network-groups/{group_id}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, _) = app.delete(&format!("/api/service-groups/{group_id}")).await;
	assert_eq!(status, StatusCode::OK);
	let (status, _) = app.get(&members_uri).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn group_rename_is_recorded() {
	let app = setup_test_app().await;
	app.post("/api/service-groups", json!({ "name": "taken" })).await;
	let (_, group) = app
		.post(
			"/api/service-groups",
			json!({ "name": "web", "description": "http and https" }),
		)
		.await;
	let group_id = group["id"].as_str().unwrap().to_string();
	let uri = format!("/api/service-groups/{group_id}");

	let (status, body) = app
		.patch(&uri, json!({ "name": "web-ports", "description": "" }))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["name"], "web-ports");
	assert!(body["description"].is_null());

	let (status, _) = app.patch(&uri, json!({ "name": "taken" })).await;
	assert_eq!(status, StatusCode::CONFLICT);
	let (status, _) = app.patch(&uri, json!({ "name": " " })).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	let (status, _) = app
		.patch(&format!("/api/network-groups/{group_id}"), json!({ "name": "x" }))
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (_, body) = app
		.get(&format!("/api/changes?entity_type=service_group&entity_id={group_id}"))
		.await;
	assert_eq!(body["total"], 2);
	assert_eq!(body["changes"][0]["action"], "updated");
	assert_eq!(body["changes"][0]["details"]["fields"], json!(["name", "description"]));
}

// ============================================================================
// Policies
// ============================================================================

#[tokio::test]
async fn policies_are_listed_in_rule_order() {
	let app = setup_test_app().await;
	let device = app.create_device("fw").await;

	create_policy(&app, &device, "allow-web", 20, true).await;
	create_policy(&app, &device, "allow-dns", 10, true).await;
	create_policy(&app, &device, "deny-all", 100, true).await;

	let (status, body) = app.get(&format!("/api/policies?device_id={device}")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 3);
	assert_eq!(
		names(&body["policies"]),
		vec!["allow-dns", "allow-web", "deny-all"]
	);
	assert_eq!(body["policies"][0]["source_zones"], json!(["trust"]));

	let (status, _) = app.get("/api/policies").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, _) = app
		.get("/api/policies?device_id=00000000-0000-4000-8000-000000000000")
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, _) = app
		.post(
			"/api/policies",
			json!({ "device_id": device, "name": "allow-web", "position": 5, "action": "deny" }),
		)
		.await;
	assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn policy_update_and_delete() {
	let app = setup_test_app().await;
	let device = app.create_device("fw").await;
	let id = create_policy(&app, &device, "legacy", 50, true).await;

	let (status, body) = app
		.request(
			Method::PATCH,
			&format!("/api/policies/{id}"),
			Some(json!({ "action": "deny", "logging": true, "services": [] })),
			Some("carol"),
		)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["action"], "deny");
	assert_eq!(body["logging"], true);
	assert_eq!(body["services"], json!([]));
	assert_eq!(body["source_zones"], json!(["trust"]));

	let (status, _) = app
		.patch(&format!("/api/policies/{id}"), json!({ "position": -1 }))
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (_, changes) = app
		.get(&format!("/api/changes?entity_type=policy&entity_id={id}"))
		.await;
	assert_eq!(changes["changes"][0]["actor"], "carol");
	assert_eq!(
		changes["changes"][0]["details"]["fields"],
		json!(["services", "action", "logging"])
	);

	let (status, _) = app.delete(&format!("/api/policies/{id}")).await;
	assert_eq!(status, StatusCode::OK);
	let (status, _) = app.get(&format!("/api/policies/{id}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn hit_counts_and_unused_policies() {
	let app = setup_test_app().await;
	let device = app.create_device("fw").await;

	let busy = create_policy(&app, &device, "busy", 10, true).await;
	let idle = create_policy(&app, &device, "idle", 20, true).await;
	create_policy(&app, &device, "never-sampled", 30, true).await;
	create_policy(&app, &device, "disabled", 40, false).await;

	let (status, body) = app
		.post(
			&format!("/api/policies/{busy}/hit-counts"),
			json!({ "hit_count": 0 }),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["policy_id"], busy.as_str());

	let (status, _) = app
		.post(
			&format!("/api/policies/{busy}/hit-counts"),
			json!({ "hit_count": 1523, "last_hit_at": "2025-06-01T12:00:00Z" }),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);

	app.post(
		&format!("/api/policies/{idle}/hit-counts"),
		json!({ "hit_count": 0 }),
	)
	.await;

	let (status, body) = app.get(&format!("/api/policies/{busy}/hit-counts")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 2);
	assert_eq!(body["samples"][0]["hit_count"], 1523);

	let (status, _) = app
		.post(
			&format!("/api/policies/{idle}/hit-counts"),
			json!({ "hit_count": -4 }),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) = app
		.get(&format!("/api/devices/{device}/unused-policies"))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["device_id"], device.as_str());
	let unused = names(&body["policies"]);
	assert_eq!(unused.len(), 2);
	assert!(unused.contains(&"idle".to_string()));
	assert!(unused.contains(&"never-sampled".to_string()));
	assert!(!unused.iter().any(|n| n == "busy" || n == "disabled"));

	let missing = "00000000-0000-4000-8000-000000000000";
	let (status, _) = app.get(&format!("/api/policies/{missing}/hit-counts")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	let (status, _) = app
		.post(
			&format!("/api/policies/{missing}/hit-counts"),
			json!({ "hit_count": 1 }),
		)
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_device_cascades_to_its_inventory() {
	let app = setup_test_app().await;
	let device = app.create_device("fw").await;
	let object = create_network_object(&app, Some(&device), "srv", "10.0.0.10").await;
	let policy = create_policy(&app, &device, "rule", 1, true).await;

	let (status, _) = app.delete(&format!("/api/devices/{device}")).await;
	assert_eq!(status, StatusCode::OK);

	let (status, _) = app.get(&format!("/api/network-objects/{object}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	let (status, _) = app.get(&format!("/api/policies/{policy}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Notifications
// ============================================================================

#[tokio::test]
async fn notification_lifecycle() {
	let app = setup_test_app().await;
	let device = app.create_device("fw").await;

	let (status, first) = app
		.post(
			"/api/notifications",
			json!({
				"device_id": device,
				"severity": "warning",
				"title": "Unused rules",
				"message": "3 policies have no hits in 90 days",
			}),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert!(first["acknowledged_at"].is_null());
	let first_id = first["id"].as_str().unwrap().to_string();

	let (status, _) = app
		.post(
			"/api/notifications",
			json!({ "severity": "info", "title": "Backup complete", "message": "ok" }),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);

	let (status, body) = app
		.post(&format!("/api/notifications/{first_id}/acknowledge"), json!({}))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert!(body["acknowledged_at"].is_string());
	let acked_at = body["acknowledged_at"].clone();

	let (status, body) = app
		.post(&format!("/api/notifications/{first_id}/acknowledge"), json!({}))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["acknowledged_at"], acked_at);

	let (_, body) = app.get("/api/notifications").await;
	assert_eq!(body["total"], 2);
	let (_, body) = app.get("/api/notifications?unacknowledged_only=true").await;
	assert_eq!(body["total"], 1);
	assert_eq!(body["notifications"][0]["title"], "Backup complete");

	let (status, _) = app
		.post(
			"/api/notifications",
			json!({ "severity": "critical", "title": " ", "message": "x" }),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, _) = app.delete(&format!("/api/notifications/{first_id}")).await;
	assert_eq!(status, StatusCode::OK);
	let (status, _) = app.delete(&format!("/api/notifications/{first_id}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	let (status, _) = app
		.post(&format!("/api/notifications/{first_id}/acknowledge"), json!({}))
		.await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}
