// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Integration tests for device endpoints and credential handling.

mod common;

use axum::http::{Method, StatusCode};
use common::{send, setup_test_app};
use serde_json::json;

const PASSWORD: &str = "Sup3rSecret!";

fn tamper(stored: &str) -> String {
	let mut chars: Vec<char> = stored.chars().collect();
	let mid = chars.len() / 2;
	chars[mid] = if chars[mid] == 'A' { 'B' } else { 'A' };
	chars.into_iter().collect()
}

#[tokio::test]
async fn create_device_hides_credentials() {
	let app = setup_test_app().await;

	let (status, body) = app
		.post(
			"/api/devices",
			json!({
				"name": "edge-fw-01",
				"vendor": "palo_alto",
				"hostname": "edge-fw-01.example.net",
				"management_ip": "10.0.0.1",
				"username": "admin",
				"password": PASSWORD,
				"api_key": "LUFRPT14MW5xOEo1R09KVlBZNnpnemh0VHRBOWl6TGM9",
			}),
		)
		.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["name"], "edge-fw-01");
	assert_eq!(body["vendor"], "palo_alto");
	assert_eq!(body["port"], 443);
	assert_eq!(body["enabled"], true);
	assert_eq!(body["has_password"], true);
	assert_eq!(body["has_api_key"], true);
	assert_eq!(body["has_enable_secret"], false);

	let text = body.to_string();
	assert!(!text.contains(PASSWORD));
	assert!(!text.contains("LUFRPT14"));
	assert!(body.get("password").is_none());
}

#[tokio::test]
async fn credentials_are_encrypted_at_rest_and_round_trip() {
	let app = setup_test_app().await;
	let id = app.create_device("core-fw").await;

	let stored: String = sqlx::query_scalar("SELECT password FROM devices WHERE id = ?")
		.bind(&id)
		.fetch_one(&app.state.pool)
		.await
		.unwrap();
	assert!(!stored.is_empty());
	assert!(!stored.contains(PASSWORD));

	let (status, creds) = app.get(&format!("/api/devices/{id}/credentials")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(creds["device_id"], id.as_str());
	assert_eq!(creds["username"], "admin");
	assert_eq!(creds["password"], PASSWORD);
	assert!(creds["api_key"].is_null());
	assert!(creds["enable_secret"].is_null());
}

#[tokio::test]
async fn tampered_credential_is_a_decryption_failure() {
	let app = setup_test_app().await;
	let id = app.create_device("dmz-fw").await;

	let stored: String = sqlx::query_scalar("SELECT password FROM devices WHERE id = ?")
		.bind(&id)
		.fetch_one(&app.state.pool)
		.await
		.unwrap();
	sqlx::query("UPDATE devices SET password = ? WHERE id = ?")
		.bind(tamper(&stored))
		.bind(&id)
		.execute(&app.state.pool)
		.await
		.unwrap();

	let (status, body) = app.get(&format!("/api/devices/{id}/credentials")).await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "credential_decryption_failed");
	assert!(body.get("password").is_none());

	// The device record itself is still readable.
	let (status, _) = app.get(&format!("/api/devices/{id}")).await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wrong_key_is_a_decryption_failure() {
	let app = setup_test_app().await;
	let id = app.create_device("branch-fw").await;

	let other = app.with_other_key();
	let (status, body) = send(
		&other,
		Method::GET,
		&format!("/api/devices/{id}/credentials"),
		None,
		None,
	)
	.await;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "credential_decryption_failed");
}

#[tokio::test]
async fn empty_password_is_stored_as_empty() {
	let app = setup_test_app().await;

	let (status, body) = app
		.post(
			"/api/devices",
			json!({
				"name": "key-only",
				"vendor": "sophos",
				"hostname": "sophos.example.net",
				"username": "api",
				"api_key": "k-123",
			}),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["has_password"], false);
	let id = body["id"].as_str().unwrap();

	let stored: String = sqlx::query_scalar("SELECT password FROM devices WHERE id = ?")
		.bind(id)
		.fetch_one(&app.state.pool)
		.await
		.unwrap();
	assert_eq!(stored, "");

	let (status, creds) = app.get(&format!("/api/devices/{id}/credentials")).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(creds["password"], "");
	assert_eq!(creds["api_key"], "k-123");
}

#[tokio::test]
async fn duplicate_device_name_conflicts() {
	let app = setup_test_app().await;
	app.create_device("edge").await;

	let (status, body) = app
		.post(
			"/api/devices",
			json!({
				"name": "edge",
				"vendor": "cisco_asa",
				"hostname": "asa.example.net",
				"username": "admin",
				"password": "x",
			}),
		)
		.await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn bad_requests() {
	let app = setup_test_app().await;

	let (status, body) = app.get("/api/devices/not-a-uuid").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "bad_request");

	let (status, _) = app
		.post(
			"/api/devices",
			json!({
				"name": "  ",
				"vendor": "fortinet",
				"hostname": "h",
				"username": "u",
			}),
		)
		.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let missing = "00000000-0000-4000-8000-000000000000";
	let (status, body) = app.get(&format!("/api/devices/{missing}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "not_found");

	let (status, _) = app.get(&format!("/api/devices/{missing}/credentials")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_rotates_and_clears_credentials() {
	let app = setup_test_app().await;
	let id = app.create_device("rotate-me").await;
	let uri = format!("/api/devices/{id}");

	let (status, body) = app
		.patch(
			&uri,
			json!({ "password": "N3wPassw0rd", "enable_secret": "en4ble", "port": 8443 }),
		)
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["port"], 8443);
	assert_eq!(body["has_enable_secret"], true);

	let (_, creds) = app.get(&format!("{uri}/credentials")).await;
	assert_eq!(creds["password"], "N3wPassw0rd");
	assert_eq!(creds["enable_secret"], "en4ble");

	let (status, body) = app.patch(&uri, json!({ "enable_secret": "" })).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["has_enable_secret"], false);

	let (_, creds) = app.get(&format!("{uri}/credentials")).await;
	assert!(creds["enable_secret"].is_null());
	assert_eq!(creds["password"], "N3wPassw0rd");
}

#[tokio::test]
async fn list_devices_filters_and_paginates() {
	let app = setup_test_app().await;
	for name in ["a-fw", "b-fw", "c-fw"] {
		app.create_device(name).await;
	}
	app.post(
		"/api/devices",
		json!({
			"name": "srx",
			"vendor": "juniper_srx",
			"hostname": "srx.example.net",
			"username": "root",
			"password": "x",
		}),
	)
	.await;

	let (status, body) = app.get("/api/devices?limit=2&offset=1").await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 4);
	assert_eq!(body["limit"], 2);
	assert_eq!(body["offset"], 1);
	assert_eq!(body["devices"].as_array().unwrap().len(), 2);

	let (_, body) = app.get("/api/devices?vendor=juniper_srx").await;
	assert_eq!(body["total"], 1);
	assert_eq!(body["devices"][0]["name"], "srx");

	let (status, _) = app.get("/api/devices?vendor=netscreen").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_devices_by_exact_name() {
	let app = setup_test_app().await;
	let id = app.create_device("edge-fw").await;
	app.create_device("edge-fw-2").await;

	let (status, body) = app.get("/api/devices?name=edge-fw").await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 1);
	assert_eq!(body["devices"][0]["id"], id.as_str());

	// create_device registers fortinet devices.
	let (_, body) = app.get("/api/devices?name=edge-fw&vendor=sophos").await;
	assert_eq!(body["total"], 0);

	let (_, body) = app.get("/api/devices?name=edge").await;
	assert_eq!(body["total"], 0);
	assert!(body["devices"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn device_lifecycle_is_recorded_in_change_log() {
	let app = setup_test_app().await;

	let (status, body) = app
		.request(
			Method::POST,
			"/api/devices",
			Some(json!({
				"name": "audited",
				"vendor": "check_point",
				"hostname": "cp.example.net",
				"username": "admin",
				"password": PASSWORD,
			})),
			Some("alice"),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	let id = body["id"].as_str().unwrap().to_string();

	app.request(
		Method::PATCH,
		&format!("/api/devices/{id}"),
		Some(json!({ "password": "an0ther", "description": "primary" })),
		Some("bob"),
	)
	.await;
	let (status, _) = app.delete(&format!("/api/devices/{id}")).await;
	assert_eq!(status, StatusCode::OK);

	let (status, _) = app.get(&format!("/api/devices/{id}")).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	let (status, body) = app
		.get(&format!("/api/changes?entity_type=device&entity_id={id}"))
		.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["total"], 3);

	let changes = body["changes"].as_array().unwrap();
	assert_eq!(changes[0]["action"], "deleted");
	assert!(changes[0]["actor"].is_null());
	assert_eq!(changes[1]["action"], "updated");
	assert_eq!(changes[1]["actor"], "bob");
	assert_eq!(changes[1]["details"]["fields"], json!(["password", "description"]));
	assert_eq!(changes[2]["action"], "created");
	assert_eq!(changes[2]["actor"], "alice");

	let text = body.to_string();
	assert!(!text.contains(PASSWORD));
	assert!(!text.contains("an0ther"));
}
