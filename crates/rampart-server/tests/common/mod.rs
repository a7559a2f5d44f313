// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared harness for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
	body::Body,
	http::{Method, Request, StatusCode},
	Router,
};
use rampart_server::{actor::ACTOR_HEADER, create_app_state, create_router, db, AppState};
use rampart_server_secrets::{generate_key, SecretCodec};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
	pub router: Router,
	pub state: AppState,
	_dir: TempDir,
}

/// App over an isolated on-disk database with a fresh random credential key.
pub async fn setup_test_app() -> TestApp {
	let dir = tempfile::tempdir().unwrap();
	let db_url = format!("sqlite:{}?mode=rwc", dir.path().join("rampart.db").display());
	let pool = db::create_pool(&db_url, 4).await.unwrap();
	db::run_migrations(&pool).await.unwrap();

	let codec = Arc::new(SecretCodec::new(generate_key()));
	let state = create_app_state(pool, codec);
	TestApp {
		router: create_router(state.clone()),
		state,
		_dir: dir,
	}
}

impl TestApp {
	/// The same database served with a different credential key.
	pub fn with_other_key(&self) -> Router {
		let codec = Arc::new(SecretCodec::new(generate_key()));
		create_router(create_app_state(self.state.pool.clone(), codec))
	}

	pub async fn request(
		&self,
		method: Method,
		uri: &str,
		body: Option<Value>,
		actor: Option<&str>,
	) -> (StatusCode, Value) {
		send(&self.router, method, uri, body, actor).await
	}

	pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
		self.request(Method::GET, uri, None, None).await
	}

	pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
		self.request(Method::POST, uri, Some(body), None).await
	}

	pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
		self.request(Method::PATCH, uri, Some(body), None).await
	}

	pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
		self.request(Method::DELETE, uri, None, None).await
	}

	/// Register a device and return its id.
	pub async fn create_device(&self, name: &str) -> String {
		let (status, body) = self
			.post(
				"/api/devices",
				serde_json::json!({
					"name": name,
					"vendor": "fortinet",
					"hostname": format!("{name}.example.net"),
					"username": "admin",
					"password": "Sup3rSecret!",
				}),
			)
			.await;
		assert_eq!(status, StatusCode::CREATED, "{body}");
		body["id"].as_str().unwrap().to_string()
	}
}

pub async fn send(
	router: &Router,
	method: Method,
	uri: &str,
	body: Option<Value>,
	actor: Option<&str>,
) -> (StatusCode, Value) {
	let mut builder = Request::builder().method(method).uri(uri);
	if let Some(actor) = actor {
		builder = builder.header(ACTOR_HEADER, actor);
	}
	let request = match body {
		Some(json) => builder
			.header("content-type", "application/json")
			.body(Body::from(json.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	};

	let response = router.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let value = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes)
			.unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
	};
	(status, value)
}
