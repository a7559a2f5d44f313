// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::str::FromStr;
use std::sync::Arc;

use rampart_common_secret::SecretString;
use rampart_server_secrets::{generate_key, SecretCodec};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::types::{DeviceId, NewDevice, Vendor};

const SCHEMA: &[&str] = &[
	include_str!("../../rampart-server/migrations/001_devices.sql"),
	include_str!("../../rampart-server/migrations/002_objects.sql"),
	include_str!("../../rampart-server/migrations/003_policies.sql"),
	include_str!("../../rampart-server/migrations/004_change_log.sql"),
];

/// Single-connection in-memory pool; every connection to `:memory:` is a
/// separate database.
pub async fn create_test_pool() -> SqlitePool {
	let options = SqliteConnectOptions::from_str(":memory:")
		.unwrap()
		.foreign_keys(true);

	SqlitePoolOptions::new()
		.max_connections(1)
		.connect_with(options)
		.await
		.expect("Failed to create test pool")
}

/// In-memory pool with the full inventory schema applied.
pub async fn create_inventory_pool() -> SqlitePool {
	let pool = create_test_pool().await;
	for migration in SCHEMA {
		for stmt in migration.split(';').filter(|s| !s.trim().is_empty()) {
			sqlx::query(stmt).execute(&pool).await.unwrap();
		}
	}
	pool
}

pub fn test_codec() -> Arc<SecretCodec> {
	Arc::new(SecretCodec::new(generate_key()))
}

pub fn sample_device(name: &str) -> NewDevice {
	NewDevice {
		name: name.to_string(),
		vendor: Vendor::PaloAlto,
		hostname: format!("{name}.fw.example.net"),
		management_ip: Some("10.20.0.1".to_string()),
		port: 443,
		username: "admin".to_string(),
		password: SecretString::from("Sup3rSecret!"),
		api_key: Some(SecretString::from("LUFRPT1-api-key")),
		enable_secret: None,
		description: None,
		enabled: true,
	}
}

/// Insert a bare device row for tests that only need a foreign-key target.
pub async fn insert_device(pool: &SqlitePool, name: &str) -> DeviceId {
	let id = DeviceId::generate();
	sqlx::query(
		r#"
		INSERT INTO devices (id, name, vendor, hostname, port, username, password, created_at, updated_at)
		VALUES (?, ?, 'fortinet', ?, 443, 'admin', '', '2025-01-01T00:00:00.000000Z', '2025-01-01T00:00:00.000000Z')
		"#,
	)
	.bind(id.to_string())
	.bind(name)
	.bind(format!("{name}.example.net"))
	.execute(pool)
	.await
	.unwrap();
	id
}
