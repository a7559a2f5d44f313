// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Database setup: pool creation and schema migrations.

use sqlx::sqlite::SqlitePool;

use crate::error::ServerError;

pub use rampart_server_db::create_pool;

const MIGRATIONS: &[(&str, &str)] = &[
	("001_devices", include_str!("../migrations/001_devices.sql")),
	("002_objects", include_str!("../migrations/002_objects.sql")),
	("003_policies", include_str!("../migrations/003_policies.sql")),
	("004_change_log", include_str!("../migrations/004_change_log.sql")),
];

/// Apply every migration, statement by statement. All statements use
/// `IF NOT EXISTS`, so running this against an existing database is a no-op.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), ServerError> {
	for (name, sql) in MIGRATIONS {
		for stmt in sql.split(';').filter(|s| !s.trim().is_empty()) {
			if let Err(e) = sqlx::query(stmt).execute(pool).await {
				if !e.to_string().contains("already exists") {
					tracing::error!(migration = name, error = %e, "migration failed");
					return Err(e.into());
				}
			}
		}
		tracing::debug!(migration = name, "migration applied");
	}
	Ok(())
}
