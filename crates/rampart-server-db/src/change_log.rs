// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Append-only audit trail of inventory mutations.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::DbError;
use crate::types::{
	format_timestamp, parse_id, parse_timestamp, ChangeEntry, ChangeFilter, ChangeId, NewChange,
};

#[async_trait]
pub trait ChangeLogStore: Send + Sync {
	async fn record_change(&self, change: &NewChange) -> Result<ChangeEntry, DbError>;
	async fn list_changes(
		&self,
		filter: &ChangeFilter,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ChangeEntry>, i64), DbError>;
}

#[async_trait]
impl ChangeLogStore for ChangeLogRepository {
	async fn record_change(&self, change: &NewChange) -> Result<ChangeEntry, DbError> {
		self.record_change(change).await
	}

	async fn list_changes(
		&self,
		filter: &ChangeFilter,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ChangeEntry>, i64), DbError> {
		self.list_changes(filter, limit, offset).await
	}
}

#[derive(Clone)]
pub struct ChangeLogRepository {
	pool: SqlitePool,
}

impl ChangeLogRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Append an entry. Entries outlive the entity they describe.
	#[tracing::instrument(
		skip(self, change),
		fields(entity_type = %change.entity_type, entity_id = %change.entity_id, action = %change.action)
	)]
	pub async fn record_change(&self, change: &NewChange) -> Result<ChangeEntry, DbError> {
		let entry = ChangeEntry {
			id: ChangeId::generate(),
			entity_type: change.entity_type,
			entity_id: change.entity_id.clone(),
			action: change.action,
			actor: change.actor.clone(),
			summary: change.summary.clone(),
			details: change.details.clone(),
			created_at: chrono::Utc::now(),
		};
		let created_at = format_timestamp(&entry.created_at);

		sqlx::query(
			r#"
			INSERT INTO change_log (id, entity_type, entity_id, action, actor, summary, details, created_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(entry.id.to_string())
		.bind(entry.entity_type.as_str())
		.bind(&entry.entity_id)
		.bind(entry.action.as_str())
		.bind(&entry.actor)
		.bind(&entry.summary)
		.bind(serde_json::to_string(&entry.details)?)
		.bind(&created_at)
		.execute(&self.pool)
		.await?;

		tracing::info!(change_id = %entry.id, summary = %entry.summary, "change recorded");
		Ok(ChangeEntry {
			created_at: parse_timestamp(&created_at, "created_at")?,
			..entry
		})
	}

	/// Entries matching `filter`, newest first.
	#[tracing::instrument(skip(self))]
	pub async fn list_changes(
		&self,
		filter: &ChangeFilter,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ChangeEntry>, i64), DbError> {
		let entity_type = filter.entity_type.map(|t| t.as_str());

		let total: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM change_log
			 WHERE (?1 IS NULL OR entity_type = ?1) AND (?2 IS NULL OR entity_id = ?2)",
		)
		.bind(entity_type)
		.bind(&filter.entity_id)
		.fetch_one(&self.pool)
		.await?;

		let rows = sqlx::query(
			r#"
			SELECT id, entity_type, entity_id, action, actor, summary, details, created_at
			FROM change_log
			WHERE (?1 IS NULL OR entity_type = ?1) AND (?2 IS NULL OR entity_id = ?2)
			ORDER BY created_at DESC, rowid DESC
			LIMIT ?3 OFFSET ?4
			"#,
		)
		.bind(entity_type)
		.bind(&filter.entity_id)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let entries = rows
			.iter()
			.map(parse_change_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((entries, total))
	}
}

fn parse_change_row(row: &sqlx::sqlite::SqliteRow) -> Result<ChangeEntry, DbError> {
	let id: String = row.get("id");
	let entity_type: String = row.get("entity_type");
	let action: String = row.get("action");
	let details: String = row.get("details");
	let created_at: String = row.get("created_at");

	Ok(ChangeEntry {
		id: parse_id(&id, "change id")?,
		entity_type: entity_type.parse().map_err(DbError::Internal)?,
		entity_id: row.get("entity_id"),
		action: action.parse().map_err(DbError::Internal)?,
		actor: row.get("actor"),
		summary: row.get("summary"),
		details: serde_json::from_str(&details)?,
		created_at: parse_timestamp(&created_at, "created_at")?,
	})
}
