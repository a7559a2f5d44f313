// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Security policy repository and hit-count history.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::{map_constraint_error, DbError};
use crate::object::merge_description;
use crate::types::{
	format_timestamp, now_timestamp, parse_id, parse_opt_timestamp, parse_timestamp, DeviceId,
	HitCountId, HitCountSample, NewHitCount, NewPolicy, Policy, PolicyId, PolicyUpdate,
};

const POLICY_COLUMNS: &str = "id, device_id, name, position, source_zones, destination_zones, \
	source_addresses, destination_addresses, services, action, enabled, logging, description, \
	created_at, updated_at";

const HIT_COUNT_COLUMNS: &str = "id, policy_id, hit_count, first_hit_at, last_hit_at, recorded_at";

#[async_trait]
pub trait PolicyStore: Send + Sync {
	async fn create_policy(&self, policy: &NewPolicy) -> Result<Policy, DbError>;
	async fn get_policy(&self, id: &PolicyId) -> Result<Option<Policy>, DbError>;
	async fn list_policies(
		&self,
		device_id: &DeviceId,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Policy>, i64), DbError>;
	async fn update_policy(&self, id: &PolicyId, update: &PolicyUpdate) -> Result<Policy, DbError>;
	async fn delete_policy(&self, id: &PolicyId) -> Result<bool, DbError>;
	async fn record_hit_count(&self, policy_id: &PolicyId, sample: &NewHitCount) -> Result<HitCountSample, DbError>;
	async fn get_latest_hit_count(&self, policy_id: &PolicyId) -> Result<Option<HitCountSample>, DbError>;
	async fn list_hit_counts(
		&self,
		policy_id: &PolicyId,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<HitCountSample>, i64), DbError>;
	async fn list_unused_policies(&self, device_id: &DeviceId) -> Result<Vec<Policy>, DbError>;
}

#[async_trait]
impl PolicyStore for PolicyRepository {
	async fn create_policy(&self, policy: &NewPolicy) -> Result<Policy, DbError> {
		self.create_policy(policy).await
	}

	async fn get_policy(&self, id: &PolicyId) -> Result<Option<Policy>, DbError> {
		self.get_policy(id).await
	}

	async fn list_policies(
		&self,
		device_id: &DeviceId,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Policy>, i64), DbError> {
		self.list_policies(device_id, limit, offset).await
	}

	async fn update_policy(&self, id: &PolicyId, update: &PolicyUpdate) -> Result<Policy, DbError> {
		self.update_policy(id, update).await
	}

	async fn delete_policy(&self, id: &PolicyId) -> Result<bool, DbError> {
		self.delete_policy(id).await
	}

	async fn record_hit_count(&self, policy_id: &PolicyId, sample: &NewHitCount) -> Result<HitCountSample, DbError> {
		self.record_hit_count(policy_id, sample).await
	}

	async fn get_latest_hit_count(&self, policy_id: &PolicyId) -> Result<Option<HitCountSample>, DbError> {
		self.get_latest_hit_count(policy_id).await
	}

	async fn list_hit_counts(
		&self,
		policy_id: &PolicyId,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<HitCountSample>, i64), DbError> {
		self.list_hit_counts(policy_id, limit, offset).await
	}

	async fn list_unused_policies(&self, device_id: &DeviceId) -> Result<Vec<Policy>, DbError> {
		self.list_unused_policies(device_id).await
	}
}

#[derive(Clone)]
pub struct PolicyRepository {
	pool: SqlitePool,
}

impl PolicyRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// # Errors
	/// `DbError::NotFound` for an unknown device, `DbError::Conflict` if the
	/// device already has a rule with this name.
	#[tracing::instrument(skip(self, policy), fields(device_id = %policy.device_id, name = %policy.name))]
	pub async fn create_policy(&self, policy: &NewPolicy) -> Result<Policy, DbError> {
		if policy.position < 0 {
			return Err(DbError::Invalid("position must not be negative".to_string()));
		}

		let id = PolicyId::generate();
		let now = now_timestamp();

		sqlx::query(
			r#"
			INSERT INTO policies (
				id, device_id, name, position, source_zones, destination_zones,
				source_addresses, destination_addresses, services, action, enabled, logging,
				description, created_at, updated_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(policy.device_id.to_string())
		.bind(&policy.name)
		.bind(policy.position)
		.bind(serde_json::to_string(&policy.source_zones)?)
		.bind(serde_json::to_string(&policy.destination_zones)?)
		.bind(serde_json::to_string(&policy.source_addresses)?)
		.bind(serde_json::to_string(&policy.destination_addresses)?)
		.bind(serde_json::to_string(&policy.services)?)
		.bind(policy.action.as_str())
		.bind(policy.enabled)
		.bind(policy.logging)
		.bind(&policy.description)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("policy '{}' already exists on device", policy.name)))?;

		tracing::debug!(policy_id = %id, "policy created");
		self.require_policy(&id).await
	}

	#[tracing::instrument(skip(self), fields(policy_id = %id))]
	pub async fn get_policy(&self, id: &PolicyId) -> Result<Option<Policy>, DbError> {
		let row = sqlx::query(&format!("SELECT {POLICY_COLUMNS} FROM policies WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(parse_policy_row).transpose()
	}

	/// Rules for one device in evaluation order.
	#[tracing::instrument(skip(self), fields(device_id = %device_id))]
	pub async fn list_policies(
		&self,
		device_id: &DeviceId,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Policy>, i64), DbError> {
		let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM policies WHERE device_id = ?")
			.bind(device_id.to_string())
			.fetch_one(&self.pool)
			.await?;

		let rows = sqlx::query(&format!(
			"SELECT {POLICY_COLUMNS} FROM policies
			 WHERE device_id = ?
			 ORDER BY position ASC, name ASC
			 LIMIT ? OFFSET ?"
		))
		.bind(device_id.to_string())
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let policies = rows
			.iter()
			.map(parse_policy_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((policies, total))
	}

	#[tracing::instrument(skip(self, update), fields(policy_id = %id))]
	pub async fn update_policy(&self, id: &PolicyId, update: &PolicyUpdate) -> Result<Policy, DbError> {
		let current = self.require_policy(id).await?;

		let name = update.name.clone().unwrap_or(current.name);
		let position = update.position.unwrap_or(current.position);
		if position < 0 {
			return Err(DbError::Invalid("position must not be negative".to_string()));
		}
		let source_zones = update.source_zones.clone().unwrap_or(current.source_zones);
		let destination_zones = update
			.destination_zones
			.clone()
			.unwrap_or(current.destination_zones);
		let source_addresses = update
			.source_addresses
			.clone()
			.unwrap_or(current.source_addresses);
		let destination_addresses = update
			.destination_addresses
			.clone()
			.unwrap_or(current.destination_addresses);
		let services = update.services.clone().unwrap_or(current.services);
		let description = merge_description(&update.description, current.description);

		sqlx::query(
			r#"
			UPDATE policies
			SET name = ?, position = ?, source_zones = ?, destination_zones = ?,
			    source_addresses = ?, destination_addresses = ?, services = ?,
			    action = ?, enabled = ?, logging = ?, description = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&name)
		.bind(position)
		.bind(serde_json::to_string(&source_zones)?)
		.bind(serde_json::to_string(&destination_zones)?)
		.bind(serde_json::to_string(&source_addresses)?)
		.bind(serde_json::to_string(&destination_addresses)?)
		.bind(serde_json::to_string(&services)?)
		.bind(update.action.unwrap_or(current.action).as_str())
		.bind(update.enabled.unwrap_or(current.enabled))
		.bind(update.logging.unwrap_or(current.logging))
		.bind(&description)
		.bind(now_timestamp())
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("policy '{name}' already exists on device")))?;

		self.require_policy(id).await
	}

	/// Delete a rule along with its hit-count history.
	#[tracing::instrument(skip(self), fields(policy_id = %id))]
	pub async fn delete_policy(&self, id: &PolicyId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM policies WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self, sample), fields(policy_id = %policy_id, hit_count = sample.hit_count))]
	pub async fn record_hit_count(
		&self,
		policy_id: &PolicyId,
		sample: &NewHitCount,
	) -> Result<HitCountSample, DbError> {
		if sample.hit_count < 0 {
			return Err(DbError::Invalid("hit_count must not be negative".to_string()));
		}

		let id = HitCountId::generate();
		sqlx::query(
			r#"
			INSERT INTO policy_hit_counts (id, policy_id, hit_count, first_hit_at, last_hit_at, recorded_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(policy_id.to_string())
		.bind(sample.hit_count)
		.bind(sample.first_hit_at.as_ref().map(format_timestamp))
		.bind(sample.last_hit_at.as_ref().map(format_timestamp))
		.bind(now_timestamp())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || "hit-count sample already exists".to_string()))?;

		let row = sqlx::query(&format!(
			"SELECT {HIT_COUNT_COLUMNS} FROM policy_hit_counts WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_one(&self.pool)
		.await?;
		parse_hit_count_row(&row)
	}

	#[tracing::instrument(skip(self), fields(policy_id = %policy_id))]
	pub async fn get_latest_hit_count(
		&self,
		policy_id: &PolicyId,
	) -> Result<Option<HitCountSample>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {HIT_COUNT_COLUMNS} FROM policy_hit_counts
			 WHERE policy_id = ?
			 ORDER BY recorded_at DESC, rowid DESC
			 LIMIT 1"
		))
		.bind(policy_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.as_ref().map(parse_hit_count_row).transpose()
	}

	/// Samples for a rule, newest first.
	#[tracing::instrument(skip(self), fields(policy_id = %policy_id))]
	pub async fn list_hit_counts(
		&self,
		policy_id: &PolicyId,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<HitCountSample>, i64), DbError> {
		let total: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM policy_hit_counts WHERE policy_id = ?")
				.bind(policy_id.to_string())
				.fetch_one(&self.pool)
				.await?;

		let rows = sqlx::query(&format!(
			"SELECT {HIT_COUNT_COLUMNS} FROM policy_hit_counts
			 WHERE policy_id = ?
			 ORDER BY recorded_at DESC, rowid DESC
			 LIMIT ? OFFSET ?"
		))
		.bind(policy_id.to_string())
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let samples = rows
			.iter()
			.map(parse_hit_count_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((samples, total))
	}

	/// Enabled rules on a device whose most recent sample reads zero, or that
	/// have never been sampled. Disabled rules are not reported.
	#[tracing::instrument(skip(self), fields(device_id = %device_id))]
	pub async fn list_unused_policies(&self, device_id: &DeviceId) -> Result<Vec<Policy>, DbError> {
		let rows = sqlx::query(&format!(
			"SELECT {POLICY_COLUMNS} FROM policies p
			 WHERE p.device_id = ? AND p.enabled = 1
			   AND COALESCE((
			       SELECT h.hit_count FROM policy_hit_counts h
			       WHERE h.policy_id = p.id
			       ORDER BY h.recorded_at DESC, h.rowid DESC
			       LIMIT 1
			   ), 0) = 0
			 ORDER BY p.position ASC, p.name ASC"
		))
		.bind(device_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(parse_policy_row).collect()
	}

	async fn require_policy(&self, id: &PolicyId) -> Result<Policy, DbError> {
		self
			.get_policy(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("policy {id}")))
	}
}

fn parse_list(row: &sqlx::sqlite::SqliteRow, column: &str) -> Result<Vec<String>, DbError> {
	let raw: String = row.get(column);
	Ok(serde_json::from_str(&raw)?)
}

fn parse_policy_row(row: &sqlx::sqlite::SqliteRow) -> Result<Policy, DbError> {
	let id: String = row.get("id");
	let device_id: String = row.get("device_id");
	let action: String = row.get("action");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Policy {
		id: parse_id(&id, "policy id")?,
		device_id: parse_id(&device_id, "device_id")?,
		name: row.get("name"),
		position: row.get("position"),
		source_zones: parse_list(row, "source_zones")?,
		destination_zones: parse_list(row, "destination_zones")?,
		source_addresses: parse_list(row, "source_addresses")?,
		destination_addresses: parse_list(row, "destination_addresses")?,
		services: parse_list(row, "services")?,
		action: action.parse().map_err(DbError::Internal)?,
		enabled: row.get("enabled"),
		logging: row.get("logging"),
		description: row.get("description"),
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

fn parse_hit_count_row(row: &sqlx::sqlite::SqliteRow) -> Result<HitCountSample, DbError> {
	let id: String = row.get("id");
	let policy_id: String = row.get("policy_id");
	let recorded_at: String = row.get("recorded_at");

	Ok(HitCountSample {
		id: parse_id(&id, "hit count id")?,
		policy_id: parse_id(&policy_id, "policy_id")?,
		hit_count: row.get("hit_count"),
		first_hit_at: parse_opt_timestamp(row.get("first_hit_at"), "first_hit_at")?,
		last_hit_at: parse_opt_timestamp(row.get("last_hit_at"), "last_hit_at")?,
		recorded_at: parse_timestamp(&recorded_at, "recorded_at")?,
	})
}
