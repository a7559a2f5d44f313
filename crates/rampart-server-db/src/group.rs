// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network and service group repository.
//!
//! Both group families share one schema shape, so a single repository serves
//! them with the table chosen by [`GroupKind`].

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::{map_constraint_error, DbError};
use crate::object::merge_description;
use crate::types::{
	now_timestamp, parse_id, parse_opt_id, parse_timestamp, DeviceId, GroupId, GroupKind,
	NewObjectGroup, ObjectGroup, ObjectGroupUpdate, ObjectId, ScopeFilter,
};

#[async_trait]
pub trait GroupStore: Send + Sync {
	async fn create_group(&self, kind: GroupKind, group: &NewObjectGroup) -> Result<ObjectGroup, DbError>;
	async fn get_group(&self, kind: GroupKind, id: &GroupId) -> Result<Option<ObjectGroup>, DbError>;
	async fn list_groups(
		&self,
		kind: GroupKind,
		scope: ScopeFilter,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ObjectGroup>, i64), DbError>;
	async fn update_group(
		&self,
		kind: GroupKind,
		id: &GroupId,
		update: &ObjectGroupUpdate,
	) -> Result<ObjectGroup, DbError>;
	async fn delete_group(&self, kind: GroupKind, id: &GroupId) -> Result<bool, DbError>;
	async fn add_group_member(
		&self,
		kind: GroupKind,
		group_id: &GroupId,
		object_id: &ObjectId,
	) -> Result<bool, DbError>;
	async fn remove_group_member(
		&self,
		kind: GroupKind,
		group_id: &GroupId,
		object_id: &ObjectId,
	) -> Result<bool, DbError>;
	async fn list_group_members(&self, kind: GroupKind, group_id: &GroupId) -> Result<Vec<ObjectId>, DbError>;
}

#[async_trait]
impl GroupStore for GroupRepository {
	async fn create_group(&self, kind: GroupKind, group: &NewObjectGroup) -> Result<ObjectGroup, DbError> {
		self.create_group(kind, group).await
	}

	async fn get_group(&self, kind: GroupKind, id: &GroupId) -> Result<Option<ObjectGroup>, DbError> {
		self.get_group(kind, id).await
	}

	async fn list_groups(
		&self,
		kind: GroupKind,
		scope: ScopeFilter,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ObjectGroup>, i64), DbError> {
		self.list_groups(kind, scope, limit, offset).await
	}

	async fn update_group(
		&self,
		kind: GroupKind,
		id: &GroupId,
		update: &ObjectGroupUpdate,
	) -> Result<ObjectGroup, DbError> {
		self.update_group(kind, id, update).await
	}

	async fn delete_group(&self, kind: GroupKind, id: &GroupId) -> Result<bool, DbError> {
		self.delete_group(kind, id).await
	}

	async fn add_group_member(
		&self,
		kind: GroupKind,
		group_id: &GroupId,
		object_id: &ObjectId,
	) -> Result<bool, DbError> {
		self.add_group_member(kind, group_id, object_id).await
	}

	async fn remove_group_member(
		&self,
		kind: GroupKind,
		group_id: &GroupId,
		object_id: &ObjectId,
	) -> Result<bool, DbError> {
		self.remove_group_member(kind, group_id, object_id).await
	}

	async fn list_group_members(&self, kind: GroupKind, group_id: &GroupId) -> Result<Vec<ObjectId>, DbError> {
		self.list_group_members(kind, group_id).await
	}
}

#[derive(Clone)]
pub struct GroupRepository {
	pool: SqlitePool,
}

impl GroupRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, group), fields(kind = ?kind, name = %group.name))]
	pub async fn create_group(
		&self,
		kind: GroupKind,
		group: &NewObjectGroup,
	) -> Result<ObjectGroup, DbError> {
		let id = GroupId::generate();
		let now = now_timestamp();

		sqlx::query(&format!(
			"INSERT INTO {} (id, device_id, name, description, created_at, updated_at)
			 VALUES (?, ?, ?, ?, ?, ?)",
			kind.groups_table()
		))
		.bind(id.to_string())
		.bind(group.device_id.map(|d| d.to_string()))
		.bind(&group.name)
		.bind(&group.description)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("group '{}' already exists", group.name)))?;

		self
			.get_group(kind, &id)
			.await?
			.ok_or_else(|| DbError::Internal("group missing after insert".to_string()))
	}

	#[tracing::instrument(skip(self), fields(kind = ?kind, group_id = %id))]
	pub async fn get_group(&self, kind: GroupKind, id: &GroupId) -> Result<Option<ObjectGroup>, DbError> {
		let row = sqlx::query(&format!("{} WHERE g.id = ?", select_groups(kind)))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(|r| parse_group_row(kind, r)).transpose()
	}

	#[tracing::instrument(skip(self), fields(kind = ?kind))]
	pub async fn list_groups(
		&self,
		kind: GroupKind,
		scope: ScopeFilter,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ObjectGroup>, i64), DbError> {
		let (any_scope, device_id) = scope.binds();

		let total: i64 = sqlx::query_scalar(&format!(
			"SELECT COUNT(*) FROM {} WHERE ?1 OR device_id IS ?2",
			kind.groups_table()
		))
		.bind(any_scope)
		.bind(&device_id)
		.fetch_one(&self.pool)
		.await?;

		let rows = sqlx::query(&format!(
			"{} WHERE ?1 OR g.device_id IS ?2 ORDER BY g.name ASC LIMIT ?3 OFFSET ?4",
			select_groups(kind)
		))
		.bind(any_scope)
		.bind(&device_id)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let groups = rows
			.iter()
			.map(|r| parse_group_row(kind, r))
			.collect::<Result<Vec<_>, _>>()?;
		Ok((groups, total))
	}

	#[tracing::instrument(skip(self, update), fields(kind = ?kind, group_id = %id))]
	pub async fn update_group(
		&self,
		kind: GroupKind,
		id: &GroupId,
		update: &ObjectGroupUpdate,
	) -> Result<ObjectGroup, DbError> {
		let current = self
			.get_group(kind, id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("group {id}")))?;

		let name = update.name.clone().unwrap_or(current.name);
		let description = merge_description(&update.description, current.description);

		sqlx::query(&format!(
			"UPDATE {} SET name = ?, description = ?, updated_at = ? WHERE id = ?",
			kind.groups_table()
		))
		.bind(&name)
		.bind(&description)
		.bind(now_timestamp())
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("group '{name}' already exists")))?;

		self
			.get_group(kind, id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("group {id}")))
	}

	/// Delete a group. Member objects are left in place.
	#[tracing::instrument(skip(self), fields(kind = ?kind, group_id = %id))]
	pub async fn delete_group(&self, kind: GroupKind, id: &GroupId) -> Result<bool, DbError> {
		let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", kind.groups_table()))
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	/// Add an object to a group. Returns `false` when it was already a member.
	///
	/// # Errors
	/// `DbError::NotFound` if the group or object does not exist (an object of
	/// the other family counts as missing), `DbError::Invalid` if the object
	/// belongs to a different device than the group.
	#[tracing::instrument(skip(self), fields(kind = ?kind, group_id = %group_id, object_id = %object_id))]
	pub async fn add_group_member(
		&self,
		kind: GroupKind,
		group_id: &GroupId,
		object_id: &ObjectId,
	) -> Result<bool, DbError> {
		let group = self
			.get_group(kind, group_id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("group {group_id}")))?;

		let object_device: Option<Option<String>> = sqlx::query_scalar(&format!(
			"SELECT device_id FROM {} WHERE id = ?",
			kind.objects_table()
		))
		.bind(object_id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		let object_device: Option<DeviceId> = match object_device {
			Some(device) => parse_opt_id(device, "device_id")?,
			None => return Err(DbError::NotFound(format!("object {object_id}"))),
		};

		if let Some(object_device) = object_device {
			if group.device_id != Some(object_device) {
				return Err(DbError::Invalid(
					"object is scoped to a different device than the group".to_string(),
				));
			}
		}

		let result = sqlx::query(&format!(
			"INSERT OR IGNORE INTO {} (group_id, object_id, added_at) VALUES (?, ?, ?)",
			kind.members_table()
		))
		.bind(group_id.to_string())
		.bind(object_id.to_string())
		.bind(now_timestamp())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || "membership already exists".to_string()))?;

		if result.rows_affected() > 0 {
			self.touch_group(kind, group_id).await?;
			tracing::debug!("member added");
		}
		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self), fields(kind = ?kind, group_id = %group_id, object_id = %object_id))]
	pub async fn remove_group_member(
		&self,
		kind: GroupKind,
		group_id: &GroupId,
		object_id: &ObjectId,
	) -> Result<bool, DbError> {
		let result = sqlx::query(&format!(
			"DELETE FROM {} WHERE group_id = ? AND object_id = ?",
			kind.members_table()
		))
		.bind(group_id.to_string())
		.bind(object_id.to_string())
		.execute(&self.pool)
		.await?;

		if result.rows_affected() > 0 {
			self.touch_group(kind, group_id).await?;
		}
		Ok(result.rows_affected() > 0)
	}

	/// Member object ids in the order they were added.
	#[tracing::instrument(skip(self), fields(kind = ?kind, group_id = %group_id))]
	pub async fn list_group_members(
		&self,
		kind: GroupKind,
		group_id: &GroupId,
	) -> Result<Vec<ObjectId>, DbError> {
		let ids: Vec<String> = sqlx::query_scalar(&format!(
			"SELECT object_id FROM {} WHERE group_id = ? ORDER BY added_at ASC, rowid ASC",
			kind.members_table()
		))
		.bind(group_id.to_string())
		.fetch_all(&self.pool)
		.await?;

		ids.iter().map(|id| parse_id(id, "object_id")).collect()
	}

	async fn touch_group(&self, kind: GroupKind, id: &GroupId) -> Result<(), DbError> {
		sqlx::query(&format!(
			"UPDATE {} SET updated_at = ? WHERE id = ?",
			kind.groups_table()
		))
		.bind(now_timestamp())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;
		Ok(())
	}
}

fn select_groups(kind: GroupKind) -> String {
	format!(
		"SELECT g.id, g.device_id, g.name, g.description, g.created_at, g.updated_at,
		        (SELECT COUNT(*) FROM {members} m WHERE m.group_id = g.id) AS member_count
		 FROM {groups} g",
		members = kind.members_table(),
		groups = kind.groups_table(),
	)
}

fn parse_group_row(kind: GroupKind, row: &sqlx::sqlite::SqliteRow) -> Result<ObjectGroup, DbError> {
	let id: String = row.get("id");
	let device_id: Option<String> = row.get("device_id");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(ObjectGroup {
		id: parse_id(&id, "group id")?,
		kind,
		device_id: parse_opt_id(device_id, "device_id")?,
		name: row.get("name"),
		description: row.get("description"),
		member_count: row.get("member_count"),
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}
