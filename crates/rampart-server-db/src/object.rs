// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network and service object repository.
//!
//! Objects may be global (`device_id` is `None`) or scoped to one device.
//! Names are unique within that scope. Values are validated before any write.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::{map_constraint_error, DbError};
use crate::types::{
	now_timestamp, parse_id, parse_opt_id, parse_port, parse_timestamp, NetworkObject,
	NetworkObjectKind, NetworkObjectUpdate, NewNetworkObject, NewServiceObject, ObjectId,
	ScopeFilter, ServiceObject, ServiceObjectUpdate, ServiceProtocol,
};
use crate::validate::{validate_network_value, validate_service_ports};

const NETWORK_COLUMNS: &str =
	"id, device_id, name, kind, value, description, created_at, updated_at";
const SERVICE_COLUMNS: &str =
	"id, device_id, name, protocol, port_start, port_end, description, created_at, updated_at";

#[async_trait]
pub trait ObjectStore: Send + Sync {
	async fn create_network_object(&self, object: &NewNetworkObject) -> Result<NetworkObject, DbError>;
	async fn get_network_object(&self, id: &ObjectId) -> Result<Option<NetworkObject>, DbError>;
	async fn list_network_objects(
		&self,
		scope: ScopeFilter,
		kind: Option<NetworkObjectKind>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<NetworkObject>, i64), DbError>;
	async fn update_network_object(
		&self,
		id: &ObjectId,
		update: &NetworkObjectUpdate,
	) -> Result<NetworkObject, DbError>;
	async fn delete_network_object(&self, id: &ObjectId) -> Result<bool, DbError>;

	async fn create_service_object(&self, object: &NewServiceObject) -> Result<ServiceObject, DbError>;
	async fn get_service_object(&self, id: &ObjectId) -> Result<Option<ServiceObject>, DbError>;
	async fn list_service_objects(
		&self,
		scope: ScopeFilter,
		protocol: Option<ServiceProtocol>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ServiceObject>, i64), DbError>;
	async fn update_service_object(
		&self,
		id: &ObjectId,
		update: &ServiceObjectUpdate,
	) -> Result<ServiceObject, DbError>;
	async fn delete_service_object(&self, id: &ObjectId) -> Result<bool, DbError>;
}

#[async_trait]
impl ObjectStore for ObjectRepository {
	async fn create_network_object(&self, object: &NewNetworkObject) -> Result<NetworkObject, DbError> {
		self.create_network_object(object).await
	}

	async fn get_network_object(&self, id: &ObjectId) -> Result<Option<NetworkObject>, DbError> {
		self.get_network_object(id).await
	}

	async fn list_network_objects(
		&self,
		scope: ScopeFilter,
		kind: Option<NetworkObjectKind>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<NetworkObject>, i64), DbError> {
		self.list_network_objects(scope, kind, limit, offset).await
	}

	async fn update_network_object(
		&self,
		id: &ObjectId,
		update: &NetworkObjectUpdate,
	) -> Result<NetworkObject, DbError> {
		self.update_network_object(id, update).await
	}

	async fn delete_network_object(&self, id: &ObjectId) -> Result<bool, DbError> {
		self.delete_network_object(id).await
	}

	async fn create_service_object(&self, object: &NewServiceObject) -> Result<ServiceObject, DbError> {
		self.create_service_object(object).await
	}

	async fn get_service_object(&self, id: &ObjectId) -> Result<Option<ServiceObject>, DbError> {
		self.get_service_object(id).await
	}

	async fn list_service_objects(
		&self,
		scope: ScopeFilter,
		protocol: Option<ServiceProtocol>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ServiceObject>, i64), DbError> {
		self.list_service_objects(scope, protocol, limit, offset).await
	}

	async fn update_service_object(
		&self,
		id: &ObjectId,
		update: &ServiceObjectUpdate,
	) -> Result<ServiceObject, DbError> {
		self.update_service_object(id, update).await
	}

	async fn delete_service_object(&self, id: &ObjectId) -> Result<bool, DbError> {
		self.delete_service_object(id).await
	}
}

#[derive(Clone)]
pub struct ObjectRepository {
	pool: SqlitePool,
}

impl ObjectRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	// =========================================================================
	// Network objects
	// =========================================================================

	/// # Errors
	/// `DbError::Invalid` for a malformed value, `DbError::Conflict` for a
	/// duplicate name in the same scope, `DbError::NotFound` for an unknown device.
	#[tracing::instrument(skip(self, object), fields(name = %object.name, kind = %object.kind))]
	pub async fn create_network_object(
		&self,
		object: &NewNetworkObject,
	) -> Result<NetworkObject, DbError> {
		let value = object.value.trim().to_string();
		validate_network_value(object.kind, &value).map_err(DbError::Invalid)?;

		let id = ObjectId::generate();
		let now = now_timestamp();

		sqlx::query(
			r#"
			INSERT INTO network_objects (id, device_id, name, kind, value, description, created_at, updated_at)
			VALUES (?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(object.device_id.map(|d| d.to_string()))
		.bind(&object.name)
		.bind(object.kind.as_str())
		.bind(&value)
		.bind(&object.description)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("network object '{}' already exists", object.name)))?;

		tracing::debug!(object_id = %id, "network object created");
		self.require_network_object(&id).await
	}

	#[tracing::instrument(skip(self), fields(object_id = %id))]
	pub async fn get_network_object(&self, id: &ObjectId) -> Result<Option<NetworkObject>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {NETWORK_COLUMNS} FROM network_objects WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.as_ref().map(parse_network_object_row).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_network_objects(
		&self,
		scope: ScopeFilter,
		kind: Option<NetworkObjectKind>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<NetworkObject>, i64), DbError> {
		let (any_scope, device_id) = scope.binds();
		let kind = kind.map(|k| k.as_str());

		let total: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM network_objects
			 WHERE (?1 OR device_id IS ?2) AND (?3 IS NULL OR kind = ?3)",
		)
		.bind(any_scope)
		.bind(&device_id)
		.bind(kind)
		.fetch_one(&self.pool)
		.await?;

		let rows = sqlx::query(&format!(
			"SELECT {NETWORK_COLUMNS} FROM network_objects
			 WHERE (?1 OR device_id IS ?2) AND (?3 IS NULL OR kind = ?3)
			 ORDER BY name ASC
			 LIMIT ?4 OFFSET ?5"
		))
		.bind(any_scope)
		.bind(&device_id)
		.bind(kind)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let objects = rows
			.iter()
			.map(parse_network_object_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((objects, total))
	}

	/// Apply a partial update; the merged kind/value pair is re-validated.
	#[tracing::instrument(skip(self, update), fields(object_id = %id))]
	pub async fn update_network_object(
		&self,
		id: &ObjectId,
		update: &NetworkObjectUpdate,
	) -> Result<NetworkObject, DbError> {
		let current = self.require_network_object(id).await?;

		let name = update.name.clone().unwrap_or(current.name);
		let kind = update.kind.unwrap_or(current.kind);
		let value = update
			.value
			.as_deref()
			.map(|v| v.trim().to_string())
			.unwrap_or(current.value);
		let description = merge_description(&update.description, current.description);

		validate_network_value(kind, &value).map_err(DbError::Invalid)?;

		sqlx::query(
			r#"
			UPDATE network_objects
			SET name = ?, kind = ?, value = ?, description = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&name)
		.bind(kind.as_str())
		.bind(&value)
		.bind(&description)
		.bind(now_timestamp())
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("network object '{name}' already exists")))?;

		self.require_network_object(id).await
	}

	/// Delete a network object; it is removed from every group that held it.
	#[tracing::instrument(skip(self), fields(object_id = %id))]
	pub async fn delete_network_object(&self, id: &ObjectId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM network_objects WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	async fn require_network_object(&self, id: &ObjectId) -> Result<NetworkObject, DbError> {
		self
			.get_network_object(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("network object {id}")))
	}

	// =========================================================================
	// Service objects
	// =========================================================================

	#[tracing::instrument(skip(self, object), fields(name = %object.name, protocol = %object.protocol))]
	pub async fn create_service_object(
		&self,
		object: &NewServiceObject,
	) -> Result<ServiceObject, DbError> {
		let (port_start, port_end) =
			validate_service_ports(object.protocol, object.port_start, object.port_end)
				.map_err(DbError::Invalid)?;

		let id = ObjectId::generate();
		let now = now_timestamp();

		sqlx::query(
			r#"
			INSERT INTO service_objects (
				id, device_id, name, protocol, port_start, port_end, description, created_at, updated_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(object.device_id.map(|d| d.to_string()))
		.bind(&object.name)
		.bind(object.protocol.as_str())
		.bind(port_start.map(i64::from))
		.bind(port_end.map(i64::from))
		.bind(&object.description)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("service object '{}' already exists", object.name)))?;

		tracing::debug!(object_id = %id, "service object created");
		self.require_service_object(&id).await
	}

	#[tracing::instrument(skip(self), fields(object_id = %id))]
	pub async fn get_service_object(&self, id: &ObjectId) -> Result<Option<ServiceObject>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {SERVICE_COLUMNS} FROM service_objects WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.as_ref().map(parse_service_object_row).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn list_service_objects(
		&self,
		scope: ScopeFilter,
		protocol: Option<ServiceProtocol>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<ServiceObject>, i64), DbError> {
		let (any_scope, device_id) = scope.binds();
		let protocol = protocol.map(|p| p.as_str());

		let total: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM service_objects
			 WHERE (?1 OR device_id IS ?2) AND (?3 IS NULL OR protocol = ?3)",
		)
		.bind(any_scope)
		.bind(&device_id)
		.bind(protocol)
		.fetch_one(&self.pool)
		.await?;

		let rows = sqlx::query(&format!(
			"SELECT {SERVICE_COLUMNS} FROM service_objects
			 WHERE (?1 OR device_id IS ?2) AND (?3 IS NULL OR protocol = ?3)
			 ORDER BY name ASC
			 LIMIT ?4 OFFSET ?5"
		))
		.bind(any_scope)
		.bind(&device_id)
		.bind(protocol)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let objects = rows
			.iter()
			.map(parse_service_object_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((objects, total))
	}

	/// Apply a partial update. Switching to ICMP without ports drops them; a
	/// supplied `port_end` replaces the old one, otherwise it follows `port_start`.
	#[tracing::instrument(skip(self, update), fields(object_id = %id))]
	pub async fn update_service_object(
		&self,
		id: &ObjectId,
		update: &ServiceObjectUpdate,
	) -> Result<ServiceObject, DbError> {
		let current = self.require_service_object(id).await?;

		let name = update.name.clone().unwrap_or(current.name);
		let protocol = update.protocol.unwrap_or(current.protocol);
		let (port_start, port_end) = match (update.port_start, update.port_end) {
			(None, None) if protocol == ServiceProtocol::Icmp => (None, None),
			(None, None) => (current.port_start, current.port_end),
			(start, end) => (start.or(current.port_start), end),
		};
		let (port_start, port_end) =
			validate_service_ports(protocol, port_start, port_end).map_err(DbError::Invalid)?;
		let description = merge_description(&update.description, current.description);

		sqlx::query(
			r#"
			UPDATE service_objects
			SET name = ?, protocol = ?, port_start = ?, port_end = ?, description = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&name)
		.bind(protocol.as_str())
		.bind(port_start.map(i64::from))
		.bind(port_end.map(i64::from))
		.bind(&description)
		.bind(now_timestamp())
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("service object '{name}' already exists")))?;

		self.require_service_object(id).await
	}

	#[tracing::instrument(skip(self), fields(object_id = %id))]
	pub async fn delete_service_object(&self, id: &ObjectId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM service_objects WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}

	async fn require_service_object(&self, id: &ObjectId) -> Result<ServiceObject, DbError> {
		self
			.get_service_object(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("service object {id}")))
	}
}

/// `Some("")` clears the description, `None` keeps it.
pub(crate) fn merge_description(update: &Option<String>, current: Option<String>) -> Option<String> {
	match update {
		Some(d) if d.is_empty() => None,
		Some(d) => Some(d.clone()),
		None => current,
	}
}

fn parse_network_object_row(row: &sqlx::sqlite::SqliteRow) -> Result<NetworkObject, DbError> {
	let id: String = row.get("id");
	let device_id: Option<String> = row.get("device_id");
	let kind: String = row.get("kind");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(NetworkObject {
		id: parse_id(&id, "object id")?,
		device_id: parse_opt_id(device_id, "device_id")?,
		name: row.get("name"),
		kind: kind.parse().map_err(DbError::Internal)?,
		value: row.get("value"),
		description: row.get("description"),
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

fn parse_service_object_row(row: &sqlx::sqlite::SqliteRow) -> Result<ServiceObject, DbError> {
	let id: String = row.get("id");
	let device_id: Option<String> = row.get("device_id");
	let protocol: String = row.get("protocol");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(ServiceObject {
		id: parse_id(&id, "object id")?,
		device_id: parse_opt_id(device_id, "device_id")?,
		name: row.get("name"),
		protocol: protocol.parse().map_err(DbError::Internal)?,
		port_start: parse_port(row.get("port_start"), "port_start")?,
		port_end: parse_port(row.get("port_end"), "port_end")?,
		description: row.get("description"),
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}
