// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device repository.
//!
//! Devices are the managed firewalls. Their password, API key and enable
//! secret are passed through [`SecretCodec::encrypt`] immediately before every
//! write and [`SecretCodec::decrypt`] immediately after every read, so the
//! `devices` table only ever holds ciphertext. A credential that fails
//! authentication on read surfaces as [`DbError::Secrets`]; it is never
//! reported as an empty credential.

use std::sync::Arc;

use async_trait::async_trait;
use rampart_common_secret::SecretString;
use rampart_server_secrets::SecretCodec;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::{map_constraint_error, DbError};
use crate::types::{
	now_timestamp, parse_id, parse_timestamp, Device, DeviceCredentials, DeviceId, DeviceUpdate,
	NewDevice, Vendor,
};

const DEVICE_COLUMNS: &str = "id, name, vendor, hostname, management_ip, port, username, \
	password, api_key, enable_secret, description, enabled, created_at, updated_at";

#[async_trait]
pub trait DeviceStore: Send + Sync {
	async fn create_device(&self, device: &NewDevice) -> Result<Device, DbError>;
	async fn get_device_by_id(&self, id: &DeviceId) -> Result<Option<Device>, DbError>;
	async fn get_device_by_name(&self, name: &str) -> Result<Option<Device>, DbError>;
	async fn list_devices(
		&self,
		vendor: Option<Vendor>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Device>, i64), DbError>;
	async fn update_device(&self, id: &DeviceId, update: &DeviceUpdate) -> Result<Device, DbError>;
	async fn delete_device(&self, id: &DeviceId) -> Result<bool, DbError>;
	async fn get_credentials(&self, id: &DeviceId) -> Result<Option<DeviceCredentials>, DbError>;
}

#[async_trait]
impl DeviceStore for DeviceRepository {
	async fn create_device(&self, device: &NewDevice) -> Result<Device, DbError> {
		self.create_device(device).await
	}

	async fn get_device_by_id(&self, id: &DeviceId) -> Result<Option<Device>, DbError> {
		self.get_device_by_id(id).await
	}

	async fn get_device_by_name(&self, name: &str) -> Result<Option<Device>, DbError> {
		self.get_device_by_name(name).await
	}

	async fn list_devices(
		&self,
		vendor: Option<Vendor>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Device>, i64), DbError> {
		self.list_devices(vendor, limit, offset).await
	}

	async fn update_device(&self, id: &DeviceId, update: &DeviceUpdate) -> Result<Device, DbError> {
		self.update_device(id, update).await
	}

	async fn delete_device(&self, id: &DeviceId) -> Result<bool, DbError> {
		self.delete_device(id).await
	}

	async fn get_credentials(&self, id: &DeviceId) -> Result<Option<DeviceCredentials>, DbError> {
		self.get_credentials(id).await
	}
}

/// Repository for managed firewalls and their encrypted credentials.
#[derive(Clone)]
pub struct DeviceRepository {
	pool: SqlitePool,
	codec: Arc<SecretCodec>,
}

impl DeviceRepository {
	pub fn new(pool: SqlitePool, codec: Arc<SecretCodec>) -> Self {
		Self { pool, codec }
	}

	/// Register a device. Credentials are encrypted before the insert.
	///
	/// # Errors
	/// `DbError::Conflict` if a device with the same name exists.
	#[tracing::instrument(skip(self, device), fields(name = %device.name, vendor = %device.vendor))]
	pub async fn create_device(&self, device: &NewDevice) -> Result<Device, DbError> {
		let id = DeviceId::generate();
		let now = now_timestamp();

		let password = self.codec.encrypt(device.password.expose())?;
		let api_key = self.seal_optional(device.api_key.as_ref())?;
		let enable_secret = self.seal_optional(device.enable_secret.as_ref())?;

		sqlx::query(
			r#"
			INSERT INTO devices (
				id, name, vendor, hostname, management_ip, port, username,
				password, api_key, enable_secret, description, enabled, created_at, updated_at
			) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(&device.name)
		.bind(device.vendor.as_str())
		.bind(&device.hostname)
		.bind(&device.management_ip)
		.bind(i64::from(device.port))
		.bind(&device.username)
		.bind(&password)
		.bind(&api_key)
		.bind(&enable_secret)
		.bind(&device.description)
		.bind(device.enabled)
		.bind(&now)
		.bind(&now)
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("device '{}' already exists", device.name)))?;

		tracing::info!(device_id = %id, "device registered");

		self
			.get_device_by_id(&id)
			.await?
			.ok_or_else(|| DbError::Internal(format!("device {id} vanished after insert")))
	}

	#[tracing::instrument(skip(self), fields(device_id = %id))]
	pub async fn get_device_by_id(&self, id: &DeviceId) -> Result<Option<Device>, DbError> {
		let row = sqlx::query(&format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE id = ?"))
			.bind(id.to_string())
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(parse_device_row).transpose()
	}

	#[tracing::instrument(skip(self))]
	pub async fn get_device_by_name(&self, name: &str) -> Result<Option<Device>, DbError> {
		let row = sqlx::query(&format!("SELECT {DEVICE_COLUMNS} FROM devices WHERE name = ?"))
			.bind(name)
			.fetch_optional(&self.pool)
			.await?;

		row.as_ref().map(parse_device_row).transpose()
	}

	/// List devices ordered by name.
	///
	/// # Returns
	/// The requested page and the total number of matching devices.
	#[tracing::instrument(skip(self))]
	pub async fn list_devices(
		&self,
		vendor: Option<Vendor>,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Device>, i64), DbError> {
		let vendor = vendor.map(|v| v.as_str());

		let total: i64 =
			sqlx::query_scalar("SELECT COUNT(*) FROM devices WHERE (?1 IS NULL OR vendor = ?1)")
				.bind(vendor)
				.fetch_one(&self.pool)
				.await?;

		let rows = sqlx::query(&format!(
			"SELECT {DEVICE_COLUMNS} FROM devices
			 WHERE (?1 IS NULL OR vendor = ?1)
			 ORDER BY name ASC
			 LIMIT ?2 OFFSET ?3"
		))
		.bind(vendor)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let devices = rows
			.iter()
			.map(parse_device_row)
			.collect::<Result<Vec<_>, _>>()?;

		tracing::debug!(count = devices.len(), total, "listed devices");
		Ok((devices, total))
	}

	/// Apply a partial update. Supplied credentials are re-encrypted with a
	/// fresh nonce; an empty credential clears the stored value.
	///
	/// # Errors
	/// `DbError::NotFound` if the device does not exist, `DbError::Conflict`
	/// on a duplicate name.
	#[tracing::instrument(
		skip(self, update),
		fields(device_id = %id, credentials_changed = update.touches_credentials())
	)]
	pub async fn update_device(&self, id: &DeviceId, update: &DeviceUpdate) -> Result<Device, DbError> {
		let current = self
			.get_device_by_id(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("device {id}")))?;

		let name = update.name.clone().unwrap_or(current.name);
		let vendor = update.vendor.unwrap_or(current.vendor);
		let hostname = update.hostname.clone().unwrap_or(current.hostname);
		let management_ip = match &update.management_ip {
			Some(ip) if ip.is_empty() => None,
			Some(ip) => Some(ip.clone()),
			None => current.management_ip,
		};
		let port = update.port.unwrap_or(current.port);
		let username = update.username.clone().unwrap_or(current.username);
		let description = match &update.description {
			Some(d) if d.is_empty() => None,
			Some(d) => Some(d.clone()),
			None => current.description,
		};
		let enabled = update.enabled.unwrap_or(current.enabled);

		let password = self.seal_optional(update.password.as_ref())?;
		let api_key = self.seal_optional(update.api_key.as_ref())?;
		let enable_secret = self.seal_optional(update.enable_secret.as_ref())?;

		sqlx::query(
			r#"
			UPDATE devices
			SET name = ?, vendor = ?, hostname = ?, management_ip = ?, port = ?, username = ?,
			    password = COALESCE(?, password),
			    api_key = COALESCE(?, api_key),
			    enable_secret = COALESCE(?, enable_secret),
			    description = ?, enabled = ?, updated_at = ?
			WHERE id = ?
			"#,
		)
		.bind(&name)
		.bind(vendor.as_str())
		.bind(&hostname)
		.bind(&management_ip)
		.bind(i64::from(port))
		.bind(&username)
		.bind(&password)
		.bind(&api_key)
		.bind(&enable_secret)
		.bind(&description)
		.bind(enabled)
		.bind(now_timestamp())
		.bind(id.to_string())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || format!("device '{name}' already exists")))?;

		tracing::info!(device_id = %id, "device updated");

		self
			.get_device_by_id(id)
			.await?
			.ok_or_else(|| DbError::NotFound(format!("device {id}")))
	}

	/// Delete a device. Its objects, groups and policies go with it.
	///
	/// # Returns
	/// `true` if a device was deleted.
	#[tracing::instrument(skip(self), fields(device_id = %id))]
	pub async fn delete_device(&self, id: &DeviceId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM devices WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;

		let deleted = result.rows_affected() > 0;
		if deleted {
			tracing::info!(device_id = %id, "device deleted");
		}
		Ok(deleted)
	}

	/// Read and decrypt a device's credentials.
	///
	/// # Errors
	/// `DbError::Secrets` if any stored credential fails authentication.
	#[tracing::instrument(skip(self), fields(device_id = %id))]
	pub async fn get_credentials(&self, id: &DeviceId) -> Result<Option<DeviceCredentials>, DbError> {
		let row = sqlx::query(
			"SELECT username, password, api_key, enable_secret FROM devices WHERE id = ?",
		)
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		let Some(row) = row else {
			return Ok(None);
		};

		let username: String = row.get("username");
		let password: String = row.get("password");
		let api_key: Option<String> = row.get("api_key");
		let enable_secret: Option<String> = row.get("enable_secret");

		let password = self.codec.decrypt(&password).map_err(|e| {
			tracing::warn!(device_id = %id, column = "password", "stored credential failed to decrypt");
			DbError::from(e)
		})?;
		let api_key = self.open_optional(id, "api_key", api_key.as_deref())?;
		let enable_secret = self.open_optional(id, "enable_secret", enable_secret.as_deref())?;

		Ok(Some(DeviceCredentials {
			device_id: *id,
			username,
			password: SecretString::new(password),
			api_key,
			enable_secret,
		}))
	}

	fn seal_optional(&self, value: Option<&SecretString>) -> Result<Option<String>, DbError> {
		Ok(self.codec.encrypt_opt(value.map(|v| v.expose().as_str()))?)
	}

	/// Decrypt an optional column. A cleared (empty) value reads back as `None`.
	fn open_optional(
		&self,
		id: &DeviceId,
		column: &'static str,
		stored: Option<&str>,
	) -> Result<Option<SecretString>, DbError> {
		let plaintext = self.codec.decrypt_opt(stored).map_err(|e| {
			tracing::warn!(device_id = %id, column, "stored credential failed to decrypt");
			DbError::from(e)
		})?;
		Ok(plaintext.filter(|p| !p.is_empty()).map(SecretString::new))
	}
}

fn parse_device_row(row: &sqlx::sqlite::SqliteRow) -> Result<Device, DbError> {
	let id: String = row.get("id");
	let vendor: String = row.get("vendor");
	let port: i64 = row.get("port");
	let password: String = row.get("password");
	let api_key: Option<String> = row.get("api_key");
	let enable_secret: Option<String> = row.get("enable_secret");
	let created_at: String = row.get("created_at");
	let updated_at: String = row.get("updated_at");

	Ok(Device {
		id: parse_id(&id, "device id")?,
		name: row.get("name"),
		vendor: vendor.parse().map_err(DbError::Internal)?,
		hostname: row.get("hostname"),
		management_ip: row.get("management_ip"),
		port: u16::try_from(port).map_err(|_| DbError::Internal(format!("Invalid port: {port}")))?,
		username: row.get("username"),
		has_password: !password.is_empty(),
		has_api_key: api_key.is_some_and(|k| !k.is_empty()),
		has_enable_secret: enable_secret.is_some_and(|s| !s.is_empty()),
		description: row.get("description"),
		enabled: row.get("enabled"),
		created_at: parse_timestamp(&created_at, "created_at")?,
		updated_at: parse_timestamp(&updated_at, "updated_at")?,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{create_inventory_pool, sample_device, test_codec};
	use proptest::prelude::*;

	async fn make_repo() -> DeviceRepository {
		DeviceRepository::new(create_inventory_pool().await, test_codec())
	}

	async fn stored_password(repo: &DeviceRepository, id: &DeviceId) -> String {
		sqlx::query_scalar("SELECT password FROM devices WHERE id = ?")
			.bind(id.to_string())
			.fetch_one(&repo.pool)
			.await
			.unwrap()
	}

	#[tokio::test]
	async fn create_and_get_device() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("edge-fw-01")).await.unwrap();

		assert_eq!(device.name, "edge-fw-01");
		assert_eq!(device.vendor, Vendor::PaloAlto);
		assert!(device.has_password);
		assert!(device.has_api_key);
		assert!(!device.has_enable_secret);

		let fetched = repo.get_device_by_id(&device.id).await.unwrap().unwrap();
		assert_eq!(fetched, device);

		let by_name = repo.get_device_by_name("edge-fw-01").await.unwrap().unwrap();
		assert_eq!(by_name.id, device.id);
	}

	#[tokio::test]
	async fn credentials_are_ciphertext_at_rest() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("edge-fw-02")).await.unwrap();

		let stored = stored_password(&repo, &device.id).await;
		assert_ne!(stored, "Sup3rSecret!");
		assert!(!stored.contains("Sup3rSecret!"));
		assert_eq!(repo.codec.decrypt(&stored).unwrap(), "Sup3rSecret!");

		let api_key: Option<String> = sqlx::query_scalar("SELECT api_key FROM devices WHERE id = ?")
			.bind(device.id.to_string())
			.fetch_one(&repo.pool)
			.await
			.unwrap();
		assert!(!api_key.unwrap().contains("LUFRPT1"));
	}

	#[tokio::test]
	async fn get_credentials_decrypts() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("core-fw")).await.unwrap();

		let creds = repo.get_credentials(&device.id).await.unwrap().unwrap();
		assert_eq!(creds.username, "admin");
		assert_eq!(creds.password.expose(), "Sup3rSecret!");
		assert_eq!(creds.api_key.unwrap().expose(), "LUFRPT1-api-key");
		assert!(creds.enable_secret.is_none());
	}

	#[tokio::test]
	async fn get_credentials_for_missing_device_is_none() {
		let repo = make_repo().await;
		assert!(repo
			.get_credentials(&DeviceId::generate())
			.await
			.unwrap()
			.is_none());
	}

	#[tokio::test]
	async fn empty_password_is_stored_empty() {
		let repo = make_repo().await;
		let mut new = sample_device("token-only");
		new.password = SecretString::from("");

		let device = repo.create_device(&new).await.unwrap();
		assert!(!device.has_password);
		assert_eq!(stored_password(&repo, &device.id).await, "");

		let creds = repo.get_credentials(&device.id).await.unwrap().unwrap();
		assert!(creds.password.is_empty());
	}

	#[tokio::test]
	async fn wrong_key_surfaces_decryption_error() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("branch-fw")).await.unwrap();

		let other = DeviceRepository::new(repo.pool.clone(), test_codec());
		let err = other.get_credentials(&device.id).await.unwrap_err();
		assert!(err.is_decryption_failure());
	}

	#[tokio::test]
	async fn tampered_ciphertext_is_not_masked_as_empty() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("dmz-fw")).await.unwrap();

		let mut stored = stored_password(&repo, &device.id).await;
		let last = stored.pop().unwrap();
		stored.push(if last == 'A' { 'B' } else { 'A' });
		sqlx::query("UPDATE devices SET password = ? WHERE id = ?")
			.bind(&stored)
			.bind(device.id.to_string())
			.execute(&repo.pool)
			.await
			.unwrap();

		let err = repo.get_credentials(&device.id).await.unwrap_err();
		assert!(err.is_decryption_failure());
	}

	#[tokio::test]
	async fn duplicate_name_conflicts() {
		let repo = make_repo().await;
		repo.create_device(&sample_device("dup")).await.unwrap();
		let err = repo.create_device(&sample_device("dup")).await.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn list_filters_by_vendor_and_paginates() {
		let repo = make_repo().await;
		for i in 0..3 {
			repo.create_device(&sample_device(&format!("pa-{i}"))).await.unwrap();
		}
		let mut forti = sample_device("forti-1");
		forti.vendor = Vendor::Fortinet;
		repo.create_device(&forti).await.unwrap();

		let (all, total) = repo.list_devices(None, 50, 0).await.unwrap();
		assert_eq!(total, 4);
		assert_eq!(all.len(), 4);

		let (page, total) = repo.list_devices(Some(Vendor::PaloAlto), 2, 1).await.unwrap();
		assert_eq!(total, 3);
		assert_eq!(
			page.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
			vec!["pa-1", "pa-2"]
		);

		let (none, total) = repo.list_devices(Some(Vendor::Sophos), 50, 0).await.unwrap();
		assert!(none.is_empty());
		assert_eq!(total, 0);
	}

	#[tokio::test]
	async fn partial_update_keeps_credentials() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("upd")).await.unwrap();
		let before = stored_password(&repo, &device.id).await;

		let updated = repo
			.update_device(
				&device.id,
				&DeviceUpdate {
					hostname: Some("upd-new.fw.example.net".to_string()),
					enabled: Some(false),
					..Default::default()
				},
			)
			.await
			.unwrap();

		assert_eq!(updated.hostname, "upd-new.fw.example.net");
		assert!(!updated.enabled);
		assert_eq!(stored_password(&repo, &device.id).await, before);
	}

	#[tokio::test]
	async fn update_reencrypts_and_clears_credentials() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("rotate")).await.unwrap();
		let before = stored_password(&repo, &device.id).await;

		let updated = repo
			.update_device(
				&device.id,
				&DeviceUpdate {
					password: Some(SecretString::from("N3wPassw0rd")),
					api_key: Some(SecretString::from("")),
					enable_secret: Some(SecretString::from("en4ble")),
					..Default::default()
				},
			)
			.await
			.unwrap();

		assert!(!updated.has_api_key);
		assert!(updated.has_enable_secret);
		assert_ne!(stored_password(&repo, &device.id).await, before);

		let creds = repo.get_credentials(&device.id).await.unwrap().unwrap();
		assert_eq!(creds.password.expose(), "N3wPassw0rd");
		assert!(creds.api_key.is_none());
		assert_eq!(creds.enable_secret.unwrap().expose(), "en4ble");
	}

	#[tokio::test]
	async fn update_missing_device_is_not_found() {
		let repo = make_repo().await;
		let err = repo
			.update_device(&DeviceId::generate(), &DeviceUpdate::default())
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::NotFound(_)));
	}

	#[tokio::test]
	async fn rename_to_existing_name_conflicts() {
		let repo = make_repo().await;
		repo.create_device(&sample_device("taken")).await.unwrap();
		let device = repo.create_device(&sample_device("other")).await.unwrap();

		let err = repo
			.update_device(
				&device.id,
				&DeviceUpdate {
					name: Some("taken".to_string()),
					..Default::default()
				},
			)
			.await
			.unwrap_err();
		assert!(matches!(err, DbError::Conflict(_)));
	}

	#[tokio::test]
	async fn delete_device_reports_outcome() {
		let repo = make_repo().await;
		let device = repo.create_device(&sample_device("gone")).await.unwrap();

		assert!(repo.delete_device(&device.id).await.unwrap());
		assert!(!repo.delete_device(&device.id).await.unwrap());
		assert!(repo.get_device_by_id(&device.id).await.unwrap().is_none());
	}

	proptest! {
		#![proptest_config(ProptestConfig::with_cases(16))]

		#[test]
		fn any_password_roundtrips_through_storage(password in "[ -~]{1,64}") {
			let rt = tokio::runtime::Runtime::new().unwrap();
			rt.block_on(async {
				let repo = make_repo().await;
				let mut new = sample_device("prop-fw");
				new.password = SecretString::new(password.clone());

				let device = repo.create_device(&new).await.unwrap();
				let stored = stored_password(&repo, &device.id).await;
				assert_ne!(stored, password);

				let creds = repo.get_credentials(&device.id).await.unwrap().unwrap();
				assert_eq!(creds.password.expose(), &password);
			});
		}
	}
}
