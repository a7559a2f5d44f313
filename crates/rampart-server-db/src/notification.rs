// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePool, Row};

use crate::error::{map_constraint_error, DbError};
use crate::types::{
	now_timestamp, parse_id, parse_opt_id, parse_opt_timestamp, parse_timestamp, NewNotification,
	Notification, NotificationId,
};

const NOTIFICATION_COLUMNS: &str =
	"id, device_id, severity, title, message, created_at, acknowledged_at";

#[async_trait]
pub trait NotificationStore: Send + Sync {
	async fn create_notification(&self, notification: &NewNotification) -> Result<Notification, DbError>;
	async fn get_notification(&self, id: &NotificationId) -> Result<Option<Notification>, DbError>;
	async fn list_notifications(
		&self,
		unacknowledged_only: bool,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Notification>, i64), DbError>;
	async fn acknowledge_notification(&self, id: &NotificationId) -> Result<bool, DbError>;
	async fn delete_notification(&self, id: &NotificationId) -> Result<bool, DbError>;
}

#[async_trait]
impl NotificationStore for NotificationRepository {
	async fn create_notification(&self, notification: &NewNotification) -> Result<Notification, DbError> {
		self.create_notification(notification).await
	}

	async fn get_notification(&self, id: &NotificationId) -> Result<Option<Notification>, DbError> {
		self.get_notification(id).await
	}

	async fn list_notifications(
		&self,
		unacknowledged_only: bool,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Notification>, i64), DbError> {
		self
			.list_notifications(unacknowledged_only, limit, offset)
			.await
	}

	async fn acknowledge_notification(&self, id: &NotificationId) -> Result<bool, DbError> {
		self.acknowledge_notification(id).await
	}

	async fn delete_notification(&self, id: &NotificationId) -> Result<bool, DbError> {
		self.delete_notification(id).await
	}
}

#[derive(Clone)]
pub struct NotificationRepository {
	pool: SqlitePool,
}

impl NotificationRepository {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	#[tracing::instrument(skip(self, notification), fields(severity = %notification.severity))]
	pub async fn create_notification(
		&self,
		notification: &NewNotification,
	) -> Result<Notification, DbError> {
		let id = NotificationId::generate();

		sqlx::query(
			r#"
			INSERT INTO notifications (id, device_id, severity, title, message, created_at)
			VALUES (?, ?, ?, ?, ?, ?)
			"#,
		)
		.bind(id.to_string())
		.bind(notification.device_id.map(|d| d.to_string()))
		.bind(notification.severity.as_str())
		.bind(&notification.title)
		.bind(&notification.message)
		.bind(now_timestamp())
		.execute(&self.pool)
		.await
		.map_err(|e| map_constraint_error(e, || "notification already exists".to_string()))?;

		self
			.get_notification(&id)
			.await?
			.ok_or_else(|| DbError::Internal("notification missing after insert".to_string()))
	}

	#[tracing::instrument(skip(self), fields(notification_id = %id))]
	pub async fn get_notification(&self, id: &NotificationId) -> Result<Option<Notification>, DbError> {
		let row = sqlx::query(&format!(
			"SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = ?"
		))
		.bind(id.to_string())
		.fetch_optional(&self.pool)
		.await?;

		row.as_ref().map(parse_notification_row).transpose()
	}

	/// Newest first; optionally only those not yet acknowledged.
	#[tracing::instrument(skip(self))]
	pub async fn list_notifications(
		&self,
		unacknowledged_only: bool,
		limit: i64,
		offset: i64,
	) -> Result<(Vec<Notification>, i64), DbError> {
		let total: i64 = sqlx::query_scalar(
			"SELECT COUNT(*) FROM notifications WHERE ?1 = 0 OR acknowledged_at IS NULL",
		)
		.bind(unacknowledged_only)
		.fetch_one(&self.pool)
		.await?;

		let rows = sqlx::query(&format!(
			"SELECT {NOTIFICATION_COLUMNS} FROM notifications
			 WHERE ?1 = 0 OR acknowledged_at IS NULL
			 ORDER BY created_at DESC, rowid DESC
			 LIMIT ?2 OFFSET ?3"
		))
		.bind(unacknowledged_only)
		.bind(limit)
		.bind(offset)
		.fetch_all(&self.pool)
		.await?;

		let notifications = rows
			.iter()
			.map(parse_notification_row)
			.collect::<Result<Vec<_>, _>>()?;
		Ok((notifications, total))
	}

	/// Mark as acknowledged. Returns `false` if missing or already acknowledged.
	#[tracing::instrument(skip(self), fields(notification_id = %id))]
	pub async fn acknowledge_notification(&self, id: &NotificationId) -> Result<bool, DbError> {
		let result = sqlx::query(
			"UPDATE notifications SET acknowledged_at = ? WHERE id = ? AND acknowledged_at IS NULL",
		)
		.bind(now_timestamp())
		.bind(id.to_string())
		.execute(&self.pool)
		.await?;
		Ok(result.rows_affected() > 0)
	}

	#[tracing::instrument(skip(self), fields(notification_id = %id))]
	pub async fn delete_notification(&self, id: &NotificationId) -> Result<bool, DbError> {
		let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
			.bind(id.to_string())
			.execute(&self.pool)
			.await?;
		Ok(result.rows_affected() > 0)
	}
}

fn parse_notification_row(row: &sqlx::sqlite::SqliteRow) -> Result<Notification, DbError> {
	let id: String = row.get("id");
	let severity: String = row.get("severity");
	let created_at: String = row.get("created_at");

	Ok(Notification {
		id: parse_id(&id, "notification id")?,
		device_id: parse_opt_id(row.get("device_id"), "device_id")?,
		severity: severity.parse().map_err(DbError::Internal)?,
		title: row.get("title"),
		message: row.get("message"),
		created_at: parse_timestamp(&created_at, "created_at")?,
		acknowledged_at: parse_opt_timestamp(row.get("acknowledged_at"), "acknowledged_at")?,
	})
}
