// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use rampart_server_db::{Notification, Severity};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NotificationResponse {
	pub id: String,
	pub device_id: Option<String>,
	pub severity: Severity,
	pub title: String,
	pub message: String,
	pub created_at: DateTime<Utc>,
	pub acknowledged_at: Option<DateTime<Utc>>,
}

impl From<Notification> for NotificationResponse {
	fn from(n: Notification) -> Self {
		Self {
			id: n.id.to_string(),
			device_id: n.device_id.map(|d| d.to_string()),
			severity: n.severity,
			title: n.title,
			message: n.message,
			created_at: n.created_at,
			acknowledged_at: n.acknowledged_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListNotificationsResponse {
	pub notifications: Vec<NotificationResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListNotificationsQuery {
	#[serde(default)]
	pub unacknowledged_only: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateNotificationRequest {
	pub device_id: Option<String>,
	pub severity: Severity,
	pub title: String,
	pub message: String,
}
