// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Operator notification handlers.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use rampart_server_api::{
	CreateNotificationRequest, ErrorResponse, ListNotificationsQuery, ListNotificationsResponse,
	NotificationResponse, SuccessResponse,
};
use rampart_server_db::{NewNotification, NotificationId};
use tracing::instrument;

use crate::{
	api::AppState,
	error::ServerError,
	pagination::PaginationParams,
	validation::{parse_id, parse_opt_id, require_non_empty},
};

#[utoipa::path(
	get,
	path = "/api/notifications",
	params(ListNotificationsQuery, PaginationParams),
	responses(
		(status = 200, description = "Notifications, newest first", body = ListNotificationsResponse)
	),
	tag = "notifications"
)]
#[instrument(skip(state))]
pub async fn list_notifications(
	State(state): State<AppState>,
	Query(query): Query<ListNotificationsQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListNotificationsResponse>, ServerError> {
	let (limit, offset) = page.resolve();
	let (notifications, total) = state
		.notifications
		.list_notifications(query.unacknowledged_only, limit, offset)
		.await?;

	Ok(Json(ListNotificationsResponse {
		notifications: notifications
			.into_iter()
			.map(NotificationResponse::from)
			.collect(),
		total,
		limit,
		offset,
	}))
}

#[utoipa::path(
	post,
	path = "/api/notifications",
	request_body = CreateNotificationRequest,
	responses(
		(status = 201, description = "Notification raised", body = NotificationResponse),
		(status = 400, description = "Invalid input", body = ErrorResponse),
		(status = 404, description = "No such device", body = ErrorResponse)
	),
	tag = "notifications"
)]
#[instrument(skip(state, req), fields(severity = %req.severity))]
pub async fn create_notification(
	State(state): State<AppState>,
	Json(req): Json<CreateNotificationRequest>,
) -> Result<(StatusCode, Json<NotificationResponse>), ServerError> {
	require_non_empty(&req.title, "title")?;
	let new = NewNotification {
		device_id: parse_opt_id(req.device_id.as_deref(), "device id")?,
		severity: req.severity,
		title: req.title,
		message: req.message,
	};

	let notification = state.notifications.create_notification(&new).await?;
	tracing::info!(notification_id = %notification.id, "notification raised");
	Ok((StatusCode::CREATED, Json(notification.into())))
}

#[utoipa::path(
	post,
	path = "/api/notifications/{id}/acknowledge",
	params(("id" = String, Path, description = "Notification ID")),
	responses(
		(status = 200, description = "Notification acknowledged (idempotent)", body = NotificationResponse),
		(status = 404, description = "No such notification", body = ErrorResponse)
	),
	tag = "notifications"
)]
#[instrument(skip(state))]
pub async fn acknowledge_notification(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<NotificationResponse>, ServerError> {
	let id: NotificationId = parse_id(&id, "notification id")?;
	if state.notifications.acknowledge_notification(&id).await? {
		tracing::info!(notification_id = %id, "notification acknowledged");
	}

	let notification = state
		.notifications
		.get_notification(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("notification {id}")))?;
	Ok(Json(notification.into()))
}

#[utoipa::path(
	delete,
	path = "/api/notifications/{id}",
	params(("id" = String, Path, description = "Notification ID")),
	responses(
		(status = 200, description = "Notification deleted", body = SuccessResponse),
		(status = 404, description = "No such notification", body = ErrorResponse)
	),
	tag = "notifications"
)]
#[instrument(skip(state))]
pub async fn delete_notification(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, ServerError> {
	let id: NotificationId = parse_id(&id, "notification id")?;
	if !state.notifications.delete_notification(&id).await? {
		return Err(ServerError::NotFound(format!("notification {id}")));
	}
	Ok(Json(SuccessResponse {
		message: format!("Notification {id} deleted"),
	}))
}
