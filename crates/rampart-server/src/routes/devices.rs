// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Device HTTP handlers.
//!
//! Device records never carry credential values. Decrypted credentials are
//! only returned by `GET /api/devices/{id}/credentials`.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use rampart_server_api::{
	CreateDeviceRequest, DeviceCredentialsResponse, DeviceResponse, ErrorResponse,
	ListDevicesQuery, ListDevicesResponse, SuccessResponse, UpdateDeviceRequest,
};
use rampart_server_db::{ChangeAction, DeviceId, EntityType};
use serde_json::json;
use tracing::instrument;

use super::record_change;
use crate::{
	actor::Actor,
	api::AppState,
	error::ServerError,
	pagination::PaginationParams,
	validation::{parse_id, require_non_empty},
};

#[utoipa::path(
	get,
	path = "/api/devices",
	params(ListDevicesQuery, PaginationParams),
	responses(
		(status = 200, description = "Devices, ordered by name", body = ListDevicesResponse)
	),
	tag = "devices"
)]
#[instrument(skip(state))]
pub async fn list_devices(
	State(state): State<AppState>,
	Query(query): Query<ListDevicesQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListDevicesResponse>, ServerError> {
	let (limit, offset) = page.resolve();
	let (devices, total) = match query.name.as_deref() {
		Some(name) => {
			let found: Vec<_> = state
				.devices
				.get_device_by_name(name.trim())
				.await?
				.into_iter()
				.filter(|d| query.vendor.map_or(true, |v| d.vendor == v))
				.collect();
			let total = found.len() as i64;
			(found.into_iter().skip(offset as usize).collect(), total)
		}
		None => state.devices.list_devices(query.vendor, limit, offset).await?,
	};

	Ok(Json(ListDevicesResponse {
		devices: devices.into_iter().map(DeviceResponse::from).collect(),
		total,
		limit,
		offset,
	}))
}

#[utoipa::path(
	post,
	path = "/api/devices",
	request_body = CreateDeviceRequest,
	responses(
		(status = 201, description = "Device registered", body = DeviceResponse),
		(status = 400, description = "Invalid input", body = ErrorResponse),
		(status = 409, description = "Device name already in use", body = ErrorResponse)
	),
	tag = "devices"
)]
#[instrument(skip(state, actor, req), fields(name = %req.name, vendor = %req.vendor))]
pub async fn create_device(
	State(state): State<AppState>,
	actor: Actor,
	Json(req): Json<CreateDeviceRequest>,
) -> Result<(StatusCode, Json<DeviceResponse>), ServerError> {
	require_non_empty(&req.name, "name")?;
	require_non_empty(&req.hostname, "hostname")?;
	require_non_empty(&req.username, "username")?;

	let device = state.devices.create_device(&req.into()).await?;
	tracing::info!(device_id = %device.id, "device registered");

	record_change(
		&state,
		actor,
		EntityType::Device,
		device.id,
		ChangeAction::Created,
		format!("Registered device {}", device.name),
		json!({
			"name": device.name,
			"vendor": device.vendor,
			"hostname": device.hostname,
			"port": device.port,
		}),
	)
	.await;

	Ok((StatusCode::CREATED, Json(device.into())))
}

#[utoipa::path(
	get,
	path = "/api/devices/{id}",
	params(("id" = String, Path, description = "Device ID")),
	responses(
		(status = 200, description = "Device", body = DeviceResponse),
		(status = 400, description = "Malformed id", body = ErrorResponse),
		(status = 404, description = "No such device", body = ErrorResponse)
	),
	tag = "devices"
)]
#[instrument(skip(state))]
pub async fn get_device(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<DeviceResponse>, ServerError> {
	let id: DeviceId = parse_id(&id, "device id")?;
	let device = state
		.devices
		.get_device_by_id(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("device {id}")))?;
	Ok(Json(device.into()))
}

#[utoipa::path(
	patch,
	path = "/api/devices/{id}",
	params(("id" = String, Path, description = "Device ID")),
	request_body = UpdateDeviceRequest,
	responses(
		(status = 200, description = "Updated device", body = DeviceResponse),
		(status = 400, description = "Invalid input", body = ErrorResponse),
		(status = 404, description = "No such device", body = ErrorResponse),
		(status = 409, description = "Device name already in use", body = ErrorResponse)
	),
	tag = "devices"
)]
#[instrument(skip(state, actor, req))]
pub async fn update_device(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<UpdateDeviceRequest>,
) -> Result<Json<DeviceResponse>, ServerError> {
	let id: DeviceId = parse_id(&id, "device id")?;
	for (value, field) in [
		(&req.name, "name"),
		(&req.hostname, "hostname"),
		(&req.username, "username"),
	] {
		if let Some(value) = value {
			require_non_empty(value, field)?;
		}
	}

	let fields = req.changed_fields();
	let device = state.devices.update_device(&id, &req.into()).await?;
	tracing::info!(device_id = %device.id, ?fields, "device updated");

	record_change(
		&state,
		actor,
		EntityType::Device,
		device.id,
		ChangeAction::Updated,
		format!("Updated device {}", device.name),
		json!({ "fields": fields }),
	)
	.await;

	Ok(Json(device.into()))
}

#[utoipa::path(
	delete,
	path = "/api/devices/{id}",
	params(("id" = String, Path, description = "Device ID")),
	responses(
		(status = 200, description = "Device deleted with its objects, groups and policies", body = SuccessResponse),
		(status = 404, description = "No such device", body = ErrorResponse)
	),
	tag = "devices"
)]
#[instrument(skip(state, actor))]
pub async fn delete_device(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	let id: DeviceId = parse_id(&id, "device id")?;
	let device = state
		.devices
		.get_device_by_id(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("device {id}")))?;

	if !state.devices.delete_device(&id).await? {
		return Err(ServerError::NotFound(format!("device {id}")));
	}
	tracing::info!(device_id = %id, "device deleted");

	record_change(
		&state,
		actor,
		EntityType::Device,
		id,
		ChangeAction::Deleted,
		format!("Deleted device {}", device.name),
		json!({ "name": device.name, "vendor": device.vendor }),
	)
	.await;

	Ok(Json(SuccessResponse {
		message: format!("Device {id} deleted"),
	}))
}

#[utoipa::path(
	get,
	path = "/api/devices/{id}/credentials",
	params(("id" = String, Path, description = "Device ID")),
	responses(
		(status = 200, description = "Decrypted device credentials", body = DeviceCredentialsResponse),
		(status = 404, description = "No such device", body = ErrorResponse),
		(status = 500, description = "Stored credential failed integrity check (credential_decryption_failed)", body = ErrorResponse)
	),
	tag = "devices"
)]
#[instrument(skip(state))]
pub async fn get_device_credentials(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<DeviceCredentialsResponse>, ServerError> {
	let id: DeviceId = parse_id(&id, "device id")?;
	let creds = state
		.devices
		.get_credentials(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("device {id}")))?;
	tracing::info!(device_id = %id, "device credentials read");
	Ok(Json(creds.into()))
}
