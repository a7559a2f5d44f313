// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network object and service object HTTP handlers.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use rampart_server_api::{
	CreateNetworkObjectRequest, CreateServiceObjectRequest, ErrorResponse, ListNetworkObjectsQuery,
	ListNetworkObjectsResponse, ListServiceObjectsQuery, ListServiceObjectsResponse,
	NetworkObjectResponse, ServiceObjectResponse, SuccessResponse, UpdateNetworkObjectRequest,
	UpdateServiceObjectRequest,
};
use rampart_server_db::{ChangeAction, EntityType, NewNetworkObject, NewServiceObject, ObjectId};
use serde_json::json;
use tracing::instrument;

use super::record_change;
use crate::{
	actor::Actor,
	api::AppState,
	error::ServerError,
	pagination::PaginationParams,
	validation::{parse_id, parse_opt_id, parse_scope, require_non_empty},
};

fn present(fields: &[(&'static str, bool)]) -> Vec<&'static str> {
	fields
		.iter()
		.filter(|(_, set)| *set)
		.map(|(name, _)| *name)
		.collect()
}

// =============================================================================
// Network objects
// =============================================================================

#[utoipa::path(
	get,
	path = "/api/network-objects",
	params(ListNetworkObjectsQuery, PaginationParams),
	responses(
		(status = 200, description = "Network objects, ordered by name", body = ListNetworkObjectsResponse),
		(status = 400, description = "Malformed device id", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state))]
pub async fn list_network_objects(
	State(state): State<AppState>,
	Query(query): Query<ListNetworkObjectsQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListNetworkObjectsResponse>, ServerError> {
	let scope = parse_scope(query.device_id.as_deref())?;
	let (limit, offset) = page.resolve();
	let (objects, total) = state
		.objects
		.list_network_objects(scope, query.kind, limit, offset)
		.await?;

	Ok(Json(ListNetworkObjectsResponse {
		objects: objects.into_iter().map(NetworkObjectResponse::from).collect(),
		total,
		limit,
		offset,
	}))
}

#[utoipa::path(
	post,
	path = "/api/network-objects",
	request_body = CreateNetworkObjectRequest,
	responses(
		(status = 201, description = "Network object created", body = NetworkObjectResponse),
		(status = 400, description = "Value does not match kind", body = ErrorResponse),
		(status = 404, description = "No such device", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state, actor, req), fields(name = %req.name, kind = %req.kind))]
pub async fn create_network_object(
	State(state): State<AppState>,
	actor: Actor,
	Json(req): Json<CreateNetworkObjectRequest>,
) -> Result<(StatusCode, Json<NetworkObjectResponse>), ServerError> {
	require_non_empty(&req.name, "name")?;
	let new = NewNetworkObject {
		device_id: parse_opt_id(req.device_id.as_deref(), "device id")?,
		name: req.name,
		kind: req.kind,
		value: req.value,
		description: req.description,
	};

	let object = state.objects.create_network_object(&new).await?;
	tracing::info!(object_id = %object.id, "network object created");

	record_change(
		&state,
		actor,
		EntityType::NetworkObject,
		object.id,
		ChangeAction::Created,
		format!("Created network object {}", object.name),
		json!({ "name": object.name, "kind": object.kind, "value": object.value }),
	)
	.await;

	Ok((StatusCode::CREATED, Json(object.into())))
}

#[utoipa::path(
	get,
	path = "/api/network-objects/{id}",
	params(("id" = String, Path, description = "Object ID")),
	responses(
		(status = 200, description = "Network object", body = NetworkObjectResponse),
		(status = 404, description = "No such object", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state))]
pub async fn get_network_object(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<NetworkObjectResponse>, ServerError> {
	let id: ObjectId = parse_id(&id, "object id")?;
	let object = state
		.objects
		.get_network_object(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("network object {id}")))?;
	Ok(Json(object.into()))
}

#[utoipa::path(
	patch,
	path = "/api/network-objects/{id}",
	params(("id" = String, Path, description = "Object ID")),
	request_body = UpdateNetworkObjectRequest,
	responses(
		(status = 200, description = "Updated network object", body = NetworkObjectResponse),
		(status = 400, description = "Value does not match kind", body = ErrorResponse),
		(status = 404, description = "No such object", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state, actor, req))]
pub async fn update_network_object(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<UpdateNetworkObjectRequest>,
) -> Result<Json<NetworkObjectResponse>, ServerError> {
	let id: ObjectId = parse_id(&id, "object id")?;
	if let Some(name) = &req.name {
		require_non_empty(name, "name")?;
	}

	let fields = present(&[
		("name", req.name.is_some()),
		("kind", req.kind.is_some()),
		("value", req.value.is_some()),
		("description", req.description.is_some()),
	]);
	let object = state.objects.update_network_object(&id, &req.into()).await?;

	record_change(
		&state,
		actor,
		EntityType::NetworkObject,
		object.id,
		ChangeAction::Updated,
		format!("Updated network object {}", object.name),
		json!({ "fields": fields, "kind": object.kind, "value": object.value }),
	)
	.await;

	Ok(Json(object.into()))
}

#[utoipa::path(
	delete,
	path = "/api/network-objects/{id}",
	params(("id" = String, Path, description = "Object ID")),
	responses(
		(status = 200, description = "Object deleted and removed from all groups", body = SuccessResponse),
		(status = 404, description = "No such object", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state, actor))]
pub async fn delete_network_object(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	let id: ObjectId = parse_id(&id, "object id")?;
	let object = state
		.objects
		.get_network_object(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("network object {id}")))?;

	if !state.objects.delete_network_object(&id).await? {
		return Err(ServerError::NotFound(format!("network object {id}")));
	}

	record_change(
		&state,
		actor,
		EntityType::NetworkObject,
		id,
		ChangeAction::Deleted,
		format!("Deleted network object {}", object.name),
		json!({ "name": object.name, "kind": object.kind, "value": object.value }),
	)
	.await;

	Ok(Json(SuccessResponse {
		message: format!("Network object {id} deleted"),
	}))
}

// =============================================================================
// Service objects
// =============================================================================

#[utoipa::path(
	get,
	path = "/api/service-objects",
	params(ListServiceObjectsQuery, PaginationParams),
	responses(
		(status = 200, description = "Service objects, ordered by name", body = ListServiceObjectsResponse),
		(status = 400, description = "Malformed device id", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state))]
pub async fn list_service_objects(
	State(state): State<AppState>,
	Query(query): Query<ListServiceObjectsQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListServiceObjectsResponse>, ServerError> {
	let scope = parse_scope(query.device_id.as_deref())?;
	let (limit, offset) = page.resolve();
	let (objects, total) = state
		.objects
		.list_service_objects(scope, query.protocol, limit, offset)
		.await?;

	Ok(Json(ListServiceObjectsResponse {
		objects: objects.into_iter().map(ServiceObjectResponse::from).collect(),
		total,
		limit,
		offset,
	}))
}

#[utoipa::path(
	post,
	path = "/api/service-objects",
	request_body = CreateServiceObjectRequest,
	responses(
		(status = 201, description = "Service object created", body = ServiceObjectResponse),
		(status = 400, description = "Invalid port range for protocol", body = ErrorResponse),
		(status = 404, description = "No such device", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state, actor, req), fields(name = %req.name, protocol = %req.protocol))]
pub async fn create_service_object(
	State(state): State<AppState>,
	actor: Actor,
	Json(req): Json<CreateServiceObjectRequest>,
) -> Result<(StatusCode, Json<ServiceObjectResponse>), ServerError> {
	require_non_empty(&req.name, "name")?;
	let new = NewServiceObject {
		device_id: parse_opt_id(req.device_id.as_deref(), "device id")?,
		name: req.name,
		protocol: req.protocol,
		port_start: req.port_start,
		port_end: req.port_end,
		description: req.description,
	};

	let object = state.objects.create_service_object(&new).await?;
	tracing::info!(object_id = %object.id, "service object created");

	record_change(
		&state,
		actor,
		EntityType::ServiceObject,
		object.id,
		ChangeAction::Created,
		format!("Created service object {}", object.name),
		json!({
			"name": object.name,
			"protocol": object.protocol,
			"port_start": object.port_start,
			"port_end": object.port_end,
		}),
	)
	.await;

	Ok((StatusCode::CREATED, Json(object.into())))
}

#[utoipa::path(
	get,
	path = "/api/service-objects/{id}",
	params(("id" = String, Path, description = "Object ID")),
	responses(
		(status = 200, description = "Service object", body = ServiceObjectResponse),
		(status = 404, description = "No such object", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state))]
pub async fn get_service_object(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<ServiceObjectResponse>, ServerError> {
	let id: ObjectId = parse_id(&id, "object id")?;
	let object = state
		.objects
		.get_service_object(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("service object {id}")))?;
	Ok(Json(object.into()))
}

#[utoipa::path(
	patch,
	path = "/api/service-objects/{id}",
	params(("id" = String, Path, description = "Object ID")),
	request_body = UpdateServiceObjectRequest,
	responses(
		(status = 200, description = "Updated service object", body = ServiceObjectResponse),
		(status = 400, description = "Invalid port range for protocol", body = ErrorResponse),
		(status = 404, description = "No such object", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state, actor, req))]
pub async fn update_service_object(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<UpdateServiceObjectRequest>,
) -> Result<Json<ServiceObjectResponse>, ServerError> {
	let id: ObjectId = parse_id(&id, "object id")?;
	if let Some(name) = &req.name {
		require_non_empty(name, "name")?;
	}

	let fields = present(&[
		("name", req.name.is_some()),
		("protocol", req.protocol.is_some()),
		("port_start", req.port_start.is_some()),
		("port_end", req.port_end.is_some()),
		("description", req.description.is_some()),
	]);
	let object = state.objects.update_service_object(&id, &req.into()).await?;

	record_change(
		&state,
		actor,
		EntityType::ServiceObject,
		object.id,
		ChangeAction::Updated,
		format!("Updated service object {}", object.name),
		json!({
			"fields": fields,
			"protocol": object.protocol,
			"port_start": object.port_start,
			"port_end": object.port_end,
		}),
	)
	.await;

	Ok(Json(object.into()))
}

#[utoipa::path(
	delete,
	path = "/api/service-objects/{id}",
	params(("id" = String, Path, description = "Object ID")),
	responses(
		(status = 200, description = "Object deleted and removed from all groups", body = SuccessResponse),
		(status = 404, description = "No such object", body = ErrorResponse)
	),
	tag = "objects"
)]
#[instrument(skip(state, actor))]
pub async fn delete_service_object(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	let id: ObjectId = parse_id(&id, "object id")?;
	let object = state
		.objects
		.get_service_object(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("service object {id}")))?;

	if !state.objects.delete_service_object(&id).await? {
		return Err(ServerError::NotFound(format!("service object {id}")));
	}

	record_change(
		&state,
		actor,
		EntityType::ServiceObject,
		id,
		ChangeAction::Deleted,
		format!("Deleted service object {}", object.name),
		json!({ "name": object.name, "protocol": object.protocol }),
	)
	.await;

	Ok(Json(SuccessResponse {
		message: format!("Service object {id} deleted"),
	}))
}
