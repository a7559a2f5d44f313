// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy rule and hit-count HTTP handlers.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use rampart_server_api::{
	CreatePolicyRequest, ErrorResponse, HitCountResponse, ListHitCountsResponse, ListPoliciesQuery,
	ListPoliciesResponse, PolicyResponse, RecordHitCountRequest, SuccessResponse,
	UnusedPoliciesResponse, UpdatePolicyRequest,
};
use rampart_server_db::{ChangeAction, DeviceId, EntityType, NewPolicy, PolicyId};
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

async fn require_device(state: &AppState, id: &DeviceId) -> Result<(), ServerError> {
	match state.devices.get_device_by_id(id).await? {
		Some(_) => Ok(()),
		None => Err(ServerError::NotFound(format!("device {id}"))),
	}
}

#[utoipa::path(
	get,
	path = "/api/policies",
	params(ListPoliciesQuery, PaginationParams),
	responses(
		(status = 200, description = "Policies of the device in rule order", body = ListPoliciesResponse),
		(status = 400, description = "Missing or malformed device id", body = ErrorResponse),
		(status = 404, description = "No such device", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state))]
pub async fn list_policies(
	State(state): State<AppState>,
	Query(query): Query<ListPoliciesQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListPoliciesResponse>, ServerError> {
	let device_id: DeviceId = parse_id(&query.device_id, "device id")?;
	require_device(&state, &device_id).await?;

	let (limit, offset) = page.resolve();
	let (policies, total) = state.policies.list_policies(&device_id, limit, offset).await?;

	Ok(Json(ListPoliciesResponse {
		policies: policies.into_iter().map(PolicyResponse::from).collect(),
		total,
		limit,
		offset,
	}))
}

#[utoipa::path(
	post,
	path = "/api/policies",
	request_body = CreatePolicyRequest,
	responses(
		(status = 201, description = "Policy created", body = PolicyResponse),
		(status = 400, description = "Invalid input", body = ErrorResponse),
		(status = 404, description = "No such device", body = ErrorResponse),
		(status = 409, description = "Policy name already used on this device", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state, actor, req), fields(name = %req.name, action = %req.action))]
pub async fn create_policy(
	State(state): State<AppState>,
	actor: Actor,
	Json(req): Json<CreatePolicyRequest>,
) -> Result<(StatusCode, Json<PolicyResponse>), ServerError> {
	require_non_empty(&req.name, "name")?;
	let new = NewPolicy {
		device_id: parse_id(&req.device_id, "device id")?,
		name: req.name,
		position: req.position,
		source_zones: req.source_zones,
		destination_zones: req.destination_zones,
		source_addresses: req.source_addresses,
		destination_addresses: req.destination_addresses,
		services: req.services,
		action: req.action,
		enabled: req.enabled,
		logging: req.logging,
		description: req.description,
	};

	let policy = state.policies.create_policy(&new).await?;
	tracing::info!(policy_id = %policy.id, device_id = %policy.device_id, "policy created");

	record_change(
		&state,
		actor,
		EntityType::Policy,
		policy.id,
		ChangeAction::Created,
		format!("Created policy {}", policy.name),
		json!({
			"device_id": policy.device_id,
			"name": policy.name,
			"position": policy.position,
			"action": policy.action,
			"enabled": policy.enabled,
		}),
	)
	.await;

	Ok((StatusCode::CREATED, Json(policy.into())))
}

#[utoipa::path(
	get,
	path = "/api/policies/{id}",
	params(("id" = String, Path, description = "Policy ID")),
	responses(
		(status = 200, description = "Policy", body = PolicyResponse),
		(status = 404, description = "No such policy", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state))]
pub async fn get_policy(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<PolicyResponse>, ServerError> {
	let id: PolicyId = parse_id(&id, "policy id")?;
	let policy = state
		.policies
		.get_policy(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("policy {id}")))?;
	Ok(Json(policy.into()))
}

#[utoipa::path(
	patch,
	path = "/api/policies/{id}",
	params(("id" = String, Path, description = "Policy ID")),
	request_body = UpdatePolicyRequest,
	responses(
		(status = 200, description = "Updated policy", body = PolicyResponse),
		(status = 400, description = "Invalid input", body = ErrorResponse),
		(status = 404, description = "No such policy", body = ErrorResponse),
		(status = 409, description = "Policy name already used on this device", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state, actor, req))]
pub async fn update_policy(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<UpdatePolicyRequest>,
) -> Result<Json<PolicyResponse>, ServerError> {
	let id: PolicyId = parse_id(&id, "policy id")?;
	if let Some(name) = &req.name {
		require_non_empty(name, "name")?;
	}

	let fields: Vec<&str> = [
		("name", req.name.is_some()),
		("position", req.position.is_some()),
		("source_zones", req.source_zones.is_some()),
		("destination_zones", req.destination_zones.is_some()),
		("source_addresses", req.source_addresses.is_some()),
		("destination_addresses", req.destination_addresses.is_some()),
		("services", req.services.is_some()),
		("action", req.action.is_some()),
		("enabled", req.enabled.is_some()),
		("logging", req.logging.is_some()),
		("description", req.description.is_some()),
	]
	.into_iter()
	.filter_map(|(field, set)| set.then_some(field))
	.collect();

	let policy = state.policies.update_policy(&id, &req.into()).await?;

	record_change(
		&state,
		actor,
		EntityType::Policy,
		policy.id,
		ChangeAction::Updated,
		format!("Updated policy {}", policy.name),
		json!({
			"fields": fields,
			"position": policy.position,
			"action": policy.action,
			"enabled": policy.enabled,
		}),
	)
	.await;

	Ok(Json(policy.into()))
}

#[utoipa::path(
	delete,
	path = "/api/policies/{id}",
	params(("id" = String, Path, description = "Policy ID")),
	responses(
		(status = 200, description = "Policy and its hit-count history deleted", body = SuccessResponse),
		(status = 404, description = "No such policy", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state, actor))]
pub async fn delete_policy(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	let id: PolicyId = parse_id(&id, "policy id")?;
	let policy = state
		.policies
		.get_policy(&id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("policy {id}")))?;

	if !state.policies.delete_policy(&id).await? {
		return Err(ServerError::NotFound(format!("policy {id}")));
	}

	record_change(
		&state,
		actor,
		EntityType::Policy,
		id,
		ChangeAction::Deleted,
		format!("Deleted policy {}", policy.name),
		json!({ "device_id": policy.device_id, "name": policy.name }),
	)
	.await;

	Ok(Json(SuccessResponse {
		message: format!("Policy {id} deleted"),
	}))
}

#[utoipa::path(
	get,
	path = "/api/policies/{id}/hit-counts",
	params(("id" = String, Path, description = "Policy ID"), PaginationParams),
	responses(
		(status = 200, description = "Hit-count samples, newest first", body = ListHitCountsResponse),
		(status = 404, description = "No such policy", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state))]
pub async fn list_hit_counts(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListHitCountsResponse>, ServerError> {
	let id: PolicyId = parse_id(&id, "policy id")?;
	if state.policies.get_policy(&id).await?.is_none() {
		return Err(ServerError::NotFound(format!("policy {id}")));
	}

	let (limit, offset) = page.resolve();
	let (samples, total) = state.policies.list_hit_counts(&id, limit, offset).await?;

	Ok(Json(ListHitCountsResponse {
		samples: samples.into_iter().map(HitCountResponse::from).collect(),
		total,
		limit,
		offset,
	}))
}

#[utoipa::path(
	post,
	path = "/api/policies/{id}/hit-counts",
	params(("id" = String, Path, description = "Policy ID")),
	request_body = RecordHitCountRequest,
	responses(
		(status = 201, description = "Sample recorded", body = HitCountResponse),
		(status = 400, description = "Negative hit count", body = ErrorResponse),
		(status = 404, description = "No such policy", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state))]
pub async fn record_hit_count(
	State(state): State<AppState>,
	Path(id): Path<String>,
	Json(req): Json<RecordHitCountRequest>,
) -> Result<(StatusCode, Json<HitCountResponse>), ServerError> {
	let id: PolicyId = parse_id(&id, "policy id")?;
	let sample = state.policies.record_hit_count(&id, &req.into()).await?;
	tracing::debug!(policy_id = %id, hit_count = sample.hit_count, "hit count recorded");
	Ok((StatusCode::CREATED, Json(sample.into())))
}

#[utoipa::path(
	get,
	path = "/api/devices/{id}/unused-policies",
	params(("id" = String, Path, description = "Device ID")),
	responses(
		(status = 200, description = "Enabled policies whose latest sample shows zero hits, or that have no sample", body = UnusedPoliciesResponse),
		(status = 404, description = "No such device", body = ErrorResponse)
	),
	tag = "policies"
)]
#[instrument(skip(state))]
pub async fn list_unused_policies(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<UnusedPoliciesResponse>, ServerError> {
	let device_id: DeviceId = parse_id(&id, "device id")?;
	require_device(&state, &device_id).await?;

	let policies = state.policies.list_unused_policies(&device_id).await?;
	Ok(Json(UnusedPoliciesResponse {
		device_id: device_id.to_string(),
		policies: policies.into_iter().map(PolicyResponse::from).collect(),
	}))
}
