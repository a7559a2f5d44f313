// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Network group and service group HTTP handlers.
//!
//! Both group kinds share one implementation parameterised by [`GroupKind`];
//! the per-kind functions exist so each route has its own OpenAPI entry.

use axum::{
	extract::{Path, Query, State},
	http::StatusCode,
	Json,
};
use rampart_server_api::{
	AddGroupMemberRequest, CreateGroupRequest, ErrorResponse, GroupMembersResponse, GroupResponse,
	ListGroupsQuery, ListGroupsResponse, SuccessResponse, UpdateGroupRequest,
};
use rampart_server_db::{ChangeAction, GroupId, GroupKind, NewObjectGroup, ObjectId};
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

fn label(kind: GroupKind) -> &'static str {
	match kind {
		GroupKind::Network => "network group",
		GroupKind::Service => "service group",
	}
}

async fn list_groups(
	state: &AppState,
	kind: GroupKind,
	query: ListGroupsQuery,
	page: PaginationParams,
) -> Result<Json<ListGroupsResponse>, ServerError> {
	let scope = parse_scope(query.device_id.as_deref())?;
	let (limit, offset) = page.resolve();
	let (groups, total) = state.groups.list_groups(kind, scope, limit, offset).await?;

	Ok(Json(ListGroupsResponse {
		groups: groups.into_iter().map(GroupResponse::from).collect(),
		total,
		limit,
		offset,
	}))
}

async fn create_group(
	state: &AppState,
	kind: GroupKind,
	actor: Actor,
	req: CreateGroupRequest,
) -> Result<(StatusCode, Json<GroupResponse>), ServerError> {
	require_non_empty(&req.name, "name")?;
	let new = NewObjectGroup {
		device_id: parse_opt_id(req.device_id.as_deref(), "device id")?,
		name: req.name,
		description: req.description,
	};

	let group = state.groups.create_group(kind, &new).await?;
	tracing::info!(group_id = %group.id, kind = label(kind), "group created");

	record_change(
		state,
		actor,
		kind.entity_type(),
		group.id,
		ChangeAction::Created,
		format!("Created {} {}", label(kind), group.name),
		json!({ "name": group.name, "device_id": group.device_id }),
	)
	.await;

	Ok((StatusCode::CREATED, Json(group.into())))
}

async fn get_group(
	state: &AppState,
	kind: GroupKind,
	id: &str,
) -> Result<Json<GroupResponse>, ServerError> {
	let id: GroupId = parse_id(id, "group id")?;
	let group = state
		.groups
		.get_group(kind, &id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("{} {id}", label(kind))))?;
	Ok(Json(group.into()))
}

async fn update_group(
	state: &AppState,
	kind: GroupKind,
	actor: Actor,
	id: &str,
	req: UpdateGroupRequest,
) -> Result<Json<GroupResponse>, ServerError> {
	let id: GroupId = parse_id(id, "group id")?;
	if let Some(name) = &req.name {
		require_non_empty(name, "name")?;
	}

	let mut fields = Vec::new();
	if req.name.is_some() {
		fields.push("name");
	}
	if req.description.is_some() {
		fields.push("description");
	}
	let group = state.groups.update_group(kind, &id, &req.into()).await?;

	record_change(
		state,
		actor,
		kind.entity_type(),
		group.id,
		ChangeAction::Updated,
		format!("Updated {} {}", label(kind), group.name),
		json!({ "fields": fields }),
	)
	.await;

	Ok(Json(group.into()))
}

async fn delete_group(
	state: &AppState,
	kind: GroupKind,
	actor: Actor,
	id: &str,
) -> Result<Json<SuccessResponse>, ServerError> {
	let id: GroupId = parse_id(id, "group id")?;
	let group = state
		.groups
		.get_group(kind, &id)
		.await?
		.ok_or_else(|| ServerError::NotFound(format!("{} {id}", label(kind))))?;

	if !state.groups.delete_group(kind, &id).await? {
		return Err(ServerError::NotFound(format!("{} {id}", label(kind))));
	}

	record_change(
		state,
		actor,
		kind.entity_type(),
		id,
		ChangeAction::Deleted,
		format!("Deleted {} {}", label(kind), group.name),
		json!({ "name": group.name, "member_count": group.member_count }),
	)
	.await;

	Ok(Json(SuccessResponse {
		message: format!("Group {id} deleted"),
	}))
}

async fn list_members(
	state: &AppState,
	kind: GroupKind,
	id: &str,
) -> Result<Json<GroupMembersResponse>, ServerError> {
	let id: GroupId = parse_id(id, "group id")?;
	if state.groups.get_group(kind, &id).await?.is_none() {
		return Err(ServerError::NotFound(format!("{} {id}", label(kind))));
	}

	let members = state.groups.list_group_members(kind, &id).await?;
	Ok(Json(GroupMembersResponse {
		group_id: id.to_string(),
		members: members.iter().map(ToString::to_string).collect(),
	}))
}

async fn add_member(
	state: &AppState,
	kind: GroupKind,
	actor: Actor,
	id: &str,
	req: AddGroupMemberRequest,
) -> Result<(StatusCode, Json<GroupMembersResponse>), ServerError> {
	let group_id: GroupId = parse_id(id, "group id")?;
	let object_id: ObjectId = parse_id(&req.object_id, "object id")?;

	let added = state
		.groups
		.add_group_member(kind, &group_id, &object_id)
		.await?;

	if added {
		record_change(
			state,
			actor,
			kind.entity_type(),
			group_id,
			ChangeAction::Updated,
			format!("Added member to {} {group_id}", label(kind)),
			json!({ "added": object_id }),
		)
		.await;
	}

	let members = state.groups.list_group_members(kind, &group_id).await?;
	let status = if added { StatusCode::CREATED } else { StatusCode::OK };
	Ok((
		status,
		Json(GroupMembersResponse {
			group_id: group_id.to_string(),
			members: members.iter().map(ToString::to_string).collect(),
		}),
	))
}

async fn remove_member(
	state: &AppState,
	kind: GroupKind,
	actor: Actor,
	id: &str,
	member_id: &str,
) -> Result<Json<SuccessResponse>, ServerError> {
	let group_id: GroupId = parse_id(id, "group id")?;
	let object_id: ObjectId = parse_id(member_id, "member id")?;

	if !state
		.groups
		.remove_group_member(kind, &group_id, &object_id)
		.await?
	{
		return Err(ServerError::NotFound(format!(
			"member {object_id} of {} {group_id}",
			label(kind)
		)));
	}

	record_change(
		state,
		actor,
		kind.entity_type(),
		group_id,
		ChangeAction::Updated,
		format!("Removed member from {} {group_id}", label(kind)),
		json!({ "removed": object_id }),
	)
	.await;

	Ok(Json(SuccessResponse {
		message: format!("Object {object_id} removed from group {group_id}"),
	}))
}

// =============================================================================
// Network groups
// =============================================================================

#[utoipa::path(
	get,
	path = "/api/network-groups",
	params(ListGroupsQuery, PaginationParams),
	responses((status = 200, description = "Network groups", body = ListGroupsResponse)),
	tag = "groups"
)]
#[instrument(skip(state))]
pub async fn list_network_groups(
	State(state): State<AppState>,
	Query(query): Query<ListGroupsQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListGroupsResponse>, ServerError> {
	list_groups(&state, GroupKind::Network, query, page).await
}

#[utoipa::path(
	post,
	path = "/api/network-groups",
	request_body = CreateGroupRequest,
	responses(
		(status = 201, description = "Network group created", body = GroupResponse),
		(status = 404, description = "No such device", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor, req), fields(name = %req.name))]
pub async fn create_network_group(
	State(state): State<AppState>,
	actor: Actor,
	Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ServerError> {
	create_group(&state, GroupKind::Network, actor, req).await
}

#[utoipa::path(
	get,
	path = "/api/network-groups/{id}",
	params(("id" = String, Path, description = "Group ID")),
	responses(
		(status = 200, description = "Network group", body = GroupResponse),
		(status = 404, description = "No such group", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state))]
pub async fn get_network_group(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<GroupResponse>, ServerError> {
	get_group(&state, GroupKind::Network, &id).await
}

#[utoipa::path(
	patch,
	path = "/api/network-groups/{id}",
	params(("id" = String, Path, description = "Group ID")),
	request_body = UpdateGroupRequest,
	responses(
		(status = 200, description = "Network group updated", body = GroupResponse),
		(status = 400, description = "Invalid name", body = ErrorResponse),
		(status = 404, description = "No such group", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor, req))]
pub async fn update_network_group(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, ServerError> {
	update_group(&state, GroupKind::Network, actor, &id, req).await
}

#[utoipa::path(
	delete,
	path = "/api/network-groups/{id}",
	params(("id" = String, Path, description = "Group ID")),
	responses(
		(status = 200, description = "Network group deleted", body = SuccessResponse),
		(status = 404, description = "No such group", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor))]
pub async fn delete_network_group(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	delete_group(&state, GroupKind::Network, actor, &id).await
}

#[utoipa::path(
	get,
	path = "/api/network-groups/{id}/members",
	params(("id" = String, Path, description = "Group ID")),
	responses(
		(status = 200, description = "Member object ids, oldest first", body = GroupMembersResponse),
		(status = 404, description = "No such group", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state))]
pub async fn list_network_group_members(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<GroupMembersResponse>, ServerError> {
	list_members(&state, GroupKind::Network, &id).await
}

#[utoipa::path(
	post,
	path = "/api/network-groups/{id}/members",
	params(("id" = String, Path, description = "Group ID")),
	request_body = AddGroupMemberRequest,
	responses(
		(status = 201, description = "Network object added", body = GroupMembersResponse),
		(status = 200, description = "Already a member", body = GroupMembersResponse),
		(status = 400, description = "Object belongs to another device", body = ErrorResponse),
		(status = 404, description = "No such group or network object", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor))]
pub async fn add_network_group_member(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<AddGroupMemberRequest>,
) -> Result<(StatusCode, Json<GroupMembersResponse>), ServerError> {
	add_member(&state, GroupKind::Network, actor, &id, req).await
}

#[utoipa::path(
	delete,
	path = "/api/network-groups/{id}/members/{member_id}",
	params(
		("id" = String, Path, description = "Group ID"),
		("member_id" = String, Path, description = "Network object ID")
	),
	responses(
		(status = 200, description = "Member removed", body = SuccessResponse),
		(status = 404, description = "Not a member", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor))]
pub async fn remove_network_group_member(
	State(state): State<AppState>,
	Path((id, member_id)): Path<(String, String)>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	remove_member(&state, GroupKind::Network, actor, &id, &member_id).await
}

// =============================================================================
// Service groups
// =============================================================================

#[utoipa::path(
	get,
	path = "/api/service-groups",
	params(ListGroupsQuery, PaginationParams),
	responses((status = 200, description = "Service groups", body = ListGroupsResponse)),
	tag = "groups"
)]
#[instrument(skip(state))]
pub async fn list_service_groups(
	State(state): State<AppState>,
	Query(query): Query<ListGroupsQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListGroupsResponse>, ServerError> {
	list_groups(&state, GroupKind::Service, query, page).await
}

#[utoipa::path(
	post,
	path = "/api/service-groups",
	request_body = CreateGroupRequest,
	responses(
		(status = 201, description = "Service group created", body = GroupResponse),
		(status = 404, description = "No such device", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor, req), fields(name = %req.name))]
pub async fn create_service_group(
	State(state): State<AppState>,
	actor: Actor,
	Json(req): Json<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), ServerError> {
	create_group(&state, GroupKind::Service, actor, req).await
}

#[utoipa::path(
	get,
	path = "/api/service-groups/{id}",
	params(("id" = String, Path, description = "Group ID")),
	responses(
		(status = 200, description = "Service group", body = GroupResponse),
		(status = 404, description = "No such group", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state))]
pub async fn get_service_group(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<GroupResponse>, ServerError> {
	get_group(&state, GroupKind::Service, &id).await
}

#[utoipa::path(
	patch,
	path = "/api/service-groups/{id}",
	params(("id" = String, Path, description = "Group ID")),
	request_body = UpdateGroupRequest,
	responses(
		(status = 200, description = "Service group updated", body = GroupResponse),
		(status = 400, description = "Invalid name", body = ErrorResponse),
		(status = 404, description = "No such group", body = ErrorResponse),
		(status = 409, description = "Name already used in this scope", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor, req))]
pub async fn update_service_group(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<UpdateGroupRequest>,
) -> Result<Json<GroupResponse>, ServerError> {
	update_group(&state, GroupKind::Service, actor, &id, req).await
}

#[utoipa::path(
	delete,
	path = "/api/service-groups/{id}",
	params(("id" = String, Path, description = "Group ID")),
	responses(
		(status = 200, description = "Service group deleted", body = SuccessResponse),
		(status = 404, description = "No such group", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor))]
pub async fn delete_service_group(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	delete_group(&state, GroupKind::Service, actor, &id).await
}

#[utoipa::path(
	get,
	path = "/api/service-groups/{id}/members",
	params(("id" = String, Path, description = "Group ID")),
	responses(
		(status = 200, description = "Member object ids, oldest first", body = GroupMembersResponse),
		(status = 404, description = "No such group", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state))]
pub async fn list_service_group_members(
	State(state): State<AppState>,
	Path(id): Path<String>,
) -> Result<Json<GroupMembersResponse>, ServerError> {
	list_members(&state, GroupKind::Service, &id).await
}

#[utoipa::path(
	post,
	path = "/api/service-groups/{id}/members",
	params(("id" = String, Path, description = "Group ID")),
	request_body = AddGroupMemberRequest,
	responses(
		(status = 201, description = "Service object added", body = GroupMembersResponse),
		(status = 200, description = "Already a member", body = GroupMembersResponse),
		(status = 400, description = "Object belongs to another device", body = ErrorResponse),
		(status = 404, description = "No such group or service object", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor))]
pub async fn add_service_group_member(
	State(state): State<AppState>,
	Path(id): Path<String>,
	actor: Actor,
	Json(req): Json<AddGroupMemberRequest>,
) -> Result<(StatusCode, Json<GroupMembersResponse>), ServerError> {
	add_member(&state, GroupKind::Service, actor, &id, req).await
}

#[utoipa::path(
	delete,
	path = "/api/service-groups/{id}/members/{member_id}",
	params(
		("id" = String, Path, description = "Group ID"),
		("member_id" = String, Path, description = "Service object ID")
	),
	responses(
		(status = 200, description = "Member removed", body = SuccessResponse),
		(status = 404, description = "Not a member", body = ErrorResponse)
	),
	tag = "groups"
)]
#[instrument(skip(state, actor))]
pub async fn remove_service_group_member(
	State(state): State<AppState>,
	Path((id, member_id)): Path<(String, String)>,
	actor: Actor,
) -> Result<Json<SuccessResponse>, ServerError> {
	remove_member(&state, GroupKind::Service, actor, &id, &member_id).await
}
