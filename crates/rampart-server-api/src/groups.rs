// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use rampart_server_db::{ObjectGroup, ObjectGroupUpdate};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// A network or service group. Which one is implied by the route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GroupResponse {
	pub id: String,
	pub device_id: Option<String>,
	pub name: String,
	pub description: Option<String>,
	pub member_count: i64,
	pub created_at: DateTime<Utc>,
	pub updated_at: DateTime<Utc>,
}

impl From<ObjectGroup> for GroupResponse {
	fn from(group: ObjectGroup) -> Self {
		Self {
			id: group.id.to_string(),
			device_id: group.device_id.map(|d| d.to_string()),
			name: group.name,
			description: group.description,
			member_count: group.member_count,
			created_at: group.created_at,
			updated_at: group.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListGroupsResponse {
	pub groups: Vec<GroupResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListGroupsQuery {
	/// A device id, or `global` for shared entries only.
	pub device_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CreateGroupRequest {
	pub device_id: Option<String>,
	pub name: String,
	pub description: Option<String>,
}

/// An empty `description` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct UpdateGroupRequest {
	pub name: Option<String>,
	pub description: Option<String>,
}

impl From<UpdateGroupRequest> for ObjectGroupUpdate {
	fn from(req: UpdateGroupRequest) -> Self {
		ObjectGroupUpdate {
			name: req.name,
			description: req.description,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct AddGroupMemberRequest {
	/// Id of a network object for network groups, a service object for
	/// service groups.
	pub object_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct GroupMembersResponse {
	pub group_id: String,
	pub members: Vec<String>,
}
