// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use chrono::{DateTime, Utc};
use rampart_server_db::{ChangeAction, ChangeEntry, EntityType};
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ChangeResponse {
	pub id: String,
	pub entity_type: EntityType,
	pub entity_id: String,
	pub action: ChangeAction,
	pub actor: Option<String>,
	pub summary: String,
	#[cfg_attr(feature = "openapi", schema(value_type = Object))]
	pub details: serde_json::Value,
	pub created_at: DateTime<Utc>,
}

impl From<ChangeEntry> for ChangeResponse {
	fn from(entry: ChangeEntry) -> Self {
		Self {
			id: entry.id.to_string(),
			entity_type: entry.entity_type,
			entity_id: entry.entity_id,
			action: entry.action,
			actor: entry.actor,
			summary: entry.summary,
			details: entry.details,
			created_at: entry.created_at,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ListChangesResponse {
	pub changes: Vec<ChangeResponse>,
	pub total: i64,
	pub limit: i64,
	pub offset: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(IntoParams))]
#[cfg_attr(feature = "openapi", into_params(parameter_in = Query))]
pub struct ListChangesQuery {
	pub entity_type: Option<EntityType>,
	pub entity_id: Option<String>,
}
