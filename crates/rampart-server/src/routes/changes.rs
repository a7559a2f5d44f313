// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Change log query handler.

use axum::{
	extract::{Query, State},
	Json,
};
use rampart_server_api::{ChangeResponse, ListChangesQuery, ListChangesResponse};
use rampart_server_db::ChangeFilter;
use tracing::instrument;

use crate::{api::AppState, error::ServerError, pagination::PaginationParams};

#[utoipa::path(
	get,
	path = "/api/changes",
	params(ListChangesQuery, PaginationParams),
	responses(
		(status = 200, description = "Change entries, newest first", body = ListChangesResponse)
	),
	tag = "changes"
)]
#[instrument(skip(state))]
pub async fn list_changes(
	State(state): State<AppState>,
	Query(query): Query<ListChangesQuery>,
	Query(page): Query<PaginationParams>,
) -> Result<Json<ListChangesResponse>, ServerError> {
	let filter = ChangeFilter {
		entity_type: query.entity_type,
		entity_id: query.entity_id,
	};
	let (limit, offset) = page.resolve();
	let (changes, total) = state.changes.list_changes(&filter, limit, offset).await?;

	Ok(Json(ListChangesResponse {
		changes: changes.into_iter().map(ChangeResponse::from).collect(),
		total,
		limit,
		offset,
	}))
}
