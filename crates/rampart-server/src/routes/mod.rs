// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP route handlers.

pub mod changes;
pub mod devices;
pub mod docs;
pub mod groups;
pub mod health;
pub mod notifications;
pub mod objects;
pub mod policies;

use rampart_server_db::{ChangeAction, EntityType, NewChange};

use crate::{actor::Actor, api::AppState};

/// Append a change-log entry for a completed mutation. The mutation has
/// already been committed, so a failure here is logged and swallowed.
pub(crate) async fn record_change(
	state: &AppState,
	actor: Actor,
	entity_type: EntityType,
	entity_id: impl ToString,
	action: ChangeAction,
	summary: String,
	details: serde_json::Value,
) {
	let change = NewChange {
		entity_type,
		entity_id: entity_id.to_string(),
		action,
		actor: actor.into_inner(),
		summary,
		details,
	};

	if let Err(e) = state.changes.record_change(&change).await {
		tracing::error!(
			error = %e,
			entity_type = %change.entity_type,
			entity_id = %change.entity_id,
			action = %change.action,
			"failed to record change entry"
		);
	}
}
