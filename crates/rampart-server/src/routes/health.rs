// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Health check handler.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use rampart_server_api::{ComponentHealth, HealthResponse, HealthStatus};

use crate::api::AppState;

async fn check_database(state: &AppState) -> ComponentHealth {
	match sqlx::query("SELECT 1").execute(&state.pool).await {
		Ok(_) => ComponentHealth {
			status: HealthStatus::Healthy,
			error: None,
		},
		Err(e) => {
			tracing::warn!(error = %e, "health: database ping failed");
			ComponentHealth {
				status: HealthStatus::Unhealthy,
				error: Some(e.to_string()),
			}
		}
	}
}

fn check_codec(state: &AppState) -> ComponentHealth {
	match state.codec.self_test() {
		Ok(()) => ComponentHealth {
			status: HealthStatus::Healthy,
			error: None,
		},
		Err(e) => {
			tracing::warn!(error = %e, "health: codec self-test failed");
			ComponentHealth {
				status: HealthStatus::Unhealthy,
				error: Some(e.to_string()),
			}
		}
	}
}

#[utoipa::path(
	get,
	path = "/health",
	responses(
		(status = 200, description = "Database and codec are healthy", body = HealthResponse),
		(status = 503, description = "A component is unhealthy", body = HealthResponse)
	),
	tag = "health"
)]
/// GET /health - Database ping and credential codec round trip.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
	let database = check_database(&state).await;
	let codec = check_codec(&state);

	let status = if database.status == HealthStatus::Healthy && codec.status == HealthStatus::Healthy
	{
		HealthStatus::Healthy
	} else {
		HealthStatus::Unhealthy
	};

	let http_status = match status {
		HealthStatus::Healthy => StatusCode::OK,
		HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
	};

	(
		http_status,
		Json(HealthResponse {
			status,
			version: env!("CARGO_PKG_VERSION").to_string(),
			database,
			codec,
		}),
	)
}
