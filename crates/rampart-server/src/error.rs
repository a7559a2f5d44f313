// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use rampart_server_api::ErrorResponse;
use rampart_server_db::DbError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Error from the inventory repositories.
	#[error("Database error: {0}")]
	Db(#[from] DbError),

	/// Raw sqlx failure outside a repository (migrations, health ping).
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Invalid request: {0}")]
	BadRequest(String),

	#[error("Internal error: {0}")]
	Internal(String),
}

impl ServerError {
	fn status_and_body(&self) -> (StatusCode, ErrorResponse) {
		match self {
			ServerError::Db(DbError::NotFound(what)) | ServerError::NotFound(what) => (
				StatusCode::NOT_FOUND,
				ErrorResponse::new("not_found", format!("Not found: {what}")),
			),
			ServerError::Db(DbError::Conflict(msg)) => (
				StatusCode::CONFLICT,
				ErrorResponse::new("conflict", msg.clone()),
			),
			ServerError::Db(DbError::Invalid(msg)) | ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse::new("bad_request", msg.clone()),
			),
			ServerError::Db(e) if e.is_decryption_failure() => {
				tracing::error!(error = %e, "stored credential failed authentication");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new(
						"credential_decryption_failed",
						"Stored credential could not be decrypted",
					),
				)
			}
			ServerError::Db(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("database_error", "A database error occurred"),
				)
			}
			ServerError::Sqlx(e) => {
				tracing::error!(error = %e, "database error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("database_error", "A database error occurred"),
				)
			}
			ServerError::Internal(msg) => {
				tracing::error!(error = %msg, "internal error");
				(
					StatusCode::INTERNAL_SERVER_ERROR,
					ErrorResponse::new("internal_error", "An internal error occurred"),
				)
			}
		}
	}
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = self.status_and_body();
		(status, Json(body)).into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rampart_server_secrets::SecretsError;

	fn status_of(err: ServerError) -> (StatusCode, String) {
		let (status, body) = err.status_and_body();
		(status, body.error)
	}

	#[test]
	fn db_errors_map_to_http_statuses() {
		assert_eq!(
			status_of(DbError::NotFound("device x".into()).into()),
			(StatusCode::NOT_FOUND, "not_found".to_string())
		);
		assert_eq!(
			status_of(DbError::Conflict("dup".into()).into()),
			(StatusCode::CONFLICT, "conflict".to_string())
		);
		assert_eq!(
			status_of(DbError::Invalid("bad cidr".into()).into()),
			(StatusCode::BAD_REQUEST, "bad_request".to_string())
		);
		assert_eq!(
			status_of(DbError::Internal("corrupt".into()).into()),
			(StatusCode::INTERNAL_SERVER_ERROR, "database_error".to_string())
		);
	}

	#[test]
	fn decryption_failure_is_distinct_500() {
		let err: ServerError =
			DbError::Secrets(SecretsError::Decryption("authentication failed".into())).into();
		assert_eq!(
			status_of(err),
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				"credential_decryption_failed".to_string()
			)
		);
	}

	#[test]
	fn internal_message_is_not_exposed() {
		let (_, body) = ServerError::Internal("pool exhausted at 0x1f".into()).status_and_body();
		assert!(!body.message.contains("0x1f"));
	}
}
