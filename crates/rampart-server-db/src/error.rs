// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use rampart_server_secrets::SecretsError;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
	#[error("Database error: {0}")]
	Sqlx(#[from] sqlx::Error),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Conflict: {0}")]
	Conflict(String),

	#[error("Internal: {0}")]
	Internal(String),

	#[error("Serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	/// Input rejected before it reached the database.
	#[error("Invalid: {0}")]
	Invalid(String),

	/// A stored credential could not be encrypted or decrypted.
	#[error("Credential error: {0}")]
	Secrets(#[from] SecretsError),
}

impl DbError {
	/// True when a stored credential failed authentication on read.
	pub fn is_decryption_failure(&self) -> bool {
		matches!(self, DbError::Secrets(e) if e.is_decryption())
	}
}

pub type Result<T> = std::result::Result<T, DbError>;

/// Map constraint violations on insert/update: unique → [`DbError::Conflict`],
/// foreign key → [`DbError::NotFound`].
pub(crate) fn map_constraint_error(e: sqlx::Error, conflict: impl FnOnce() -> String) -> DbError {
	match e {
		sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
			DbError::Conflict(conflict())
		}
		sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
			DbError::NotFound("referenced record does not exist".to_string())
		}
		_ => DbError::Sqlx(e),
	}
}
