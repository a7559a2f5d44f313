// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared pagination utilities for API handlers.

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 500;

#[derive(Debug, Clone, Default, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
	/// Page size, 1 to 500 (default 50).
	pub limit: Option<i64>,
	/// Rows to skip (default 0).
	pub offset: Option<i64>,
}

impl PaginationParams {
	pub fn limit_clamped(&self) -> i64 {
		self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
	}

	pub fn offset_or_default(&self) -> i64 {
		self.offset.unwrap_or(0).max(0)
	}

	/// `(limit, offset)` ready to hand to a repository.
	pub fn resolve(&self) -> (i64, i64) {
		(self.limit_clamped(), self.offset_or_default())
	}
}
