// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Attribution for change-log entries.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

/// Header carrying the operator name recorded on change entries.
pub const ACTOR_HEADER: &str = "x-rampart-actor";

const MAX_ACTOR_LEN: usize = 128;

/// Who made a change, taken from the [`ACTOR_HEADER`] header. Absent, blank
/// or non-UTF-8 values yield `Actor(None)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor(pub Option<String>);

impl Actor {
	pub fn into_inner(self) -> Option<String> {
		self.0
	}
}

impl<S> FromRequestParts<S> for Actor
where
	S: Send + Sync,
{
	type Rejection = Infallible;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let actor = parts
			.headers
			.get(ACTOR_HEADER)
			.and_then(|v| v.to_str().ok())
			.map(str::trim)
			.filter(|v| !v.is_empty())
			.map(|v| v.chars().take(MAX_ACTOR_LEN).collect());
		Ok(Actor(actor))
	}
}
