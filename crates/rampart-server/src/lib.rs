// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP server for the Rampart firewall inventory.
//!
//! The binary in `main.rs` wires configuration, logging and the credential
//! codec together; everything reachable from a request lives here so the
//! integration tests can drive the router directly.

pub mod actor;
pub mod api;
pub mod api_docs;
pub mod db;
pub mod error;
pub mod pagination;
pub mod routes;
pub mod validation;
pub mod version;

pub use api::{create_app_state, create_router, AppState};
pub use error::ServerError;
