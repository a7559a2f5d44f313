// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Application state and router construction.

use std::sync::Arc;

use axum::{
	routing::{delete, get, post},
	Router,
};
use rampart_server_db::{
	ChangeLogRepository, DeviceRepository, GroupRepository, NotificationRepository, ObjectRepository,
	PolicyRepository,
};
use rampart_server_secrets::SecretCodec;
use sqlx::sqlite::SqlitePool;

use crate::routes;

/// Shared handler state. Cloned per request; everything inside is an `Arc` or
/// a pool handle.
#[derive(Clone)]
pub struct AppState {
	pub pool: SqlitePool,
	pub codec: Arc<SecretCodec>,
	pub devices: Arc<DeviceRepository>,
	pub objects: Arc<ObjectRepository>,
	pub groups: Arc<GroupRepository>,
	pub policies: Arc<PolicyRepository>,
	pub changes: Arc<ChangeLogRepository>,
	pub notifications: Arc<NotificationRepository>,
}

/// Build the state from a migrated pool and a codec that has already passed
/// its self-test.
pub fn create_app_state(pool: SqlitePool, codec: Arc<SecretCodec>) -> AppState {
	AppState {
		devices: Arc::new(DeviceRepository::new(pool.clone(), codec.clone())),
		objects: Arc::new(ObjectRepository::new(pool.clone())),
		groups: Arc::new(GroupRepository::new(pool.clone())),
		policies: Arc::new(PolicyRepository::new(pool.clone())),
		changes: Arc::new(ChangeLogRepository::new(pool.clone())),
		notifications: Arc::new(NotificationRepository::new(pool.clone())),
		codec,
		pool,
	}
}

pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/api/openapi.json", get(routes::docs::openapi_json))
		// Devices
		.route(
			"/api/devices",
			get(routes::devices::list_devices).post(routes::devices::create_device),
		)
		.route(
			"/api/devices/{id}",
			get(routes::devices::get_device)
				.patch(routes::devices::update_device)
				.delete(routes::devices::delete_device),
		)
		.route(
			"/api/devices/{id}/credentials",
			get(routes::devices::get_device_credentials),
		)
		.route(
			"/api/devices/{id}/unused-policies",
			get(routes::policies::list_unused_policies),
		)
		// Objects
		.route(
			"/api/network-objects",
			get(routes::objects::list_network_objects).post(routes::objects::create_network_object),
		)
		.route(
			"/api/network-objects/{id}",
			get(routes::objects::get_network_object)
				.patch(routes::objects::update_network_object)
				.delete(routes::objects::delete_network_object),
		)
		.route(
			"/api/service-objects",
			get(routes::objects::list_service_objects).post(routes::objects::create_service_object),
		)
		.route(
			"/api/service-objects/{id}",
			get(routes::objects::get_service_object)
				.patch(routes::objects::update_service_object)
				.delete(routes::objects::delete_service_object),
		)
		// Groups
		.route(
			"/api/network-groups",
			get(routes::groups::list_network_groups).post(routes::groups::create_network_group),
		)
		.route(
			"/api/network-groups/{id}",
			get(routes::groups::get_network_group)
				.patch(routes::groups::update_network_group)
				.delete(routes::groups::delete_network_group),
		)
		.route(
			"/api/network-groups/{id}/members",
			get(routes::groups::list_network_group_members)
				.post(routes::groups::add_network_group_member),
		)
		.route(
			"/api/network-groups/{id}/members/{member_id}",
			delete(routes::groups::remove_network_group_member),
		)
		.route(
			"/api/service-groups",
			get(routes::groups::list_service_groups).post(routes::groups::create_service_group),
		)
		.route(
			"/api/service-groups/{id}",
			get(routes::groups::get_service_group)
				.patch(routes::groups::update_service_group)
				.delete(routes::groups::delete_service_group),
		)
		.route(
			"/api/service-groups/{id}/members",
			get(routes::groups::list_service_group_members)
				.post(routes::groups::add_service_group_member),
		)
		.route(
			"/api/service-groups/{id}/members/{member_id}",
			delete(routes::groups::remove_service_group_member),
		)
		// Policies
		.route(
			"/api/policies",
			get(routes::policies::list_policies).post(routes::policies::create_policy),
		)
		.route(
			"/api/policies/{id}",
			get(routes::policies::get_policy)
				.patch(routes::policies::update_policy)
				.delete(routes::policies::delete_policy),
		)
		.route(
			"/api/policies/{id}/hit-counts",
			get(routes::policies::list_hit_counts).post(routes::policies::record_hit_count),
		)
		// Change log and notifications
		.route("/api/changes", get(routes::changes::list_changes))
		.route(
			"/api/notifications",
			get(routes::notifications::list_notifications)
				.post(routes::notifications::create_notification),
		)
		.route(
			"/api/notifications/{id}",
			delete(routes::notifications::delete_notification),
		)
		.route(
			"/api/notifications/{id}/acknowledge",
			post(routes::notifications::acknowledge_notification),
		)
		.with_state(state)
}
