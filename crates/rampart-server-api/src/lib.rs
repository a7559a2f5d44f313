// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod changes;
pub mod common;
pub mod devices;
pub mod groups;
pub mod notifications;
pub mod objects;
pub mod policies;

pub use changes::{ChangeResponse, ListChangesQuery, ListChangesResponse};
pub use common::{ComponentHealth, ErrorResponse, HealthResponse, HealthStatus, SuccessResponse};
pub use devices::{
	CreateDeviceRequest, DeviceCredentialsResponse, DeviceResponse, ListDevicesQuery,
	ListDevicesResponse, UpdateDeviceRequest,
};
pub use groups::{
	AddGroupMemberRequest, CreateGroupRequest, GroupMembersResponse, GroupResponse, ListGroupsQuery,
	ListGroupsResponse, UpdateGroupRequest,
};
pub use notifications::{
	CreateNotificationRequest, ListNotificationsQuery, ListNotificationsResponse,
	NotificationResponse,
};
pub use objects::{
	CreateNetworkObjectRequest, CreateServiceObjectRequest, ListNetworkObjectsQuery,
	ListNetworkObjectsResponse, ListServiceObjectsQuery, ListServiceObjectsResponse,
	NetworkObjectResponse, ServiceObjectResponse, UpdateNetworkObjectRequest,
	UpdateServiceObjectRequest,
};
pub use policies::{
	CreatePolicyRequest, HitCountResponse, ListHitCountsResponse, ListPoliciesQuery,
	ListPoliciesResponse, PolicyResponse, RecordHitCountRequest, UnusedPoliciesResponse,
	UpdatePolicyRequest,
};
