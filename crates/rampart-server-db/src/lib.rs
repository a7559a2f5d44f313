// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! # rampart-server-db
//!
//! Persistence for the Rampart firewall inventory, SQLite via sqlx.
//!
//! ## Repository Pattern
//!
//! Each domain has a `*Store` trait describing the interface and a
//! `*Repository` struct holding a `SqlitePool` that implements it by
//! delegating to inherent methods:
//!
//! ```rust,ignore
//! #[async_trait]
//! pub trait PolicyStore: Send + Sync {
//!     async fn get_policy(&self, id: &PolicyId) -> Result<Option<Policy>, DbError>;
//! }
//!
//! #[async_trait]
//! impl PolicyStore for PolicyRepository { /* delegate to inherent methods */ }
//! ```
//!
//! [`DeviceRepository`] additionally holds the shared
//! [`rampart_server_secrets::SecretCodec`]: credentials are sealed before every
//! write and only opened by [`DeviceRepository::get_credentials`].
//!
//! ## Error Handling
//!
//! | Variant | When |
//! |---------|------|
//! | `NotFound` | An id the caller supplied does not exist, including foreign keys |
//! | `Conflict` | Unique constraint violation |
//! | `Invalid` | Input rejected before the write (bad address, inverted port range) |
//! | `Secrets` | A credential failed to encrypt or authenticate |
//! | `Internal` | Stored data could not be parsed |
//!
//! Lookups where absence is normal return `Result<Option<T>>`; paginated
//! listings return `(Vec<T>, total)`; deletes return `bool`.
//!
//! ## Testing
//!
//! Tests run against in-memory SQLite with the server's migrations applied,
//! see `testing::create_inventory_pool`.

pub mod change_log;
pub mod device;
mod error;
pub mod group;
pub mod notification;
pub mod object;
pub mod policy;
pub mod pool;
pub mod types;
pub mod validate;

#[cfg(test)]
pub mod testing;

pub use change_log::{ChangeLogRepository, ChangeLogStore};
pub use device::{DeviceRepository, DeviceStore};
pub use error::{DbError, Result};
pub use group::{GroupRepository, GroupStore};
pub use notification::{NotificationRepository, NotificationStore};
pub use object::{ObjectRepository, ObjectStore};
pub use policy::{PolicyRepository, PolicyStore};
pub use pool::create_pool;
pub use types::*;
pub use validate::{validate_network_value, validate_service_ports};
