// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential encryption for the Rampart inventory server.
//!
//! Device passwords, API keys and enable secrets are never written to the
//! database in plaintext. The persistence layer calls
//! [`SecretCodec::encrypt`] immediately before a write and
//! [`SecretCodec::decrypt`] immediately after a read.
//!
//! # Key handling
//!
//! One 256-bit key is loaded at startup (see `rampart-server-config`) and
//! handed to [`SecretCodec::from_encoded`]. A missing or malformed key fails
//! initialisation with [`SecretsError::Configuration`]; nothing is deferred to
//! first use. Key rotation is not supported.
//!
//! ```
//! use rampart_server_secrets::{generate_key, SecretCodec};
//!
//! let codec = SecretCodec::new(generate_key());
//! let stored = codec.encrypt("Sup3rSecret!").unwrap();
//! assert_eq!(codec.decrypt(&stored).unwrap(), "Sup3rSecret!");
//! assert_eq!(codec.encrypt("").unwrap(), "");
//! ```

pub mod codec;
pub mod error;
pub mod key;

pub use codec::{SecretCodec, FORMAT_VERSION, NONCE_SIZE, TAG_SIZE};
pub use error::{SecretsError, SecretsResult};
pub use key::{encode_key, generate_key, parse_key, KEY_SIZE};
