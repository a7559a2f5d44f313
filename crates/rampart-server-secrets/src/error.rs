// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for credential encryption.

use thiserror::Error;

/// Result type alias for codec operations.
pub type SecretsResult<T> = Result<T, SecretsError>;

/// Errors raised while building the codec or transforming a credential.
///
/// Messages never include plaintext, ciphertext or key bytes.
#[derive(Debug, Error)]
pub enum SecretsError {
	/// The credential key is missing or malformed. Fatal at startup.
	#[error("configuration error: {0}")]
	Configuration(String),

	#[error("encryption failed: {0}")]
	Encryption(String),

	/// The stored value was not produced by this codec under this key.
	#[error("decryption failed: {0}")]
	Decryption(String),

	#[error("invalid key size: expected {expected}, got {actual}")]
	InvalidKeySize { expected: usize, actual: usize },
}

impl SecretsError {
	pub fn is_decryption(&self) -> bool {
		matches!(self, SecretsError::Decryption(_))
	}

	pub fn is_configuration(&self) -> bool {
		matches!(
			self,
			SecretsError::Configuration(_) | SecretsError::InvalidKeySize { .. }
		)
	}
}
