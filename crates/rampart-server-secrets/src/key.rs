// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential key generation and parsing.
//!
//! A key is 32 random bytes. On the wire (environment variable, secret file,
//! `generate-key` output) it is written as base64; parsing also accepts the
//! URL-safe and unpadded base64 alphabets and 64 hex digits.

use aes_gcm::aead::OsRng;
use base64::{
	engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
	Engine,
};
use rampart_common_secret::SecretString;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{SecretsError, SecretsResult};

/// Size of the credential key in bytes (256 bits for AES-256).
pub const KEY_SIZE: usize = 32;

/// Generate a random credential key.
pub fn generate_key() -> Zeroizing<[u8; KEY_SIZE]> {
	let mut key = Zeroizing::new([0u8; KEY_SIZE]);
	OsRng.fill_bytes(key.as_mut());
	key
}

/// Render a key as standard padded base64.
pub fn encode_key(key: &[u8; KEY_SIZE]) -> SecretString {
	SecretString::new(STANDARD.encode(key))
}

/// Parse key material from configuration.
///
/// Surrounding whitespace is ignored. Input that does not decode is a
/// [`SecretsError::Configuration`] error; a decoded key that is not exactly
/// 32 bytes is [`SecretsError::InvalidKeySize`].
pub fn parse_key(encoded: &SecretString) -> SecretsResult<Zeroizing<[u8; KEY_SIZE]>> {
	let trimmed = encoded.expose().trim();
	if trimmed.is_empty() {
		return Err(SecretsError::Configuration(
			"credential key is empty".to_string(),
		));
	}

	let bytes = decode_key_bytes(trimmed)?;
	if bytes.len() != KEY_SIZE {
		return Err(SecretsError::InvalidKeySize {
			expected: KEY_SIZE,
			actual: bytes.len(),
		});
	}

	let mut key = Zeroizing::new([0u8; KEY_SIZE]);
	key.copy_from_slice(&bytes);
	Ok(key)
}

fn decode_key_bytes(encoded: &str) -> SecretsResult<Zeroizing<Vec<u8>>> {
	// 64 hex digits would also decode as (48 bytes of) base64, so hex goes first.
	if encoded.len() == KEY_SIZE * 2 && encoded.bytes().all(|b| b.is_ascii_hexdigit()) {
		return hex::decode(encoded)
			.map(Zeroizing::new)
			.map_err(|e| SecretsError::Configuration(format!("invalid credential key hex: {e}")));
	}

	for engine in [&STANDARD, &URL_SAFE, &STANDARD_NO_PAD, &URL_SAFE_NO_PAD] {
		if let Ok(bytes) = engine.decode(encoded) {
			return Ok(Zeroizing::new(bytes));
		}
	}

	Err(SecretsError::Configuration(
		"credential key is neither base64 nor hex".to_string(),
	))
}
