// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Encrypt-before-write / decrypt-after-read codec for credential columns.
//!
//! Stored form is URL-safe unpadded base64 of
//!
//! ```text
//! version (1 byte, 0x01) || nonce (12 bytes) || AES-256-GCM ciphertext || tag (16 bytes)
//! ```
//!
//! The version byte is also bound as associated data. Empty input is never
//! handed to the cipher; it passes through unchanged in both directions.

use std::fmt;

use aes_gcm::{
	aead::{Aead, KeyInit, OsRng, Payload},
	Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rampart_common_secret::SecretString;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{SecretsError, SecretsResult};
use crate::key::{parse_key, KEY_SIZE};

/// Size of AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// Leading byte of every stored ciphertext.
pub const FORMAT_VERSION: u8 = 0x01;

const HEADER_SIZE: usize = 1 + NONCE_SIZE;

const SELF_TEST_SAMPLE: &str = "rampart-codec-self-test";

/// Process-wide credential codec.
///
/// Built once at startup from the configured key and shared behind an `Arc`.
/// Holds no mutable state, so concurrent `encrypt`/`decrypt` calls need no
/// locking.
#[derive(Clone)]
pub struct SecretCodec {
	cipher: Aes256Gcm,
}

impl SecretCodec {
	pub fn new(key: Zeroizing<[u8; KEY_SIZE]>) -> Self {
		let key = Key::<Aes256Gcm>::from_slice(key.as_slice());
		Self {
			cipher: Aes256Gcm::new(key),
		}
	}

	/// Build a codec from encoded key material (base64 or hex).
	pub fn from_encoded(encoded: &SecretString) -> SecretsResult<Self> {
		parse_key(encoded).map(Self::new)
	}

	/// Encrypt a credential for storage. `""` is returned as `""`.
	pub fn encrypt(&self, plaintext: &str) -> SecretsResult<String> {
		if plaintext.is_empty() {
			return Ok(String::new());
		}

		let mut nonce_bytes = [0u8; NONCE_SIZE];
		OsRng.fill_bytes(&mut nonce_bytes);
		let nonce = Nonce::from_slice(&nonce_bytes);

		let sealed = self
			.cipher
			.encrypt(
				nonce,
				Payload {
					msg: plaintext.as_bytes(),
					aad: &[FORMAT_VERSION],
				},
			)
			.map_err(|e| SecretsError::Encryption(format!("credential encryption failed: {e}")))?;

		let mut out = Vec::with_capacity(HEADER_SIZE + sealed.len());
		out.push(FORMAT_VERSION);
		out.extend_from_slice(&nonce_bytes);
		out.extend_from_slice(&sealed);

		Ok(URL_SAFE_NO_PAD.encode(out))
	}

	/// Decrypt a stored credential. `""` is returned as `""`.
	///
	/// Anything not produced by [`SecretCodec::encrypt`] under this key fails
	/// with [`SecretsError::Decryption`].
	pub fn decrypt(&self, stored: &str) -> SecretsResult<String> {
		if stored.is_empty() {
			return Ok(String::new());
		}

		let raw = URL_SAFE_NO_PAD
			.decode(stored)
			.map_err(|_| SecretsError::Decryption("stored credential is not valid base64".to_string()))?;

		if raw.len() < HEADER_SIZE + TAG_SIZE {
			return Err(SecretsError::Decryption(
				"stored credential is truncated".to_string(),
			));
		}

		let (version, rest) = raw.split_at(1);
		if version[0] != FORMAT_VERSION {
			return Err(SecretsError::Decryption(format!(
				"unknown credential format version {}",
				version[0]
			)));
		}

		let (nonce_bytes, sealed) = rest.split_at(NONCE_SIZE);
		let plaintext = Zeroizing::new(
			self.cipher
				.decrypt(
					Nonce::from_slice(nonce_bytes),
					Payload {
						msg: sealed,
						aad: &[FORMAT_VERSION],
					},
				)
				.map_err(|_| {
					SecretsError::Decryption("credential failed authentication".to_string())
				})?,
		);

		String::from_utf8(plaintext.to_vec())
			.map_err(|_| SecretsError::Decryption("credential is not valid UTF-8".to_string()))
	}

	/// [`encrypt`](Self::encrypt) for optional columns; `None` stays `None`.
	pub fn encrypt_opt(&self, plaintext: Option<&str>) -> SecretsResult<Option<String>> {
		plaintext.map(|p| self.encrypt(p)).transpose()
	}

	/// [`decrypt`](Self::decrypt) for optional columns; `None` stays `None`.
	pub fn decrypt_opt(&self, stored: Option<&str>) -> SecretsResult<Option<String>> {
		stored.map(|s| self.decrypt(s)).transpose()
	}

	/// Round-trip a fixed sample string. Used by the health endpoint.
	pub fn self_test(&self) -> SecretsResult<()> {
		let sealed = self.encrypt(SELF_TEST_SAMPLE)?;
		if self.decrypt(&sealed)? == SELF_TEST_SAMPLE {
			Ok(())
		} else {
			Err(SecretsError::Decryption(
				"self-test round trip mismatch".to_string(),
			))
		}
	}
}

impl fmt::Debug for SecretCodec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SecretCodec")
			.field("cipher", &"AES-256-GCM")
			.field("key", &rampart_common_secret::REDACTED)
			.finish()
	}
}
