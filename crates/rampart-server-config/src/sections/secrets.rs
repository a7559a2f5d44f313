// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Credential key configuration.
//!
//! The key itself only comes from `RAMPART_SERVER_SECRET_KEY` or
//! `RAMPART_SERVER_SECRET_KEY_FILE`; a TOML file may point at a key file but
//! never carries key material inline.

use std::path::{Path, PathBuf};

use rampart_common_secret::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable holding the credential key.
pub const SECRET_KEY_ENV: &str = "RAMPART_SERVER_SECRET_KEY";

/// Resolved credential key configuration.
#[derive(Debug, Clone)]
pub struct SecretsConfig {
	/// Encoded 256-bit key, already validated.
	pub key: SecretString,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretsConfigLayer {
	#[serde(skip)]
	pub key: Option<SecretString>,
	#[serde(default)]
	pub key_file: Option<PathBuf>,
}

impl SecretsConfigLayer {
	pub fn merge(&mut self, other: SecretsConfigLayer) {
		if other.key.is_some() {
			self.key = other.key;
		}
		if other.key_file.is_some() {
			self.key_file = other.key_file;
		}
	}

	/// Resolve and validate the key. A missing or malformed key is fatal.
	pub fn finalize(self) -> Result<SecretsConfig, ConfigError> {
		let key = match (self.key, self.key_file) {
			(Some(key), _) => key,
			(None, Some(path)) => read_key_file(&path)?,
			(None, None) => return Err(ConfigError::MissingEnvVar(SECRET_KEY_ENV.to_string())),
		};

		rampart_server_secrets::parse_key(&key).map_err(|e| ConfigError::InvalidValue {
			key: SECRET_KEY_ENV.to_string(),
			message: e.to_string(),
		})?;

		Ok(SecretsConfig { key })
	}
}

fn read_key_file(path: &Path) -> Result<SecretString, ConfigError> {
	let content = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
		path: path.to_path_buf(),
		source,
	})?;
	Ok(SecretString::new(content.trim().to_string()))
}

#[cfg(test)]
mod tests {
	use super::*;
	use rampart_server_secrets::{encode_key, generate_key};
	use std::io::Write;
	use tempfile::NamedTempFile;

	#[test]
	fn missing_key_is_fatal() {
		let err = SecretsConfigLayer::default().finalize().unwrap_err();
		assert!(matches!(err, ConfigError::MissingEnvVar(ref v) if v == SECRET_KEY_ENV));
	}

	#[test]
	fn malformed_key_is_fatal_and_not_echoed() {
		let layer = SecretsConfigLayer {
			key: Some(SecretString::from("definitely-not-a-key")),
			key_file: None,
		};
		let err = layer.finalize().unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
		assert!(!err.to_string().contains("definitely-not-a-key"));
	}

	#[test]
	fn valid_key_is_accepted() {
		let encoded = encode_key(&generate_key());
		let config = SecretsConfigLayer {
			key: Some(encoded.clone()),
			key_file: None,
		}
		.finalize()
		.unwrap();
		assert_eq!(config.key, encoded);
		assert!(format!("{config:?}").contains("[REDACTED]"));
	}

	#[test]
	fn key_file_is_read_when_no_direct_key() {
		let encoded = encode_key(&generate_key());
		let mut file = NamedTempFile::new().unwrap();
		writeln!(file, "{}", encoded.expose()).unwrap();

		let config = SecretsConfigLayer {
			key: None,
			key_file: Some(file.path().to_path_buf()),
		}
		.finalize()
		.unwrap();
		assert_eq!(config.key, encoded);
	}

	#[test]
	fn direct_key_wins_over_key_file() {
		let direct = encode_key(&generate_key());
		let mut base = SecretsConfigLayer {
			key: None,
			key_file: Some(PathBuf::from("/nonexistent/rampart.key")),
		};
		base.merge(SecretsConfigLayer {
			key: Some(direct.clone()),
			key_file: None,
		});

		let config = base.finalize().unwrap();
		assert_eq!(config.key, direct);
	}

	#[test]
	fn toml_cannot_carry_inline_key() {
		let layer: SecretsConfigLayer =
			toml::from_str("key_file = \"/run/secrets/rampart.key\"").unwrap();
		assert!(layer.key.is_none());
		assert_eq!(
			layer.key_file,
			Some(PathBuf::from("/run/secrets/rampart.key"))
		);
	}
}
