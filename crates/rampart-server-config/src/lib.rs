// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for the Rampart inventory server.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Consistent environment variable naming (`RAMPART_SERVER_*`)
//! - Startup validation of the credential key, so a missing or malformed key
//!   stops the process before it serves anything
//!
//! # Usage
//!
//! ```ignore
//! use rampart_server_config::load_config;
//!
//! let config = load_config()?;
//! println!("listening on {}", config.socket_addr());
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;

pub use error::ConfigError;
pub use layer::ServerConfigLayer;
pub use sections::*;
pub use sources::{
	ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, SYSTEM_CONFIG_PATH,
};

use tracing::{debug, info};

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
	pub http: HttpConfig,
	pub database: DatabaseConfig,
	pub logging: LoggingConfig,
	pub secrets: SecretsConfig,
}

impl ServerConfig {
	/// Get the socket address string for binding.
	pub fn socket_addr(&self) -> String {
		format!("{}:{}", self.http.host, self.http.port)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`RAMPART_SERVER_*`)
/// 2. Config file (`/etc/rampart/server.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<ServerConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<ServerConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = ServerConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
pub fn finalize(layer: ServerConfigLayer) -> Result<ServerConfig, ConfigError> {
	let http = layer.http.unwrap_or_default().finalize();
	let database = layer.database.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let secrets = layer.secrets.unwrap_or_default().finalize()?;

	info!(
		host = %http.host,
		port = http.port,
		database = %database.url,
		log_format = ?logging.format,
		"Server configuration loaded"
	);

	Ok(ServerConfig {
		http,
		database,
		logging,
		secrets,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use rampart_common_secret::SecretString;
	use rampart_server_secrets::{encode_key, generate_key};

	fn layer_with_key(key: SecretString) -> ServerConfigLayer {
		ServerConfigLayer {
			secrets: Some(SecretsConfigLayer {
				key: Some(key),
				key_file: None,
			}),
			..Default::default()
		}
	}

	#[test]
	fn finalize_applies_defaults() {
		let config = finalize(layer_with_key(encode_key(&generate_key()))).unwrap();
		assert_eq!(config.socket_addr(), "127.0.0.1:8640");
		assert_eq!(config.database.url, "sqlite:./rampart.db");
	}

	#[test]
	fn finalize_without_key_fails() {
		let err = finalize(ServerConfigLayer::default()).unwrap_err();
		assert!(err.to_string().contains(SECRET_KEY_ENV));
	}

	#[test]
	fn finalize_with_malformed_key_fails() {
		let err = finalize(layer_with_key(SecretString::from("c2hvcnQ="))).unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { .. }));
	}

	#[test]
	fn debug_output_never_shows_key() {
		let key = encode_key(&generate_key());
		let config = finalize(layer_with_key(key.clone())).unwrap();
		let debug = format!("{config:?}");
		assert!(!debug.contains(key.expose().as_str()));
	}
}
