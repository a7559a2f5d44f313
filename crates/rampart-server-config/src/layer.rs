// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration layer for merging from multiple sources.

use serde::Deserialize;

use crate::sections::{DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, SecretsConfigLayer};

/// Server configuration layer - all fields are Option for merging.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfigLayer {
	#[serde(default)]
	pub http: Option<HttpConfigLayer>,
	#[serde(default)]
	pub database: Option<DatabaseConfigLayer>,
	#[serde(default)]
	pub logging: Option<LoggingConfigLayer>,
	#[serde(default)]
	pub secrets: Option<SecretsConfigLayer>,
}

impl ServerConfigLayer {
	/// Merge another layer into this one. Other layer takes precedence.
	pub fn merge(&mut self, other: ServerConfigLayer) {
		merge_option(&mut self.http, other.http, HttpConfigLayer::merge);
		merge_option(
			&mut self.database,
			other.database,
			DatabaseConfigLayer::merge,
		);
		merge_option(&mut self.logging, other.logging, LoggingConfigLayer::merge);
		merge_option(&mut self.secrets, other.secrets, SecretsConfigLayer::merge);
	}
}

fn merge_option<T, F>(target: &mut Option<T>, source: Option<T>, merge_fn: F)
where
	F: FnOnce(&mut T, T),
{
	match (target.as_mut(), source) {
		(Some(t), Some(s)) => merge_fn(t, s),
		(None, Some(s)) => *target = Some(s),
		_ => {}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_other_preserves_base() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				..Default::default()
			}),
			..Default::default()
		};
		base.merge(ServerConfigLayer::default());
		assert_eq!(base.http.as_ref().unwrap().port, Some(9000));
		assert!(base.database.is_none());
	}

	#[test]
	fn other_overwrites_and_adds_sections() {
		let mut base = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(9000),
				host: Some("10.0.0.5".to_string()),
				..Default::default()
			}),
			..Default::default()
		};
		let other = ServerConfigLayer {
			http: Some(HttpConfigLayer {
				port: Some(8443),
				..Default::default()
			}),
			database: Some(DatabaseConfigLayer {
				url: Some("sqlite::memory:".to_string()),
				max_connections: None,
			}),
			..Default::default()
		};
		base.merge(other);

		let http = base.http.unwrap();
		assert_eq!(http.port, Some(8443));
		assert_eq!(http.host.as_deref(), Some("10.0.0.5"));
		assert_eq!(
			base.database.unwrap().url.as_deref(),
			Some("sqlite::memory:")
		);
	}

	#[test]
	fn parses_full_toml_document() {
		let layer: ServerConfigLayer = toml::from_str(
			r#"
[http]
host = "0.0.0.0"
port = 8443
cors_origins = ["https://netops.example.com"]

[database]
url = "sqlite:/var/lib/rampart/inventory.db"

[logging]
level = "debug"
format = "json"

[secrets]
key_file = "/run/secrets/rampart.key"
"#,
		)
		.unwrap();

		assert_eq!(layer.http.unwrap().port, Some(8443));
		assert!(layer.database.unwrap().url.is_some());
		assert_eq!(layer.logging.unwrap().level.as_deref(), Some("debug"));
		assert!(layer.secrets.unwrap().key_file.is_some());
	}
}
