// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Rampart firewall inventory server binary.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use clap::{Parser, Subcommand};
use rampart_server::{create_app_state, create_router, db, version};
use rampart_server_config::{LogFormat, ServerConfig};
use rampart_server_secrets::{encode_key, generate_key, SecretCodec};
use tower_http::{
	cors::{Any, CorsLayer},
	trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rampart server - firewall inventory and change tracking over HTTP.
#[derive(Parser, Debug)]
#[command(
	name = "rampart-server",
	about = "Firewall inventory and change-tracking server",
	version
)]
struct Args {
	/// TOML configuration file (default: /etc/rampart/server.toml)
	#[arg(long, short = 'c', env = "RAMPART_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server (default)
	Serve,
	/// Show version and build information
	Version,
	/// Print a fresh base64 credential key for RAMPART_SERVER_SECRET_KEY
	GenerateKey,
}

fn init_tracing(config: &ServerConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());

	match config.logging.format {
		LogFormat::Json => tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
		LogFormat::Pretty => tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer())
			.init(),
	}
}

fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
	if origins.is_empty() {
		return None;
	}

	let layer = CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
		.allow_headers(Any);

	if origins.iter().any(|o| o == "*") {
		return Some(layer.allow_origin(Any));
	}

	let allowed: Vec<HeaderValue> = origins
		.iter()
		.filter_map(|o| match HeaderValue::from_str(o) {
			Ok(v) => Some(v),
			Err(_) => {
				tracing::warn!(origin = %o, "ignoring invalid CORS origin");
				None
			}
		})
		.collect();
	Some(layer.allow_origin(allowed))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	match args.command {
		Some(Command::Version) => {
			println!("{}", version::format_version_info());
			return Ok(());
		}
		Some(Command::GenerateKey) => {
			let key = generate_key();
			println!("{}", encode_key(&key).expose());
			return Ok(());
		}
		Some(Command::Serve) | None => {}
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => rampart_server_config::load_config_with_file(path)?,
		None => rampart_server_config::load_config()?,
	};

	init_tracing(&config);

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		"starting rampart-server"
	);

	// A malformed key or a codec that cannot round-trip stops startup here.
	let codec = SecretCodec::from_encoded(&config.secrets.key)?;
	codec.self_test()?;
	let codec = Arc::new(codec);

	let pool = db::create_pool(&config.database.url, config.database.max_connections).await?;
	db::run_migrations(&pool).await?;

	let state = create_app_state(pool, codec);
	let mut app = create_router(state).layer(TraceLayer::new_for_http());
	if let Some(cors) = cors_layer(&config.http.cors_origins) {
		app = app.layer(cors);
	}

	let addr = config.socket_addr();
	tracing::info!(base_url = %config.http.base_url, "listening on {}", addr);

	let listener = tokio::net::TcpListener::bind(&addr).await?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
