pub mod routes;
pub mod state;

use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use tokio::net::TcpListener;

use ccdr_cli::ConfigArgs;
use ccdr_service::spawn_retrain_loop;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = ccdr_cli::VERSION,
	rename_all = "kebab",
	styles = ccdr_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = ccdr_config::load(&args.config.config)?;

	ccdr_cli::init_tracing(&config.service.log_level);

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let state = AppState::new(&config).await?;
	let retrain = spawn_retrain_loop(
		state.index.ranking().clone(),
		Duration::from_secs(config.ranking.retrain_interval_seconds),
	);
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	axum::serve(listener, routes::router(state)).with_graceful_shutdown(shutdown_signal()).await?;
	retrain.shutdown().await;

	Ok(())
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "Failed to listen for the shutdown signal.");
	}

	tracing::info!("Shutting down.");
}
