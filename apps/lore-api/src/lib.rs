pub mod routes;
pub mod state;

use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use lore_config::Service;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = lore_cli::VERSION,
	rename_all = "kebab",
	styles = lore_cli::styles(),
)]
pub struct Args {
	/// Path to the TOML config file.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = lore_config::load(&args.config)?;

	init_tracing(&config.service.log_level);

	let (public_addr, admin_addr) = resolve_binds(&config.service)?;
	let state = AppState::new(config).await?;
	let public = listen(public_addr, "public").await?;
	let admin = listen(admin_addr, "admin").await?;

	tokio::try_join!(
		axum::serve(public, routes::router(state.clone())),
		axum::serve(admin, routes::admin_router(state)),
	)?;

	Ok(())
}

/// The admin surface carries the rebuild endpoint and must never leave the
/// host.
fn resolve_binds(service: &Service) -> color_eyre::Result<(SocketAddr, SocketAddr)> {
	let public = service.http_bind.parse()?;
	let admin: SocketAddr = service.admin_bind.parse()?;

	if !admin.ip().is_loopback() {
		return Err(eyre::eyre!("service.admin_bind must be a loopback address."));
	}

	Ok((public, admin))
}

async fn listen(addr: SocketAddr, surface: &'static str) -> color_eyre::Result<TcpListener> {
	let listener = TcpListener::bind(addr).await?;

	tracing::info!(%addr, surface, "Listening.");

	Ok(listener)
}

fn init_tracing(log_level: &str) {
	let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}
