use std::net::{Ipv4Addr, SocketAddr};

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

mod config;
mod latency;
mod logging;
mod routes;
mod simulate;
mod sink;

use crate::{config::Cli, routes::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let port = cli.port();

    let app = routes::router(AppState::process());

    info!(port, "starting server");

    let listener = tokio::net::TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
        .await
        .inspect_err(|err| error!(%err, port, "failed to start server"))
        .with_context(|| format!("failed to bind port {port}"))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server stopped unexpectedly")?;

    Ok(())
}
