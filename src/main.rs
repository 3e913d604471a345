// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! flightmap: live aircraft positions for a map viewport.
//!
//! `serve` runs the key-hiding Aviation Edge proxy. `watch` polls the
//! selected flight provider for a fixed viewport and logs what it sees.

mod config;
mod proxy;
mod watch;

#[cfg(test)]
mod testing;

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use flight_client::{load_runtime_provider, BoundingBox, FlightProvider, RawBounds, ReqwestClient};
use log::{error, info, warn};
use tokio_util::sync::CancellationToken;

use config::AppConfig;
use proxy::ProxyState;

#[derive(Debug, Parser)]
#[command(name = "flightmap")]
#[command(about = "Live aircraft positions for a map viewport", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the Aviation Edge proxy server
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Poll the selected provider for a viewport and log visible flights
    Watch {
        /// Southern edge in degrees
        #[arg(long, allow_negative_numbers = true)]
        south: f64,

        /// Western edge in degrees
        #[arg(long, allow_negative_numbers = true)]
        west: f64,

        /// Northern edge in degrees
        #[arg(long, allow_negative_numbers = true)]
        north: f64,

        /// Eastern edge in degrees (may be less than west to cross the dateline)
        #[arg(long, allow_negative_numbers = true)]
        east: f64,

        /// Seconds between polls
        #[arg(long, default_value = "15")]
        interval: u64,

        /// Runtime provider selection file (overrides the config file)
        #[arg(long)]
        selection: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = AppConfig::load()?;
    if let Ok(path) = AppConfig::get_config_path() {
        info!("Using configuration from {}", path.display());
    }

    match args.command {
        Command::Serve { listen } => {
            if let Some(listen) = listen {
                config.listen_address = listen;
            }
            serve(&config).await
        }
        Command::Watch {
            south,
            west,
            north,
            east,
            interval,
            selection,
        } => {
            if let Some(selection) = selection {
                config.runtime_provider_path = selection;
            }
            let bbox = BoundingBox::from_raw_bounds(RawBounds {
                south,
                west,
                north,
                east,
            })?;
            watch_flights(&config, bbox, Duration::from_secs(interval.max(1))).await
        }
    }
}

async fn serve(config: &AppConfig) -> Result<(), Box<dyn Error>> {
    let api_key = config.resolve_api_key();
    if api_key.is_none() {
        warn!(
            "No Aviation Edge credential configured (set {}); flight requests will fail",
            config::API_KEY_ENV
        );
    }

    let http = ReqwestClient::new(config.request_timeout())?;
    let state = ProxyState::new(http, &config.aviation_edge_base_url, api_key)?;
    let app = proxy::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_address).await?;
    info!("Proxy listening on {}", listener.local_addr()?);
    info!("Radius-search providers should use {}", config.proxy_flights_url());

    let cancel = shutdown_token();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    info!("Proxy stopped");
    Ok(())
}

async fn watch_flights(config: &AppConfig, bbox: BoundingBox, interval: Duration) -> Result<(), Box<dyn Error>> {
    let provider_config = load_runtime_provider(&config.runtime_provider_path);
    let http = ReqwestClient::new(config.request_timeout())?;
    let provider = FlightProvider::from_config(&provider_config, http, config.cache_policy())?;

    let session = watch::run(&provider, bbox, interval, shutdown_token()).await;
    if let Some(message) = session.last_error() {
        warn!("Last update failed: {message}");
    }
    Ok(())
}

/// Token cancelled on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown requested");
                trigger.cancel();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
        }
    });
    cancel
}
