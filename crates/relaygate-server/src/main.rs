//! Relaygate relay server
//!
//! Wires the control plane together: session intake, registration
//! coordinator, in-memory stats and the administrative API, running until
//! interrupted.

mod intake;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::ops::RangeInclusive;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relaygate_api::{ApiServer, ApiServerConfig};
use relaygate_control::{
    HookPipeline, PortRangeAuthority, ProxyCoordinator, ProxyNamePolicy, ProxyRegistry,
    SessionRegistry, UserScopedNames,
};
use relaygate_stats::MemoryStatsStore;

use crate::intake::IntakeListener;

/// Relaygate relay - binds proxy registrations to live client sessions
#[derive(Parser, Debug)]
#[command(name = "relaygate")]
#[command(about = "Run a relaygate relay server", long_about = None)]
#[command(version)]
struct Cli {
    /// Session intake bind address (clients connect here)
    #[arg(long, default_value = "127.0.0.1:7000")]
    intake_addr: String,

    /// Administrative API bind address
    #[arg(long, default_value = "127.0.0.1:7400")]
    api_addr: String,

    /// Public host name proxies are exposed under
    #[arg(long, env = "RELAYGATE_PUBLIC_HOST", default_value = "localhost")]
    public_host: String,

    /// TCP/UDP port range for allocated proxy endpoints (format: "lo-hi")
    #[arg(long, default_value = "20000-21000")]
    port_range: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Disable CORS on the administrative API
    #[arg(long)]
    no_cors: bool,
}

fn parse_port_range(spec: &str) -> Result<RangeInclusive<u16>> {
    let (lo, hi) = spec
        .split_once('-')
        .ok_or_else(|| anyhow!("port range must look like \"20000-21000\", got {:?}", spec))?;
    let lo: u16 = lo.trim().parse().context("invalid low end of port range")?;
    let hi: u16 = hi.trim().parse().context("invalid high end of port range")?;
    if lo > hi {
        return Err(anyhow!("port range is empty: {}-{}", lo, hi));
    }
    Ok(lo..=hi)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {}", e))?;

    let intake_addr: SocketAddr = cli.intake_addr.parse().context("invalid intake address")?;
    let api_addr: SocketAddr = cli.api_addr.parse().context("invalid API address")?;
    let port_range = parse_port_range(&cli.port_range)?;

    let sessions = Arc::new(SessionRegistry::new());
    let proxies = Arc::new(ProxyRegistry::new());
    let stats = Arc::new(MemoryStatsStore::new());
    let authority = Arc::new(PortRangeAuthority::new(cli.public_host.clone(), port_range));

    let hooks = Arc::new(
        HookPipeline::new()
            .with_hook(Arc::new(UserScopedNames))
            .with_hook(Arc::new(ProxyNamePolicy)),
    );

    let coordinator = Arc::new(ProxyCoordinator::new(
        sessions.clone(),
        proxies,
        authority,
        stats,
    ));

    info!(
        public_host = %cli.public_host,
        %intake_addr,
        %api_addr,
        "starting relaygate"
    );

    let intake = Arc::new(IntakeListener::new(sessions.clone(), hooks));
    let intake_task = tokio::spawn(intake.run(intake_addr));

    let api_server = ApiServer::new(
        ApiServerConfig {
            bind_addr: api_addr,
            enable_cors: !cli.no_cors,
        },
        coordinator,
        sessions,
    );
    let api_task = tokio::spawn(api_server.start());

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("shutdown requested");
        }
        result = intake_task => {
            error!("session intake exited: {:?}", result);
        }
        result = api_task => {
            error!("API server exited: {:?}", result);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port_range() {
        assert_eq!(parse_port_range("20000-21000").unwrap(), 20000..=21000);
        assert_eq!(parse_port_range("8000-8000").unwrap(), 8000..=8000);
        assert!(parse_port_range("21000-20000").is_err());
        assert!(parse_port_range("20000").is_err());
        assert!(parse_port_range("a-b").is_err());
    }
}
