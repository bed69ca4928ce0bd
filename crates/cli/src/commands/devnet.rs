use std::{net::SocketAddr, time::Duration};

use clap::Parser;
use coordinator::CoordinatorConfig;
use election_rpc::rpc::{DevnetConfig, DevnetServer};
use primitives::DEFAULT_DEVNET_ADDRESS;
use telemetry::info;

use crate::result::{CliError, Result};

#[derive(Parser, Debug)]
pub struct DevnetOpts {
    /// Address the JSON-RPC server listens on
    #[clap(long, value_parser, default_value = DEFAULT_DEVNET_ADDRESS)]
    pub address: SocketAddr,

    /// Delay before an included transaction's receipt becomes visible
    #[clap(long, value_parser, default_value = "0")]
    pub receipt_delay_ms: u64,
}

/// Serves the development contract at the configured contract address until
/// interrupted.
pub async fn exec(config: CoordinatorConfig, opts: DevnetOpts) -> Result<()> {
    let devnet = DevnetConfig {
        address: opts.address,
        contract_address: config.contract_address,
        receipt_delay: Duration::from_millis(opts.receipt_delay_ms),
    };

    let (handle, addr, _contract) = DevnetServer::run(&devnet)
        .await
        .map_err(|err| CliError::Devnet(err.to_string()))?;

    println!("devnet listening on ws://{addr}");

    tokio::signal::ctrl_c().await?;

    info!("shutting down devnet");
    handle
        .stop()
        .map_err(|err| CliError::Devnet(err.to_string()))?;
    handle.stopped().await;

    Ok(())
}
