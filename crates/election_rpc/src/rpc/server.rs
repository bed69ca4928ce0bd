use std::{net::SocketAddr, time::Duration};

use jsonrpsee::server::{ServerBuilder, ServerHandle};
use primitives::{Address, DEFAULT_CONTRACT_ADDRESS, DEFAULT_DEVNET_ADDRESS};
use telemetry::info;

use crate::rpc::{api::ElectionApiServer, server_impl::DevnetContract};

#[derive(Debug, Clone)]
pub struct DevnetConfig {
    pub address: SocketAddr,
    pub contract_address: Address,
    /// How long a receipt stays hidden after inclusion.
    pub receipt_delay: Duration,
}

impl Default for DevnetConfig {
    fn default() -> Self {
        Self {
            address: DEFAULT_DEVNET_ADDRESS
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 9293))),
            contract_address: DEFAULT_CONTRACT_ADDRESS
                .parse()
                .unwrap_or(Address([0x12; 20])),
            receipt_delay: Duration::ZERO,
        }
    }
}

/// Development node emulating the election contract in memory.
#[derive(Debug)]
pub struct DevnetServer;

impl DevnetServer {
    /// Starts the server and returns a handle to it alongside the contract
    /// state, so callers can inspect what reached the chain.
    pub async fn run(
        config: &DevnetConfig,
    ) -> anyhow::Result<(ServerHandle, SocketAddr, DevnetContract)> {
        let server = ServerBuilder::default().build(config.address).await?;

        let contract = DevnetContract::new(config.contract_address, config.receipt_delay);

        let addr = server.local_addr()?;
        let handle = server.start(contract.clone().into_rpc())?;

        info!(%addr, contract = %config.contract_address, "devnet contract node listening");

        Ok((handle, addr, contract))
    }
}
