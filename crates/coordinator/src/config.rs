use std::time::Duration;

use derive_builder::Builder;
use primitives::{
    Address, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_CONTRACT_ADDRESS, DEFAULT_INITIAL_BACKOFF,
    DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_BACKOFF, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_RPC_URL,
};
use serde::{Deserialize, Serialize};

fn default_contract_address() -> Address {
    DEFAULT_CONTRACT_ADDRESS
        .parse()
        .unwrap_or(Address([0x12; 20]))
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

#[derive(Builder, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[builder(setter(into))]
#[serde(default)]
pub struct CoordinatorConfig {
    /// JSON-RPC websocket endpoint of the network provider
    #[builder(default = "DEFAULT_RPC_URL.to_string()")]
    pub rpc_url: String,

    /// Address of the deployed election contract
    #[builder(default = "default_contract_address()")]
    pub contract_address: Address,

    /// Total submission attempts per operation, the first one included
    #[builder(default = "DEFAULT_MAX_ATTEMPTS")]
    pub max_attempts: u32,

    #[builder(default = "millis(DEFAULT_INITIAL_BACKOFF)")]
    pub initial_backoff_ms: u64,

    #[builder(default = "millis(DEFAULT_MAX_BACKOFF)")]
    pub max_backoff_ms: u64,

    /// Interval between receipt polls
    #[builder(default = "millis(DEFAULT_POLL_INTERVAL)")]
    pub poll_interval_ms: u64,

    /// How long an operation waits for its receipt before reporting a timeout
    #[builder(default = "millis(DEFAULT_CONFIRMATION_TIMEOUT)")]
    pub confirmation_timeout_ms: u64,

    /// Per-request timeout of the JSON-RPC client
    #[builder(default = "millis(DEFAULT_REQUEST_TIMEOUT)")]
    pub request_timeout_ms: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            contract_address: default_contract_address(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff_ms: millis(DEFAULT_INITIAL_BACKOFF),
            max_backoff_ms: millis(DEFAULT_MAX_BACKOFF),
            poll_interval_ms: millis(DEFAULT_POLL_INTERVAL),
            confirmation_timeout_ms: millis(DEFAULT_CONFIRMATION_TIMEOUT),
            request_timeout_ms: millis(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

impl CoordinatorConfig {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_be_built_using_a_builder() {
        let config = CoordinatorConfigBuilder::default()
            .rpc_url("ws://10.0.0.1:9293")
            .max_attempts(5u32)
            .poll_interval_ms(50u64)
            .build()
            .unwrap();

        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.initial_backoff(), DEFAULT_INITIAL_BACKOFF);
        assert_eq!(config.contract_address, default_contract_address());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: CoordinatorConfig =
            serde_json::from_value(serde_json::json!({ "max_attempts": 1 })).unwrap();

        assert_eq!(config.max_attempts, 1);
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.confirmation_timeout(), DEFAULT_CONFIRMATION_TIMEOUT);
    }
}
