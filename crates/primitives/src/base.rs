use std::time::Duration;

pub const DEFAULT_RPC_URL: &str = "ws://127.0.0.1:9293";
pub const DEFAULT_DEVNET_ADDRESS: &str = "127.0.0.1:9293";

/// Address the development node answers contract calls for unless told otherwise.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x1234567890123456789012345678901234567890";

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(200);
pub const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(5);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type Nonce = u64;
pub type BlockNumber = u64;
