pub mod api;
pub mod client;
mod server;
mod server_impl;

pub use server::*;
pub use server_impl::*;

/// The signature did not verify against the sender's public key.
pub const INVALID_SIGNATURE_CODE: i32 = -32010;

/// The transaction nonce does not match the sender's next nonce.
pub const NONCE_MISMATCH_CODE: i32 = -32011;

/// A read-only contract call failed to execute.
pub const CALL_EXECUTION_CODE: i32 = -32020;
