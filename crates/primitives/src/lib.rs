pub mod address;
pub mod base;
pub mod crypto;
pub mod election;
pub mod environment;
pub mod error;
pub mod fingerprint;
pub mod method;
pub mod transaction;

pub use address::*;
pub use base::*;
pub use crypto::*;
pub use election::*;
pub use environment::*;
pub use error::*;
pub use fingerprint::*;
pub use method::*;
pub use transaction::*;
