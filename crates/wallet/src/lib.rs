pub mod credential;
pub mod error;
pub mod handle;
pub mod session;

pub use credential::*;
pub use error::*;
pub use handle::*;
pub use session::*;
