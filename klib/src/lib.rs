pub mod balance;
pub mod error;
pub mod headers;
pub mod keys;
pub mod pipeline;
pub mod sink;
pub mod tunnel;

pub use balance::{BalanceClient, Lookup};
pub use error::{Error, Result};
pub use keys::{PrivateKey, PublicKey};
pub use pipeline::{RunConfig, RunSummary};
pub use sink::{Record, ResultSink};
pub use tunnel::{Tunnel, TunnelConfig};
