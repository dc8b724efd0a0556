//! Chain application for the scloud ledger.
//!
//! Wires the staking ledger and the governance engine to their external
//! collaborators (balance store, block clock, event sink) and exposes the
//! block lifecycle used by the consensus layer:
//! - transaction routing ([`Chain::deliver_tx`]) and evidence ([`Chain::slash`])
//! - the end-of-block driver ([`Chain::end_block`])
//! - commit with an app hash and a committed snapshot for [`Querier`]s
//! - genesis loading, TOML configuration and logging setup

pub mod chain;
pub mod commit;
pub mod config;
pub mod error;
pub mod events;
pub mod genesis;
pub mod logging;
pub mod msg;
pub mod query;

pub use chain::{Chain, EndBlockOutcome};
pub use commit::{state_hash, AppHash};
pub use config::ChainConfig;
pub use error::AppError;
pub use genesis::{GenesisState, GenesisValidator};
pub use logging::{init_logging, LogFormat};
pub use msg::{Msg, TxResult};
pub use query::{Querier, Snapshot};
