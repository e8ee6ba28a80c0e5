//! Ledger interface and settlement drivers
//!
//! The vault contract is an external collaborator reached over the
//! ledger's RPC. This crate owns the seam: a [`LedgerClient`] trait the
//! engine talks to, the RPC-backed driver that implements the
//! simulate → sign → send → poll pipeline, and a deterministic in-memory
//! double every invariant test runs against.

pub mod driver;
pub mod mock;
pub mod rpc;

pub use driver::{DriverConfig, SettlementDriver};
pub use mock::InMemoryLedger;

use async_trait::async_trait;
use types::errors::LedgerError;
use types::trade::SettlementInstruction;

/// The engine's view of the settlement contract.
///
/// Only three entry points matter to the core: the configured pair, a
/// committed balance read, and the atomic trade settlement. Everything
/// else on the contract (deposits, withdrawals, admin) happens outside
/// the engine.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Resolved (base, quote) token contract addresses the vault trades.
    async fn get_pair(&self) -> Result<(String, String), LedgerError>;

    /// Committed vault balance in stroops for (account, token).
    async fn get_balance(&self, account: &str, token: &str) -> Result<i128, LedgerError>;

    /// Submit `settle_trade` and drive it to a terminal status.
    ///
    /// Returns the on-chain transaction hash on success.
    async fn settle_trade(&self, instruction: &SettlementInstruction)
        -> Result<String, LedgerError>;
}
