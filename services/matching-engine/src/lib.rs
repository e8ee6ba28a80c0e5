//! Dark-pool matching core
//!
//! Price-time priority matching over a private per-pair book, vault-aware
//! admission against contract-committed balances, and synchronous
//! settlement of every match through the ledger.
//!
//! **Key invariants:**
//! - Sequence numbers are unique and strictly increasing across accepted
//!   orders; within a price level, lower sequence matches first
//! - `reserved ≤ committed` per (account, token) after every admission,
//!   fill, and cancellation
//! - Execution price is always the maker's price
//! - No trade pairs an account with itself
//! - After every accepted order the engine agrees with the contract, or
//!   has compensated and said so

pub mod book;
pub mod engine;
pub mod matching;
pub mod tokens;
pub mod vault;

pub use engine::{BalanceView, EngineConfig, MatchingEngine, SubmitOutcome};
pub use matching::SelfTradePolicy;
