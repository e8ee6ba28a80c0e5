//! Core domain types for the dark-pool matching engine
//!
//! Shared by every service crate. Prices and quantities are fixed-point
//! decimals end to end; integer stroop amounts appear only at the ledger
//! boundary.
//!
//! # Modules
//! - `numeric`: fixed-point `Price`/`Quantity` and stroop scaling
//! - `pair`: asset pair identifier
//! - `order`: order lifecycle types
//! - `trade`: trade records and settlement instructions
//! - `errors`: error taxonomy

pub mod errors;
pub mod numeric;
pub mod order;
pub mod pair;
pub mod trade;
