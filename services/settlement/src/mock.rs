//! Deterministic in-memory vault contract
//!
//! Mirrors the settlement contract's observable behavior — committed
//! balances per (account, token), atomic four-way transfer on
//! `settle_trade`, matcher authorization, settle-once per trade id — with
//! no network and no clock. Failure injection lets tests script the exact
//! contract rejection they need.

use crate::LedgerClient;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use types::errors::LedgerError;
use types::trade::SettlementInstruction;

struct MockState {
    pair: (String, String),
    balances: HashMap<(String, String), i128>,
    matcher: String,
    caller: String,
    settled: HashSet<String>,
    injected_failures: VecDeque<LedgerError>,
    tx_counter: u64,
}

/// In-memory [`LedgerClient`] double.
pub struct InMemoryLedger {
    state: Mutex<MockState>,
}

impl InMemoryLedger {
    /// Create a vault for one pair, with `matcher` as the authorized
    /// settlement identity (the caller defaults to the matcher).
    pub fn new(
        base: impl Into<String>,
        quote: impl Into<String>,
        matcher: impl Into<String>,
    ) -> Self {
        let matcher = matcher.into();
        Self {
            state: Mutex::new(MockState {
                pair: (base.into(), quote.into()),
                balances: HashMap::new(),
                matcher: matcher.clone(),
                caller: matcher,
                settled: HashSet::new(),
                injected_failures: VecDeque::new(),
                tx_counter: 0,
            }),
        }
    }

    /// Seed a committed balance, as a user deposit would.
    pub fn deposit(&self, account: &str, token: &str, amount: i128) {
        let mut state = self.state.lock().unwrap();
        *state
            .balances
            .entry((account.to_string(), token.to_string()))
            .or_insert(0) += amount;
    }

    /// Withdraw committed funds out from under the engine (race scenarios).
    pub fn withdraw(&self, account: &str, token: &str, amount: i128) -> Result<(), LedgerError> {
        let mut state = self.state.lock().unwrap();
        let balance = state
            .balances
            .entry((account.to_string(), token.to_string()))
            .or_insert(0);
        if *balance < amount {
            return Err(LedgerError::InsufficientVaultBalance);
        }
        *balance -= amount;
        Ok(())
    }

    /// Direct committed-balance read, bypassing the client interface.
    pub fn balance(&self, account: &str, token: &str) -> i128 {
        let state = self.state.lock().unwrap();
        state
            .balances
            .get(&(account.to_string(), token.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Queue a failure for the next `settle_trade` call.
    pub fn fail_next_settlement(&self, error: LedgerError) {
        self.state
            .lock()
            .unwrap()
            .injected_failures
            .push_back(error);
    }

    /// Pretend a different identity is invoking the contract.
    pub fn set_caller(&self, caller: impl Into<String>) {
        self.state.lock().unwrap().caller = caller.into();
    }

    pub fn settled_count(&self) -> usize {
        self.state.lock().unwrap().settled.len()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn get_pair(&self) -> Result<(String, String), LedgerError> {
        Ok(self.state.lock().unwrap().pair.clone())
    }

    async fn get_balance(&self, account: &str, token: &str) -> Result<i128, LedgerError> {
        Ok(self.balance(account, token))
    }

    async fn settle_trade(
        &self,
        instruction: &SettlementInstruction,
    ) -> Result<String, LedgerError> {
        let mut state = self.state.lock().unwrap();

        if let Some(error) = state.injected_failures.pop_front() {
            return Err(error);
        }
        if state.caller != state.matcher {
            return Err(LedgerError::UnauthorizedMatcher);
        }

        let trade_key = instruction.trade_id.to_hex();
        if state.settled.contains(&trade_key) {
            return Err(LedgerError::Contract("trade already settled".into()));
        }
        if instruction.base_asset != state.pair.0 || instruction.quote_asset != state.pair.1 {
            return Err(LedgerError::Contract("asset not held by this vault".into()));
        }
        if instruction.base_amount <= 0 || instruction.quote_amount <= 0 {
            return Err(LedgerError::Contract("non-positive settlement amount".into()));
        }

        let buyer_quote = (
            instruction.buy_user.clone(),
            instruction.quote_asset.clone(),
        );
        let seller_base = (
            instruction.sell_user.clone(),
            instruction.base_asset.clone(),
        );
        let buyer_quote_balance = state.balances.get(&buyer_quote).copied().unwrap_or(0);
        let seller_base_balance = state.balances.get(&seller_base).copied().unwrap_or(0);

        if buyer_quote_balance < instruction.quote_amount + instruction.fee_quote
            || seller_base_balance < instruction.base_amount + instruction.fee_base
        {
            return Err(LedgerError::InsufficientVaultBalance);
        }

        // Atomic four-way update: buyer pays quote and receives base, the
        // seller mirrors.
        let buyer_base = (instruction.buy_user.clone(), instruction.base_asset.clone());
        let seller_quote = (
            instruction.sell_user.clone(),
            instruction.quote_asset.clone(),
        );
        *state.balances.entry(buyer_quote).or_insert(0) -= instruction.quote_amount;
        *state.balances.entry(buyer_base).or_insert(0) += instruction.base_amount;
        *state.balances.entry(seller_base).or_insert(0) -= instruction.base_amount;
        *state.balances.entry(seller_quote).or_insert(0) += instruction.quote_amount;

        state.settled.insert(trade_key);
        state.tx_counter += 1;
        Ok(format!("mocktx-{:016x}", state.tx_counter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Quantity;
    use types::pair::AssetPair;
    use types::trade::{SettlementState, Trade, TradeId};

    const BASE: &str = "CBASE";
    const QUOTE: &str = "CQUOTE";
    const MATCHER: &str = "GMATCHER";

    fn instruction(buyer: &str, seller: &str, base: i128, quote: i128) -> SettlementInstruction {
        let trade = Trade {
            trade_id: TradeId::random(),
            buy_order_id: "b".to_string(),
            sell_order_id: "s".to_string(),
            buy_user: buyer.to_string(),
            sell_user: seller.to_string(),
            asset_pair: AssetPair::new(BASE, QUOTE),
            price: "1".parse().unwrap(),
            quantity: Quantity::from_u64(1),
            timestamp: 1_700_000_000,
            settlement: SettlementState::Pending,
        };
        let mut instr = SettlementInstruction::for_trade(&trade, BASE, QUOTE).unwrap();
        instr.base_amount = base;
        instr.quote_amount = quote;
        instr
    }

    #[tokio::test]
    async fn test_settle_moves_both_legs() {
        let ledger = InMemoryLedger::new(BASE, QUOTE, MATCHER);
        ledger.deposit("GA", QUOTE, 1_000_000_000);
        ledger.deposit("GB", BASE, 1_000_000_000);

        let tx = ledger
            .settle_trade(&instruction("GA", "GB", 100_000_000, 50_000_000))
            .await
            .unwrap();
        assert!(tx.starts_with("mocktx-"));

        assert_eq!(ledger.balance("GA", BASE), 100_000_000);
        assert_eq!(ledger.balance("GA", QUOTE), 950_000_000);
        assert_eq!(ledger.balance("GB", BASE), 900_000_000);
        assert_eq!(ledger.balance("GB", QUOTE), 50_000_000);
    }

    #[tokio::test]
    async fn test_insufficient_balance_rejected_atomically() {
        let ledger = InMemoryLedger::new(BASE, QUOTE, MATCHER);
        ledger.deposit("GA", QUOTE, 10);
        ledger.deposit("GB", BASE, 1_000_000_000);

        let err = ledger
            .settle_trade(&instruction("GA", "GB", 100_000_000, 50_000_000))
            .await
            .unwrap_err();
        assert_eq!(err, LedgerError::InsufficientVaultBalance);

        // Nothing moved
        assert_eq!(ledger.balance("GA", QUOTE), 10);
        assert_eq!(ledger.balance("GB", BASE), 1_000_000_000);
        assert_eq!(ledger.settled_count(), 0);
    }

    #[tokio::test]
    async fn test_settle_once_per_trade_id() {
        let ledger = InMemoryLedger::new(BASE, QUOTE, MATCHER);
        ledger.deposit("GA", QUOTE, 1_000_000_000);
        ledger.deposit("GB", BASE, 1_000_000_000);

        let instr = instruction("GA", "GB", 1_000, 1_000);
        ledger.settle_trade(&instr).await.unwrap();
        assert!(matches!(
            ledger.settle_trade(&instr).await,
            Err(LedgerError::Contract(_))
        ));
    }

    #[tokio::test]
    async fn test_non_matcher_rejected() {
        let ledger = InMemoryLedger::new(BASE, QUOTE, MATCHER);
        ledger.deposit("GA", QUOTE, 1_000_000_000);
        ledger.deposit("GB", BASE, 1_000_000_000);
        ledger.set_caller("GIMPOSTOR");

        assert_eq!(
            ledger
                .settle_trade(&instruction("GA", "GB", 1_000, 1_000))
                .await
                .unwrap_err(),
            LedgerError::UnauthorizedMatcher
        );
    }

    #[tokio::test]
    async fn test_failure_injection_fires_once() {
        let ledger = InMemoryLedger::new(BASE, QUOTE, MATCHER);
        ledger.deposit("GA", QUOTE, 1_000_000_000);
        ledger.deposit("GB", BASE, 1_000_000_000);
        ledger.fail_next_settlement(LedgerError::InsufficientVaultBalance);

        assert!(ledger
            .settle_trade(&instruction("GA", "GB", 1_000, 1_000))
            .await
            .is_err());
        assert!(ledger
            .settle_trade(&instruction("GA", "GB", 1_000, 1_000))
            .await
            .is_ok());
    }
}
