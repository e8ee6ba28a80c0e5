//! Vault balance cache with reservation accounting
//!
//! Committed balances mirror the on-chain vault and expire on a short
//! TTL; reservations are engine-local truth that earmarks committed
//! funds for resting orders. `available = committed − reserved` is all
//! that admission ever consumes. The cache is a fast path only — the
//! contract re-checks every settlement, so a stale committed value can
//! cost a failed settlement but never lost funds.

use settlement::LedgerClient;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use types::errors::EngineError;

#[derive(Debug, Default)]
struct BalanceEntry {
    /// Mirrored on-chain balance; None after invalidation.
    committed: Option<i128>,
    /// Stroops earmarked by this account's resting orders on this token.
    reserved: i128,
    fetched_at: Option<Instant>,
}

impl BalanceEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.committed.is_some() && self.fetched_at.is_some_and(|t| t.elapsed() < ttl)
    }
}

pub struct VaultCache {
    ttl: Duration,
    entries: HashMap<(String, String), BalanceEntry>,
}

impl VaultCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    fn key(account: &str, token: &str) -> (String, String) {
        (account.to_string(), token.to_string())
    }

    /// Committed balance, read through the ledger on miss or expiry.
    ///
    /// A fetch failure during admission surfaces as upstream
    /// unavailability; the order is rejected rather than admitted blind.
    pub async fn committed(
        &mut self,
        ledger: &dyn LedgerClient,
        account: &str,
        token: &str,
    ) -> Result<i128, EngineError> {
        let key = Self::key(account, token);
        let fresh = self
            .entries
            .get(&key)
            .is_some_and(|e| e.is_fresh(self.ttl));

        if !fresh {
            let value = ledger
                .get_balance(account, token)
                .await
                .map_err(|e| EngineError::UpstreamUnavailable(e.to_string()))?;
            let entry = self.entries.entry(key.clone()).or_default();
            entry.committed = Some(value);
            entry.fetched_at = Some(Instant::now());
        }

        Ok(self
            .entries
            .get(&key)
            .and_then(|e| e.committed)
            .unwrap_or(0))
    }

    /// What new orders may consume: committed minus reserved.
    ///
    /// Can go negative when a withdrawal races the cache; admission then
    /// rejects until a refresh reconciles.
    pub async fn available(
        &mut self,
        ledger: &dyn LedgerClient,
        account: &str,
        token: &str,
    ) -> Result<i128, EngineError> {
        let committed = self.committed(ledger, account, token).await?;
        let reserved = self.reserved(account, token);
        Ok(committed - reserved)
    }

    pub fn reserve(&mut self, account: &str, token: &str, amount: i128) {
        let entry = self.entries.entry(Self::key(account, token)).or_default();
        entry.reserved += amount;
    }

    /// Release a reservation, clamped at zero. Over-release is a logic
    /// bug upstream; it is logged, not propagated.
    pub fn release(&mut self, account: &str, token: &str, amount: i128) {
        let entry = self.entries.entry(Self::key(account, token)).or_default();
        if amount > entry.reserved {
            tracing::warn!(
                account,
                token,
                amount = %amount,
                reserved = %entry.reserved,
                "reservation over-release clamped"
            );
            entry.reserved = 0;
        } else {
            entry.reserved -= amount;
        }
    }

    /// Adjust the mirrored committed value by a trade delta. Stale
    /// entries are left alone; the next read refetches chain truth that
    /// already includes the delta.
    pub fn apply_committed_delta(&mut self, account: &str, token: &str, delta: i128) {
        if let Some(entry) = self.entries.get_mut(&Self::key(account, token)) {
            if let Some(committed) = entry.committed {
                entry.committed = Some(committed + delta);
            }
        }
    }

    /// Drop the cached value and re-read the contract immediately.
    pub async fn refresh(
        &mut self,
        ledger: &dyn LedgerClient,
        account: &str,
        token: &str,
    ) -> Result<i128, EngineError> {
        self.invalidate(account, token);
        self.committed(ledger, account, token).await
    }

    /// Drop the mirrored balance but keep the reservation: resting
    /// orders do not lose their earmark because the chain moved.
    pub fn invalidate(&mut self, account: &str, token: &str) {
        if let Some(entry) = self.entries.get_mut(&Self::key(account, token)) {
            entry.committed = None;
            entry.fetched_at = None;
        }
    }

    /// Full eviction, reservations included. Admin/test convenience for
    /// deterministic end-to-end runs against an empty book.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn reserved(&self, account: &str, token: &str) -> i128 {
        self.entries
            .get(&Self::key(account, token))
            .map(|e| e.reserved)
            .unwrap_or(0)
    }
}
