//! Matching engine orchestration
//!
//! One engine instance owns one order book (the contract trades exactly
//! one pair), the vault cache, and the sequence counter. Every mutation
//! runs under a single global mutex: admission, matching, optimistic
//! balance deltas, and the synchronous settlement of each produced trade
//! are atomic with respect to other submissions. Ledger RPC calls happen
//! while holding the lock — the engine needs one coherent view across
//! admission and settlement.
//!
//! Signature verification is pure CPU and runs before the lock.

use crate::book::{BookSnapshot, OrderBook};
use crate::matching::SelfTradePolicy;
use crate::tokens::TokenRegistry;
use crate::vault::VaultCache;
use rust_decimal::Decimal;
use settlement::LedgerClient;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;
use types::errors::{CancelError, EngineError, LedgerError};
use types::numeric::{from_stroops, to_stroops, Price, Quantity};
use types::order::{Order, OrderStatus, OrderType, Side, TimeInForce};
use types::pair::AssetPair;
use types::trade::{SettlementInstruction, SettlementState, Trade};

/// Engine tuning, fixed at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub self_trade_policy: SelfTradePolicy,
    pub balance_cache_ttl: Duration,
    pub snapshot_depth: usize,
    /// Optional short symbol accepted for the base token (e.g. "XLM").
    pub base_symbol: Option<String>,
    /// Optional short symbol accepted for the quote token.
    pub quote_symbol: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            self_trade_policy: SelfTradePolicy::default(),
            balance_cache_ttl: Duration::from_secs(30),
            snapshot_depth: 20,
            base_symbol: None,
            quote_symbol: None,
        }
    }
}

/// Result of one submission: the final order view plus every produced
/// trade with its settlement outcome. `error` is set when a settlement
/// failed and compensation ran; the trades then carry failed states.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
    pub error: Option<EngineError>,
}

/// Read model for the balances endpoint.
#[derive(Debug, Clone)]
pub struct BalanceView {
    pub token: String,
    pub balance_raw: i128,
    pub balance: Decimal,
}

struct EngineState {
    book: OrderBook,
    vault: VaultCache,
    next_sequence: u64,
}

pub struct MatchingEngine {
    ledger: Arc<dyn LedgerClient>,
    tokens: TokenRegistry,
    policy: SelfTradePolicy,
    snapshot_depth: usize,
    state: Mutex<EngineState>,
}

impl MatchingEngine {
    /// Query the contract for its configured pair and build the engine
    /// around it.
    pub async fn bootstrap(
        ledger: Arc<dyn LedgerClient>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        let (base, quote) = ledger
            .get_pair()
            .await
            .map_err(|e| EngineError::UpstreamUnavailable(e.to_string()))?;
        tracing::info!(%base, %quote, "engine bootstrapped for contract pair");

        let tokens = TokenRegistry::new(
            base.clone(),
            quote.clone(),
            config.base_symbol.clone(),
            config.quote_symbol.clone(),
        );

        Ok(Self {
            ledger,
            tokens,
            policy: config.self_trade_policy,
            snapshot_depth: config.snapshot_depth,
            state: Mutex::new(EngineState {
                book: OrderBook::new(AssetPair::new(base, quote)),
                vault: VaultCache::new(config.balance_cache_ttl),
                next_sequence: 1,
            }),
        })
    }

    /// The pair this engine trades, as resolved contract addresses.
    pub fn pair(&self) -> AssetPair {
        AssetPair::new(self.tokens.base(), self.tokens.quote())
    }

    /// Submit a signed order: verify, admit, match, settle.
    pub async fn submit(
        &self,
        mut order: Order,
        signature: &str,
    ) -> Result<SubmitOutcome, EngineError> {
        // Static validation and signature check happen outside the lock.
        if !order.quantity.is_positive() {
            return Err(EngineError::ClientInput("quantity must be positive".into()));
        }
        if order.order_type == OrderType::Limit && order.price.is_none() {
            return Err(EngineError::ClientInput(
                "limit order requires a price".into(),
            ));
        }

        auth::verify_order(&order, signature).map_err(|e| match e {
            auth::AuthError::MalformedOrder(m) => EngineError::ClientInput(m),
            other => EngineError::AuthFailure(other.to_string()),
        })?;
        order.signature = signature.to_string();
        order.filled_quantity = Quantity::zero();
        order.status = OrderStatus::Pending;

        let mut state = self.state.lock().await;
        let state = &mut *state;

        if state.book.contains(&order.order_id) {
            return Err(EngineError::DuplicateOrderId(order.order_id));
        }

        // Pair admission; the book stores resolved addresses only.
        order.asset_pair = self.tokens.resolve_pair(&order.asset_pair)?;

        let limit = match order.order_type {
            OrderType::Limit => order.price,
            OrderType::Market => None,
        };

        // FOK and market orders must be fully executable before any state
        // changes; the scan also prices market-buy reservations exactly.
        let scan = if order.time_in_force == TimeInForce::FOK
            || order.order_type == OrderType::Market
        {
            let scan = state.book.prescan(
                order.side,
                limit,
                &order.user_address,
                order.quantity,
                self.policy == SelfTradePolicy::CancelNewer,
            );
            if scan.achievable < order.quantity {
                return Err(if order.time_in_force == TimeInForce::FOK {
                    EngineError::FokUnfillable {
                        requested: order.quantity.to_string(),
                        achievable: scan.achievable.to_string(),
                    }
                } else {
                    EngineError::ClientInput(format!(
                        "market order cannot fully execute: {} available of {}",
                        scan.achievable, order.quantity
                    ))
                });
            }
            Some(scan)
        } else {
            None
        };

        // Balance admission and reservation.
        let overflow = || EngineError::ClientInput("order value overflows stroop range".into());
        let (reserve_token, reserve_amount) = match order.side {
            Side::Buy => {
                let cost = match order.order_type {
                    OrderType::Market => scan.as_ref().map(|s| s.quote_cost).unwrap_or_default(),
                    OrderType::Limit => {
                        order.quantity * order.price.expect("limit price validated")
                    }
                };
                (
                    self.tokens.quote().to_string(),
                    to_stroops(cost).ok_or_else(overflow)?,
                )
            }
            Side::Sell => (
                self.tokens.base().to_string(),
                to_stroops(order.quantity.as_decimal()).ok_or_else(overflow)?,
            ),
        };

        let available = state
            .vault
            .available(self.ledger.as_ref(), &order.user_address, &reserve_token)
            .await?;
        if reserve_amount > available {
            return Err(EngineError::InsufficientFunds {
                required: reserve_amount,
                available,
            });
        }
        state
            .vault
            .reserve(&order.user_address, &reserve_token, reserve_amount);

        // Accept: assign sequence and match.
        order.sequence = state.next_sequence;
        state.next_sequence += 1;

        let taker_id = order.order_id.clone();
        let taker_account = order.user_address.clone();
        let taker_side = order.side;
        let taker_type = order.order_type;
        let now = unix_now();

        tracing::info!(
            order_id = %taker_id,
            side = %taker_side,
            sequence = order.sequence,
            "order accepted"
        );

        let mut trades = state.book.add(order, self.policy, now);

        // Release reservations by the filled share and apply optimistic
        // committed deltas for each fill.
        let base = self.tokens.base().to_string();
        let quote = self.tokens.quote().to_string();
        let mut taker_released: i128 = 0;

        for trade in &trades {
            let base_stroops = trade_base_stroops(trade);
            let quote_stroops = trade_quote_stroops(trade);

            state.vault.release(&trade.sell_user, &base, base_stroops);
            if taker_side == Side::Sell && trade.sell_order_id == taker_id {
                taker_released += base_stroops;
            }

            // The buyer's earmark was priced at its own limit; a market
            // taker's was priced by the pre-scan at the executed levels.
            let buyer_earmark = if taker_side == Side::Buy
                && trade.buy_order_id == taker_id
                && taker_type == OrderType::Limit
            {
                earmark_stroops(trade.quantity, limit.expect("limit taker has a price"))
            } else {
                quote_stroops
            };
            state.vault.release(&trade.buy_user, &quote, buyer_earmark);
            if taker_side == Side::Buy && trade.buy_order_id == taker_id {
                taker_released += buyer_earmark;
            }

            state
                .vault
                .apply_committed_delta(&trade.buy_user, &quote, -quote_stroops);
            state
                .vault
                .apply_committed_delta(&trade.buy_user, &base, base_stroops);
            state
                .vault
                .apply_committed_delta(&trade.sell_user, &base, -base_stroops);
            state
                .vault
                .apply_committed_delta(&trade.sell_user, &quote, quote_stroops);
        }

        // Whatever the resting remainder does not earmark goes back.
        let kept = if state.book.is_resting(&taker_id) {
            let remaining = state
                .book
                .get_order(&taker_id)
                .map(|o| o.remaining())
                .unwrap_or_else(Quantity::zero);
            match taker_side {
                Side::Buy => earmark_stroops(remaining, limit.expect("resting order has a price")),
                Side::Sell => to_stroops(remaining.as_decimal())
                    .expect("validated at admission"),
            }
        } else {
            0
        };
        let leftover = reserve_amount - taker_released - kept;
        if leftover > 0 {
            state
                .vault
                .release(&taker_account, &reserve_token, leftover);
        }

        // Settle synchronously, in production order. The first failure
        // compensates that trade and every one after it.
        let mut error = None;
        for index in 0..trades.len() {
            let instruction =
                match SettlementInstruction::for_trade(&trades[index], &base, &quote) {
                    Ok(instruction) => instruction,
                    Err(e) => {
                        let reason = LedgerError::Contract(e.to_string());
                        self.compensate(state, &mut trades, index, &reason, &taker_id);
                        error = Some(EngineError::Internal(e.to_string()));
                        break;
                    }
                };

            match self.ledger.settle_trade(&instruction).await {
                Ok(tx_hash) => {
                    tracing::info!(trade_id = %trades[index].trade_id, %tx_hash, "trade settled");
                    trades[index].settlement = SettlementState::Settled {
                        transaction_hash: tx_hash,
                    };
                    for account in [&trades[index].buy_user, &trades[index].sell_user] {
                        state.vault.invalidate(account, &base);
                        state.vault.invalidate(account, &quote);
                    }
                }
                Err(e) => {
                    tracing::error!(
                        trade_id = %trades[index].trade_id,
                        error = %e,
                        "settlement failed, compensating"
                    );
                    self.compensate(state, &mut trades, index, &e, &taker_id);
                    error = Some(e.into());
                    break;
                }
            }
        }

        let order = state
            .book
            .get_order(&taker_id)
            .cloned()
            .ok_or_else(|| EngineError::Internal("submitted order vanished".into()))?;

        debug_assert!(state.book.check_consistency());

        Ok(SubmitOutcome {
            order,
            trades,
            error,
        })
    }

    /// Unwind trade `failed` and everything after it: mark them failed,
    /// reverse their optimistic deltas, restore fills, re-reserve the
    /// resting share, and re-insert both orders at the tail of their
    /// price levels. Tail insertion forfeits time priority — the known
    /// cost of a failed settlement.
    fn compensate(
        &self,
        state: &mut EngineState,
        trades: &mut [Trade],
        failed: usize,
        reason: &LedgerError,
        taker_id: &str,
    ) {
        let base = self.tokens.base().to_string();
        let quote = self.tokens.quote().to_string();
        // Reinsert in sequence order so the unwound tail is deterministic.
        let mut to_reinsert: BTreeMap<u64, String> = BTreeMap::new();

        for index in failed..trades.len() {
            trades[index].settlement = SettlementState::Failed {
                reason: if index == failed {
                    reason.to_string()
                } else {
                    "unwound after earlier settlement failure".to_string()
                },
            };

            let trade = trades[index].clone();
            let base_stroops = trade_base_stroops(&trade);
            let quote_stroops = trade_quote_stroops(&trade);

            state
                .vault
                .apply_committed_delta(&trade.buy_user, &quote, quote_stroops);
            state
                .vault
                .apply_committed_delta(&trade.buy_user, &base, -base_stroops);
            state
                .vault
                .apply_committed_delta(&trade.sell_user, &base, base_stroops);
            state
                .vault
                .apply_committed_delta(&trade.sell_user, &quote, -quote_stroops);

            for (order_id, is_buyer) in [
                (trade.buy_order_id.clone(), true),
                (trade.sell_order_id.clone(), false),
            ] {
                let order = state
                    .book
                    .order_mut(&order_id)
                    .expect("trade references unknown order");
                order.remove_fill(trade.quantity);

                // Only GTC limit orders can return to the book; an IOC or
                // market taker's restored remainder is cancelled instead.
                let can_rest = order.order_type == OrderType::Limit
                    && order.time_in_force == TimeInForce::GTC;
                if can_rest {
                    let account = order.user_address.clone();
                    let earmark = if is_buyer {
                        earmark_stroops(
                            trade.quantity,
                            order.price.expect("limit order carries a price"),
                        )
                    } else {
                        base_stroops
                    };
                    to_reinsert.insert(order.sequence, order_id.clone());
                    let token = if is_buyer { quote.clone() } else { base.clone() };
                    state.vault.reserve(&account, &token, earmark);
                } else if order_id == taker_id {
                    order.cancel();
                }
            }
        }

        for order_id in to_reinsert.values() {
            state.book.restore_resting_tail(order_id);
        }
    }

    /// Cancel a resting order; strictly in-process, never touches the
    /// ledger. Terminal orders cancel idempotently.
    pub async fn cancel(&self, order_id: &str, account: &str) -> Result<Order, CancelError> {
        let mut state = self.state.lock().await;
        let state = &mut *state;

        if let Some(release) = state.book.cancel(order_id, account)? {
            let (token, amount) = match release.side {
                Side::Buy => (
                    self.tokens.quote(),
                    earmark_stroops(release.remaining, release.price),
                ),
                Side::Sell => (
                    self.tokens.base(),
                    to_stroops(release.remaining.as_decimal())
                        .expect("resting quantity fits stroop range"),
                ),
            };
            state.vault.release(account, token, amount);
            tracing::info!(order_id, "order cancelled");
        }

        Ok(state
            .book
            .get_order(order_id)
            .cloned()
            .expect("cancelled order must exist"))
    }

    pub async fn get_order(&self, order_id: &str) -> Option<Order> {
        self.state.lock().await.book.get_order(order_id).cloned()
    }

    /// Depth snapshot for the configured pair.
    pub async fn snapshot(&self, pair: &AssetPair) -> Result<BookSnapshot, EngineError> {
        self.tokens.resolve_pair(pair)?;
        let state = self.state.lock().await;
        Ok(state.book.snapshot(self.snapshot_depth, unix_now()))
    }

    /// Committed vault balance, read through the cache.
    pub async fn balance(&self, account: &str, token: &str) -> Result<BalanceView, EngineError> {
        let resolved = self
            .tokens
            .resolve(token)
            .ok_or_else(|| EngineError::ClientInput(format!("unknown token: {token}")))?;

        let mut state = self.state.lock().await;
        let raw = state
            .vault
            .committed(self.ledger.as_ref(), account, &resolved)
            .await?;

        Ok(BalanceView {
            token: resolved,
            balance_raw: raw,
            balance: from_stroops(raw),
        })
    }

    /// Flush the vault cache (admin/test hook).
    pub async fn clear_cache(&self) {
        self.state.lock().await.vault.clear();
        tracing::info!("vault cache cleared");
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn trade_base_stroops(trade: &Trade) -> i128 {
    to_stroops(trade.quantity.as_decimal()).expect("trade quantity validated at admission")
}

fn trade_quote_stroops(trade: &Trade) -> i128 {
    to_stroops(trade.quantity * trade.price).expect("trade value validated at admission")
}

fn earmark_stroops(quantity: Quantity, price: Price) -> i128 {
    to_stroops(quantity * price).expect("earmark validated at admission")
}
