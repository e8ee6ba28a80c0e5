//! End-to-end engine scenarios against the deterministic ledger double

use ed25519_dalek::SigningKey;
use matching_engine::{EngineConfig, MatchingEngine, SelfTradePolicy};
use settlement::{InMemoryLedger, LedgerClient};
use std::sync::Arc;
use types::errors::{EngineError, LedgerError};
use types::numeric::Quantity;
use types::order::{Order, OrderStatus, OrderType, Side, TimeInForce};
use types::pair::AssetPair;
use types::trade::SettlementState;

const BASE: &str = "CBASETOKENADDRESS";
const QUOTE: &str = "CQUOTETOKENADDRESS";
const MATCHER: &str = "GMATCHER";

fn keypair(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn address(key: &SigningKey) -> String {
    auth::account_address(&key.verifying_key())
}

struct Harness {
    ledger: Arc<InMemoryLedger>,
    engine: MatchingEngine,
}

async fn harness() -> Harness {
    harness_with_policy(SelfTradePolicy::SkipMatch).await
}

async fn harness_with_policy(policy: SelfTradePolicy) -> Harness {
    let ledger = Arc::new(InMemoryLedger::new(BASE, QUOTE, MATCHER));
    let dyn_ledger: Arc<dyn LedgerClient> = ledger.clone();
    let engine = MatchingEngine::bootstrap(
        dyn_ledger,
        EngineConfig {
            self_trade_policy: policy,
            ..EngineConfig::default()
        },
    )
    .await
    .unwrap();
    Harness { ledger, engine }
}

fn build_order(
    key: &SigningKey,
    id: &str,
    side: Side,
    price: Option<&str>,
    qty: &str,
    tif: TimeInForce,
) -> (Order, String) {
    let order = Order {
        order_id: id.to_string(),
        user_address: address(key),
        asset_pair: AssetPair::new(BASE, QUOTE),
        side,
        order_type: if price.is_some() {
            OrderType::Limit
        } else {
            OrderType::Market
        },
        price: price.map(|p| p.parse().unwrap()),
        quantity: qty.parse().unwrap(),
        filled_quantity: Quantity::zero(),
        time_in_force: tif,
        timestamp: 1_700_000_000,
        sequence: 0,
        status: OrderStatus::Pending,
        signature: String::new(),
    };
    let signature = auth::sign_order(&order, key).unwrap();
    (order, signature)
}

async fn submit(
    harness: &Harness,
    key: &SigningKey,
    id: &str,
    side: Side,
    price: Option<&str>,
    qty: &str,
    tif: TimeInForce,
) -> Result<matching_engine::SubmitOutcome, EngineError> {
    let (order, signature) = build_order(key, id, side, price, qty, tif);
    harness.engine.submit(order, &signature).await
}

#[tokio::test]
async fn clean_cross_exact_fill_settles_on_chain() {
    let h = harness().await;
    let buyer = keypair(1);
    let seller = keypair(2);
    h.ledger.deposit(&address(&buyer), QUOTE, 1_000_000_000);
    h.ledger.deposit(&address(&seller), BASE, 1_000_000_000);

    let outcome = submit(&h, &buyer, "buy-1", Side::Buy, Some("0.5"), "10", TimeInForce::GTC)
        .await
        .unwrap();
    assert!(outcome.trades.is_empty());
    assert_eq!(outcome.order.status, OrderStatus::Pending);

    let outcome = submit(&h, &seller, "sell-1", Side::Sell, Some("0.5"), "10", TimeInForce::GTC)
        .await
        .unwrap();

    assert!(outcome.error.is_none());
    assert_eq!(outcome.trades.len(), 1);
    let trade = &outcome.trades[0];
    assert_eq!(trade.price, "0.5".parse().unwrap());
    assert_eq!(trade.quantity, "10".parse().unwrap());
    assert!(matches!(trade.settlement, SettlementState::Settled { .. }));
    assert_eq!(outcome.order.status, OrderStatus::Filled);

    // On-chain truth: buyer gained 10 base, paid 5 quote (stroops ×10^7)
    assert_eq!(h.ledger.balance(&address(&buyer), BASE), 100_000_000);
    assert_eq!(h.ledger.balance(&address(&buyer), QUOTE), 950_000_000);
    assert_eq!(h.ledger.balance(&address(&seller), BASE), 900_000_000);
    assert_eq!(h.ledger.balance(&address(&seller), QUOTE), 50_000_000);

    // The cache was invalidated; reads now reflect the settled state
    let view = h
        .engine
        .balance(&address(&buyer), BASE)
        .await
        .unwrap();
    assert_eq!(view.balance_raw, 100_000_000);
}

#[tokio::test]
async fn price_time_priority_within_and_across_levels() {
    let h = harness().await;
    let m1 = keypair(1);
    let m2 = keypair(2);
    let m3 = keypair(3);
    let taker = keypair(4);
    for maker in [&m1, &m2, &m3] {
        h.ledger.deposit(&address(maker), BASE, 1_000_000_000);
    }
    h.ledger.deposit(&address(&taker), QUOTE, 1_000_000_000);

    submit(&h, &m1, "ask-1", Side::Sell, Some("1.00"), "1", TimeInForce::GTC)
        .await
        .unwrap();
    submit(&h, &m2, "ask-2", Side::Sell, Some("1.00"), "1", TimeInForce::GTC)
        .await
        .unwrap();
    submit(&h, &m3, "ask-3", Side::Sell, Some("1.01"), "1", TimeInForce::GTC)
        .await
        .unwrap();

    let outcome = submit(&h, &taker, "mkt-1", Side::Buy, None, "1.5", TimeInForce::IOC)
        .await
        .unwrap();

    assert!(outcome.error.is_none());
    assert_eq!(outcome.trades.len(), 2);
    assert_eq!(outcome.trades[0].sell_order_id, "ask-1");
    assert_eq!(outcome.trades[0].quantity, "1".parse().unwrap());
    assert_eq!(outcome.trades[0].price, "1.00".parse().unwrap());
    assert_eq!(outcome.trades[1].sell_order_id, "ask-2");
    assert_eq!(outcome.trades[1].quantity, "0.5".parse().unwrap());

    let m2_order = h.engine.get_order("ask-2").await.unwrap();
    assert_eq!(m2_order.remaining(), "0.5".parse().unwrap());
    let m3_order = h.engine.get_order("ask-3").await.unwrap();
    assert_eq!(m3_order.status, OrderStatus::Pending);
}

#[tokio::test]
async fn fok_unfillable_rejects_without_state_change() {
    let h = harness().await;
    let maker = keypair(1);
    let taker = keypair(2);
    h.ledger.deposit(&address(&maker), BASE, 1_000_000_000);
    h.ledger.deposit(&address(&taker), QUOTE, 1_000_000_000);

    submit(&h, &maker, "ask-1", Side::Sell, Some("1.00"), "7", TimeInForce::GTC)
        .await
        .unwrap();

    let err = submit(&h, &taker, "fok-1", Side::Buy, Some("1.00"), "10", TimeInForce::FOK)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::FokUnfillable { .. }));

    // Book unchanged, nothing settled, rejected order not recorded
    let snap = h.engine.snapshot(&AssetPair::new(BASE, QUOTE)).await.unwrap();
    assert_eq!(snap.asks.len(), 1);
    assert_eq!(snap.asks[0].quantity, "7".parse().unwrap());
    assert_eq!(h.ledger.settled_count(), 0);
    assert!(h.engine.get_order("fok-1").await.is_none());
}

#[tokio::test]
async fn fok_exact_fit_executes() {
    let h = harness().await;
    let maker = keypair(1);
    let taker = keypair(2);
    h.ledger.deposit(&address(&maker), BASE, 1_000_000_000);
    h.ledger.deposit(&address(&taker), QUOTE, 1_000_000_000);

    submit(&h, &maker, "ask-1", Side::Sell, Some("1.00"), "10", TimeInForce::GTC)
        .await
        .unwrap();
    let outcome = submit(&h, &taker, "fok-1", Side::Buy, Some("1.00"), "10", TimeInForce::FOK)
        .await
        .unwrap();

    assert_eq!(outcome.order.status, OrderStatus::Filled);
    assert_eq!(h.ledger.settled_count(), 1);
}

#[tokio::test]
async fn ioc_partial_fill_drops_residual() {
    let h = harness().await;
    let maker = keypair(1);
    let taker = keypair(2);
    h.ledger.deposit(&address(&maker), BASE, 1_000_000_000);
    h.ledger.deposit(&address(&taker), QUOTE, 1_000_000_000);

    submit(&h, &maker, "ask-1", Side::Sell, Some("1.00"), "4", TimeInForce::GTC)
        .await
        .unwrap();
    let outcome = submit(&h, &taker, "ioc-1", Side::Buy, Some("1.00"), "10", TimeInForce::IOC)
        .await
        .unwrap();

    assert_eq!(outcome.trades.len(), 1);
    assert_eq!(outcome.trades[0].quantity, "4".parse().unwrap());
    assert_eq!(outcome.order.status, OrderStatus::PartiallyFilled);

    // Residual never rested
    let snap = h.engine.snapshot(&AssetPair::new(BASE, QUOTE)).await.unwrap();
    assert!(snap.bids.is_empty());
}

#[tokio::test]
async fn ioc_no_liquidity_is_cancelled_with_zero_trades() {
    let h = harness().await;
    let taker = keypair(1);
    h.ledger.deposit(&address(&taker), QUOTE, 1_000_000_000);

    let outcome = submit(&h, &taker, "ioc-1", Side::Buy, Some("1.00"), "10", TimeInForce::IOC)
        .await
        .unwrap();
    assert!(outcome.trades.is_empty());
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn self_trade_skip_match_leaves_both_orders() {
    let h = harness().await;
    let account = keypair(1);
    h.ledger.deposit(&address(&account), QUOTE, 1_000_000_000);
    h.ledger.deposit(&address(&account), BASE, 1_000_000_000);

    submit(&h, &account, "buy-1", Side::Buy, Some("1.00"), "5", TimeInForce::GTC)
        .await
        .unwrap();
    let outcome = submit(&h, &account, "sell-1", Side::Sell, Some("0.99"), "5", TimeInForce::GTC)
        .await
        .unwrap();

    assert!(outcome.trades.is_empty());
    assert_eq!(outcome.order.status, OrderStatus::Pending);

    let snap = h.engine.snapshot(&AssetPair::new(BASE, QUOTE)).await.unwrap();
    assert_eq!(snap.bids.len(), 1);
    assert_eq!(snap.asks.len(), 1);
    assert_eq!(h.ledger.settled_count(), 0);
}

#[tokio::test]
async fn self_trade_ioc_variant_cancels_incoming() {
    let h = harness().await;
    let account = keypair(1);
    h.ledger.deposit(&address(&account), QUOTE, 1_000_000_000);
    h.ledger.deposit(&address(&account), BASE, 1_000_000_000);

    submit(&h, &account, "buy-1", Side::Buy, Some("1.00"), "5", TimeInForce::GTC)
        .await
        .unwrap();
    let outcome = submit(&h, &account, "sell-1", Side::Sell, Some("0.99"), "5", TimeInForce::IOC)
        .await
        .unwrap();

    assert!(outcome.trades.is_empty());
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    let buy = h.engine.get_order("buy-1").await.unwrap();
    assert_eq!(buy.status, OrderStatus::Pending);
}

#[tokio::test]
async fn self_trade_cancel_newer_policy() {
    let h = harness_with_policy(SelfTradePolicy::CancelNewer).await;
    let account = keypair(1);
    h.ledger.deposit(&address(&account), QUOTE, 1_000_000_000);
    h.ledger.deposit(&address(&account), BASE, 1_000_000_000);

    submit(&h, &account, "buy-1", Side::Buy, Some("1.00"), "5", TimeInForce::GTC)
        .await
        .unwrap();
    let outcome = submit(&h, &account, "sell-1", Side::Sell, Some("0.99"), "5", TimeInForce::GTC)
        .await
        .unwrap();

    assert!(outcome.trades.is_empty());
    assert_eq!(outcome.order.status, OrderStatus::Cancelled);
    assert_eq!(
        h.engine.get_order("buy-1").await.unwrap().status,
        OrderStatus::Pending
    );
}

#[tokio::test]
async fn settlement_failure_compensates_and_requeues_at_tail() {
    let h = harness().await;
    let buyer = keypair(1);
    let seller = keypair(2);
    h.ledger.deposit(&address(&buyer), QUOTE, 1_000_000_000);
    h.ledger.deposit(&address(&seller), BASE, 1_000_000_000);

    submit(&h, &buyer, "buy-1", Side::Buy, Some("1.0"), "10", TimeInForce::GTC)
        .await
        .unwrap();

    h.ledger
        .fail_next_settlement(LedgerError::InsufficientVaultBalance);
    let outcome = submit(&h, &seller, "sell-1", Side::Sell, Some("1.0"), "10", TimeInForce::GTC)
        .await
        .unwrap();

    // The failure is explicit, never silent
    assert!(matches!(
        outcome.error,
        Some(EngineError::SettlementFailed(
            LedgerError::InsufficientVaultBalance
        ))
    ));
    assert_eq!(outcome.trades.len(), 1);
    assert!(matches!(
        outcome.trades[0].settlement,
        SettlementState::Failed { .. }
    ));

    // Fills rolled back; both orders rest again at their original price
    let buy = h.engine.get_order("buy-1").await.unwrap();
    let sell = h.engine.get_order("sell-1").await.unwrap();
    assert_eq!(buy.status, OrderStatus::Pending);
    assert!(buy.filled_quantity.is_zero());
    assert_eq!(sell.status, OrderStatus::Pending);
    assert!(sell.filled_quantity.is_zero());

    let snap = h.engine.snapshot(&AssetPair::new(BASE, QUOTE)).await.unwrap();
    assert_eq!(snap.bids.len(), 1);
    assert_eq!(snap.bids[0].quantity, "10".parse().unwrap());
    assert_eq!(snap.asks.len(), 1);
    assert_eq!(snap.asks[0].quantity, "10".parse().unwrap());

    // Nothing moved on-chain; cached balances match pre-match deposits
    assert_eq!(h.ledger.balance(&address(&buyer), QUOTE), 1_000_000_000);
    assert_eq!(h.ledger.balance(&address(&seller), BASE), 1_000_000_000);
    let view = h.engine.balance(&address(&buyer), QUOTE).await.unwrap();
    assert_eq!(view.balance_raw, 1_000_000_000);
}

#[tokio::test]
async fn duplicate_order_id_rejected() {
    let h = harness().await;
    let account = keypair(1);
    h.ledger.deposit(&address(&account), QUOTE, 1_000_000_000);

    submit(&h, &account, "dup-1", Side::Buy, Some("1.0"), "1", TimeInForce::GTC)
        .await
        .unwrap();
    let err = submit(&h, &account, "dup-1", Side::Buy, Some("1.0"), "1", TimeInForce::GTC)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DuplicateOrderId(_)));
}

#[tokio::test]
async fn insufficient_funds_rejected_and_reservations_hold() {
    let h = harness().await;
    let account = keypair(1);
    // Enough for one 10 @ 1.0 buy (100_000_000 stroops), not two
    h.ledger.deposit(&address(&account), QUOTE, 150_000_000);

    submit(&h, &account, "buy-1", Side::Buy, Some("1.0"), "10", TimeInForce::GTC)
        .await
        .unwrap();
    let err = submit(&h, &account, "buy-2", Side::Buy, Some("1.0"), "10", TimeInForce::GTC)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientFunds { .. }));

    // Cancelling the first frees the reservation for a new order
    h.engine.cancel("buy-1", &address(&account)).await.unwrap();
    submit(&h, &account, "buy-3", Side::Buy, Some("1.0"), "10", TimeInForce::GTC)
        .await
        .unwrap();
}

#[tokio::test]
async fn bad_signature_rejected() {
    let h = harness().await;
    let account = keypair(1);
    let other = keypair(2);
    h.ledger.deposit(&address(&account), QUOTE, 1_000_000_000);

    let (order, _) = build_order(&account, "x-1", Side::Buy, Some("1.0"), "1", TimeInForce::GTC);
    // Signature from the wrong key
    let forged = auth::sign_order(&order, &other).unwrap();
    let err = h.engine.submit(order, &forged).await.unwrap_err();
    assert!(matches!(err, EngineError::AuthFailure(_)));
}

#[tokio::test]
async fn unsupported_pair_rejected() {
    let h = harness().await;
    let account = keypair(1);
    h.ledger.deposit(&address(&account), QUOTE, 1_000_000_000);

    let (mut order, _) = build_order(&account, "x-1", Side::Buy, Some("1.0"), "1", TimeInForce::GTC);
    order.asset_pair = AssetPair::new("DOGE", "SHIB");
    let signature = auth::sign_order(&order, &account).unwrap();
    let err = h.engine.submit(order, &signature).await.unwrap_err();
    assert!(matches!(err, EngineError::PairNotSupported { .. }));
}

#[tokio::test]
async fn market_order_with_thin_book_rejected() {
    let h = harness().await;
    let taker = keypair(1);
    h.ledger.deposit(&address(&taker), QUOTE, 1_000_000_000);

    let err = submit(&h, &taker, "mkt-1", Side::Buy, None, "1", TimeInForce::IOC)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ClientInput(_)));
}

#[tokio::test]
async fn cancel_is_idempotent_and_owner_checked() {
    let h = harness().await;
    let owner = keypair(1);
    let stranger = keypair(2);
    h.ledger.deposit(&address(&owner), QUOTE, 1_000_000_000);

    submit(&h, &owner, "buy-1", Side::Buy, Some("1.0"), "10", TimeInForce::GTC)
        .await
        .unwrap();

    assert!(h.engine.cancel("buy-1", &address(&stranger)).await.is_err());

    let order = h.engine.cancel("buy-1", &address(&owner)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);

    // Idempotent second cancel
    let order = h.engine.cancel("buy-1", &address(&owner)).await.unwrap();
    assert_eq!(order.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn sequences_strictly_increase() {
    let h = harness().await;
    let account = keypair(1);
    h.ledger.deposit(&address(&account), QUOTE, 1_000_000_000);

    let mut last = 0;
    for i in 0..5 {
        let outcome = submit(
            &h,
            &account,
            &format!("seq-{i}"),
            Side::Buy,
            Some("0.01"),
            "1",
            TimeInForce::GTC,
        )
        .await
        .unwrap();
        assert!(outcome.order.sequence > last);
        last = outcome.order.sequence;
    }
}
