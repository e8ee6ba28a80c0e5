//! Trade construction
//!
//! Execution price is always the maker's price; the taker's side decides
//! which order is the buy leg. Self-trades never reach this point — the
//! matching walk filters them by policy first.

use crate::book::price_level::LevelEntry;
use types::numeric::{Price, Quantity};
use types::order::{Order, Side};
use types::trade::{SettlementState, Trade, TradeId};

/// Build the trade record for one fill between the incoming taker and a
/// resting maker entry.
pub fn make_trade(
    taker: &Order,
    maker: &LevelEntry,
    price: Price,
    quantity: Quantity,
    timestamp: i64,
) -> Trade {
    debug_assert_ne!(maker.account, taker.user_address, "self-trade reached executor");

    let (buy_order_id, sell_order_id, buy_user, sell_user) = match taker.side {
        Side::Buy => (
            taker.order_id.clone(),
            maker.order_id.clone(),
            taker.user_address.clone(),
            maker.account.clone(),
        ),
        Side::Sell => (
            maker.order_id.clone(),
            taker.order_id.clone(),
            maker.account.clone(),
            taker.user_address.clone(),
        ),
    };

    Trade {
        trade_id: TradeId::random(),
        buy_order_id,
        sell_order_id,
        buy_user,
        sell_user,
        asset_pair: taker.asset_pair.clone(),
        price,
        quantity,
        timestamp,
        settlement: SettlementState::Pending,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::numeric::Quantity as Qty;
    use types::order::{OrderStatus, OrderType, TimeInForce};
    use types::pair::AssetPair;

    fn taker(side: Side) -> Order {
        Order {
            order_id: "taker-1".to_string(),
            user_address: "GTAKER".to_string(),
            asset_pair: AssetPair::new("CBASE", "CQUOTE"),
            side,
            order_type: OrderType::Limit,
            price: Some("2".parse().unwrap()),
            quantity: "5".parse().unwrap(),
            filled_quantity: Qty::zero(),
            time_in_force: TimeInForce::GTC,
            timestamp: 1_700_000_000,
            sequence: 10,
            status: OrderStatus::Pending,
            signature: String::new(),
        }
    }

    fn maker() -> LevelEntry {
        LevelEntry {
            order_id: "maker-1".to_string(),
            account: "GMAKER".to_string(),
            sequence: 5,
            remaining: "5".parse().unwrap(),
        }
    }

    #[test]
    fn test_buy_taker_is_buy_leg() {
        let trade = make_trade(
            &taker(Side::Buy),
            &maker(),
            "1.9".parse().unwrap(),
            "3".parse().unwrap(),
            1_700_000_001,
        );
        assert_eq!(trade.buy_order_id, "taker-1");
        assert_eq!(trade.sell_order_id, "maker-1");
        assert_eq!(trade.buy_user, "GTAKER");
        assert_eq!(trade.sell_user, "GMAKER");
        assert_eq!(trade.price, "1.9".parse().unwrap());
        assert_eq!(trade.settlement, SettlementState::Pending);
    }

    #[test]
    fn test_sell_taker_is_sell_leg() {
        let trade = make_trade(
            &taker(Side::Sell),
            &maker(),
            "2.1".parse().unwrap(),
            "5".parse().unwrap(),
            1_700_000_001,
        );
        assert_eq!(trade.buy_order_id, "maker-1");
        assert_eq!(trade.sell_order_id, "taker-1");
        assert_eq!(trade.buy_user, "GMAKER");
        assert_eq!(trade.sell_user, "GTAKER");
    }
}
