//! Trade execution and settlement types

use crate::errors::EngineError;
use crate::numeric::{to_stroops, Price, Quantity};
use crate::pair::AssetPair;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique 32-byte trade identifier, generated by the engine at match time.
///
/// Serialized as 64 hex characters; the raw bytes feed the contract's
/// `trade_id: BytesN<32>` argument unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TradeId([u8; 32]);

impl TradeId {
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Option<Self> {
        let decoded = hex::decode(s).ok()?;
        let bytes: [u8; 32] = decoded.try_into().ok()?;
        Some(Self(bytes))
    }
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for TradeId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TradeId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).ok_or_else(|| serde::de::Error::custom("trade id must be 32 hex bytes"))
    }
}

/// Settlement outcome attached to a trade.
///
/// Failure is never silent: a trade whose settlement was rolled back is
/// reported with the classified reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "settlement_status", rename_all = "snake_case")]
pub enum SettlementState {
    Pending,
    Settled { transaction_hash: String },
    Failed { reason: String },
}

impl SettlementState {
    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementState::Settled { .. })
    }
}

/// An execution between one buy and one sell order.
///
/// Execution price is always the resting (maker) order's price. Immutable
/// after creation except for the settlement outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub trade_id: TradeId,
    pub buy_order_id: String,
    pub sell_order_id: String,
    pub buy_user: String,
    pub sell_user: String,
    pub asset_pair: AssetPair,
    pub price: Price,
    pub quantity: Quantity,
    pub timestamp: i64,
    #[serde(flatten)]
    pub settlement: SettlementState,
}

/// On-chain settlement arguments: all amounts as integer stroops
/// (10^7 per unit), decimal products rounded HALF_UP at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementInstruction {
    pub trade_id: TradeId,
    pub buy_user: String,
    pub sell_user: String,
    pub base_asset: String,
    pub quote_asset: String,
    pub base_amount: i128,
    pub quote_amount: i128,
    pub fee_base: i128,
    pub fee_quote: i128,
    pub timestamp: u64,
}

impl SettlementInstruction {
    /// Build the instruction for a trade against resolved token addresses.
    ///
    /// Fees are zero; the engine takes no cut.
    pub fn for_trade(
        trade: &Trade,
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let base_amount = to_stroops(trade.quantity.as_decimal())
            .ok_or_else(|| EngineError::ClientInput("base amount overflows stroop range".into()))?;
        let quote_amount = to_stroops(trade.quantity * trade.price)
            .ok_or_else(|| EngineError::ClientInput("quote amount overflows stroop range".into()))?;

        Ok(Self {
            trade_id: trade.trade_id,
            buy_user: trade.buy_user.clone(),
            sell_user: trade.sell_user.clone(),
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
            base_amount,
            quote_amount,
            fee_base: 0,
            fee_quote: 0,
            timestamp: trade.timestamp.max(0) as u64,
        })
    }
}
