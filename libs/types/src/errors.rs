//! Error taxonomy shared across the engine, settlement driver, and ingress
//!
//! Every submission failure surfaces as exactly one `EngineError` kind so
//! the REST boundary can map it to a status code without inspecting
//! message text.

use thiserror::Error;

/// Order submission and engine operation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed or out-of-range client input (HTTP 400)
    #[error("invalid order: {0}")]
    ClientInput(String),

    /// Signature or address failure (HTTP 401)
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// The order id is already known, in any status (HTTP 409)
    #[error("duplicate order id: {0}")]
    DuplicateOrderId(String),

    /// Pair is not the one the contract is configured for (HTTP 422)
    #[error("unsupported asset pair: {pair}")]
    PairNotSupported { pair: String },

    /// Balance admission rejected the reservation (HTTP 422)
    #[error("insufficient vault balance: required {required}, available {available}")]
    InsufficientFunds { required: i128, available: i128 },

    /// FOK pre-scan could not cover the full quantity (HTTP 422)
    #[error("fill-or-kill order unfillable: achievable {achievable} of {requested}")]
    FokUnfillable {
        requested: String,
        achievable: String,
    },

    /// The contract rejected a settlement call (HTTP 502)
    #[error("settlement failed: {0}")]
    SettlementFailed(LedgerError),

    /// RPC timeout or connection failure during admission or settlement (HTTP 503)
    #[error("upstream ledger unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Invariant violation; must never happen on valid inputs (HTTP 500)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Classified outcome of a failed ledger interaction.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient vault balance on-chain")]
    InsufficientVaultBalance,

    #[error("engine is not the authorized matcher")]
    UnauthorizedMatcher,

    #[error("settlement authorization revoked")]
    Revoked,

    #[error("contract rejected the call: {0}")]
    Contract(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out: {0}")]
    Timeout(String),
}

impl LedgerError {
    /// Transport-level failures escalate as upstream unavailability;
    /// everything else is a contract-level settlement failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, LedgerError::Network(_) | LedgerError::Timeout(_))
    }
}

impl From<LedgerError> for EngineError {
    fn from(err: LedgerError) -> Self {
        if err.is_transport() {
            EngineError::UpstreamUnavailable(err.to_string())
        } else {
            EngineError::SettlementFailed(err)
        }
    }
}

/// Cancellation outcomes that are not plain success.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CancelError {
    #[error("order not found: {0}")]
    NotFound(String),

    #[error("order belongs to another account")]
    NotOwner,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_errors_escalate_as_upstream() {
        let err: EngineError = LedgerError::Timeout("30s elapsed".into()).into();
        assert!(matches!(err, EngineError::UpstreamUnavailable(_)));

        let err: EngineError = LedgerError::Network("connection refused".into()).into();
        assert!(matches!(err, EngineError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_contract_errors_are_settlement_failures() {
        let err: EngineError = LedgerError::InsufficientVaultBalance.into();
        assert!(matches!(
            err,
            EngineError::SettlementFailed(LedgerError::InsufficientVaultBalance)
        ));
    }

    #[test]
    fn test_display_includes_amounts() {
        let err = EngineError::InsufficientFunds {
            required: 100,
            available: 7,
        };
        let text = err.to_string();
        assert!(text.contains("100"));
        assert!(text.contains('7'));
    }
}
