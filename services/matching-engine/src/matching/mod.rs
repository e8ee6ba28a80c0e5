//! Matching rules: crossing predicate, trade construction, self-trade policy.

pub mod crossing;
pub mod executor;

use serde::Deserialize;

/// What happens when an incoming order meets one of its owner's own
/// resting orders at a crossing price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum SelfTradePolicy {
    /// Skip the resting order for this pass; both orders stay intact.
    #[default]
    #[serde(rename = "skip-match")]
    SkipMatch,
    /// Cancel the incoming (newer) order; the book is untouched.
    #[serde(rename = "cancel-newer")]
    CancelNewer,
}

impl std::str::FromStr for SelfTradePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "skip-match" => Ok(SelfTradePolicy::SkipMatch),
            "cancel-newer" => Ok(SelfTradePolicy::CancelNewer),
            other => Err(format!("unknown self-trade policy: {other}")),
        }
    }
}
