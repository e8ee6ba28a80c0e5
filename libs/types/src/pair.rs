//! Asset pair identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// A trading pair of opaque token identifiers.
///
/// The API accepts short symbolic names or contract addresses; the engine
/// resolves both sides to contract addresses at admission. A pair stored
/// inside the engine always carries resolved addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub base: String,
    pub quote: String,
}

impl AssetPair {
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            quote: quote.into(),
        }
    }

    /// Parse "BASE/QUOTE" or "BASE-QUOTE".
    pub fn parse(s: &str) -> Option<Self> {
        let sep = if s.contains('/') { '/' } else { '-' };
        let mut parts = s.splitn(2, sep);
        let base = parts.next()?.trim();
        let quote = parts.next()?.trim();
        if base.is_empty() || quote.is_empty() {
            return None;
        }
        Some(Self::new(base, quote))
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}
