//! Token identifier resolution
//!
//! The API accepts short symbols ("XLM"), 56-char C... contract
//! addresses, or 64-hex contract ids; the engine stores and settles only
//! resolved addresses. The pair itself comes from the contract at
//! startup, so resolution is a closed mapping, not a lookup service.

use types::errors::EngineError;
use types::pair::AssetPair;

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    base_address: String,
    quote_address: String,
    base_symbol: Option<String>,
    quote_symbol: Option<String>,
}

impl TokenRegistry {
    pub fn new(
        base_address: impl Into<String>,
        quote_address: impl Into<String>,
        base_symbol: Option<String>,
        quote_symbol: Option<String>,
    ) -> Self {
        Self {
            base_address: base_address.into(),
            quote_address: quote_address.into(),
            base_symbol,
            quote_symbol,
        }
    }

    pub fn base(&self) -> &str {
        &self.base_address
    }

    pub fn quote(&self) -> &str {
        &self.quote_address
    }

    /// Resolve a client-supplied token identifier to a contract address.
    pub fn resolve(&self, token: &str) -> Option<String> {
        if self.base_symbol.as_deref() == Some(token) {
            return Some(self.base_address.clone());
        }
        if self.quote_symbol.as_deref() == Some(token) {
            return Some(self.quote_address.clone());
        }
        if token == self.base_address || token == self.quote_address {
            return Some(token.to_string());
        }
        // Any well-formed contract strkey passes through unchanged.
        if let Ok(stellar_strkey::Strkey::Contract(_)) = stellar_strkey::Strkey::from_string(token)
        {
            return Some(token.to_string());
        }
        // 64-hex contract id re-encoded as a strkey.
        if token.len() == 64 {
            if let Ok(raw) = hex::decode(token) {
                if let Ok(bytes) = <[u8; 32]>::try_from(raw.as_slice()) {
                    return Some(
                        stellar_strkey::Strkey::Contract(stellar_strkey::Contract(bytes))
                            .to_string(),
                    );
                }
            }
        }
        None
    }

    /// Resolve both legs and require exactly the configured pair.
    pub fn resolve_pair(&self, pair: &AssetPair) -> Result<AssetPair, EngineError> {
        let unsupported = || EngineError::PairNotSupported {
            pair: pair.to_string(),
        };
        let base = self.resolve(&pair.base).ok_or_else(unsupported)?;
        let quote = self.resolve(&pair.quote).ok_or_else(unsupported)?;
        if base != self.base_address || quote != self.quote_address {
            return Err(unsupported());
        }
        Ok(AssetPair::new(base, quote))
    }
}
