//! Environment configuration, loaded once at startup

use matching_engine::SelfTradePolicy;
use serde::Deserialize;

/// Runtime settings, one field per recognized environment key.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Contract the engine settles through; the pair derives from it.
    pub settlement_contract_id: String,

    /// Engine's Ed25519 settlement secret (S... seed or 64 hex chars).
    /// When absent an ephemeral key is generated at startup.
    #[serde(default)]
    pub matching_engine_signing_key: Option<String>,

    #[serde(default = "default_rpc_url")]
    pub soroban_rpc_url: String,

    #[serde(default = "default_network_passphrase")]
    pub network_passphrase: String,

    #[serde(default = "default_rest_port")]
    pub rest_port: u16,

    #[serde(default = "default_cache_ttl")]
    pub balance_cache_ttl_seconds: u64,

    #[serde(default = "default_settlement_timeout")]
    pub settlement_timeout_seconds: u64,

    #[serde(default)]
    pub self_trade_policy: SelfTradePolicy,

    /// Short symbol accepted for the base token (e.g. "XLM").
    #[serde(default)]
    pub base_asset_symbol: Option<String>,

    /// Short symbol accepted for the quote token.
    #[serde(default)]
    pub quote_asset_symbol: Option<String>,
}

fn default_rpc_url() -> String {
    "https://soroban-testnet.stellar.org".to_string()
}

fn default_network_passphrase() -> String {
    "Test SDF Network ; September 2015".to_string()
}

fn default_rest_port() -> u16 {
    8080
}

fn default_cache_ttl() -> u64 {
    30
}

fn default_settlement_timeout() -> u64 {
    30
}

impl Settings {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()
    }
}
