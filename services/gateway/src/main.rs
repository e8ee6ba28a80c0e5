mod config;
mod error;
mod handlers;
mod models;
mod rate_limit;
mod router;
mod state;

use config::Settings;
use matching_engine::{EngineConfig, MatchingEngine};
use rand::RngCore;
use router::create_router;
use settlement::rpc::SorobanRpc;
use settlement::{DriverConfig, LedgerClient, SettlementDriver};
use state::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env()?;
    tracing::info!(
        contract = %settings.settlement_contract_id,
        rpc = %settings.soroban_rpc_url,
        "starting dark-pool matching engine"
    );

    let signing_key = match &settings.matching_engine_signing_key {
        Some(secret) => auth::signing_key_from_secret(secret)
            .map_err(|e| anyhow::anyhow!("invalid MATCHING_ENGINE_SIGNING_KEY: {e}"))?,
        None => {
            let mut seed = [0u8; 32];
            rand::rngs::OsRng.fill_bytes(&mut seed);
            let key = ed25519_dalek::SigningKey::from_bytes(&seed);
            tracing::warn!(
                address = %auth::account_address(&key.verifying_key()),
                "no signing key configured, generated an ephemeral one"
            );
            key
        }
    };

    let rpc = SorobanRpc::new(&settings.soroban_rpc_url, Duration::from_secs(10))?;
    let mut driver_config = DriverConfig::new(
        &settings.settlement_contract_id,
        &settings.network_passphrase,
    );
    driver_config.settlement_timeout = Duration::from_secs(settings.settlement_timeout_seconds);

    let driver = SettlementDriver::new(rpc, signing_key, driver_config);
    tracing::info!(engine_address = %driver.engine_address(), "settlement identity ready");
    let ledger: Arc<dyn LedgerClient> = Arc::new(driver);

    let engine = MatchingEngine::bootstrap(
        ledger,
        EngineConfig {
            self_trade_policy: settings.self_trade_policy,
            balance_cache_ttl: Duration::from_secs(settings.balance_cache_ttl_seconds),
            snapshot_depth: 20,
            base_symbol: settings.base_asset_symbol.clone(),
            quote_symbol: settings.quote_asset_symbol.clone(),
        },
    )
    .await?;

    let app = create_router(AppState::new(Arc::new(engine)));

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.rest_port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
