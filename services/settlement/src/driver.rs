//! Settlement driver: the simulate → sign → send → poll pipeline
//!
//! One `settle_trade` call per trade, driven synchronously to a terminal
//! status under a bounded overall timeout. Transient transport errors are
//! retried a fixed number of times; contract rejections are classified and
//! surfaced for the engine's compensation path.

use crate::rpc::{ContractCall, SignedEnvelope, SorobanRpc, TransactionEnvelope};
use crate::LedgerClient;
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::time::Instant;
use types::errors::LedgerError;
use types::trade::SettlementInstruction;

/// Driver tuning knobs.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    pub contract_id: String,
    pub network_passphrase: String,
    /// Overall budget for one settlement, submission through confirmation.
    pub settlement_timeout: Duration,
    /// Retry budget for transient transport failures per pipeline step.
    pub max_transient_retries: u32,
    /// Initial poll interval; doubles up to [`MAX_POLL_INTERVAL`].
    pub poll_interval: Duration,
}

impl DriverConfig {
    pub fn new(contract_id: impl Into<String>, network_passphrase: impl Into<String>) -> Self {
        Self {
            contract_id: contract_id.into(),
            network_passphrase: network_passphrase.into(),
            settlement_timeout: Duration::from_secs(30),
            max_transient_retries: 3,
            poll_interval: Duration::from_millis(500),
        }
    }
}

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(4);

/// RPC-backed [`LedgerClient`].
pub struct SettlementDriver {
    rpc: SorobanRpc,
    signing_key: SigningKey,
    config: DriverConfig,
}

impl SettlementDriver {
    pub fn new(rpc: SorobanRpc, signing_key: SigningKey, config: DriverConfig) -> Self {
        Self {
            rpc,
            signing_key,
            config,
        }
    }

    /// Text address of the engine's settlement identity.
    pub fn engine_address(&self) -> String {
        auth::account_address(&self.signing_key.verifying_key())
    }

    fn envelope(&self, function: &str, args: Vec<serde_json::Value>) -> TransactionEnvelope {
        TransactionEnvelope {
            source_account: self.engine_address(),
            network_passphrase: self.config.network_passphrase.clone(),
            call: ContractCall {
                contract_id: self.config.contract_id.clone(),
                function: function.to_string(),
                args,
            },
            transaction_data: None,
        }
    }

    fn sign_envelope(&self, envelope: TransactionEnvelope) -> SignedEnvelope {
        let digest = envelope_digest(&envelope);
        let signature = self.signing_key.sign(&digest);
        SignedEnvelope {
            envelope,
            signature: hex::encode(signature.to_bytes()),
            public_key: hex::encode(self.signing_key.verifying_key().to_bytes()),
        }
    }

    /// Read-only contract call via simulation, with transient retries.
    async fn simulate_read(
        &self,
        function: &str,
        args: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, LedgerError> {
        let envelope = self.envelope(function, args);
        let mut attempt = 0u32;
        let response = loop {
            match self.rpc.simulate(&envelope).await {
                Ok(r) => break r,
                Err(e) if e.is_transport() && attempt < self.config.max_transient_retries => {
                    attempt += 1;
                    tracing::warn!(function, attempt, error = %e, "transient rpc failure, retrying");
                    tokio::time::sleep(self.config.poll_interval * attempt).await;
                }
                Err(e) => return Err(e),
            }
        };

        if let Some(error) = response.error {
            return Err(classify_contract_error(&error));
        }
        response
            .result
            .ok_or_else(|| LedgerError::Network(format!("{function}: simulation returned no value")))
    }
}

#[async_trait]
impl LedgerClient for SettlementDriver {
    async fn get_pair(&self) -> Result<(String, String), LedgerError> {
        let base = self.simulate_read("get_asset_a", vec![]).await?;
        let quote = self.simulate_read("get_asset_b", vec![]).await?;
        Ok((value_as_address(&base)?, value_as_address(&quote)?))
    }

    async fn get_balance(&self, account: &str, token: &str) -> Result<i128, LedgerError> {
        let value = self
            .simulate_read(
                "get_balance",
                vec![serde_json::json!(account), serde_json::json!(token)],
            )
            .await?;
        value_as_i128(&value)
    }

    async fn settle_trade(
        &self,
        instruction: &SettlementInstruction,
    ) -> Result<String, LedgerError> {
        let deadline = Instant::now() + self.config.settlement_timeout;
        let trade_id = instruction.trade_id.to_hex();
        tracing::info!(%trade_id, "submitting settlement");

        let mut envelope = self.envelope(
            "settle_trade",
            vec![serde_json::to_value(instruction)
                .map_err(|e| LedgerError::Network(e.to_string()))?],
        );

        // Simulate; the contract surfaces deterministic rejections here
        // before anything hits the chain.
        let mut attempt = 0u32;
        let simulation = loop {
            match self.rpc.simulate(&envelope).await {
                Ok(r) => break r,
                Err(e) if e.is_transport() && attempt < self.config.max_transient_retries => {
                    attempt += 1;
                    tracing::warn!(%trade_id, attempt, error = %e, "simulate retry");
                    tokio::time::sleep(self.config.poll_interval * attempt).await;
                }
                Err(e) => return Err(e),
            }
        };
        if let Some(error) = simulation.error {
            return Err(classify_contract_error(&error));
        }
        envelope.transaction_data = simulation.transaction_data;

        // Sign and submit.
        let signed = self.sign_envelope(envelope);
        let mut attempt = 0u32;
        let sent = loop {
            match self.rpc.send(&signed).await {
                Ok(r) => break r,
                Err(e) if e.is_transport() && attempt < self.config.max_transient_retries => {
                    attempt += 1;
                    tracing::warn!(%trade_id, attempt, error = %e, "send retry");
                    tokio::time::sleep(self.config.poll_interval * attempt).await;
                }
                Err(e) => return Err(e),
            }
        };
        if sent.status == "ERROR" {
            let reason = sent.error.unwrap_or_else(|| "submission rejected".into());
            return Err(classify_contract_error(&reason));
        }

        // Poll to a terminal status with exponential backoff.
        let mut interval = self.config.poll_interval;
        loop {
            if Instant::now() >= deadline {
                return Err(LedgerError::Timeout(format!(
                    "settlement polling exceeded {:?} (tx {})",
                    self.config.settlement_timeout, sent.hash
                )));
            }

            match self.rpc.get_transaction(&sent.hash).await {
                Ok(status) => match status.status.as_str() {
                    "SUCCESS" => {
                        tracing::info!(%trade_id, tx_hash = %sent.hash, "settlement confirmed");
                        return Ok(sent.hash);
                    }
                    "FAILED" => {
                        let reason = status
                            .error
                            .unwrap_or_else(|| "transaction failed on-chain".into());
                        return Err(classify_contract_error(&reason));
                    }
                    _ => {}
                },
                // Transient polling errors are absorbed by the deadline.
                Err(e) if e.is_transport() => {
                    tracing::warn!(%trade_id, error = %e, "poll failure, will retry");
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(interval).await;
            interval = (interval * 2).min(MAX_POLL_INTERVAL);
        }
    }
}

/// Digest the engine signs: network passphrase domain-separates the
/// envelope bytes, matching how the chain scopes transaction signatures.
fn envelope_digest(envelope: &TransactionEnvelope) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(envelope.network_passphrase.as_bytes());
    hasher.update(serde_json::to_vec(envelope).expect("envelope serialization must not fail"));
    hasher.finalize().into()
}

/// Map a contract or submission failure message to a classified kind.
fn classify_contract_error(message: &str) -> LedgerError {
    let lower = message.to_ascii_lowercase();
    if lower.contains("insufficient") {
        LedgerError::InsufficientVaultBalance
    } else if lower.contains("unauthorized") || lower.contains("not the matching engine") {
        LedgerError::UnauthorizedMatcher
    } else if lower.contains("revoked") {
        LedgerError::Revoked
    } else {
        LedgerError::Contract(message.to_string())
    }
}

fn value_as_address(value: &serde_json::Value) -> Result<String, LedgerError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| LedgerError::Network(format!("expected address, got {value}")))
}

/// Balances arrive as a JSON number or, for full i128 range, a string.
fn value_as_i128(value: &serde_json::Value) -> Result<i128, LedgerError> {
    if let Some(n) = value.as_i64() {
        return Ok(n as i128);
    }
    if let Some(s) = value.as_str() {
        if let Ok(n) = s.parse::<i128>() {
            return Ok(n);
        }
    }
    Err(LedgerError::Network(format!(
        "expected integer balance, got {value}"
    )))
}
