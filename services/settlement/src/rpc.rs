//! JSON-RPC transport to the Soroban endpoint
//!
//! Thin request/response plumbing only: contract invocations travel as a
//! structured call description, and the three RPC methods the driver needs
//! are exposed one-to-one (`simulateTransaction`, `sendTransaction`,
//! `getTransaction`). The envelope byte format on the wire is the ledger
//! SDK's concern, not the matching core's; sequencing, signing, and status
//! interpretation live in the driver.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use types::errors::LedgerError;

/// A single contract entry-point invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCall {
    pub contract_id: String,
    pub function: String,
    pub args: Vec<serde_json::Value>,
}

/// Unsigned invocation envelope submitted for simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEnvelope {
    pub source_account: String,
    pub network_passphrase: String,
    pub call: ContractCall,
    /// Resource footprint suggested by simulation; echoed back on submit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_data: Option<String>,
}

/// Envelope plus the engine's Ed25519 signature over its digest.
#[derive(Debug, Clone, Serialize)]
pub struct SignedEnvelope {
    #[serde(flatten)]
    pub envelope: TransactionEnvelope,
    pub signature: String,
    pub public_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub transaction_data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    pub hash: String,
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetTransactionResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<R> {
    result: Option<R>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Soroban JSON-RPC client with a bounded per-call timeout.
pub struct SorobanRpc {
    client: reqwest::Client,
    url: String,
    next_id: AtomicU64,
}

impl SorobanRpc {
    pub fn new(url: impl Into<String>, call_timeout: Duration) -> Result<Self, LedgerError> {
        let client = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .map_err(|e| LedgerError::Network(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, LedgerError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(classify_reqwest)?;

        let body: RpcResponse<R> = response.json().await.map_err(classify_reqwest)?;

        if let Some(err) = body.error {
            return Err(LedgerError::Network(format!(
                "rpc error {}: {}",
                err.code, err.message
            )));
        }
        body.result
            .ok_or_else(|| LedgerError::Network("rpc response missing result".into()))
    }

    pub async fn simulate(
        &self,
        envelope: &TransactionEnvelope,
    ) -> Result<SimulateResponse, LedgerError> {
        self.call("simulateTransaction", [envelope]).await
    }

    pub async fn send(&self, signed: &SignedEnvelope) -> Result<SendResponse, LedgerError> {
        self.call("sendTransaction", [signed]).await
    }

    pub async fn get_transaction(&self, hash: &str) -> Result<GetTransactionResponse, LedgerError> {
        self.call("getTransaction", [hash]).await
    }
}

fn classify_reqwest(err: reqwest::Error) -> LedgerError {
    if err.is_timeout() {
        LedgerError::Timeout(err.to_string())
    } else {
        LedgerError::Network(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_absent_transaction_data() {
        let envelope = TransactionEnvelope {
            source_account: "GENGINE".to_string(),
            network_passphrase: "Test".to_string(),
            call: ContractCall {
                contract_id: "CCONTRACT".to_string(),
                function: "get_balance".to_string(),
                args: vec![serde_json::json!("GUSER")],
            },
            transaction_data: None,
        };
        let json = serde_json::to_string(&envelope).unwrap();
        assert!(!json.contains("transaction_data"));
    }

    #[test]
    fn test_get_transaction_response_tolerates_missing_fields() {
        let parsed: GetTransactionResponse =
            serde_json::from_str("{\"status\":\"NOT_FOUND\"}").unwrap();
        assert_eq!(parsed.status, "NOT_FOUND");
        assert!(parsed.result.is_none());
        assert!(parsed.error.is_none());
    }
}
