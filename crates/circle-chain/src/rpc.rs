//! # JSON-RPC Contract Reader
//!
//! [`CircleReader`] over an EVM JSON-RPC endpoint. Every read is an
//! `eth_call` against the `latest` block; nothing is signed or sent.
//! The same reader serves circle, registry and factory contracts.
//!
//! ## Error Mapping
//!
//! | Outcome | Error | Retried |
//! |---------|-------|---------|
//! | connection failure | [`ChainReadError::Http`] | yes |
//! | HTTP client timeout | [`ChainReadError::Timeout`] | yes |
//! | HTTP 429 or 5xx | [`ChainReadError::HttpStatus`] | yes |
//! | other non-2xx HTTP status | [`ChainReadError::HttpStatus`] | no |
//! | JSON-RPC error mentioning a revert, or code 3 | [`ChainReadError::Reverted`] | no |
//! | any other JSON-RPC error | [`ChainReadError::Rpc`] | yes |
//! | `"0x"` result (no code at address) | [`ChainReadError::NoContract`] | no |
//! | malformed envelope or return data | [`ChainReadError::Decode`] | no |
//!
//! Retries follow [`ChainConfig::max_retries`] with exponential backoff.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use circle_core::{Address, CircleStatus, CreditProfile, U256};
use serde_json::{json, Value};
use url::Url;

use crate::abi::{self, Function, Token};
use crate::config::ChainConfig;
use crate::error::ChainReadError;
use crate::reader::{CircleReader, CircleUint};
use crate::retry::with_retry;

/// JSON-RPC error code geth-compatible nodes use for execution reverts.
const REVERT_ERROR_CODE: i64 = 3;

/// Reads circle and registry contracts over JSON-RPC.
#[derive(Debug)]
pub struct RpcCircleReader {
    http: reqwest::Client,
    rpc_url: Url,
    max_retries: u32,
    next_id: AtomicU64,
}

impl RpcCircleReader {
    /// Create a reader from configuration.
    pub fn new(config: &ChainConfig) -> Result<Self, ChainReadError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChainReadError::Http {
                call: "client_init".into(),
                source: e,
            })?;

        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            max_retries: config.max_retries,
            next_id: AtomicU64::new(1),
        })
    }

    /// The endpoint this reader talks to.
    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    /// `eth_chainId` of the connected node.
    pub async fn chain_id(&self) -> Result<u64, ChainReadError> {
        let call = "eth_chainId";
        let result = self.rpc_call(call, call, json!([])).await?;
        let quantity = result.as_str().ok_or_else(|| ChainReadError::Decode {
            call: call.into(),
            reason: "result is not a string".into(),
        })?;
        u64::from_str_radix(quantity.trim_start_matches("0x"), 16).map_err(|e| {
            ChainReadError::Decode {
                call: call.into(),
                reason: format!("invalid quantity {quantity:?}: {e}"),
            }
        })
    }

    /// Send a JSON-RPC request and return the `result` field, retrying
    /// transient failures.
    async fn rpc_call(&self, call: &str, method: &str, params: Value) -> Result<Value, ChainReadError> {
        with_retry(call, self.max_retries, || self.rpc_attempt(call, method, &params)).await
    }

    /// One JSON-RPC round trip, classified into a [`ChainReadError`].
    async fn rpc_attempt(&self, call: &str, method: &str, params: &Value) -> Result<Value, ChainReadError> {
        let body = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": self.next_id.fetch_add(1, Ordering::Relaxed),
        });

        let resp = self
            .http
            .post(self.rpc_url.clone())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainReadError::Timeout { call: call.into() }
                } else {
                    ChainReadError::Http {
                        call: call.into(),
                        source: e,
                    }
                }
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChainReadError::HttpStatus {
                call: call.into(),
                status,
                body,
            });
        }

        let envelope: Value = resp.json().await.map_err(|e| ChainReadError::Decode {
            call: call.into(),
            reason: format!("invalid JSON-RPC envelope: {e}"),
        })?;

        if let Some(error) = envelope.get("error") {
            let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown RPC error")
                .to_string();
            if code == REVERT_ERROR_CODE || message.to_ascii_lowercase().contains("revert") {
                return Err(ChainReadError::Reverted {
                    call: call.into(),
                    reason: message,
                });
            }
            return Err(ChainReadError::Rpc {
                call: call.into(),
                code,
                message,
            });
        }

        envelope
            .get("result")
            .cloned()
            .ok_or_else(|| ChainReadError::Decode {
                call: call.into(),
                reason: "JSON-RPC response missing 'result' field".into(),
            })
    }

    /// `eth_call` a view function and return the raw return data.
    async fn eth_call(
        &self,
        to: &Address,
        function: &Function,
        args: &[Token],
    ) -> Result<Vec<u8>, ChainReadError> {
        let tx = json!({
            "to": to.to_lowercase_hex(),
            "data": abi::encode_call_hex(function, args),
        });
        tracing::debug!(contract = %to, function = function.signature, "eth_call");

        let result = self
            .rpc_call(function.name, "eth_call", json!([tx, "latest"]))
            .await?;
        let raw = result.as_str().ok_or_else(|| ChainReadError::Decode {
            call: function.name.into(),
            reason: "result is not a hex string".into(),
        })?;
        let data = hex::decode(raw.trim_start_matches("0x")).map_err(|e| ChainReadError::Decode {
            call: function.name.into(),
            reason: format!("invalid hex: {e}"),
        })?;

        if data.is_empty() {
            return Err(ChainReadError::NoContract {
                address: to.to_string(),
            });
        }
        Ok(data)
    }

    async fn call_decoded<T>(
        &self,
        to: &Address,
        function: &Function,
        args: &[Token],
        decode: fn(&[u8]) -> Result<T, abi::AbiError>,
    ) -> Result<T, ChainReadError> {
        let data = self.eth_call(to, function, args).await?;
        decode(&data).map_err(|e| ChainReadError::Decode {
            call: function.name.into(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl CircleReader for RpcCircleReader {
    async fn candidates(&self, circle: &Address, month: u64) -> Result<Vec<Address>, ChainReadError> {
        self.call_decoded(
            circle,
            &abi::GET_CANDIDATES,
            &[Token::Uint(U256::from(month))],
            abi::decode_address_array,
        )
        .await
    }

    async fn candidate_votes(
        &self,
        circle: &Address,
        month: u64,
        candidate: &Address,
    ) -> Result<U256, ChainReadError> {
        self.call_decoded(
            circle,
            &abi::GET_CANDIDATE_VOTES,
            &[Token::Uint(U256::from(month)), Token::Address(candidate.clone())],
            abi::decode_uint,
        )
        .await
    }

    async fn winner(&self, circle: &Address, month: u64) -> Result<Address, ChainReadError> {
        self.call_decoded(
            circle,
            &abi::GET_WINNER,
            &[Token::Uint(U256::from(month))],
            abi::decode_address,
        )
        .await
    }

    async fn voting_period_ended(&self, circle: &Address, month: u64) -> Result<bool, ChainReadError> {
        self.call_decoded(
            circle,
            &abi::IS_VOTING_PERIOD_ENDED,
            &[Token::Uint(U256::from(month))],
            abi::decode_bool,
        )
        .await
    }

    async fn credit_registry(&self, circle: &Address) -> Result<Address, ChainReadError> {
        self.call_decoded(circle, &abi::CREDIT_REGISTRY, &[], abi::decode_address)
            .await
    }

    async fn circle_uint(&self, circle: &Address, field: CircleUint) -> Result<U256, ChainReadError> {
        self.call_decoded(circle, field.function(), &[], abi::decode_uint)
            .await
    }

    async fn creator(&self, circle: &Address) -> Result<Address, ChainReadError> {
        self.call_decoded(circle, &abi::CREATOR, &[], abi::decode_address)
            .await
    }

    async fn status(&self, circle: &Address) -> Result<CircleStatus, ChainReadError> {
        self.call_decoded(circle, &abi::STATUS, &[], abi::decode_status)
            .await
    }

    async fn credit_score(&self, registry: &Address, account: &Address) -> Result<U256, ChainReadError> {
        self.call_decoded(
            registry,
            &abi::GET_CREDIT_SCORE,
            &[Token::Address(account.clone())],
            abi::decode_uint,
        )
        .await
    }

    async fn credit_profile(
        &self,
        registry: &Address,
        account: &Address,
    ) -> Result<CreditProfile, ChainReadError> {
        self.call_decoded(
            registry,
            &abi::GET_CREDIT_PROFILE,
            &[Token::Address(account.clone())],
            abi::decode_credit_profile,
        )
        .await
    }

    async fn circle_count(&self, factory: &Address) -> Result<U256, ChainReadError> {
        self.call_decoded(factory, &abi::GET_CIRCLE_COUNT, &[], abi::decode_uint)
            .await
    }

    async fn circles(&self, factory: &Address, offset: u64, limit: u64) -> Result<Vec<Address>, ChainReadError> {
        self.call_decoded(
            factory,
            &abi::GET_CIRCLES,
            &[Token::Uint(U256::from(offset)), Token::Uint(U256::from(limit))],
            abi::decode_address_array,
        )
        .await
    }

    async fn user_circles(&self, factory: &Address, user: &Address) -> Result<Vec<Address>, ChainReadError> {
        self.call_decoded(
            factory,
            &abi::GET_USER_CIRCLES,
            &[Token::Address(user.clone())],
            abi::decode_address_array,
        )
        .await
    }
}
