//! Contract read error types.

/// Errors from a single contract read.
#[derive(Debug, thiserror::Error)]
pub enum ChainReadError {
    /// HTTP transport error.
    #[error("HTTP error calling {call}: {source}")]
    Http {
        call: String,
        source: reqwest::Error,
    },
    /// The read did not complete within its time bound.
    #[error("{call} timed out")]
    Timeout { call: String },
    /// RPC endpoint returned a non-2xx status.
    #[error("RPC endpoint returned {status} for {call}: {body}")]
    HttpStatus {
        call: String,
        status: u16,
        body: String,
    },
    /// JSON-RPC error object other than an execution revert.
    #[error("RPC error {code} for {call}: {message}")]
    Rpc {
        call: String,
        code: i64,
        message: String,
    },
    /// The contract call reverted.
    #[error("{call} reverted: {reason}")]
    Reverted { call: String, reason: String },
    /// `eth_call` returned no data: nothing is deployed at the address.
    #[error("no contract deployed at {address}")]
    NoContract { address: String },
    /// Return data or JSON-RPC envelope did not have the expected shape.
    #[error("failed to decode {call} response: {reason}")]
    Decode { call: String, reason: String },
}

impl ChainReadError {
    /// Whether the failure is a property of the transport or node rather
    /// than of the contract state. Transient reads are retried.
    ///
    /// Of the HTTP statuses only 429 and 5xx count: any other status
    /// will not change on a second attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::Timeout { .. } | Self::Rpc { .. } => true,
            Self::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Self::Reverted { .. } | Self::NoContract { .. } | Self::Decode { .. } => false,
        }
    }
}
