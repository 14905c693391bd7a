/// Failure of a single transaction lookup.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("unsupported chain '{0}'")]
    UnsupportedChain(String),

    #[error("'{0}' is not a transaction hash (0x + 64 hex chars)")]
    InvalidHash(String),

    #[error("missing explorer API key (set ETHERSCAN_API_KEY)")]
    MissingCredential,

    #[error("explorer request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("explorer returned no usable result: {0}")]
    InvalidResult(String),

    #[error("transaction {0} is still pending")]
    Pending(String),
}

impl FetchError {
    /// Errors worth another attempt against the explorer.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::InvalidResult(_))
    }
}

/// Failure of a single exchange-rate source.
#[derive(Debug, thiserror::Error)]
pub enum RateError {
    #[error("rate request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate response is missing '{0}'")]
    MissingField(&'static str),

    #[error("rate source returned a non-positive value: {0}")]
    NonPositive(f64),
}

impl RateError {
    /// Network-level failures are retried; bad payloads are not.
    pub fn is_transient(&self) -> bool {
        match self {
            RateError::Http(e) => is_retryable_http(e),
            _ => false,
        }
    }
}

/// Timeouts, connection failures, 5xx and 429 responses.
pub fn is_retryable_http(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_connect() {
        return true;
    }
    match err.status() {
        Some(status) => {
            status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(FetchError::InvalidResult("Max rate limit reached".into()).is_transient());
        assert!(!FetchError::MissingCredential.is_transient());
        assert!(!FetchError::UnsupportedChain("goerli".into()).is_transient());
        assert!(!FetchError::Pending("0xabc".into()).is_transient());
        assert!(!FetchError::InvalidHash("0x1234".into()).is_transient());
        assert!(!RateError::MissingField("price").is_transient());
        assert!(!RateError::NonPositive(0.0).is_transient());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            FetchError::UnsupportedChain("goerli".into()).to_string(),
            "unsupported chain 'goerli'"
        );
        assert_eq!(
            RateError::MissingField("rates.IDR").to_string(),
            "rate response is missing 'rates.IDR'"
        );
    }
}
