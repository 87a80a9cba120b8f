use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Invalid API response: {0}")]
    ParseError(String),

    #[error("Signing failed: {0}")]
    SignatureError(String),

    /// The exchange answered with a non-empty `error` list.
    #[error("Exchange API error: {}", .messages.join(", "))]
    ExchangeError { messages: Vec<String> },
}

impl ApiError {
    /// True when the exchange rejected the request because of a stale nonce.
    pub fn is_invalid_nonce(&self) -> bool {
        match self {
            ApiError::ExchangeError { messages } => {
                messages.iter().any(|m| m.contains("Invalid nonce"))
            }
            _ => false,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ParseError(err.to_string())
    }
}

impl From<base64::DecodeError> for ApiError {
    fn from(err: base64::DecodeError) -> Self {
        ApiError::SignatureError(format!("API secret is not valid base64: {}", err))
    }
}
