use thiserror::Error;

/// Error type for token operations.
///
/// Validation failures are kept distinct so callers can log and report them
/// separately, even though they all map to the same rejection at the edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Failed to encode token: {0}")]
    EncodingFailed(String),

    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token is expired")]
    Expired,
}

impl TokenError {
    /// Stable machine-readable code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            TokenError::EncodingFailed(_) => "TOKEN_ENCODING_FAILED",
            TokenError::Malformed(_) => "MALFORMED_TOKEN",
            TokenError::InvalidSignature => "INVALID_SIGNATURE",
            TokenError::Expired => "TOKEN_EXPIRED",
        }
    }
}
