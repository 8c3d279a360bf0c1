//! Identity verification errors

/// Auth result alias
pub type Result<T, E = AuthError> = std::result::Result<T, E>;

/// Why a request carries no usable identity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// No `Authorization` header
    #[error("missing authorization header")]
    MissingToken,

    /// Header or token could not be decoded
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signature does not match the configured key
    #[error("invalid token signature")]
    BadSignature,

    /// Past its `exp` claim
    #[error("token expired at {expired_at}")]
    Expired { expired_at: u64 },

    /// No `exp` claim
    #[error("token has no expiry")]
    MissingExpiry,

    #[error("unexpected issuer: '{0}'")]
    WrongIssuer(String),

    #[error("unexpected audience: '{0}'")]
    WrongAudience(String),

    /// Verified token without an email claim
    #[error("token has no '{0}' claim")]
    MissingEmail(String),

    /// Key material could not be read
    #[error("invalid key: {0}")]
    InvalidKey(String),
}
