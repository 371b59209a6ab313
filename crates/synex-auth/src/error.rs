//! Authorization and token error types.

use synex_core::error::SynexError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    #[error("access denied")]
    AccessDenied,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for SynexError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::TokenExpired | AuthError::TokenInvalid(_) => {
                SynexError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::AccessDenied => SynexError::Forbidden,
            AuthError::Crypto(msg) => SynexError::Crypto(msg),
        }
    }
}
