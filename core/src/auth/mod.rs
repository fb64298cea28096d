//! Authentication - session ownership, identity provider client, token provider

pub mod oauth;
pub mod provider;
pub mod session;

pub use oauth::{DeviceCode, EntraIdentityClient};
pub use provider::{IdentityClient, TokenProvider};
pub use session::{Account, AuthSession, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("identity provider not configured: missing {0}")]
    NotConfigured(&'static str),

    #[error("request to identity provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("identity provider rejected the request: {error} {description}")]
    Rejected { error: String, description: String },

    #[error("sign-in expired before it was completed")]
    Expired,

    #[error("session has no refresh token")]
    NoRefreshToken,

    #[error("invalid id_token: {0}")]
    InvalidIdToken(String),
}
