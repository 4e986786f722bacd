//! Google sign-in bridge.
//!
//! `GET /auth/google` records a login attempt and redirects to the consent
//! screen. The callback resolves the attempt exactly once, exchanges the code
//! for a profile, and renders a page that hands the profile to the opener window.

pub mod cleanup;
pub mod google;
pub mod state;

pub use cleanup::{run_cleanup_worker, CleanupConfig};
pub use google::{GoogleOAuth, UserProfile, GOOGLE_SCOPES};
pub use state::{begin_login_attempt, generate_state_token, hash_state_token, resolve_login_attempt};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Google sign-in is not configured: {0} is unset")]
    NotConfigured(&'static str),
    #[error("login state is missing, unknown, expired or already used")]
    InvalidState,
    #[error("identity provider returned an error: {0}")]
    Provider(String),
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("profile fetch failed: {0}")]
    Profile(String),
    #[error("{0}")]
    Internal(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl OAuthError {
    /// Bridge step the failure happened in, for logs.
    #[must_use]
    pub fn step(&self) -> &'static str {
        match self {
            Self::InvalidState => "state",
            Self::Provider(_) => "consent",
            Self::NotConfigured(_) | Self::TokenExchange(_) => "token_exchange",
            Self::Profile(_) => "profile",
            Self::Internal(_) | Self::Store(_) => "internal",
        }
    }
}
