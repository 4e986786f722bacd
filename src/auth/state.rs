//! Single-use state tokens binding an OAuth callback to the redirect that started it.

use std::time::Duration;

use chrono::Utc;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::OAuthError;
use crate::db::{self, Database, LoginAttempt};

/// Longest client nonce echoed back to the opener.
pub const MAX_NONCE_LEN: usize = 128;

/// Generate a random state token.
pub fn generate_state_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Hash a state token for storage. Only the hash is ever persisted.
#[must_use]
pub fn hash_state_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Keep a client nonce only if it is short and URL-safe.
#[must_use]
pub fn sanitize_nonce(nonce: Option<&str>) -> Option<&str> {
    nonce.filter(|n| {
        !n.is_empty()
            && n.len() <= MAX_NONCE_LEN
            && n
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    })
}

/// Start a login attempt, returning the raw state token for the consent URL.
///
/// # Errors
///
/// Returns an error if the attempt cannot be stored.
pub async fn begin_login_attempt(
    db: &Database,
    client_nonce: Option<&str>,
    ttl: Duration,
) -> Result<String, OAuthError> {
    let token = generate_state_token();
    let now = Utc::now();
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::minutes(10));

    let id = db::create_login_attempt(
        db.pool(),
        &hash_state_token(&token),
        sanitize_nonce(client_nonce),
        now,
        now + ttl,
    )
    .await?;

    debug!(attempt_id = id, "Login attempt started");
    Ok(token)
}

/// Resolve the attempt owning `token`.
///
/// Succeeds at most once per token, and only before the attempt expires.
///
/// # Errors
///
/// Returns [`OAuthError::InvalidState`] if the token is unknown, expired or
/// already used.
pub async fn resolve_login_attempt(db: &Database, token: &str) -> Result<LoginAttempt, OAuthError> {
    let hash = hash_state_token(token);
    match db::resolve_login_attempt(db.pool(), &hash, Utc::now()).await? {
        Some(attempt) => {
            debug!(attempt_id = attempt.id, "Login attempt resolved");
            Ok(attempt)
        }
        None => {
            warn!("Callback presented an unknown, expired or reused login state");
            Err(OAuthError::InvalidState)
        }
    }
}
