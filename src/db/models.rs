use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Author recorded when a post is submitted without one.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// A user-submitted blog post.
///
/// Serialized with camelCase keys (`authorId`, `createdAt`) since the
/// browser client reads those names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: String,
    pub created_at: String,
}

/// A post ready for insertion. Fields are already validated.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author_id: String,
}

/// Lifecycle of a login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoginAttemptStatus {
    Pending,
    Resolved,
    Expired,
}

impl LoginAttemptStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::Expired => "expired",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "resolved" => Some(Self::Resolved),
            "expired" => Some(Self::Expired),
            _ => None,
        }
    }
}

/// A login started by `GET /auth/google`, keyed by the hash of its state token.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoginAttempt {
    pub id: i64,
    pub state_hash: String,
    pub client_nonce: Option<String>,
    pub status: String,
    pub created_at: String,
    pub expires_at: String,
    pub resolved_at: Option<String>,
}

impl LoginAttempt {
    #[must_use]
    pub fn status_enum(&self) -> Option<LoginAttemptStatus> {
        LoginAttemptStatus::from_str(&self.status)
    }
}

/// Format a timestamp the way every table stores it.
///
/// Fixed-width RFC 3339 in UTC, so SQL string comparison matches time order.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}
