use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::models::{format_timestamp, LoginAttempt, LoginAttemptStatus, NewPost, Post};

// ========== Posts ==========

/// List every post, newest first.
///
/// Posts inserted within the same microsecond keep insertion order reversed
/// through the id tiebreaker.
pub async fn list_posts(pool: &SqlitePool) -> Result<Vec<Post>> {
    sqlx::query_as("SELECT * FROM posts ORDER BY created_at DESC, id DESC")
        .fetch_all(pool)
        .await
        .context("Failed to list posts")
}

/// Get a post by its ID.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")
}

/// Insert a new post stamped with the current server time, returning the stored row.
pub async fn insert_post(pool: &SqlitePool, post: &NewPost) -> Result<Post> {
    insert_post_at(pool, post, Utc::now()).await
}

/// Insert a new post with an explicit creation time.
pub async fn insert_post_at(
    pool: &SqlitePool,
    post: &NewPost,
    created_at: DateTime<Utc>,
) -> Result<Post> {
    sqlx::query_as(
        r"
        INSERT INTO posts (title, content, author_id, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        ",
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(&post.author_id)
    .bind(format_timestamp(created_at))
    .fetch_one(pool)
    .await
    .context("Failed to insert post")
}

/// Count stored posts.
pub async fn count_posts(pool: &SqlitePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts")
        .fetch_one(pool)
        .await
        .context("Failed to count posts")?;
    Ok(count)
}

// ========== Login Attempts ==========

/// Record a pending login attempt, returning its ID.
pub async fn create_login_attempt(
    pool: &SqlitePool,
    state_hash: &str,
    client_nonce: Option<&str>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO login_attempts (state_hash, client_nonce, status, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?)
        ",
    )
    .bind(state_hash)
    .bind(client_nonce)
    .bind(LoginAttemptStatus::Pending.as_str())
    .bind(format_timestamp(created_at))
    .bind(format_timestamp(expires_at))
    .execute(pool)
    .await
    .context("Failed to create login attempt")?;

    Ok(result.last_insert_rowid())
}

/// Get a login attempt by the hash of its state token.
pub async fn get_login_attempt_by_state_hash(
    pool: &SqlitePool,
    state_hash: &str,
) -> Result<Option<LoginAttempt>> {
    sqlx::query_as("SELECT * FROM login_attempts WHERE state_hash = ?")
        .bind(state_hash)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch login attempt")
}

/// Resolve a pending, unexpired login attempt.
///
/// The conditional update makes resolution single-shot: concurrent or replayed
/// callbacks with the same state see `None`.
pub async fn resolve_login_attempt(
    pool: &SqlitePool,
    state_hash: &str,
    now: DateTime<Utc>,
) -> Result<Option<LoginAttempt>> {
    let now = format_timestamp(now);
    sqlx::query_as(
        r"
        UPDATE login_attempts
        SET status = ?, resolved_at = ?
        WHERE state_hash = ? AND status = ? AND expires_at > ?
        RETURNING *
        ",
    )
    .bind(LoginAttemptStatus::Resolved.as_str())
    .bind(&now)
    .bind(state_hash)
    .bind(LoginAttemptStatus::Pending.as_str())
    .bind(&now)
    .fetch_optional(pool)
    .await
    .context("Failed to resolve login attempt")
}

/// Mark pending attempts past their deadline as expired.
pub async fn expire_login_attempts(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE login_attempts SET status = ? WHERE status = ? AND expires_at <= ?",
    )
    .bind(LoginAttemptStatus::Expired.as_str())
    .bind(LoginAttemptStatus::Pending.as_str())
    .bind(format_timestamp(now))
    .execute(pool)
    .await
    .context("Failed to expire login attempts")?;

    Ok(result.rows_affected())
}

/// Delete finished (resolved or expired) attempts created before `cutoff`.
pub async fn delete_login_attempts_before(
    pool: &SqlitePool,
    cutoff: DateTime<Utc>,
) -> Result<u64> {
    let result = sqlx::query("DELETE FROM login_attempts WHERE status != ? AND created_at < ?")
        .bind(LoginAttemptStatus::Pending.as_str())
        .bind(format_timestamp(cutoff))
        .execute(pool)
        .await
        .context("Failed to delete old login attempts")?;

    Ok(result.rows_affected())
}
