use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderValue;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};

use super::auth;
use super::error::ApiError;
use super::AppState;
use crate::db::{get_post, list_posts};
use crate::hashtag::{Hashtag, SearchOutcome};
use crate::posts::{create_post, CreatePost, PostError};

/// Header telling clients whether hashtag results are live or demo data.
pub const HASHTAG_SOURCE_HEADER: &str = "x-hashtag-source";

/// Create the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(health))
        .route("/api/posts", get(list_posts_handler).post(create_post_handler))
        .route("/api/posts/:id", get(get_post_handler))
        .route("/api/twitter/hashtag/:tag", get(hashtag_search))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
}

async fn root() -> &'static str {
    "UGC Blogging Platform Backend"
}

async fn health() -> &'static str {
    "OK"
}

// ========== Posts ==========

async fn list_posts_handler(State(state): State<AppState>) -> Response {
    match list_posts(state.db.pool()).await {
        Ok(posts) => Json(posts).into_response(),
        Err(e) => {
            tracing::error!("Failed to fetch posts: {e:#}");
            ApiError::Internal("Failed to fetch posts".to_string()).into_response()
        }
    }
}

async fn create_post_handler(
    State(state): State<AppState>,
    body: Result<Json<CreatePost>, JsonRejection>,
) -> Response {
    let Json(input) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected post body");
            return ApiError::BadRequest(rejection.body_text()).into_response();
        }
    };

    match create_post(&state.db, input).await {
        Ok(post) => Json(post).into_response(),
        Err(PostError::MissingField(field)) => {
            ApiError::BadRequest(format!("{field} is required")).into_response()
        }
        Err(PostError::Store(e)) => {
            tracing::error!("Failed to create post: {e:#}");
            ApiError::Internal("Failed to create post".to_string()).into_response()
        }
    }
}

async fn get_post_handler(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    match get_post(state.db.pool(), id).await {
        Ok(Some(post)) => Json(post).into_response(),
        Ok(None) => ApiError::NotFound("Post not found".to_string()).into_response(),
        Err(e) => {
            tracing::error!(post_id = id, "Failed to fetch post: {e:#}");
            ApiError::Internal("Failed to fetch post".to_string()).into_response()
        }
    }
}

// ========== Hashtag Search ==========

/// Handler for `GET /api/twitter/hashtag/:tag`.
///
/// With the fallback enabled, a failed search still answers 200 with the demo
/// tweets; the `x-hashtag-source` header says which set was served.
async fn hashtag_search(State(state): State<AppState>, Path(raw): Path<String>) -> Response {
    let Some(tag) = Hashtag::parse(&raw) else {
        return ApiError::BadRequest("Hashtag required".to_string()).into_response();
    };

    let outcome = if state.config.hashtag_fallback_enabled {
        state.hashtag.search_or_fallback(&tag).await
    } else {
        match state.hashtag.search(&tag).await {
            Ok(tweets) => SearchOutcome::Live(tweets),
            Err(e) => {
                tracing::error!(tag = %tag, kind = e.kind(), "Hashtag search failed: {e}");
                return ApiError::BadGateway(format!("Hashtag search unavailable ({})", e.kind()))
                    .into_response();
            }
        }
    };

    let source = HeaderValue::from_static(outcome.source());
    let mut response = Json(outcome.into_tweets()).into_response();
    response.headers_mut().insert(HASHTAG_SOURCE_HEADER, source);
    response
}
