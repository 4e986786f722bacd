use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use super::templates;
use super::AppState;
use crate::auth::{begin_login_attempt, resolve_login_attempt, OAuthError};

/// Query of `GET /auth/google`.
#[derive(Debug, Default, Deserialize)]
pub struct LoginParams {
    /// Opaque value from the opener, echoed back in the success message.
    nonce: Option<String>,
}

/// Query Google sends to the callback.
#[derive(Debug, Default, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /auth/google - Start a login attempt and redirect to the consent screen.
pub async fn google_login(
    State(state): State<AppState>,
    Query(params): Query<LoginParams>,
) -> Response {
    let token = match begin_login_attempt(
        &state.db,
        params.nonce.as_deref(),
        state.config.login_attempt_ttl,
    )
    .await
    {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(step = e.step(), "Failed to start login attempt: {e:#}");
            return failure_page(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    match state.google.authorize_url(&token) {
        Ok(url) => (StatusCode::FOUND, [(header::LOCATION, url)]).into_response(),
        Err(e) => {
            tracing::error!(step = e.step(), "Failed to build consent URL: {e}");
            failure_page(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /auth/google/callback - Resolve the attempt, exchange the code, hand the profile to the opener.
pub async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error.as_deref() {
        let e = OAuthError::Provider(error.to_string());
        tracing::warn!(step = e.step(), "Google sign-in declined: {e}");
        return failure_page(StatusCode::OK);
    }

    let Some(code) = params.code.as_deref().filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "No code").into_response();
    };

    let Some(token) = params.state.as_deref().filter(|s| !s.is_empty()) else {
        tracing::warn!("Callback without login state");
        return failure_page(StatusCode::BAD_REQUEST);
    };

    let attempt = match resolve_login_attempt(&state.db, token).await {
        Ok(a) => a,
        Err(OAuthError::InvalidState) => return failure_page(StatusCode::BAD_REQUEST),
        Err(e) => {
            tracing::error!(step = e.step(), "Failed to resolve login attempt: {e:#}");
            return failure_page(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let profile = match state.google.exchange_code(code).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(attempt_id = attempt.id, step = e.step(), "Google sign-in failed: {e}");
            return failure_page(StatusCode::OK);
        }
    };

    let page = templates::render_login_success(
        &profile,
        attempt.client_nonce.as_deref(),
        &state.config.client_origin,
        state.config.popup_close_delay,
    );
    Html(page.into_string()).into_response()
}

fn failure_page(status: StatusCode) -> Response {
    (status, Html(templates::render_login_failure().into_string())).into_response()
}
