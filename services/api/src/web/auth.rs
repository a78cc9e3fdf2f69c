//! services/api/src/web/auth.rs
//!
//! The OAuth redirect endpoints: `/login` sends the browser to the music
//! provider's authorization page, `/callback` exchanges the returned code
//! and opens the session.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, warn};

use crate::web::state::AppState;

/// GET /login - redirect to the provider, or straight home when a session
/// already holds a credential.
pub async fn login_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(session_id) = state.tokens.store.session_id_from_headers(&headers) {
        if state.tokens.store.credential(&session_id).await.is_some() {
            return Redirect::to("/home").into_response();
        }
    }
    Redirect::to(&state.tokens.auth.authorize_url()).into_response()
}

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// GET /callback - complete the authorization code flow.
///
/// Success stores the credential in a fresh session and lands on the
/// analysis page; any failure goes back to `/login`.
pub async fn callback_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(reason) = query.error {
        warn!("Authorization was denied: {}", reason);
        return Redirect::to("/login").into_response();
    }
    let Some(code) = query.code else {
        warn!("Callback arrived without an authorization code");
        return Redirect::to("/login").into_response();
    };

    let tokens = match state.tokens.auth.exchange_code(&code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!("Error in callback: {}", e);
            return Redirect::to("/login").into_response();
        }
    };

    match state.tokens.store_tokens(tokens).await {
        Ok(session_id) => {
            let cookie = state.tokens.store.set_cookie_header(&session_id);
            ([(header::SET_COOKIE, cookie)], Redirect::to("/analysis")).into_response()
        }
        Err(e) => {
            error!("Error storing session tokens: {}", e);
            Redirect::to("/login").into_response()
        }
    }
}
