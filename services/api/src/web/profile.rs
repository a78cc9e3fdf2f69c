//! services/api/src/web/profile.rs
//!
//! The post-login landing page showing the authenticated user's public
//! profile.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use mood_journal_core::ports::PortError;
use std::sync::Arc;
use tracing::error;

use crate::web::{pages, state::AppState};

/// GET /home - profile info, or a redirect to `/login` without a usable
/// credential.
pub async fn home_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let Some(session_id) = state.tokens.store.session_id_from_headers(&headers) else {
        return Redirect::to("/login").into_response();
    };
    let Some(client) = state.tokens.get_client(&session_id).await else {
        return Redirect::to("/login").into_response();
    };

    match client.current_user().await {
        Ok(profile) => Html(pages::home_page(&profile)).into_response(),
        Err(PortError::Unauthorized) => Redirect::to("/login").into_response(),
        Err(e) => {
            error!("Error getting user info: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::server_error_page()),
            )
                .into_response()
        }
    }
}
