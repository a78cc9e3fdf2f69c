//! services/api/src/web/analysis.rs
//!
//! The analysis endpoints: the journal entry form and the submission that
//! drives one full analysis cycle.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::web::{
    analysis_task,
    pages,
    session::AuthenticatedClient,
    state::AppState,
};

/// Resolves the request's session into an authenticated client, refreshing
/// the credential when needed. `None` sends the user back to `/login`.
async fn authenticated(
    state: &AppState,
    headers: &HeaderMap,
) -> Option<(String, AuthenticatedClient)> {
    let session_id = state.tokens.store.session_id_from_headers(headers)?;
    let client = state.tokens.get_client(&session_id).await?;
    Some((session_id, client))
}

/// GET /analysis - the journal input form.
pub async fn analysis_form_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    if authenticated(&state, &headers).await.is_none() {
        return Redirect::to("/login").into_response();
    }
    Html(pages::analysis_form_page()).into_response()
}

#[derive(Deserialize)]
pub struct AnalysisForm {
    #[serde(default)]
    pub input_value: String,
}

/// POST /analysis - run one analysis cycle and render the results.
///
/// A classifier fault is the only fatal outcome and renders the error page;
/// everything else produces a results page, possibly with empty fields.
pub async fn analysis_submit_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<AnalysisForm>,
) -> Response {
    let Some((session_id, client)) = authenticated(&state, &headers).await else {
        return Redirect::to("/login").into_response();
    };

    match analysis_task::run_analysis(&state, &client, &session_id, &form.input_value).await {
        Ok(outcome) => Html(pages::results_page(&outcome)).into_response(),
        Err(e) => {
            error!("Analysis failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(pages::server_error_page()),
            )
                .into_response()
        }
    }
}
