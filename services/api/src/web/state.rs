//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use crate::web::session::SessionTokenManager;
use mood_journal_core::ports::{EmotionModel, ExplanationEngine, ModeSelector};
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
///
/// The classifier and explainer are process-wide and stateless per call, so
/// concurrent requests share them read-only. Per-user credentials live in the
/// token manager's session store instead of ambient process state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub classifier: Arc<dyn EmotionModel>,
    pub explainer: Arc<dyn ExplanationEngine>,
    pub mode_selector: Arc<dyn ModeSelector>,
    pub tokens: SessionTokenManager,
}
