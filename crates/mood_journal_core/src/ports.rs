//! crates/mood_journal_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like model hosts or APIs.

use async_trait::async_trait;
use crate::domain::{
    EmotionDistribution, EmotionLabel, ExplanationMode, PlaylistRef, TokenSet, TrackItem,
    UserProfile,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., model host, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The black-box emotion classifier.
///
/// One call scores one text and yields exactly one probability per label in
/// the fixed set, alphabetically ordered. Failure here is fatal to a request.
#[async_trait]
pub trait EmotionModel: Send + Sync {
    async fn score(&self, text: &str) -> PortResult<EmotionDistribution>;
}

/// The black-box perturbation explainer.
///
/// Probes `model` with perturbed variants of `text`, constrained to the
/// `target` label, and renders the result as an HTML fragment. Probe and
/// sample bounds are implementation configuration.
#[async_trait]
pub trait ExplanationEngine: Send + Sync {
    async fn explain(
        &self,
        text: &str,
        model: &dyn EmotionModel,
        target: EmotionLabel,
    ) -> PortResult<String>;
}

/// The music provider's OAuth boundary: authorization URL, code exchange,
/// and token refresh. Protocol details stay behind this trait.
#[async_trait]
pub trait MusicAuthService: Send + Sync {
    fn authorize_url(&self) -> String;

    async fn exchange_code(&self, code: &str) -> PortResult<TokenSet>;

    async fn refresh_token(&self, refresh_token: &str) -> PortResult<TokenSet>;
}

/// Read access to the external music catalog with a caller-supplied
/// access token.
#[async_trait]
pub trait MusicCatalogService: Send + Sync {
    /// Searches for playlists matching `query`, limited to the single best
    /// match.
    async fn find_playlist(&self, access_token: &str, query: &str)
        -> PortResult<Option<PlaylistRef>>;

    /// Fetches up to `limit` tracks from a playlist.
    async fn playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        limit: usize,
    ) -> PortResult<Vec<TrackItem>>;

    /// The authenticated user's public profile.
    async fn current_user(&self, access_token: &str) -> PortResult<UserProfile>;
}

/// Picks the explanation strategy for one request.
///
/// Production uses a uniformly random choice over the three modes; tests
/// substitute a fixed selector so every branch is deterministic.
pub trait ModeSelector: Send + Sync {
    fn pick(&self) -> ExplanationMode;
}
