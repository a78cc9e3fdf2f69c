//! services/api/src/web/recommendation.rs
//!
//! Maps a top emotion to a catalog search and fetches a handful of tracks.
//! Recommendation failure never aborts a request: every error is logged and
//! degraded to an empty track list.

use crate::web::session::AuthenticatedClient;
use mood_journal_core::domain::{EmotionLabel, TrackItem};
use tracing::{error, warn};

/// Maximum number of tracks returned per recommendation.
pub const RECOMMENDATION_LIMIT: usize = 5;

/// The fixed search phrase for a top label. `None` stands for a label
/// outside the known set and yields the generic fallback phrase.
pub fn search_phrase(label: Option<EmotionLabel>) -> &'static str {
    match label {
        Some(EmotionLabel::Anger) => "angry mix",
        Some(EmotionLabel::Fear) => "soothing mix",
        Some(EmotionLabel::Joy) => "feel good happy mix",
        Some(EmotionLabel::Love) => "love song mix",
        Some(EmotionLabel::Sadness) => "sad crying mix",
        Some(EmotionLabel::Surprise) => "feel good upbeat mix",
        None => "feel good mix",
    }
}

/// Searches for the label's playlist and returns up to
/// [`RECOMMENDATION_LIMIT`] of its tracks.
pub async fn recommend(client: &AuthenticatedClient, label: EmotionLabel) -> Vec<TrackItem> {
    let query = search_phrase(Some(label));

    let playlist = match client.find_playlist(query).await {
        Ok(Some(playlist)) => playlist,
        Ok(None) => {
            warn!("No playlist matched search phrase '{}'", query);
            return Vec::new();
        }
        Err(e) => {
            error!("Error getting music recommendation: {}", e);
            return Vec::new();
        }
    };

    match client
        .playlist_tracks(&playlist.id, RECOMMENDATION_LIMIT)
        .await
    {
        Ok(tracks) => tracks,
        Err(e) => {
            error!(
                "Error fetching tracks from playlist '{}': {}",
                playlist.name, e
            );
            Vec::new()
        }
    }
}
