//! services/api/src/adapters/spotify.rs
//!
//! Adapters for the Spotify Web API: the OAuth boundary (`MusicAuthService`)
//! and catalog reads (`MusicCatalogService`).
//!
//! API documentation: https://developer.spotify.com/documentation/web-api

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use mood_journal_core::{
    domain::{PlaylistRef, TokenSet, TrackItem, UserProfile},
    ports::{MusicAuthService, MusicCatalogService, PortError, PortResult},
};
use reqwest::{StatusCode, Url};
use serde::Deserialize;

const ACCOUNTS_BASE: &str = "https://accounts.spotify.com";
const API_BASE: &str = "https://api.spotify.com/v1";

/// The scope granting read access to the user's library.
const OAUTH_SCOPE: &str = "user-library-read";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    playlists: PlaylistPage,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    // Search pages can contain null entries.
    items: Vec<Option<PlaylistItem>>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    items: Vec<TrackEntry>,
}

#[derive(Debug, Deserialize)]
struct TrackEntry {
    // Absent for removed or local-only tracks.
    track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    name: String,
    #[serde(default)]
    artists: Vec<ArtistObject>,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    name: String,
}

#[derive(Debug, Deserialize, Default)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    id: String,
    display_name: Option<String>,
}

fn token_set_from_response(response: TokenResponse, now: DateTime<Utc>) -> TokenSet {
    TokenSet {
        access_token: response.access_token,
        refresh_token: response.refresh_token,
        expires_at: now + Duration::seconds(response.expires_in),
    }
}

fn playlist_from_response(response: SearchResponse) -> Option<PlaylistRef> {
    response
        .playlists
        .items
        .into_iter()
        .flatten()
        .next()
        .map(|item| PlaylistRef {
            id: item.id,
            name: item.name,
        })
}

fn tracks_from_response(response: TracksResponse) -> Vec<TrackItem> {
    response
        .items
        .into_iter()
        .filter_map(|entry| entry.track)
        .map(|track| TrackItem {
            name: track.name,
            artists: track.artists.into_iter().map(|a| a.name).collect(),
            url: track.external_urls.spotify,
        })
        .collect()
}

/// Maps a non-success response into a `PortError`, surfacing the response
/// body for diagnostics.
async fn check(response: reqwest::Response, what: &str) -> PortResult<reqwest::Response> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(PortError::Unauthorized);
    }
    if !status.is_success() {
        let detail = response.text().await.unwrap_or_default();
        return Err(PortError::Unexpected(format!(
            "{} failed with {}: {}",
            what, status, detail
        )));
    }
    Ok(response)
}

//=========================================================================================
// OAuth Adapter
//=========================================================================================

/// An adapter that implements the `MusicAuthService` port against the
/// Spotify accounts service.
#[derive(Clone)]
pub struct SpotifyAuthAdapter {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    accounts_base: String,
}

impl SpotifyAuthAdapter {
    /// Creates a new `SpotifyAuthAdapter` from the application credentials.
    pub fn new(
        client: reqwest::Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            client,
            client_id,
            client_secret,
            redirect_uri,
            accounts_base: ACCOUNTS_BASE.to_string(),
        }
    }

    fn token_url(&self) -> String {
        format!("{}/api/token", self.accounts_base)
    }

    async fn request_tokens(&self, params: &[(&str, &str)], what: &str) -> PortResult<TokenSet> {
        let response = self
            .client
            .post(self.token_url())
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(params)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("{} request failed: {}", what, e)))?;

        let response = check(response, what).await?;
        let tokens: TokenResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed token response: {}", e)))?;

        Ok(token_set_from_response(tokens, Utc::now()))
    }
}

#[async_trait]
impl MusicAuthService for SpotifyAuthAdapter {
    /// The user-authorization URL to redirect an unauthenticated browser to.
    fn authorize_url(&self) -> String {
        let url = Url::parse_with_params(
            &format!("{}/authorize", self.accounts_base),
            &[
                ("client_id", self.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("scope", OAUTH_SCOPE),
            ],
        )
        .expect("authorize URL is well-formed");
        url.to_string()
    }

    /// Exchanges a callback authorization code for a token set.
    async fn exchange_code(&self, code: &str) -> PortResult<TokenSet> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.redirect_uri.as_str()),
        ];
        self.request_tokens(&params, "Token exchange").await
    }

    /// Trades a refresh token for a fresh access token. Spotify frequently
    /// omits the refresh token on these responses; the caller keeps the old one.
    async fn refresh_token(&self, refresh_token: &str) -> PortResult<TokenSet> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        self.request_tokens(&params, "Token refresh").await
    }
}

//=========================================================================================
// Catalog Adapter
//=========================================================================================

/// An adapter that implements the `MusicCatalogService` port against the
/// Spotify Web API, authenticating each call with the caller's access token.
#[derive(Clone)]
pub struct SpotifyCatalogAdapter {
    client: reqwest::Client,
    api_base: String,
}

impl SpotifyCatalogAdapter {
    /// Creates a new `SpotifyCatalogAdapter`.
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            api_base: API_BASE.to_string(),
        }
    }
}

#[async_trait]
impl MusicCatalogService for SpotifyCatalogAdapter {
    /// Searches for playlists matching `query`, limited to the best match.
    async fn find_playlist(
        &self,
        access_token: &str,
        query: &str,
    ) -> PortResult<Option<PlaylistRef>> {
        let response = self
            .client
            .get(format!("{}/search", self.api_base))
            .query(&[("q", query), ("type", "playlist"), ("limit", "1")])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Playlist search failed: {}", e)))?;

        let response = check(response, "Playlist search").await?;
        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed search response: {}", e)))?;

        Ok(playlist_from_response(body))
    }

    /// Fetches up to `limit` tracks from a playlist.
    async fn playlist_tracks(
        &self,
        access_token: &str,
        playlist_id: &str,
        limit: usize,
    ) -> PortResult<Vec<TrackItem>> {
        let response = self
            .client
            .get(format!("{}/playlists/{}/tracks", self.api_base, playlist_id))
            .query(&[("limit", limit.to_string())])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Track fetch failed: {}", e)))?;

        let response = check(response, "Track fetch").await?;
        let body: TracksResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed tracks response: {}", e)))?;

        Ok(tracks_from_response(body))
    }

    /// The authenticated user's public profile.
    async fn current_user(&self, access_token: &str) -> PortResult<UserProfile> {
        let response = self
            .client
            .get(format!("{}/me", self.api_base))
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Profile fetch failed: {}", e)))?;

        let response = check(response, "Profile fetch").await?;
        let body: UserResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed profile response: {}", e)))?;

        Ok(UserProfile {
            id: body.id,
            display_name: body.display_name,
        })
    }
}
