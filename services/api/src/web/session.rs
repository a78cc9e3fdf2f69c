//! services/api/src/web/session.rs
//!
//! The per-browser-session credential store and the token manager that
//! produces authenticated catalog clients from it.
//!
//! Sessions live in process memory only; with a random per-process secret
//! key they do not survive restarts, which matches the bounded lifetime of
//! the stored credential.

use axum::http::{header, HeaderMap};
use chrono::Utc;
use mood_journal_core::{
    domain::{PlaylistRef, SessionCredential, TokenSet, TrackItem, UserProfile},
    ports::{MusicAuthService, MusicCatalogService, PortError, PortResult},
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

//=========================================================================================
// SessionStore
//=========================================================================================

/// In-memory store of session credentials, keyed by session id.
///
/// Cookie values are `<id>.<sig>` where `sig` is a keyed SHA-256 hash of the
/// id under the configured secret, so a forged or tampered cookie never
/// resolves to a session.
#[derive(Clone)]
pub struct SessionStore {
    secret: Arc<String>,
    inner: Arc<RwLock<HashMap<String, SessionCredential>>>,
}

impl SessionStore {
    /// Creates an empty store signing cookies with `secret`.
    pub fn new(secret: String) -> Self {
        Self {
            secret: Arc::new(secret),
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a new session holding `credential` and returns its id.
    pub async fn insert_new(&self, credential: SessionCredential) -> String {
        let id = Uuid::new_v4().to_string();
        self.inner.write().await.insert(id.clone(), credential);
        id
    }

    /// The credential for a session, if any.
    pub async fn credential(&self, session_id: &str) -> Option<SessionCredential> {
        self.inner.read().await.get(session_id).cloned()
    }

    /// Replaces the credential for an existing session.
    pub async fn set_credential(&self, session_id: &str, credential: SessionCredential) {
        self.inner
            .write()
            .await
            .insert(session_id.to_string(), credential);
    }

    /// Removes the session's credential. Idempotent: clearing an already
    /// cleared (or unknown) session is a no-op.
    pub async fn clear(&self, session_id: &str) {
        self.inner.write().await.remove(session_id);
    }

    fn sign(&self, session_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.secret.as_bytes());
        hasher.update(b".");
        hasher.update(session_id.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// The signed cookie value for a session id.
    pub fn cookie_value(&self, session_id: &str) -> String {
        format!("{}.{}", session_id, self.sign(session_id))
    }

    /// Verifies a cookie value and returns the session id it names.
    pub fn verify_cookie(&self, value: &str) -> Option<String> {
        let (id, sig) = value.rsplit_once('.')?;
        if sig == self.sign(id) {
            Some(id.to_string())
        } else {
            None
        }
    }

    /// The full `Set-Cookie` header value for a session. Session-scoped on
    /// purpose: no Max-Age, so the cookie dies with the browser session.
    pub fn set_cookie_header(&self, session_id: &str) -> String {
        format!(
            "{}={}; HttpOnly; Secure; SameSite=Lax; Path=/",
            SESSION_COOKIE,
            self.cookie_value(session_id)
        )
    }

    /// Extracts and verifies the session id from a request's cookies.
    pub fn session_id_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
        let value = cookie_header.split(';').find_map(|c| {
            let c = c.trim();
            c.strip_prefix("session=")
        })?;
        self.verify_cookie(value)
    }
}

//=========================================================================================
// AuthenticatedClient
//=========================================================================================

/// A catalog client bound to one valid access token, sufficient for the
/// external catalog's read endpoints.
#[derive(Clone)]
pub struct AuthenticatedClient {
    access_token: String,
    catalog: Arc<dyn MusicCatalogService>,
}

impl AuthenticatedClient {
    pub fn new(access_token: String, catalog: Arc<dyn MusicCatalogService>) -> Self {
        Self {
            access_token,
            catalog,
        }
    }

    pub async fn find_playlist(&self, query: &str) -> PortResult<Option<PlaylistRef>> {
        self.catalog.find_playlist(&self.access_token, query).await
    }

    pub async fn playlist_tracks(
        &self,
        playlist_id: &str,
        limit: usize,
    ) -> PortResult<Vec<TrackItem>> {
        self.catalog
            .playlist_tracks(&self.access_token, playlist_id, limit)
            .await
    }

    pub async fn current_user(&self) -> PortResult<UserProfile> {
        self.catalog.current_user(&self.access_token).await
    }
}

//=========================================================================================
// SessionTokenManager
//=========================================================================================

/// Owns the session credential lifecycle: storing tokens at callback time,
/// refreshing them on expiry, and clearing them after an analysis cycle.
#[derive(Clone)]
pub struct SessionTokenManager {
    pub store: SessionStore,
    pub auth: Arc<dyn MusicAuthService>,
    pub catalog: Arc<dyn MusicCatalogService>,
}

impl SessionTokenManager {
    pub fn new(
        store: SessionStore,
        auth: Arc<dyn MusicAuthService>,
        catalog: Arc<dyn MusicCatalogService>,
    ) -> Self {
        Self {
            store,
            auth,
            catalog,
        }
    }

    /// Stores the tokens from a completed code exchange in a fresh session
    /// and returns the session id. The exchange must have produced a refresh
    /// token; without one the session could never outlive the access token.
    pub async fn store_tokens(&self, tokens: TokenSet) -> PortResult<String> {
        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            PortError::Unexpected("Token exchange response had no refresh token".to_string())
        })?;
        let credential = SessionCredential {
            access_token: tokens.access_token,
            refresh_token,
            expires_at: tokens.expires_at,
        };
        Ok(self.store.insert_new(credential).await)
    }

    /// An authenticated catalog client for the session, refreshing the
    /// credential first if it has expired.
    ///
    /// `None` means the caller must send the user back to authentication:
    /// either there is no credential, or the refresh failed.
    pub async fn get_client(&self, session_id: &str) -> Option<AuthenticatedClient> {
        let credential = self.store.credential(session_id).await?;

        let credential = if credential.is_expired(Utc::now()) {
            match self.auth.refresh_token(&credential.refresh_token).await {
                Ok(tokens) => {
                    let updated = credential.refreshed(tokens);
                    self.store.set_credential(session_id, updated.clone()).await;
                    updated
                }
                Err(e) => {
                    error!("Failed to refresh music provider token: {}", e);
                    return None;
                }
            }
        } else {
            credential
        };

        Some(AuthenticatedClient::new(
            credential.access_token,
            self.catalog.clone(),
        ))
    }

    /// Unconditionally removes the session's credential.
    pub async fn clear(&self, session_id: &str) {
        self.store.clear(session_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubAuth {
        refresh_result: fn() -> PortResult<TokenSet>,
        refresh_calls: AtomicUsize,
    }

    #[async_trait]
    impl MusicAuthService for StubAuth {
        fn authorize_url(&self) -> String {
            "https://auth.example/authorize".to_string()
        }

        async fn exchange_code(&self, _code: &str) -> PortResult<TokenSet> {
            Err(PortError::Unexpected("not used".to_string()))
        }

        async fn refresh_token(&self, _refresh_token: &str) -> PortResult<TokenSet> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            (self.refresh_result)()
        }
    }

    struct StubCatalog;

    #[async_trait]
    impl MusicCatalogService for StubCatalog {
        async fn find_playlist(
            &self,
            _access_token: &str,
            _query: &str,
        ) -> PortResult<Option<PlaylistRef>> {
            Ok(None)
        }

        async fn playlist_tracks(
            &self,
            _access_token: &str,
            _playlist_id: &str,
            _limit: usize,
        ) -> PortResult<Vec<TrackItem>> {
            Ok(Vec::new())
        }

        async fn current_user(&self, _access_token: &str) -> PortResult<UserProfile> {
            Ok(UserProfile {
                id: "user".to_string(),
                display_name: None,
            })
        }
    }

    fn manager_with(refresh_result: fn() -> PortResult<TokenSet>) -> SessionTokenManager {
        SessionTokenManager::new(
            SessionStore::new("test-secret".to_string()),
            Arc::new(StubAuth {
                refresh_result,
                refresh_calls: AtomicUsize::new(0),
            }),
            Arc::new(StubCatalog),
        )
    }

    fn expired_credential() -> SessionCredential {
        SessionCredential {
            access_token: "stale".to_string(),
            refresh_token: "refresh-me".to_string(),
            expires_at: Utc::now() - Duration::hours(1),
        }
    }

    #[test]
    fn cookie_round_trip_and_tamper_rejection() {
        let store = SessionStore::new("k1".to_string());
        let value = store.cookie_value("abc-123");
        assert_eq!(store.verify_cookie(&value), Some("abc-123".to_string()));

        // Flip the id: the signature no longer matches.
        let forged = value.replacen("abc-123", "abc-124", 1);
        assert_eq!(store.verify_cookie(&forged), None);
        // No signature at all.
        assert_eq!(store.verify_cookie("abc-123"), None);

        // A different key never validates the first key's cookies.
        let other = SessionStore::new("k2".to_string());
        assert_eq!(other.verify_cookie(&value), None);
    }

    #[test]
    fn session_id_is_parsed_from_the_cookie_header() {
        let store = SessionStore::new("k1".to_string());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            format!("theme=dark; session={}", store.cookie_value("id-9"))
                .parse()
                .unwrap(),
        );
        assert_eq!(
            store.session_id_from_headers(&headers),
            Some("id-9".to_string())
        );
    }

    #[tokio::test]
    async fn no_credential_means_no_client() {
        let manager = manager_with(|| Err(PortError::Unexpected("unused".to_string())));
        assert!(manager.get_client("missing").await.is_none());
    }

    #[tokio::test]
    async fn valid_credential_yields_a_client_without_refreshing() {
        let manager = manager_with(|| Err(PortError::Unexpected("should not refresh".into())));
        let id = manager
            .store
            .insert_new(SessionCredential {
                access_token: "fresh".to_string(),
                refresh_token: "r".to_string(),
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await;
        assert!(manager.get_client(&id).await.is_some());
    }

    #[tokio::test]
    async fn expired_credential_with_failing_refresh_yields_none() {
        let manager = manager_with(|| Err(PortError::Unauthorized));
        let id = manager.store.insert_new(expired_credential()).await;
        assert!(manager.get_client(&id).await.is_none());
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed_and_stored() {
        let manager = manager_with(|| {
            Ok(TokenSet {
                access_token: "renewed".to_string(),
                refresh_token: None,
                expires_at: Utc::now() + Duration::hours(1),
            })
        });
        let id = manager.store.insert_new(expired_credential()).await;

        assert!(manager.get_client(&id).await.is_some());

        let stored = manager.store.credential(&id).await.unwrap();
        assert_eq!(stored.access_token, "renewed");
        // The provider omitted a refresh token, so the old one survives.
        assert_eq!(stored.refresh_token, "refresh-me");
    }

    #[tokio::test]
    async fn store_tokens_requires_a_refresh_token() {
        let manager = manager_with(|| Err(PortError::Unexpected("unused".into())));
        let result = manager
            .store_tokens(TokenSet {
                access_token: "a".to_string(),
                refresh_token: None,
                expires_at: Utc::now(),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn clearing_is_idempotent() {
        let manager = manager_with(|| Err(PortError::Unexpected("unused".into())));
        let id = manager.store.insert_new(expired_credential()).await;

        manager.clear(&id).await;
        assert!(manager.store.credential(&id).await.is_none());

        // Second clear of the same session is harmless.
        manager.clear(&id).await;
        assert!(manager.store.credential(&id).await.is_none());
    }
}
