//! services/api/src/web/analysis_task.rs
//!
//! The per-request analysis flow: validate the journal entry, classify it,
//! produce an explanation, fetch a recommendation, and clear the session
//! credential. Each stage runs sequentially and exactly once; nothing is
//! retried.

use crate::web::{explain, recommendation, session::AuthenticatedClient, state::AppState};
use mood_journal_core::{
    domain::AnalysisOutcome,
    ports::PortResult,
};
use tracing::info;

/// Runs one complete analysis cycle for a submitted journal entry.
///
/// Empty or whitespace-only input short-circuits to the all-empty outcome
/// without touching the classifier or the stored credential. A classifier
/// error is fatal and propagates; explanation and recommendation trouble
/// degrade to empty results inside their own stages. On every non-short-
/// circuit path the session credential is cleared exactly once at the end.
pub async fn run_analysis(
    state: &AppState,
    client: &AuthenticatedClient,
    session_id: &str,
    input: &str,
) -> PortResult<AnalysisOutcome> {
    if input.trim().is_empty() {
        return Ok(AnalysisOutcome::empty());
    }

    let distribution = state.classifier.score(input).await?;
    let (top_label, top_score) = distribution.top();
    info!("Top emotion '{}' at {:.2}", top_label, top_score);

    let (explanation, mode) = explain::select_explanation(
        state.mode_selector.as_ref(),
        state.explainer.as_ref(),
        state.classifier.as_ref(),
        input,
        top_label,
    )
    .await;

    let tracks = recommendation::recommend(client, top_label).await;

    state.tokens.clear(session_id).await;

    Ok(AnalysisOutcome {
        explanation,
        tracks,
        top_emotion: top_label.to_string(),
        explanation_kind: mode.label().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::web::explain::get_text_explanation;
    use crate::web::session::{AuthenticatedClient, SessionStore, SessionTokenManager};
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use mood_journal_core::domain::{
        EmotionDistribution, EmotionLabel, ExplanationMode, ExplanationResult, PlaylistRef,
        SessionCredential, TokenSet, TrackItem, UserProfile,
    };
    use mood_journal_core::ports::{
        EmotionModel, ExplanationEngine, ModeSelector, MusicAuthService, MusicCatalogService,
        PortError,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tracing::Level;

    struct StubClassifier {
        joy: f64,
        fail: bool,
        calls: AtomicUsize,
    }

    impl StubClassifier {
        fn joyful() -> Self {
            Self {
                joy: 0.9,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmotionModel for StubClassifier {
        async fn score(&self, _text: &str) -> PortResult<EmotionDistribution> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PortError::Unexpected("model unavailable".to_string()));
            }
            let rest = (1.0 - self.joy) / 5.0;
            EmotionDistribution::from_scores(EmotionLabel::ALL.iter().map(|l| {
                (*l, if *l == EmotionLabel::Joy { self.joy } else { rest })
            }))
            .map_err(|e| PortError::Unexpected(e.to_string()))
        }
    }

    struct StubEngine {
        fail: bool,
    }

    #[async_trait]
    impl ExplanationEngine for StubEngine {
        async fn explain(
            &self,
            _text: &str,
            _model: &dyn EmotionModel,
            target: EmotionLabel,
        ) -> PortResult<String> {
            if self.fail {
                return Err(PortError::Unexpected("explainer down".to_string()));
            }
            Ok(format!("<div>toward {}</div>", target))
        }
    }

    struct FixedSelector(ExplanationMode);

    impl ModeSelector for FixedSelector {
        fn pick(&self) -> ExplanationMode {
            self.0
        }
    }

    struct StubCatalog {
        queries: Mutex<Vec<String>>,
        fail: bool,
    }

    impl StubCatalog {
        fn working() -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                fail: false,
            }
        }
    }

    #[async_trait]
    impl MusicCatalogService for StubCatalog {
        async fn find_playlist(
            &self,
            _access_token: &str,
            query: &str,
        ) -> PortResult<Option<PlaylistRef>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.fail {
                return Err(PortError::Unexpected("catalog down".to_string()));
            }
            Ok(Some(PlaylistRef {
                id: "pl".to_string(),
                name: "Mix".to_string(),
            }))
        }

        async fn playlist_tracks(
            &self,
            _access_token: &str,
            _playlist_id: &str,
            limit: usize,
        ) -> PortResult<Vec<TrackItem>> {
            Ok((0..limit)
                .map(|i| TrackItem {
                    name: format!("Track {}", i + 1),
                    artists: vec!["Someone".to_string()],
                    url: None,
                })
                .collect())
        }

        async fn current_user(&self, _access_token: &str) -> PortResult<UserProfile> {
            Ok(UserProfile {
                id: "u".to_string(),
                display_name: None,
            })
        }
    }

    struct NoopAuth;

    #[async_trait]
    impl MusicAuthService for NoopAuth {
        fn authorize_url(&self) -> String {
            String::new()
        }

        async fn exchange_code(&self, _code: &str) -> PortResult<TokenSet> {
            Err(PortError::Unexpected("unused".to_string()))
        }

        async fn refresh_token(&self, _refresh_token: &str) -> PortResult<TokenSet> {
            Err(PortError::Unexpected("unused".to_string()))
        }
    }

    fn test_config() -> Config {
        Config {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            log_level: Level::INFO,
            spotify_client_id: "id".to_string(),
            spotify_client_secret: "secret".to_string(),
            spotify_redirect_uri: "http://localhost/callback".to_string(),
            secret_key: "test-key".to_string(),
            hf_api_token: None,
            emotion_model: "stub".to_string(),
            explain_features: 5,
            explain_samples: 200,
        }
    }

    struct Fixture {
        state: AppState,
        classifier: Arc<StubClassifier>,
        catalog: Arc<StubCatalog>,
    }

    impl Fixture {
        fn new(classifier: StubClassifier, engine: StubEngine, mode: ExplanationMode) -> Self {
            Self::with_catalog(classifier, engine, mode, StubCatalog::working())
        }

        fn with_catalog(
            classifier: StubClassifier,
            engine: StubEngine,
            mode: ExplanationMode,
            catalog: StubCatalog,
        ) -> Self {
            let classifier = Arc::new(classifier);
            let catalog = Arc::new(catalog);
            let store = SessionStore::new("test-secret".to_string());
            let state = AppState {
                config: Arc::new(test_config()),
                classifier: classifier.clone(),
                explainer: Arc::new(engine),
                mode_selector: Arc::new(FixedSelector(mode)),
                tokens: SessionTokenManager::new(store, Arc::new(NoopAuth), catalog.clone()),
            };
            Self {
                state,
                classifier,
                catalog,
            }
        }

        /// Seeds a session with a valid credential and returns its id and
        /// an authenticated client, the way the handlers obtain one.
        async fn login(&self) -> (String, AuthenticatedClient) {
            let id = self
                .state
                .tokens
                .store
                .insert_new(SessionCredential {
                    access_token: "token".to_string(),
                    refresh_token: "refresh".to_string(),
                    expires_at: Utc::now() + Duration::hours(1),
                })
                .await;
            let client = self.state.tokens.get_client(&id).await.unwrap();
            (id, client)
        }
    }

    #[tokio::test]
    async fn whitespace_input_short_circuits_without_classifying() {
        let fixture = Fixture::new(
            StubClassifier::joyful(),
            StubEngine { fail: false },
            ExplanationMode::Static,
        );
        let (id, client) = fixture.login().await;

        let outcome = run_analysis(&fixture.state, &client, &id, "   ")
            .await
            .unwrap();

        assert_eq!(outcome, AnalysisOutcome::empty());
        assert_eq!(outcome.top_emotion, "");
        assert_eq!(outcome.explanation_kind, "");
        assert_eq!(fixture.classifier.calls.load(Ordering::SeqCst), 0);
        assert!(fixture.catalog.queries.lock().unwrap().is_empty());
        // The short circuit never reaches credential clearing.
        assert!(fixture.state.tokens.store.credential(&id).await.is_some());
    }

    #[tokio::test]
    async fn happy_entry_yields_joy_and_the_matching_mix() {
        let fixture = Fixture::new(
            StubClassifier::joyful(),
            StubEngine { fail: false },
            ExplanationMode::Static,
        );
        let (id, client) = fixture.login().await;

        let outcome = run_analysis(&fixture.state, &client, &id, "I am so happy today!")
            .await
            .unwrap();

        assert_eq!(outcome.top_emotion, "joy");
        assert_eq!(outcome.explanation_kind, "text");
        assert_eq!(
            outcome.explanation,
            ExplanationResult::Text(get_text_explanation(Some(EmotionLabel::Joy)).to_string())
        );
        assert_eq!(outcome.tracks.len(), 5);
        assert_eq!(
            fixture.catalog.queries.lock().unwrap().as_slice(),
            ["feel good happy mix"]
        );
        // The credential is gone after a completed cycle.
        assert!(fixture.state.tokens.store.credential(&id).await.is_none());
    }

    #[tokio::test]
    async fn perturbation_mode_returns_markup() {
        let fixture = Fixture::new(
            StubClassifier::joyful(),
            StubEngine { fail: false },
            ExplanationMode::Perturbation,
        );
        let (id, client) = fixture.login().await;

        let outcome = run_analysis(&fixture.state, &client, &id, "I am so happy today!")
            .await
            .unwrap();

        assert_eq!(outcome.explanation_kind, "html");
        assert!(matches!(outcome.explanation, ExplanationResult::Html(_)));
    }

    #[tokio::test]
    async fn no_explanation_mode_leaves_it_empty() {
        let fixture = Fixture::new(
            StubClassifier::joyful(),
            StubEngine { fail: false },
            ExplanationMode::None,
        );
        let (id, client) = fixture.login().await;

        let outcome = run_analysis(&fixture.state, &client, &id, "I am so happy today!")
            .await
            .unwrap();

        assert_eq!(outcome.explanation, ExplanationResult::None);
        assert_eq!(outcome.explanation_kind, "");
        // The rest of the cycle still completes.
        assert_eq!(outcome.tracks.len(), 5);
    }

    #[tokio::test]
    async fn classifier_failure_is_fatal() {
        let fixture = Fixture::new(
            StubClassifier {
                joy: 0.9,
                fail: true,
                calls: AtomicUsize::new(0),
            },
            StubEngine { fail: false },
            ExplanationMode::Static,
        );
        let (id, client) = fixture.login().await;

        let result = run_analysis(&fixture.state, &client, &id, "anything").await;
        assert!(result.is_err());
        // The failed request never reached credential clearing.
        assert!(fixture.state.tokens.store.credential(&id).await.is_some());
    }

    #[tokio::test]
    async fn recommendation_failure_degrades_but_completes_the_cycle() {
        let fixture = Fixture::with_catalog(
            StubClassifier::joyful(),
            StubEngine { fail: false },
            ExplanationMode::Static,
            StubCatalog {
                queries: Mutex::new(Vec::new()),
                fail: true,
            },
        );
        let (id, client) = fixture.login().await;

        let outcome = run_analysis(&fixture.state, &client, &id, "I am so happy today!")
            .await
            .unwrap();

        assert!(outcome.tracks.is_empty());
        assert_eq!(outcome.top_emotion, "joy");
        assert!(!outcome.explanation.body().is_empty());
        assert!(fixture.state.tokens.store.credential(&id).await.is_none());
    }

    #[tokio::test]
    async fn explainer_failure_degrades_to_text_and_completes_the_cycle() {
        let fixture = Fixture::new(
            StubClassifier::joyful(),
            StubEngine { fail: true },
            ExplanationMode::Perturbation,
        );
        let (id, client) = fixture.login().await;

        let outcome = run_analysis(&fixture.state, &client, &id, "I am so happy today!")
            .await
            .unwrap();

        assert_eq!(outcome.explanation_kind, "text");
        assert_eq!(
            outcome.explanation,
            ExplanationResult::Text(get_text_explanation(Some(EmotionLabel::Joy)).to_string())
        );
        assert!(fixture.state.tokens.store.credential(&id).await.is_none());
    }
}
