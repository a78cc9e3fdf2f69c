//! crates/mood_journal_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any web framework or serialization format.

use chrono::{DateTime, Utc};

/// The fixed set of emotions the classifier can predict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmotionLabel {
    Anger,
    Fear,
    Joy,
    Love,
    Sadness,
    Surprise,
}

impl EmotionLabel {
    /// All labels in alphabetical order. This ordering is the canonical
    /// index order for feature vectors built from a distribution.
    pub const ALL: [EmotionLabel; 6] = [
        EmotionLabel::Anger,
        EmotionLabel::Fear,
        EmotionLabel::Joy,
        EmotionLabel::Love,
        EmotionLabel::Sadness,
        EmotionLabel::Surprise,
    ];

    /// The lowercase label string used by the model and in rendered pages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Anger => "anger",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Joy => "joy",
            EmotionLabel::Love => "love",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Surprise => "surprise",
        }
    }

    /// Parses a label string as emitted by the model. Returns `None` for
    /// anything outside the fixed set; callers fall back to their documented
    /// defaults in that case.
    pub fn from_model_label(label: &str) -> Option<EmotionLabel> {
        match label {
            "anger" => Some(EmotionLabel::Anger),
            "fear" => Some(EmotionLabel::Fear),
            "joy" => Some(EmotionLabel::Joy),
            "love" => Some(EmotionLabel::Love),
            "sadness" => Some(EmotionLabel::Sadness),
            "surprise" => Some(EmotionLabel::Surprise),
            _ => None,
        }
    }
}

impl std::fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a set of model scores cannot form a valid distribution.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum DistributionError {
    #[error("Duplicate score for label '{0}'")]
    DuplicateLabel(EmotionLabel),
    #[error("Missing score for label '{0}'")]
    MissingLabel(EmotionLabel),
    #[error("Score {1} for label '{0}' is outside [0, 1]")]
    ScoreOutOfRange(EmotionLabel, f64),
}

/// A probability score per emotion label, in alphabetical label order.
///
/// Scores are each in [0, 1] but are not required to sum to 1; that is up to
/// the upstream model. The only way to construct one is `from_scores`, which
/// enforces the exactly-one-entry-per-label invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionDistribution {
    entries: Vec<(EmotionLabel, f64)>,
}

impl EmotionDistribution {
    /// Builds a distribution from `(label, score)` pairs in any order.
    pub fn from_scores(
        scores: impl IntoIterator<Item = (EmotionLabel, f64)>,
    ) -> Result<Self, DistributionError> {
        let mut by_label: [Option<f64>; 6] = [None; 6];
        for (label, score) in scores {
            if !(0.0..=1.0).contains(&score) {
                return Err(DistributionError::ScoreOutOfRange(label, score));
            }
            let idx = Self::index_of(label);
            if by_label[idx].is_some() {
                return Err(DistributionError::DuplicateLabel(label));
            }
            by_label[idx] = Some(score);
        }

        let mut entries = Vec::with_capacity(6);
        for (idx, label) in EmotionLabel::ALL.iter().enumerate() {
            match by_label[idx] {
                Some(score) => entries.push((*label, score)),
                None => return Err(DistributionError::MissingLabel(*label)),
            }
        }
        Ok(Self { entries })
    }

    /// The position of `label` in the alphabetical ordering.
    pub fn index_of(label: EmotionLabel) -> usize {
        EmotionLabel::ALL
            .iter()
            .position(|l| *l == label)
            .unwrap_or(0)
    }

    /// The entries in alphabetical label order.
    pub fn entries(&self) -> &[(EmotionLabel, f64)] {
        &self.entries
    }

    /// The score for a single label.
    pub fn score(&self, label: EmotionLabel) -> f64 {
        self.entries[Self::index_of(label)].1
    }

    /// The highest-probability entry. On a tie the alphabetically first
    /// label wins, so the result is deterministic.
    pub fn top(&self) -> (EmotionLabel, f64) {
        let mut best = self.entries[0];
        for entry in &self.entries[1..] {
            if entry.1 > best.1 {
                best = *entry;
            }
        }
        best
    }
}

/// Which explanation strategy was selected for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplanationMode {
    /// Perturbation-based explanation rendered as HTML markup.
    Perturbation,
    /// Fixed human-readable message for the top label.
    Static,
    /// No explanation at all.
    None,
}

impl ExplanationMode {
    /// The user-visible label for the mode, shown on the results page.
    pub fn label(&self) -> &'static str {
        match self {
            ExplanationMode::Perturbation => "html",
            ExplanationMode::Static => "text",
            ExplanationMode::None => "",
        }
    }
}

/// The explanation produced for one request. Exactly one variant per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplanationResult {
    Html(String),
    Text(String),
    None,
}

impl ExplanationResult {
    /// The rendered body, empty for `None`.
    pub fn body(&self) -> &str {
        match self {
            ExplanationResult::Html(markup) => markup,
            ExplanationResult::Text(message) => message,
            ExplanationResult::None => "",
        }
    }
}

/// Tokens returned by the music provider's token endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSet {
    pub access_token: String,
    /// Absent on most refresh responses; the stored token stays valid then.
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// The per-browser-session credential for the music provider.
///
/// Lifetime is bounded to a single browser session and it is cleared after
/// one completed analysis cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionCredential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionCredential {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Applies a refresh response, keeping the stored refresh token when the
    /// provider omits a new one.
    pub fn refreshed(&self, tokens: TokenSet) -> SessionCredential {
        SessionCredential {
            access_token: tokens.access_token,
            refresh_token: tokens
                .refresh_token
                .unwrap_or_else(|| self.refresh_token.clone()),
            expires_at: tokens.expires_at,
        }
    }
}

/// A playlist found in the external catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRef {
    pub id: String,
    pub name: String,
}

/// A single recommended track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackItem {
    pub name: String,
    pub artists: Vec<String>,
    pub url: Option<String>,
}

/// The authenticated user's public profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

/// Everything the results page needs for one analysis cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOutcome {
    pub explanation: ExplanationResult,
    pub tracks: Vec<TrackItem>,
    pub top_emotion: String,
    pub explanation_kind: String,
}

impl AnalysisOutcome {
    /// The all-empty outcome returned when validation short-circuits.
    pub fn empty() -> Self {
        Self {
            explanation: ExplanationResult::None,
            tracks: Vec::new(),
            top_emotion: String::new(),
            explanation_kind: String::new(),
        }
    }
}
