pub mod domain;
pub mod ports;

pub use domain::{
    AnalysisOutcome, EmotionDistribution, EmotionLabel, ExplanationMode, ExplanationResult,
    PlaylistRef, SessionCredential, TokenSet, TrackItem, UserProfile,
};
pub use ports::{
    EmotionModel, ExplanationEngine, ModeSelector, MusicAuthService, MusicCatalogService,
    PortError, PortResult,
};
