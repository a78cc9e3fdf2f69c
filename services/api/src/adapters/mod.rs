pub mod classifier;
pub mod explainer;
pub mod spotify;

pub use classifier::HfEmotionClassifier;
pub use explainer::PerturbationExplainer;
pub use spotify::{SpotifyAuthAdapter, SpotifyCatalogAdapter};
