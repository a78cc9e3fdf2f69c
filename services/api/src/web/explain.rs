//! services/api/src/web/explain.rs
//!
//! Per-request explanation selection: a uniformly random choice between the
//! perturbation explainer, a fixed textual explanation, and no explanation.
//! The random choice is injected through the `ModeSelector` port so tests can
//! pin each branch.

use mood_journal_core::{
    domain::{EmotionLabel, ExplanationMode, ExplanationResult},
    ports::{EmotionModel, ExplanationEngine, ModeSelector},
};
use rand::Rng;
use tracing::warn;

/// The production selector: each mode with equal probability.
pub struct RandomModeSelector;

impl ModeSelector for RandomModeSelector {
    fn pick(&self) -> ExplanationMode {
        match rand::thread_rng().gen_range(0..3) {
            0 => ExplanationMode::Perturbation,
            1 => ExplanationMode::Static,
            _ => ExplanationMode::None,
        }
    }
}

/// The fixed human-readable explanation for a top label. `None` stands for a
/// label outside the known set and yields the generic fallback.
pub fn get_text_explanation(label: Option<EmotionLabel>) -> &'static str {
    match label {
        Some(EmotionLabel::Anger) => {
            "It seems you're feeling angry. Based on your emotion, we recommend listening to some energetic music to help release tension and channel your emotions positively."
        }
        Some(EmotionLabel::Fear) => {
            "It appears you're feeling fearful. To soothe your nerves, we suggest listening to calming music that can help alleviate anxiety and promote relaxation."
        }
        Some(EmotionLabel::Joy) => {
            "You seem to be experiencing joy! How wonderful! For an extra boost of happiness, we recommend listening to upbeat and cheerful music that resonates with your mood."
        }
        Some(EmotionLabel::Love) => {
            "It looks like you're in a loving mood. To celebrate the warmth of your emotions, we suggest indulging in some romantic music that reflects the beauty of love."
        }
        Some(EmotionLabel::Sadness) => {
            "It appears you're feeling sad. During times of sadness, music can provide comfort and solace. We recommend listening to soothing melodies that match your mood."
        }
        Some(EmotionLabel::Surprise) => {
            "You seem to be surprised! How exciting! To enhance the sense of wonder, we recommend exploring eclectic and diverse music that embraces the element of surprise."
        }
        None => {
            "We've analyzed your emotion and selected music that we think will resonate with your current mood."
        }
    }
}

/// Picks an explanation mode and produces the explanation for one request.
///
/// A failing perturbation explainer degrades to the static text for the same
/// label (and reports the static mode), so explanation trouble never aborts
/// the request.
pub async fn select_explanation(
    selector: &dyn ModeSelector,
    engine: &dyn ExplanationEngine,
    model: &dyn EmotionModel,
    text: &str,
    top_label: EmotionLabel,
) -> (ExplanationResult, ExplanationMode) {
    match selector.pick() {
        ExplanationMode::Perturbation => match engine.explain(text, model, top_label).await {
            Ok(markup) => (ExplanationResult::Html(markup), ExplanationMode::Perturbation),
            Err(e) => {
                warn!(
                    "Perturbation explainer failed, falling back to text explanation: {}",
                    e
                );
                (
                    ExplanationResult::Text(get_text_explanation(Some(top_label)).to_string()),
                    ExplanationMode::Static,
                )
            }
        },
        ExplanationMode::Static => (
            ExplanationResult::Text(get_text_explanation(Some(top_label)).to_string()),
            ExplanationMode::Static,
        ),
        ExplanationMode::None => (ExplanationResult::None, ExplanationMode::None),
    }
}
