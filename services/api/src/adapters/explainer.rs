//! services/api/src/adapters/explainer.rs
//!
//! This module contains the perturbation-based explainer. It implements the
//! `ExplanationEngine` port from the `core` crate by repeatedly masking words
//! out of the input, re-scoring the perturbed text against the target label,
//! and rendering the strongest words as an HTML fragment.

use async_trait::async_trait;
use mood_journal_core::{
    domain::EmotionLabel,
    ports::{EmotionModel, ExplanationEngine, PortError, PortResult},
};
use rand::Rng;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A model-agnostic word-masking explainer.
///
/// Bounded by construction: at most `num_features` words are reported and at
/// most `num_samples` perturbed texts are scored per explanation.
#[derive(Clone)]
pub struct PerturbationExplainer {
    num_features: usize,
    num_samples: usize,
}

impl PerturbationExplainer {
    /// Creates a new `PerturbationExplainer` with the given bounds.
    pub fn new(num_features: usize, num_samples: usize) -> Self {
        Self {
            num_features,
            num_samples,
        }
    }

    /// Draws `samples` random word masks. `true` keeps the word. Every mask
    /// keeps at least one word so the perturbed text is never empty.
    fn sample_masks<R: Rng>(rng: &mut R, word_count: usize, samples: usize) -> Vec<Vec<bool>> {
        let mut masks = Vec::with_capacity(samples);
        for _ in 0..samples {
            let mut mask: Vec<bool> = (0..word_count).map(|_| rng.gen_bool(0.5)).collect();
            if mask.iter().all(|keep| !keep) {
                mask[rng.gen_range(0..word_count)] = true;
            }
            masks.push(mask);
        }
        masks
    }

    /// Estimates each word's effect on the target probability as the mean
    /// drop observed over the samples that removed it, then keeps the
    /// `limit` strongest words. Words no sample removed carry no evidence
    /// and are skipped.
    fn rank_terms(
        words: &[&str],
        base_prob: f64,
        scored: &[(Vec<bool>, f64)],
        limit: usize,
    ) -> Vec<(String, f64)> {
        let mut drop_sum = vec![0.0f64; words.len()];
        let mut drop_count = vec![0usize; words.len()];

        for (mask, prob) in scored {
            for (idx, keep) in mask.iter().enumerate() {
                if !keep {
                    drop_sum[idx] += base_prob - prob;
                    drop_count[idx] += 1;
                }
            }
        }

        let mut terms: Vec<(String, f64)> = words
            .iter()
            .enumerate()
            .filter(|(idx, _)| drop_count[*idx] > 0)
            .map(|(idx, word)| (word.to_string(), drop_sum[idx] / drop_count[idx] as f64))
            .collect();

        terms.sort_by(|a, b| b.1.abs().partial_cmp(&a.1.abs()).unwrap_or(std::cmp::Ordering::Equal));
        terms.truncate(limit);
        terms
    }

    async fn explain_with_masks(
        &self,
        words: &[&str],
        base_prob: f64,
        model: &dyn EmotionModel,
        target: EmotionLabel,
        masks: Vec<Vec<bool>>,
    ) -> PortResult<String> {
        let mut scored = Vec::with_capacity(masks.len());
        for mask in masks {
            let perturbed: String = words
                .iter()
                .zip(&mask)
                .filter(|(_, keep)| **keep)
                .map(|(word, _)| *word)
                .collect::<Vec<_>>()
                .join(" ");
            let prob = model.score(&perturbed).await?.score(target);
            scored.push((mask, prob));
        }

        let terms = Self::rank_terms(words, base_prob, &scored, self.num_features);
        Ok(Self::render(target, base_prob, &terms))
    }

    fn render(target: EmotionLabel, base_prob: f64, terms: &[(String, f64)]) -> String {
        let mut items = String::new();
        for (word, weight) in terms {
            items.push_str(&format!(
                "<li><span class=\"term\">{}</span> <span class=\"weight\">{:+.3}</span></li>\n",
                escape_html(word),
                weight
            ));
        }
        format!(
            "<div class=\"explanation\">\n\
             <p>The model predicts <strong>{}</strong> with probability {:.2}. \
             Words with the strongest influence on that prediction:</p>\n\
             <ul class=\"explanation-terms\">\n{}</ul>\n</div>",
            target, base_prob, items
        )
    }
}

/// Minimal HTML escaping for words taken from user input.
fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

//=========================================================================================
// `ExplanationEngine` Trait Implementation
//=========================================================================================

#[async_trait]
impl ExplanationEngine for PerturbationExplainer {
    /// Explains why `model` scores `text` toward `target`.
    async fn explain(
        &self,
        text: &str,
        model: &dyn EmotionModel,
        target: EmotionLabel,
    ) -> PortResult<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Err(PortError::Unexpected(
                "Cannot explain an empty text".to_string(),
            ));
        }

        let base_prob = model.score(text).await?.score(target);
        let masks =
            Self::sample_masks(&mut rand::thread_rng(), words.len(), self.num_samples);
        self.explain_with_masks(&words, base_prob, model, target, masks)
            .await
    }
}
