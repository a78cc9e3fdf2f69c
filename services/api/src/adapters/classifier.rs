//! services/api/src/adapters/classifier.rs
//!
//! This module contains the adapter for the hosted emotion-classification model.
//! It implements the `EmotionModel` port from the `core` crate.

use async_trait::async_trait;
use mood_journal_core::{
    domain::{EmotionDistribution, EmotionLabel},
    ports::{EmotionModel, PortError, PortResult},
};
use serde::Deserialize;
use serde_json::json;

/// One label/score pair as returned by the inference endpoint.
#[derive(Debug, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `EmotionModel` against the Hugging Face hosted
/// inference endpoint for a text-classification model.
#[derive(Clone)]
pub struct HfEmotionClassifier {
    client: reqwest::Client,
    api_token: String,
    endpoint: String,
}

impl HfEmotionClassifier {
    /// Creates a new `HfEmotionClassifier` for the given model id.
    pub fn new(client: reqwest::Client, api_token: String, model: &str) -> Self {
        Self {
            client,
            api_token,
            endpoint: format!("https://api-inference.huggingface.co/models/{}", model),
        }
    }

    /// Converts a raw inference response into a validated distribution.
    ///
    /// The endpoint returns one row of label/score pairs per input text; this
    /// adapter always sends a single input. A row that does not cover the six
    /// known labels exactly once fails the distribution invariant.
    fn distribution_from_rows(rows: Vec<Vec<LabelScore>>) -> PortResult<EmotionDistribution> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| PortError::Unexpected("Model returned no scores".to_string()))?;

        let mut scores = Vec::with_capacity(row.len());
        for entry in row {
            let label = EmotionLabel::from_model_label(&entry.label).ok_or_else(|| {
                PortError::Unexpected(format!("Model returned unknown label '{}'", entry.label))
            })?;
            scores.push((label, entry.score));
        }

        EmotionDistribution::from_scores(scores)
            .map_err(|e| PortError::Unexpected(e.to_string()))
    }
}

//=========================================================================================
// `EmotionModel` Trait Implementation
//=========================================================================================

#[async_trait]
impl EmotionModel for HfEmotionClassifier {
    /// Scores a text against the fixed six-label emotion set.
    async fn score(&self, text: &str) -> PortResult<EmotionDistribution> {
        let body = json!({
            "inputs": text,
            // Block instead of erroring while the hosted model is loading.
            "options": { "wait_for_model": true },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("Inference request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(PortError::Unexpected(format!(
                "Inference endpoint returned {}: {}",
                status, detail
            )));
        }

        let rows: Vec<Vec<LabelScore>> = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed inference response: {}", e)))?;

        Self::distribution_from_rows(rows)
    }
}
