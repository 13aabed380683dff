use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::workflow::UploadableFile;

/// Answer of the language-identification service.
///
/// Unknown fields are ignored and missing ones default to `None`. A result
/// without `predicted_language` is a failure whether or not `error` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(rename = "predicted_language")]
    #[serde(default)]
    pub predicted_language: Option<String>,

    #[serde(default)]
    pub error: Option<String>,
}

impl PredictionResult {
    pub fn language(language: impl Into<String>) -> Self {
        Self {
            predicted_language: Some(language.into()),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            predicted_language: None,
            error: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.predicted_language.is_some()
    }
}

/// Predictor interface - actual model runs in the remote service
#[async_trait]
pub trait LanguagePredictor: Send + Sync {
    /// Upload `file` and return the service's answer.
    ///
    /// Never fails: transport problems come back as a result carrying only
    /// an error message.
    async fn predict(&self, file: &UploadableFile) -> PredictionResult;
}
