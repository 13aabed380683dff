use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

use super::interface::{LanguagePredictor, PredictionResult};
use crate::language_service::{LanguageServiceClient, ServiceError};
use crate::workflow::UploadableFile;

pub const INVALID_FILE_MESSAGE: &str = "Selected audio file is invalid or empty.";

#[derive(Debug, Error)]
enum UploadError {
    #[error(transparent)]
    Read(#[from] std::io::Error),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Predictor client that uploads audio to the language service
pub struct PredictorClient {
    service: Arc<LanguageServiceClient>,
}

impl PredictorClient {
    /// Client against the hosted service with default HTTP settings
    pub fn new() -> Self {
        Self::with_service(Arc::new(LanguageServiceClient::new()))
    }

    pub fn with_service(service: Arc<LanguageServiceClient>) -> Self {
        Self { service }
    }

    async fn upload(&self, file: &UploadableFile) -> Result<PredictionResult, UploadError> {
        let audio = tokio::fs::read(&file.path).await?;
        let result = self.service.predict_language(audio, &file.name).await?;
        Ok(result)
    }
}

impl Default for PredictorClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn is_uploadable(file: &UploadableFile) -> bool {
    match tokio::fs::metadata(&file.path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

#[async_trait]
impl LanguagePredictor for PredictorClient {
    async fn predict(&self, file: &UploadableFile) -> PredictionResult {
        info!(
            "Attempting to upload file: {}, Size: {} bytes",
            file.name, file.len
        );

        if !is_uploadable(file).await {
            error!("Audio file {} is invalid or empty before upload", file.path.display());
            return PredictionResult::failure(INVALID_FILE_MESSAGE);
        }

        match self.upload(file).await {
            Ok(result) => {
                debug!("Language service response: {:?}", result);
                result
            }
            Err(e) => {
                error!("Language service call failed: {}", e);
                PredictionResult::failure(format!("Network request failed: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unreachable_client() -> PredictorClient {
        let service = LanguageServiceClient::with_client(reqwest::Client::new(), "http://127.0.0.1:9");
        PredictorClient::with_service(Arc::new(service))
    }

    #[tokio::test]
    async fn test_missing_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let file = UploadableFile {
            path: temp_dir.path().join("gone.mp3"),
            name: "gone.mp3".to_string(),
            len: 1024,
        };

        let result = unreachable_client().predict(&file).await;
        assert_eq!(result, PredictionResult::failure(INVALID_FILE_MESSAGE));
    }

    #[tokio::test]
    async fn test_empty_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.mp3");
        std::fs::write(&path, b"").unwrap();
        let file = UploadableFile {
            path,
            name: "empty.mp3".to_string(),
            len: 0,
        };

        let result = unreachable_client().predict(&file).await;
        assert_eq!(result, PredictionResult::failure(INVALID_FILE_MESSAGE));
    }

    #[tokio::test]
    async fn test_transport_failure_is_normalized() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("clip.mp3");
        std::fs::write(&path, [0xFFu8, 0xFB, 0x90, 0x00]).unwrap();
        let file = UploadableFile {
            path,
            name: "clip.mp3".to_string(),
            len: 4,
        };

        let result = unreachable_client().predict(&file).await;
        assert!(result.predicted_language.is_none());
        assert!(result
            .error
            .as_deref()
            .unwrap()
            .starts_with("Network request failed: "));
    }
}
