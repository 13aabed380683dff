use reqwest::{multipart, Client, StatusCode};
use thiserror::Error;
use tracing::debug;

use crate::predictor::PredictionResult;

/// Hosted language-identification service.
pub const DEFAULT_BASE_URL: &str = "https://ml-project-kaek.onrender.com";

/// Multipart field the service reads the upload from.
pub const AUDIO_FIELD_NAME: &str = "audio_file";

pub const AUDIO_MIME_TYPE: &str = "audio/mpeg";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("request timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("{0}")]
    Request(#[source] reqwest::Error),

    #[error("service answered with HTTP status {status}")]
    Status { status: StatusCode },

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ServiceError::Timeout(e)
        } else {
            ServiceError::Request(e)
        }
    }
}

#[derive(Debug, Clone)]
pub struct LanguageServiceClient {
    client: Client,
    base_url: String,
}

impl LanguageServiceClient {
    pub fn new() -> Self {
        Self::with_client(Client::new(), DEFAULT_BASE_URL)
    }

    /// Client against another deployment of the service, e.g. a local stub.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST the audio bytes to `/predict-language` as a single multipart part.
    ///
    /// A non-2xx answer is still accepted when its body carries an `error`
    /// string, since the service reports model failures as HTTP 500 with a
    /// JSON body.
    pub async fn predict_language(
        &self,
        audio: Vec<u8>,
        file_name: &str,
    ) -> Result<PredictionResult, ServiceError> {
        let url = format!("{}/predict-language", self.base_url);

        let part = multipart::Part::bytes(audio)
            .file_name(file_name.to_string())
            .mime_str(AUDIO_MIME_TYPE)?;
        let form = multipart::Form::new().part(AUDIO_FIELD_NAME, part);

        let response = self.client.post(&url).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!("Language service answered {} ({} bytes)", status, body.len());

        if status.is_success() {
            let result: PredictionResult = serde_json::from_slice(&body)?;
            return Ok(result);
        }

        match serde_json::from_slice::<PredictionResult>(&body) {
            Ok(PredictionResult { error: Some(error), .. }) => Ok(PredictionResult::failure(error)),
            _ => Err(ServiceError::Status { status }),
        }
    }
}

impl Default for LanguageServiceClient {
    fn default() -> Self {
        Self::new()
    }
}
