use crate::utils::{GeoAssistError, RecognitionConfig, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Placeholder the recognition service substitutes for any character it could
/// not read with confidence.
pub const UNCERTAIN_CHAR: char = '?';

#[derive(Debug, Clone, Deserialize)]
pub struct RecognitionResult {
    pub text: String,
}

impl RecognitionResult {
    pub fn is_uncertain(&self) -> bool {
        self.text.contains(UNCERTAIN_CHAR)
    }
}

pub struct RecognitionClient {
    client: Client,
    endpoint: String,
}

impl RecognitionClient {
    pub fn new(config: &RecognitionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Send an image for text recognition. Transport failures and timeouts are
    /// transient, never parse failures.
    pub async fn recognize(&self, image: Vec<u8>) -> Result<RecognitionResult> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/octet-stream")
            .body(image)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GeoAssistError::ServiceUnavailable(format!(
                "recognition service returned {}",
                status
            )));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeoAssistError::ApiError(format!(
                "recognition service returned {}: {}",
                status, body
            )));
        }

        let result: RecognitionResult = response.json().await?;
        Ok(result)
    }
}

pub(crate) fn transport_error(e: reqwest::Error) -> GeoAssistError {
    if e.is_timeout() || e.is_connect() {
        GeoAssistError::ServiceUnavailable(e.to_string())
    } else {
        GeoAssistError::HttpError(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uncertainty_marker_is_detected() {
        let certain = RecognitionResult {
            text: "7285334.5 551668.2".to_string(),
        };
        let uncertain = RecognitionResult {
            text: "72853?4.5 551668.2".to_string(),
        };
        assert!(!certain.is_uncertain());
        assert!(uncertain.is_uncertain());
    }
}
