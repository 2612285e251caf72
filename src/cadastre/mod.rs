use crate::recognition::transport_error;
use crate::utils::{CadastreConfig, GeoAssistError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// district:region:block:parcel — two fixed-width segments, a 6-7 digit block,
// a numeric parcel
static CADNUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}:\d{2}:\d{6,7}:\d+$").unwrap());

pub fn validate_number(raw: &str) -> Result<&str> {
    let trimmed = raw.trim();
    if CADNUM_RE.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(GeoAssistError::InvalidCadastralNumber(raw.to_string()))
    }
}

/// Public attributes of a parcel. All fields optional: a default record means
/// "not found", which is not an error condition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParcelRecord {
    pub address: Option<String>,
    pub area: Option<f64>,
    pub category: Option<String>,
    pub permitted_use: Option<String>,
    pub assessed_value: Option<f64>,
    pub status: Option<String>,
}

impl ParcelRecord {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.area.is_none()
            && self.category.is_none()
            && self.permitted_use.is_none()
            && self.assessed_value.is_none()
            && self.status.is_none()
    }
}

pub struct CadastreClient {
    client: Client,
    endpoint: String,
}

impl CadastreClient {
    pub fn new(config: &CadastreConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
        })
    }

    /// Look a parcel up by cadastral number. Registry unavailability is
    /// reported as such — never as "not found".
    pub async fn lookup(&self, number: &str) -> Result<ParcelRecord> {
        let number = validate_number(number)?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("cad_num", number)])
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GeoAssistError::ServiceUnavailable(format!(
                "cadastral registry returned {}",
                status
            )));
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(ParcelRecord::default());
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeoAssistError::ApiError(format!(
                "cadastral registry returned {}: {}",
                status, body
            )));
        }

        let record: ParcelRecord = response.json().await?;
        Ok(record)
    }
}
