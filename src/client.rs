//! HTTP client for the crop prediction backend.
//!
//! Each call is a single best-effort round trip: no retries, no caching and
//! no timeout beyond the transport default. Responses are decoded into the
//! explicit schemas in [`crate::models`] and validated at this boundary.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{PredictionResult, SensorSnapshot};

// ---

/// Failure of a single backend round trip.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Backend unreachable, connection reset, or body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Backend answered with a non-success status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Body was not the expected structured data.
    #[error("decode error: {0}")]
    Decode(String),
}

/// Coarse classification of a [`ClientError`], kept by the workflow for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Server,
    Decode,
    /// Not a backend failure: the workflow could not publish its result.
    Internal,
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::Server { .. } => ErrorKind::Server,
            ClientError::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// Source of sensor snapshots and crop predictions.
///
/// [`HttpSensorClient`] talks to the real backend; tests substitute
/// scripted implementations.
pub trait SensorSource: Send + Sync {
    fn fetch_latest_snapshot(
        &self,
    ) -> impl Future<Output = Result<SensorSnapshot, ClientError>> + Send;

    fn request_prediction(
        &self,
        snapshot: &SensorSnapshot,
    ) -> impl Future<Output = Result<PredictionResult, ClientError>> + Send;
}

/// Stateless client for the prediction backend.
#[derive(Debug, Clone)]
pub struct HttpSensorClient {
    // ---
    http: reqwest::Client,
    base_url: String,
}

impl HttpSensorClient {
    // ---
    pub fn new(base_url: impl Into<String>) -> Self {
        // ---
        let base_url = base_url.into().trim_end_matches('/').to_string();
        HttpSensorClient {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /weather?city=<name>`. The payload is opaque to this crate and
    /// is only checked to be well-formed JSON.
    pub async fn fetch_weather(&self, city: &str) -> Result<serde_json::Value, ClientError> {
        // ---
        let url = format!("{}/weather", self.base_url);
        debug!("Fetching weather for {:?} from: {}", city, url);

        let request = self.http.get(&url).query(&[("city", city)]);
        decode_response(request.send().await?).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // ---
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);
        let response = self.http.post(&url).json(body).send().await?;
        decode_response(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        // ---
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self.http.get(&url).send().await?;
        decode_response(response).await
    }
}

impl SensorSource for HttpSensorClient {
    // ---
    async fn fetch_latest_snapshot(&self) -> Result<SensorSnapshot, ClientError> {
        // ---
        let snapshot: SensorSnapshot = self.get_json("/latest").await?;
        snapshot.validate().map_err(ClientError::Decode)?;
        debug!("Latest snapshot: {:?}", snapshot);
        Ok(snapshot)
    }

    async fn request_prediction(
        &self,
        snapshot: &SensorSnapshot,
    ) -> Result<PredictionResult, ClientError> {
        // ---
        let prediction: PredictionResult = self.post_json("/predict", snapshot).await?;
        prediction.validate().map_err(ClientError::Decode)?;
        debug!("Prediction: {:?}", prediction);
        Ok(prediction)
    }
}

/// Map a response onto the client error taxonomy and decode its JSON body.
async fn decode_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    // ---
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = if body.trim().is_empty() {
            status
                .canonical_reason()
                .unwrap_or("API Error")
                .to_string()
        } else {
            body
        };
        warn!("Backend returned {}: {}", status, message);
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        debug!("Failed to decode body: {} - Raw body: {}", e, body);
        ClientError::Decode(e.to_string())
    })
}
