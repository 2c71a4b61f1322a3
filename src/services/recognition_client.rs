//! Plant recognition provider client
//!
//! **[LFL-INT-010]** HTTP client for the third-party recognition service:
//! image identification and name search, with client-side rate limiting and
//! failure classification into fixed recoverable advisory categories.
//!
//! **[LFL-INT-030]** When no API key is configured the client runs in mock
//! mode: callers get a canned response flagged `is_mock` so the app remains
//! usable without credentials.

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::Mutex;

const DEFAULT_BASE_URL: &str = "https://plant.id/api/v3";
const USER_AGENT: &str = "Leafling/0.1.0 (https://github.com/leafling/leafling)";
const REQUEST_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_MS: u64 = 500; // 2 requests per second

/// Identification failure categories
///
/// **[LFL-ERR-020]** Every variant is recoverable: the caller may retry,
/// switch to text search, or fall back to manual entry. `advisory()` supplies
/// the distinct user-facing message for each category.
#[derive(Debug, Error)]
pub enum IdentifyError {
    /// Provider responded but no ranked candidate list was present, or it was
    /// empty. Not a hard failure.
    #[error("No plants identified")]
    NoMatch,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider API key not configured")]
    NotConfigured,

    #[error("Provider rejected credentials")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("Provider quota exceeded")]
    QuotaExceeded,

    #[error("Provider temporarily unavailable (HTTP {0})")]
    Unavailable(u16),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),
}

impl IdentifyError {
    /// User-facing advisory text. Inline, dismissible; never fatal.
    pub fn advisory(&self) -> &'static str {
        match self {
            IdentifyError::NoMatch => {
                "We couldn't identify this plant. Try another photo, search by name, or enter details manually."
            }
            IdentifyError::Network(_) => {
                "Network unreachable. Check your connection and try again."
            }
            IdentifyError::NotConfigured => {
                "Plant identification isn't configured yet. Add a provider API key in settings."
            }
            IdentifyError::Unauthorized => {
                "The identification service rejected our credentials. Check the provider API key."
            }
            IdentifyError::RateLimited => {
                "Too many identification requests. Wait a moment and try again."
            }
            IdentifyError::Timeout => {
                "The identification service took too long to respond. Try again."
            }
            IdentifyError::QuotaExceeded => {
                "The identification quota is used up for now. You can still add the plant manually."
            }
            IdentifyError::Unavailable(_) => {
                "The identification service is temporarily unavailable. Try again shortly."
            }
            IdentifyError::Parse(_) => {
                "The identification service returned something we couldn't read. Try again."
            }
            IdentifyError::Api(_, _) => {
                "Something went wrong during identification. Try again or add the plant manually."
            }
        }
    }
}

/// Rate limiter enforcing a minimum interval between provider calls
struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(None),
            min_interval: Duration::from_millis(min_interval_ms),
        }
    }

    async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Recognition rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Recognition provider API client
pub struct RecognitionClient {
    http_client: reqwest::Client,
    rate_limiter: Arc<RateLimiter>,
    api_key: Option<String>,
    base_url: String,
}

impl RecognitionClient {
    pub fn new(api_key: Option<String>) -> Result<Self, IdentifyError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        api_key: Option<String>,
        base_url: String,
    ) -> Result<Self, IdentifyError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| IdentifyError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RATE_LIMIT_MS)),
            api_key,
            base_url,
        })
    }

    /// True when no API key is available and canned responses are served
    ///
    /// **[LFL-INT-030]**
    pub fn is_mock(&self) -> bool {
        self.api_key.is_none()
    }

    /// Identify a plant from an encoded still image
    ///
    /// **[LFL-INT-010]** POST /identification with the image as a data URI.
    /// The raw JSON body is returned untyped; the normalizer owns shape
    /// probing because the provider reshuffles nesting between revisions.
    pub async fn identify(&self, image_data_uri: &str) -> Result<Value, IdentifyError> {
        let Some(api_key) = &self.api_key else {
            tracing::info!("No provider API key; serving mock identification");
            return Ok(mock_identification());
        };
        if api_key.trim().is_empty() {
            return Err(IdentifyError::NotConfigured);
        }

        self.rate_limiter.wait().await;

        let url = format!("{}/identification", self.base_url);
        let body = json!({
            "images": [image_data_uri],
            "similar_images": true,
        });

        tracing::debug!(url = %url, "Querying recognition provider (image)");

        let response = self
            .http_client
            .post(&url)
            .header("Api-Key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(classify_transport_error)?;

        Self::decode_response(response).await
    }

    /// Search the provider's knowledge base by plant name
    ///
    /// **[LFL-INT-020]** GET /kb/plants/name_search?q=
    pub async fn search(&self, query: &str) -> Result<Value, IdentifyError> {
        let Some(api_key) = &self.api_key else {
            tracing::info!(query = %query, "No provider API key; serving mock search");
            return Ok(mock_search(query));
        };
        if api_key.trim().is_empty() {
            return Err(IdentifyError::NotConfigured);
        }

        self.rate_limiter.wait().await;

        let url = format!("{}/kb/plants/name_search", self.base_url);

        tracing::debug!(url = %url, query = %query, "Querying recognition provider (text)");

        let response = self
            .http_client
            .get(&url)
            .header("Api-Key", api_key)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(classify_transport_error)?;

        Self::decode_response(response).await
    }

    async fn decode_response(response: reqwest::Response) -> Result<Value, IdentifyError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), error_text));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| IdentifyError::Parse(e.to_string()))
    }
}

/// Map an HTTP status to a failure category
///
/// **[LFL-ERR-020]**
fn classify_status(status: u16, body: String) -> IdentifyError {
    match status {
        401 | 403 => IdentifyError::Unauthorized,
        402 => IdentifyError::QuotaExceeded,
        429 => IdentifyError::RateLimited,
        500 | 502 | 503 | 504 => IdentifyError::Unavailable(status),
        _ => IdentifyError::Api(status, body),
    }
}

/// Map a transport-level failure to a category
fn classify_transport_error(err: reqwest::Error) -> IdentifyError {
    if err.is_timeout() {
        IdentifyError::Timeout
    } else {
        IdentifyError::Network(err.to_string())
    }
}

/// Reason string attached to mock responses
pub const MOCK_REASON: &str = "provider API key not configured";

/// Canned identification payload in the provider's current wire shape
///
/// **[LFL-INT-030]** Keeps the full pipeline exercisable without credentials.
pub fn mock_identification() -> Value {
    json!({
        "result": {
            "classification": {
                "suggestions": [
                    {
                        "id": "mock-monstera",
                        "name": "Monstera deliciosa",
                        "probability": 0.93,
                        "details": {
                            "common_names": ["Swiss Cheese Plant", "Split-leaf Philodendron"],
                            "taxonomy": {
                                "class": "Liliopsida",
                                "family": "Araceae",
                                "genus": "Monstera",
                                "kingdom": "Plantae",
                                "order": "Alismatales",
                                "phylum": "Tracheophyta"
                            },
                            "description": {
                                "value": "Monstera deliciosa, the Swiss cheese plant, is a species of flowering plant native to tropical forests of southern Mexico, known for its large, glossy, perforated leaves."
                            },
                            "url": "https://en.wikipedia.org/wiki/Monstera_deliciosa"
                        }
                    }
                ]
            }
        }
    })
}

/// Canned name-search payload
pub fn mock_search(query: &str) -> Value {
    json!({
        "suggestions": [
            {
                "id": "mock-spathiphyllum",
                "entity_name": "Spathiphyllum wallisii",
                "probability": 0.88,
                "details": {
                    "common_names": ["Peace Lily", "White Sails"],
                    "taxonomy": {
                        "family": "Araceae",
                        "genus": "Spathiphyllum"
                    },
                    "url": "https://en.wikipedia.org/wiki/Spathiphyllum_wallisii"
                }
            }
        ],
        "query": query,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_creation() {
        let limiter = RateLimiter::new(500);
        assert_eq!(limiter.min_interval, Duration::from_millis(500));
    }

    #[test]
    fn test_client_creation_without_key_is_mock() {
        let client = RecognitionClient::new(None).unwrap();
        assert!(client.is_mock());
    }

    #[test]
    fn test_client_creation_with_key() {
        let client = RecognitionClient::new(Some("test_key".to_string())).unwrap();
        assert!(!client.is_mock());
    }

    #[tokio::test]
    async fn test_rate_limiter_timing() {
        let limiter = RateLimiter::new(200);

        let start = Instant::now();

        limiter.wait().await;
        let first_elapsed = start.elapsed();

        limiter.wait().await;
        let second_elapsed = start.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(180));
    }

    #[tokio::test]
    async fn test_blank_key_is_not_configured() {
        let client = RecognitionClient::new(Some("   ".to_string())).unwrap();
        let err = client
            .identify("data:image/jpeg;base64,AAAA")
            .await
            .unwrap_err();
        assert!(matches!(err, IdentifyError::NotConfigured));
    }

    #[tokio::test]
    async fn test_mock_identify_without_network() {
        let client = RecognitionClient::new(None).unwrap();
        let payload = client.identify("data:image/jpeg;base64,AAAA").await.unwrap();
        assert!(payload["result"]["classification"]["suggestions"].is_array());
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(401, String::new()),
            IdentifyError::Unauthorized
        ));
        assert!(matches!(
            classify_status(403, String::new()),
            IdentifyError::Unauthorized
        ));
        assert!(matches!(
            classify_status(402, String::new()),
            IdentifyError::QuotaExceeded
        ));
        assert!(matches!(
            classify_status(429, String::new()),
            IdentifyError::RateLimited
        ));
        assert!(matches!(
            classify_status(503, String::new()),
            IdentifyError::Unavailable(503)
        ));
        assert!(matches!(
            classify_status(418, String::new()),
            IdentifyError::Api(418, _)
        ));
    }

    #[test]
    fn test_advisories_are_distinct() {
        let variants = [
            IdentifyError::NoMatch,
            IdentifyError::Network("x".to_string()),
            IdentifyError::NotConfigured,
            IdentifyError::Unauthorized,
            IdentifyError::RateLimited,
            IdentifyError::Timeout,
            IdentifyError::QuotaExceeded,
            IdentifyError::Unavailable(503),
            IdentifyError::Parse("x".to_string()),
            IdentifyError::Api(418, "teapot".to_string()),
        ];

        let mut advisories: Vec<&str> = variants.iter().map(|v| v.advisory()).collect();
        advisories.sort();
        advisories.dedup();
        assert_eq!(advisories.len(), variants.len());
    }
}
