use crate::circuit_breaker::{create_scoring_circuit_breaker, ScoringCircuitBreaker};
use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CustomerId, CustomerProfile, EligibilityResult, Fetched, ImageData};
use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use reqwest::{header::CONTENT_TYPE, Response, StatusCode};
use std::time::Duration;
use url::Url;

const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Read-only view of the scoring/interpretation service.
///
/// Every method returns a value: failures are folded into [`Fetched`]
/// outcomes (or an empty enumeration) so callers can always render something.
#[async_trait]
pub trait ScoringApi: Send + Sync {
    /// `GET /clients`. An empty vector means the enumeration failed or was empty.
    async fn fetch_enumeration(&self) -> Vec<CustomerId>;

    /// `GET /client/{id}`
    async fn fetch_profile(&self, id: &CustomerId) -> Fetched<CustomerProfile>;

    /// `GET /predict/{id}`
    async fn fetch_prediction(&self, id: &CustomerId) -> Fetched<EligibilityResult>;

    /// `GET /interpretation/global`, encoded as a data URI.
    async fn fetch_global_interpretation(&self) -> Fetched<ImageData>;

    /// Browser-navigable link to `/interpretation/local/{id}`.
    fn local_interpretation_link(&self, id: &CustomerId) -> Url;

    /// Browser-navigable link to `/drift`.
    fn drift_link(&self) -> Url;
}

#[derive(Debug)]
enum RemoteFault {
    Transport(reqwest::Error),
    Status(StatusCode),
}

impl RemoteFault {
    /// Only transport faults and 5xx answers trip the breaker; a 404 for an
    /// unknown customer is a healthy backend.
    fn counts_as_failure(&self) -> bool {
        match self {
            RemoteFault::Transport(_) => true,
            RemoteFault::Status(status) => status.is_server_error(),
        }
    }
}

/// HTTP client for the scoring service.
pub struct ScoringClient {
    client: reqwest::Client,
    base_url: Url,
    breaker: ScoringCircuitBreaker,
}

impl ScoringClient {
    /// Creates a client from the loaded configuration.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        Self::with_settings(
            &config.scoring_api_url,
            Duration::from_secs(config.scoring_timeout_secs),
            config.breaker_failure_threshold,
        )
    }

    /// Creates a client for `base_url` with an explicit timeout and breaker threshold.
    pub fn with_settings(
        base_url: &str,
        timeout: Duration,
        breaker_threshold: u32,
    ) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::InternalError(format!("Invalid scoring API URL {}: {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::InternalError(format!(
                "Scoring API URL cannot be used as a base: {}",
                base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AppError::InternalError(format!("Failed to create scoring client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url,
            breaker: create_scoring_circuit_breaker(breaker_threshold),
        })
    }

    /// Appends escaped path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Single GET through the circuit breaker; any non-success status is a fault.
    async fn get(&self, url: Url) -> Result<Response, failsafe::Error<RemoteFault>> {
        let client = self.client.clone();
        let request = async move {
            let response = client
                .get(url)
                .send()
                .await
                .map_err(RemoteFault::Transport)?;
            let status = response.status();
            if status.is_success() {
                Ok::<Response, RemoteFault>(response)
            } else {
                Err(RemoteFault::Status(status))
            }
        };

        self.breaker
            .call_with(RemoteFault::counts_as_failure, request)
            .await
    }

    /// Folds a failed keyed lookup into `NotFound` (service answered) or
    /// `Unavailable` (service unreachable or circuit open).
    fn degrade<T>(what: &str, error: failsafe::Error<RemoteFault>) -> Fetched<T> {
        match error {
            failsafe::Error::Inner(RemoteFault::Status(status)) => {
                tracing::info!("{} not found (scoring service returned {})", what, status);
                Fetched::NotFound
            }
            failsafe::Error::Inner(RemoteFault::Transport(e)) => {
                tracing::warn!("{} unavailable: scoring request failed: {}", what, e);
                Fetched::Unavailable
            }
            failsafe::Error::Rejected => {
                tracing::warn!("{} unavailable: scoring circuit is open", what);
                Fetched::Unavailable
            }
        }
    }
}

#[async_trait]
impl ScoringApi for ScoringClient {
    async fn fetch_enumeration(&self) -> Vec<CustomerId> {
        let url = self.endpoint(&["clients"]);
        tracing::info!("Fetching customer enumeration: {}", url);

        let response = match self.get(url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Customer enumeration failed: {:?}", e);
                return Vec::new();
            }
        };

        // Decode element by element so one unusable id does not empty the dropdown.
        match response.json::<Vec<serde_json::Value>>().await {
            Ok(values) => {
                let ids: Vec<CustomerId> = values
                    .into_iter()
                    .filter_map(|value| match serde_json::from_value(value.clone()) {
                        Ok(id) => Some(id),
                        Err(e) => {
                            tracing::warn!("Skipping unusable customer id {}: {}", value, e);
                            None
                        }
                    })
                    .collect();
                tracing::info!("✓ Enumerated {} customers", ids.len());
                ids
            }
            Err(e) => {
                tracing::warn!("Failed to parse customer enumeration: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_profile(&self, id: &CustomerId) -> Fetched<CustomerProfile> {
        let url = self.endpoint(&["client", id.as_str()]);
        tracing::info!("Fetching profile {} from scoring service: {}", id, url);

        let response = match self.get(url).await {
            Ok(response) => response,
            Err(e) => return Self::degrade(&format!("Profile {}", id), e),
        };

        // The service answers with a one-element array.
        match response.json::<Vec<CustomerProfile>>().await {
            Ok(profiles) => match profiles.into_iter().next() {
                Some(profile) => Fetched::Found(profile),
                None => {
                    tracing::info!("Profile {} not found (empty record list)", id);
                    Fetched::NotFound
                }
            },
            Err(e) => {
                tracing::warn!("Failed to parse profile {}: {}", id, e);
                Fetched::Unavailable
            }
        }
    }

    async fn fetch_prediction(&self, id: &CustomerId) -> Fetched<EligibilityResult> {
        let url = self.endpoint(&["predict", id.as_str()]);
        tracing::info!("Requesting prediction for {}: {}", id, url);

        let response = match self.get(url).await {
            Ok(response) => response,
            Err(e) => return Self::degrade(&format!("Prediction {}", id), e),
        };

        match response.json::<f64>().await {
            Ok(probability) => match EligibilityResult::new(probability) {
                Some(result) => {
                    tracing::info!("✓ Prediction for {}: {}%", id, probability);
                    Fetched::Found(result)
                }
                None => {
                    tracing::warn!("Prediction for {} out of range: {}", id, probability);
                    Fetched::Unavailable
                }
            },
            Err(e) => {
                tracing::warn!("Failed to parse prediction for {}: {}", id, e);
                Fetched::Unavailable
            }
        }
    }

    async fn fetch_global_interpretation(&self) -> Fetched<ImageData> {
        let url = self.endpoint(&["interpretation", "global"]);
        tracing::info!("Fetching global interpretation: {}", url);

        let response = match self.get(url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Global interpretation unavailable: {:?}", e);
                return Fetched::Unavailable;
            }
        };

        let mime = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.split(';').next().unwrap_or(value).trim().to_string())
            .filter(|value| value.starts_with("image/"))
            .unwrap_or_else(|| DEFAULT_IMAGE_MIME.to_string());

        match response.bytes().await {
            Ok(bytes) if !bytes.is_empty() => Fetched::Found(ImageData::from_bytes(&mime, &bytes)),
            Ok(_) => {
                tracing::warn!("Global interpretation returned an empty body");
                Fetched::Unavailable
            }
            Err(e) => {
                tracing::warn!("Failed to read global interpretation: {}", e);
                Fetched::Unavailable
            }
        }
    }

    fn local_interpretation_link(&self, id: &CustomerId) -> Url {
        self.endpoint(&["interpretation", "local", id.as_str()])
    }

    fn drift_link(&self) -> Url {
        self.endpoint(&["drift"])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ScoringClient {
        ScoringClient::with_settings(base, Duration::from_secs(1), 5).unwrap()
    }

    #[tokio::test]
    async fn test_client_creation() {
        assert!(ScoringClient::with_settings("https://example.com", Duration::from_secs(1), 5).is_ok());
        assert!(ScoringClient::with_settings("not a url", Duration::from_secs(1), 5).is_err());
        assert!(ScoringClient::with_settings("mailto:ops@example.com", Duration::from_secs(1), 5).is_err());
    }

    #[test]
    fn test_links_keep_base_path() {
        let client = client("https://scoring.example/api");
        let id = CustomerId::new("101").unwrap();

        assert_eq!(
            client.local_interpretation_link(&id).as_str(),
            "https://scoring.example/api/interpretation/local/101"
        );
        assert_eq!(client.drift_link().as_str(), "https://scoring.example/api/drift");
    }

    #[test]
    fn test_trailing_slash_base() {
        let client = client("https://scoring.example/api/");
        assert_eq!(client.drift_link().as_str(), "https://scoring.example/api/drift");
    }

    #[test]
    fn test_ids_are_escaped_as_single_segment() {
        let client = client("https://scoring.example");
        let id = CustomerId::new("a b/c").unwrap();

        assert_eq!(
            client.local_interpretation_link(&id).as_str(),
            "https://scoring.example/interpretation/local/a%20b%2Fc"
        );
    }

    #[test]
    fn test_client_errors_do_not_trip_breaker() {
        assert!(!RemoteFault::Status(StatusCode::NOT_FOUND).counts_as_failure());
        assert!(RemoteFault::Status(StatusCode::BAD_GATEWAY).counts_as_failure());
    }
}
