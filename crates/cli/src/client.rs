//! API client for the advisor daemon

use advisor_lib::recommender::{CostAnalysis, RecommendationList};
use advisor_lib::{RecommendationType, WorkloadRecommendation};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors talking to the advisor API
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("invalid API URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("advisor not ready: {0}")]
    NotReady(String),

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },
}

/// Error body returned by the advisor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API client for the advisor daemon
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self { client, base_url })
    }

    /// GET a JSON resource with optional query parameters
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, Option<&str>)],
    ) -> Result<T, ClientError> {
        let mut url = self.base_url.join(path)?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                if let Some(value) = value {
                    pairs.append_pair(key, value);
                }
            }
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);

        Err(match status {
            StatusCode::NOT_FOUND => ClientError::NotFound(message),
            StatusCode::SERVICE_UNAVAILABLE => ClientError::NotReady(message),
            _ => ClientError::Api { status, message },
        })
    }

    pub async fn list_recommendations(
        &self,
        namespace: Option<&str>,
        recommendation_type: Option<RecommendationType>,
    ) -> Result<RecommendationList, ClientError> {
        let type_param = recommendation_type.map(|t| t.to_string());
        self.get(
            "api/v1/recommendations",
            &[("namespace", namespace), ("type", type_param.as_deref())],
        )
        .await
    }

    pub async fn get_recommendation(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<WorkloadRecommendation, ClientError> {
        let path = format!("api/v1/recommendations/{}/{}", namespace, name);
        self.get(&path, &[]).await
    }

    pub async fn costs(&self, namespace: Option<&str>) -> Result<CostAnalysis, ClientError> {
        self.get("api/v1/costs", &[("namespace", namespace)]).await
    }
}
