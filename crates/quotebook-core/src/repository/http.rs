//! HTTP implementation of the quote repository

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{ApiResult, QuoteRepository};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{ExternalQuery, ExternalSuggestion, Quote, QuoteDraft, QuoteId};

/// Quote repository backed by the catalog service's REST API
#[derive(Clone)]
pub struct HttpQuoteRepository {
    client: Client,
    base_url: String,
}

impl HttpQuoteRepository {
    /// Create a repository for the service at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quotebook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a repository from configuration
    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.api_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> ApiResult<T> {
        let url = self.url(path);
        debug!("GET {} {:?}", url, params);
        let response = self.client.get(&url).query(params).send().await?;
        decode(response).await
    }
}

/// Turn a response into a payload, or classify the failure
async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
    let response = check_status(response).await?;
    Ok(response.json::<T>().await?)
}

/// Pass successful responses through; read the body of failed ones
async fn check_status(response: Response) -> ApiResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("Request failed with {}: {}", status, body);
    Err(ApiError::from_status(status, &body))
}

#[async_trait]
impl QuoteRepository for HttpQuoteRepository {
    async fn list_all(&self) -> ApiResult<Vec<Quote>> {
        self.get_json("/quotes", &[]).await
    }

    async fn get_random(&self) -> ApiResult<Quote> {
        self.get_json("/quotes/random", &[]).await
    }

    async fn search(&self, term: &str) -> ApiResult<Vec<Quote>> {
        let term = term.trim();
        if term.is_empty() {
            return self.list_all().await;
        }

        // The service answers "no hits" with a 404
        match self.get_json("/quotes/search", &[("query", term)]).await {
            Err(ApiError::NotFound(_)) => Ok(Vec::new()),
            other => other,
        }
    }

    async fn create(&self, draft: &QuoteDraft) -> ApiResult<Quote> {
        let url = self.url("/quotes");
        debug!("POST {}", url);
        let response = self.client.post(&url).json(draft).send().await?;
        decode(response).await
    }

    async fn update(&self, id: QuoteId, draft: &QuoteDraft) -> ApiResult<Quote> {
        let url = self.url(&format!("/quotes/{}", id));
        debug!("PUT {}", url);
        let response = self.client.put(&url).json(draft).send().await?;
        decode(response).await
    }

    async fn delete(&self, id: QuoteId) -> ApiResult<()> {
        let url = self.url(&format!("/quotes/{}", id));
        debug!("DELETE {}", url);
        let response = self.client.delete(&url).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn fetch_external(&self, query: &ExternalQuery) -> ApiResult<ExternalSuggestion> {
        let params = query.params();
        let suggestion: ExternalSuggestion = self.get_json("/external/fetch", &params).await?;

        if !suggestion.is_complete() {
            return Err(ApiError::NotFound(
                "The external source returned an empty quote".to_string(),
            ));
        }
        Ok(suggestion)
    }
}
