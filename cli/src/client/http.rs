use super::backend::StockBackend;
use crate::{
    error::{Result, StockError},
    models::{
        Algorithm, ErrorResponse, HistoryResponse, PredictRequestBody, PredictionResult,
        StocksResponse,
    },
    utils::Logger,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Talks to a running stockpredict server
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    logger: Logger,
}

impl HttpBackend {
    pub fn new(base_url: &str) -> Result<Self> {
        // Predictions train a model per request, so keep the timeout generous
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            logger: Logger::new("HTTP_CLIENT"),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let err = remote_error(status.as_u16(), &body);
        self.logger.warn(&format!("Request failed: {err}"));
        Err(err)
    }
}

/// Error for a non-success response. A server error body becomes
/// `error` or `error: details`; any other body is kept as the message.
pub fn remote_error(status: u16, body: &str) -> StockError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(ErrorResponse { error, details: Some(details) }) => format!("{error}: {details}"),
        Ok(ErrorResponse { error, details: None }) => error,
        Err(_) => body.to_string(),
    };
    StockError::Remote { status, message }
}

#[async_trait]
impl StockBackend for HttpBackend {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        let url = format!("{}/stocks", self.base_url);
        let response = self.client.get(&url).send().await?;
        let body: StocksResponse = self.decode(response).await?;
        Ok(body.stocks)
    }

    async fn load_history(&self, symbol: &str) -> Result<HistoryResponse> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| StockError::Validation(format!("invalid server url: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StockError::Validation("server url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(["api", "stock-history", symbol]);

        let response = self.client.get(url).send().await?;
        self.decode(response).await
    }

    async fn predict(&self, symbol: &str, algorithm: &Algorithm) -> Result<PredictionResult> {
        let url = format!("{}/api/predict", self.base_url);
        let body = PredictRequestBody {
            stock_symbol: Some(symbol.to_string()),
            model_type: Some(algorithm.to_string()),
        };
        let response = self.client.post(&url).json(&body).send().await?;
        self.decode(response).await
    }
}
