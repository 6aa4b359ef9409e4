use crate::{
    config::ServiceConfig,
    error::{Result, StockError},
    models::{Algorithm, HistoryResponse, PredictionResult, Symbol},
    services::{HistoryReader, PredictionBridge, Predictor, StockCatalog},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Where a [`super::ClientView`] gets its data from
#[async_trait]
pub trait StockBackend: Send + Sync {
    async fn list_symbols(&self) -> Result<Vec<String>>;

    async fn load_history(&self, symbol: &str) -> Result<HistoryResponse>;

    async fn predict(&self, symbol: &str, algorithm: &Algorithm) -> Result<PredictionResult>;
}

#[async_trait]
impl<B: StockBackend + ?Sized> StockBackend for Arc<B> {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        (**self).list_symbols().await
    }

    async fn load_history(&self, symbol: &str) -> Result<HistoryResponse> {
        (**self).load_history(symbol).await
    }

    async fn predict(&self, symbol: &str, algorithm: &Algorithm) -> Result<PredictionResult> {
        (**self).predict(symbol, algorithm).await
    }
}

/// Calls the services in-process instead of going through the server
#[derive(Clone)]
pub struct LocalBackend {
    catalog: StockCatalog,
    reader: HistoryReader,
    bridge: PredictionBridge,
    window_size: usize,
}

impl LocalBackend {
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let bridge = PredictionBridge::from_config(config.clone())?;
        Ok(Self::with_bridge(config, bridge))
    }

    pub fn with_predictor(config: ServiceConfig, predictor: Arc<dyn Predictor>) -> Self {
        let bridge = PredictionBridge::new(config.clone(), predictor);
        Self::with_bridge(config, bridge)
    }

    fn with_bridge(config: ServiceConfig, bridge: PredictionBridge) -> Self {
        Self {
            catalog: StockCatalog::new(config.data_dir.clone()),
            window_size: config.window_size,
            reader: HistoryReader::new(config),
            bridge,
        }
    }
}

#[async_trait]
impl StockBackend for LocalBackend {
    async fn list_symbols(&self) -> Result<Vec<String>> {
        let catalog = self.catalog.clone();
        let symbols = blocking(move || catalog.list_symbols()).await?;
        Ok(symbols.into_iter().map(|s| s.to_string()).collect())
    }

    async fn load_history(&self, symbol: &str) -> Result<HistoryResponse> {
        let symbol = Symbol::parse(symbol)?;
        let reader = self.reader.clone();
        let window = self.window_size;
        let history = blocking(move || reader.load_recent_history(&symbol, window)).await?;
        Ok(HistoryResponse {
            data: history.points,
            info: history.summary,
        })
    }

    async fn predict(&self, symbol: &str, algorithm: &Algorithm) -> Result<PredictionResult> {
        let symbol = Symbol::parse(symbol)?;
        self.bridge.predict(&symbol, algorithm).await
    }
}

/// Runs file reads off the async worker threads
async fn blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| StockError::Bridge(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryPredictor;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn backend(dir: &TempDir) -> LocalBackend {
        let config = ServiceConfig::new(dir.path(), "predict.py");
        LocalBackend::with_predictor(config, Arc::new(InMemoryPredictor::new(r#"{"trend":"UP"}"#)))
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_local_reads_run_off_the_runtime() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("SBIN.csv"),
            "Date,Close,Volume\n2024-01-01,600.0,10\n2024-01-02,606.0,12\n",
        )
        .unwrap();
        let backend = backend(&dir);

        assert_eq!(backend.list_symbols().await.unwrap(), vec!["SBIN"]);

        let history = backend.load_history("SBIN").await.unwrap();
        assert_eq!(history.data.len(), 2);
        assert_eq!(history.info.latest_close, 606.0);
        assert_eq!(history.info.day_change_percent, 1.0);
    }

    #[tokio::test]
    async fn test_local_errors_pass_through() {
        let dir = tempdir().unwrap();
        let backend = backend(&dir);

        assert!(matches!(
            backend.load_history("GHOST").await,
            Err(StockError::NotFound { .. })
        ));
        assert!(matches!(
            backend.load_history("  ").await,
            Err(StockError::Validation(_))
        ));
    }
}
