use super::backend::StockBackend;
use crate::{
    error::{Result, StockError},
    models::{Algorithm, HistoryResponse, PredictionResult},
    utils::Logger,
};

pub const MAX_SUGGESTIONS: usize = 10;

const HISTORY_ERROR: &str = "Failed to fetch stock history";
const PREDICTION_ERROR: &str = "Failed to get prediction";
const SYMBOLS_ERROR: &str = "Failed to load stock list";

/// Client-side state of the stock screen: symbol search, the selected
/// symbol's history and the latest prediction.
///
/// Each operation drives one backend call. A prediction is split into
/// [`ClientView::begin_prediction`] and [`ClientView::finish_prediction`] so
/// callers can render the loading state while the call is in flight;
/// [`ClientView::request_prediction`] does both.
pub struct ClientView<B> {
    backend: B,
    symbols: Vec<String>,
    search: String,
    suggestions: Vec<String>,
    selected: Option<String>,
    algorithm: Algorithm,
    history: Option<HistoryResponse>,
    prediction: Option<PredictionResult>,
    loading: bool,
    error: Option<String>,
    logger: Logger,
}

impl<B: StockBackend> ClientView<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            symbols: Vec::new(),
            search: String::new(),
            suggestions: Vec::new(),
            selected: None,
            algorithm: Algorithm::default(),
            history: None,
            prediction: None,
            loading: false,
            error: None,
            logger: Logger::new("VIEW"),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn load_symbols(&mut self) -> Result<()> {
        match self.backend.list_symbols().await {
            Ok(symbols) => {
                self.symbols = symbols;
                self.refresh_suggestions();
                Ok(())
            }
            Err(e) => {
                self.logger.warn_with_error("Could not list symbols", &e);
                self.error = Some(SYMBOLS_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Update the search text; suggestions follow it.
    pub fn set_search(&mut self, text: &str) {
        self.search = text.to_string();
        self.refresh_suggestions();
    }

    fn refresh_suggestions(&mut self) {
        let needle = self.search.trim().to_lowercase();
        self.suggestions = if needle.is_empty() {
            Vec::new()
        } else {
            self.symbols
                .iter()
                .filter(|s| s.to_lowercase().contains(&needle))
                .take(MAX_SUGGESTIONS)
                .cloned()
                .collect()
        };
    }

    /// Select a symbol and fetch its history. The previous prediction no
    /// longer applies and is dropped.
    pub async fn select(&mut self, symbol: &str) -> Result<()> {
        let symbol = symbol.trim().to_string();
        self.search = symbol.clone();
        self.suggestions.clear();
        self.selected = Some(symbol.clone());
        self.prediction = None;
        self.error = None;

        match self.backend.load_history(&symbol).await {
            Ok(history) => {
                self.history = Some(history);
                Ok(())
            }
            Err(e) => {
                self.logger.warn_with_error(&format!("History for {symbol} failed"), &e);
                self.history = None;
                self.error = Some(HISTORY_ERROR.to_string());
                Err(e)
            }
        }
    }

    /// Select the first suggestion, as pressing Enter in the search box does.
    pub async fn select_first_suggestion(&mut self) -> Result<bool> {
        match self.suggestions.first().cloned() {
            Some(symbol) => self.select(&symbol).await.map(|_| true),
            None => Ok(false),
        }
    }

    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.algorithm = algorithm;
    }

    pub fn can_predict(&self) -> bool {
        self.selected.is_some() && !self.loading
    }

    /// Enter the loading state and return what to predict.
    pub fn begin_prediction(&mut self) -> Result<(String, Algorithm)> {
        let symbol = match (&self.selected, self.loading) {
            (Some(symbol), false) => symbol.clone(),
            (None, _) => return Err(StockError::Validation("Stock symbol required".to_string())),
            (Some(_), true) => {
                return Err(StockError::Validation("A prediction is already running".to_string()))
            }
        };
        self.loading = true;
        self.error = None;
        self.prediction = None;
        Ok((symbol, self.algorithm.clone()))
    }

    /// Leave the loading state with the outcome of the call. History is
    /// untouched either way.
    pub fn finish_prediction(&mut self, outcome: Result<PredictionResult>) {
        self.loading = false;
        match outcome {
            Ok(result) => self.prediction = Some(result),
            Err(e) => {
                self.logger.warn_with_error("Prediction failed", &e);
                self.prediction = None;
                self.error = Some(PREDICTION_ERROR.to_string());
            }
        }
    }

    pub async fn request_prediction(&mut self) -> Result<()> {
        let (symbol, algorithm) = self.begin_prediction()?;
        let outcome = self.backend.predict(&symbol, &algorithm).await;
        self.finish_prediction(outcome);
        Ok(())
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn algorithm(&self) -> &Algorithm {
        &self.algorithm
    }

    pub fn history(&self) -> Option<&HistoryResponse> {
        self.history.as_ref()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.prediction.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
