use axum::extract::FromRef;
use std::sync::Arc;
use stockpredict::{
    config::ServiceConfig,
    error::Result,
    services::{CompanyDirectory, HistoryReader, PredictionBridge, Predictor, StockCatalog},
};

pub type SharedCatalog = Arc<StockCatalog>;
pub type SharedReader = Arc<HistoryReader>;
pub type SharedBridge = Arc<PredictionBridge>;
pub type SharedCompanies = Arc<CompanyDirectory>;

#[derive(Clone)]
pub struct AppState {
    pub catalog: SharedCatalog,
    pub reader: SharedReader,
    pub bridge: SharedBridge,
    pub companies: SharedCompanies,
}

impl AppState {
    /// State backed by the configured predictor process
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
            catalog: Arc::new(StockCatalog::new(config.data_dir.clone())),
            companies: Arc::new(CompanyDirectory::new(config.company_file.clone())),
            reader: Arc::new(HistoryReader::new(config)),
            bridge: Arc::new(bridge),
        }
    }
}

impl FromRef<AppState> for SharedCatalog {
    fn from_ref(app_state: &AppState) -> SharedCatalog {
        app_state.catalog.clone()
    }
}

impl FromRef<AppState> for SharedReader {
    fn from_ref(app_state: &AppState) -> SharedReader {
        app_state.reader.clone()
    }
}

impl FromRef<AppState> for SharedBridge {
    fn from_ref(app_state: &AppState) -> SharedBridge {
        app_state.bridge.clone()
    }
}

impl FromRef<AppState> for SharedCompanies {
    fn from_ref(app_state: &AppState) -> SharedCompanies {
        app_state.companies.clone()
    }
}
