//! # stockpredict - stock history and ML prediction library
//!
//! Reads per-symbol price history from CSV files and asks an external
//! predictor process for a trend on a symbol:
//! - Symbol catalog over a directory of `<SYMBOL>.csv` files
//! - Windowed history reads with a day-over-day summary
//! - A bridge that runs the predictor and decodes its JSON output
//! - A client view and text renderer, local or over HTTP
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stockpredict::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let config = ServiceConfig::new("data/stocks", "ml/predict.py");
//!     let reader = HistoryReader::new(config.clone());
//!     let symbol = Symbol::parse("RELIANCE")?;
//!
//!     let history = reader.load_recent_history(&symbol, reader.default_window())?;
//!     println!("{} closed at {}", symbol, history.summary.latest_close);
//!
//!     let bridge = PredictionBridge::from_config(config)?;
//!     let result = bridge.predict(&symbol, &Algorithm::RandomForest).await?;
//!     println!("Predicted trend: {}", result.trend);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;

pub mod prelude {
    //! Prelude module for convenient imports
    //!
    //! ```rust
    //! use stockpredict::prelude::*;
    //! ```

    pub use crate::client::{ClientView, HttpBackend, LocalBackend, StockBackend};
    pub use crate::config::{ExitStatusPolicy, ServiceConfig};
    pub use crate::error::{ErrorKind, Result, StockError};
    pub use crate::models::{
        Algorithm, History, HistorySummary, PredictionResult, PricePoint, Symbol, Trend,
    };
    pub use crate::services::{
        CompanyDirectory, HistoryReader, PredictionBridge, Predictor, ProcessPredictor,
        StockCatalog,
    };
}

pub use utils::{init_logger, Logger, Timer};
