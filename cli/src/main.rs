use stockpredict::{
    client::{
        render_prediction, render_summary, render_view, ClientView, HttpBackend, LocalBackend,
        StockBackend,
    },
    config::{ServiceConfig, DEFAULT_INTERPRETER, DEFAULT_WINDOW_SIZE},
    init_logger,
    models::Algorithm,
    utils::{format_count, format_price, DEFAULT_LOG_FILTER},
};

use clap::{Parser, Subcommand};
use std::{path::PathBuf, sync::Arc};

#[derive(Parser)]
#[command(name = "stockpredict")]
#[command(about = "Browse stock price history and run local ML trend predictions")]
pub struct Cli {
    /// Use a running server instead of reading files directly
    #[arg(long, global = true, env = "STOCKPREDICT_SERVER")]
    pub server: Option<String>,

    /// Directory holding <SYMBOL>.csv history files
    #[arg(long, global = true, env = "DATA_DIR", default_value = "data/stocks")]
    pub data_dir: PathBuf,

    /// Predictor script run for each prediction
    #[arg(long, global = true, env = "PREDICT_SCRIPT", default_value = "ml/predict.py")]
    pub script: PathBuf,

    /// Interpreter used to run the predictor script
    #[arg(long, global = true, env = "PYTHON_BIN", default_value = DEFAULT_INTERPRETER)]
    pub python: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List every symbol with a history file
    Symbols,
    /// Case-insensitive symbol search, at most 10 matches
    Search {
        query: String,
    },
    /// Show the most recent prices of a symbol
    History {
        symbol: String,
        /// Number of most recent rows (local mode only)
        #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
        window: usize,
    },
    /// Predict the next trend of a symbol
    Predict {
        symbol: String,
        /// Model to train (rf, svm, ...)
        #[arg(short, long, default_value = "rf")]
        model: String,
    },
    /// Run several models on one symbol concurrently
    Compare {
        symbol: String,
        /// Comma-separated model names
        #[arg(short, long, value_delimiter = ',', default_value = "rf,svm")]
        models: Vec<String>,
    },
    /// Summary, chart and prediction for one symbol
    View {
        symbol: String,
        #[arg(short, long, default_value = "rf")]
        model: String,
    },
}

impl Cli {
    fn service_config(&self, window: usize) -> ServiceConfig {
        ServiceConfig::new(&self.data_dir, &self.script)
            .with_interpreter(self.python.clone())
            .with_window_size(window)
    }

    fn backend(&self, window: usize) -> anyhow::Result<Arc<dyn StockBackend>> {
        Ok(match &self.server {
            Some(url) => Arc::new(HttpBackend::new(url)?),
            None => Arc::new(LocalBackend::from_config(self.service_config(window))?),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger(DEFAULT_LOG_FILTER)?;

    let cli = Cli::parse();
    let window = match &cli.command {
        Commands::History { window, .. } => *window,
        _ => DEFAULT_WINDOW_SIZE,
    };
    let backend = cli.backend(window)?;

    match cli.command {
        Commands::Symbols => {
            for symbol in backend.list_symbols().await? {
                println!("{symbol}");
            }
        }
        Commands::Search { query } => {
            let mut view = ClientView::new(backend);
            view.load_symbols().await?;
            view.set_search(&query);
            if view.suggestions().is_empty() {
                println!("No symbols match '{query}'");
            }
            for symbol in view.suggestions() {
                println!("{symbol}");
            }
        }
        Commands::History { symbol, .. } => {
            let history = backend.load_history(&symbol).await?;
            print!("{}", render_summary(&symbol, &history.info));
            println!();
            println!("{:<12} {:>12} {:>14}", "Date", "Close", "Volume");
            for point in &history.data {
                println!(
                    "{:<12} {:>12} {:>14}",
                    point.date.format("%Y-%m-%d"),
                    format_price(point.close),
                    format_count(point.volume)
                );
            }
        }
        Commands::Predict { symbol, model } => {
            let algorithm: Algorithm = model.parse()?;
            let result = backend.predict(&symbol, &algorithm).await?;
            print!("{}", render_prediction(&algorithm, &result));
        }
        Commands::Compare { symbol, models } => {
            let algorithms = models
                .iter()
                .map(|m| m.parse::<Algorithm>())
                .collect::<Result<Vec<_>, _>>()?;

            let runs = algorithms.iter().map(|a| backend.predict(&symbol, a));
            let results = futures::future::join_all(runs).await;

            for (algorithm, result) in algorithms.iter().zip(results) {
                match result {
                    Ok(prediction) => print!("{}", render_prediction(algorithm, &prediction)),
                    Err(e) => println!("Local Model ({}) failed: {e}", algorithm.label()),
                }
                println!();
            }
        }
        Commands::View { symbol, model } => {
            let mut view = ClientView::new(backend);
            view.set_algorithm(model.parse()?);

            if view.select(&symbol).await.is_err() {
                print!("{}", render_view(&view));
                return Ok(());
            }

            let (symbol, algorithm) = view.begin_prediction()?;
            print!("{}", render_view(&view));
            let outcome = view.backend().predict(&symbol, &algorithm).await;
            view.finish_prediction(outcome);

            match (view.prediction(), view.error()) {
                (Some(prediction), _) => print!("{}", render_prediction(view.algorithm(), prediction)),
                (None, Some(error)) => println!("Error: {error}"),
                (None, None) => {}
            }
        }
    }

    Ok(())
}
