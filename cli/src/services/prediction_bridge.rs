use super::predictor::{Predictor, PredictorOutput, ProcessPredictor};
use crate::{
    config::{ExitStatusPolicy, ServiceConfig},
    error::{Result, StockError},
    models::{Algorithm, PredictionResult, Symbol},
    utils::{Logger, Timer},
};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

/// Resolves a symbol to its data file, runs the predictor over it and
/// decodes what the predictor printed.
///
/// Runs are independent. When `max_concurrent_predictions` is set, callers
/// beyond the limit wait for a permit; `prediction_timeout` bounds each run
/// (not the wait).
#[derive(Clone)]
pub struct PredictionBridge {
    config: ServiceConfig,
    predictor: Arc<dyn Predictor>,
    permits: Option<Arc<Semaphore>>,
    logger: Logger,
}

impl PredictionBridge {
    pub fn new(config: ServiceConfig, predictor: Arc<dyn Predictor>) -> Self {
        let permits = config
            .max_concurrent_predictions
            .map(|limit| Arc::new(Semaphore::new(limit.max(1))));
        Self {
            config,
            predictor,
            permits,
            logger: Logger::new("BRIDGE"),
        }
    }

    /// Bridge backed by the configured interpreter and script
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        let script = config.script_file()?;
        let predictor = ProcessPredictor::new(config.interpreter.clone(), script);
        Ok(Self::new(config, Arc::new(predictor)))
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    pub async fn predict(&self, symbol: &Symbol, algorithm: &Algorithm) -> Result<PredictionResult> {
        let data_file = self.config.data_file(symbol)?;
        if !data_file.is_file() {
            self.logger.debug(&format!("No data file at {}", data_file.display()));
            return Err(StockError::not_found(symbol.as_str()));
        }

        let _permit = match &self.permits {
            Some(permits) => Some(
                permits
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| StockError::Bridge("prediction queue closed".to_string()))?,
            ),
            None => None,
        };

        let timer = Timer::start(&format!("{symbol} {algorithm} prediction"));
        let run = self.predictor.run(algorithm, &data_file);
        let output = match self.config.prediction_timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| StockError::Timeout(limit))??,
            None => run.await?,
        };

        log_stderr(symbol, algorithm, &output);

        if self.config.exit_status_policy == ExitStatusPolicy::Reject && !output.success() {
            return Err(StockError::Bridge(format!(
                "predictor exited with {}: {}{}",
                output
                    .exit_code
                    .map(|c| format!("status {c}"))
                    .unwrap_or_else(|| "a signal".to_string()),
                output.stderr.trim(),
                if output.stdout.trim().is_empty() {
                    String::new()
                } else {
                    format!("\n{}", output.stdout.trim())
                }
            )));
        }

        let result = PredictionResult::decode(&output.stdout).inspect_err(|e| {
            self.logger.error_with_error(&format!("Undecodable output for {symbol}"), e);
        })?;

        self.logger.info(&format!(
            "{} {} -> {} ({:.1}ms, exit {:?})",
            symbol,
            algorithm,
            result.trend,
            timer.elapsed_ms(),
            output.exit_code
        ));
        Ok(result)
    }
}

fn log_stderr(symbol: &Symbol, algorithm: &Algorithm, output: &PredictorOutput) {
    for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
        warn!(%symbol, %algorithm, line, "Predictor stderr");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Trend;
    use crate::services::predictor::InMemoryPredictor;
    use std::fs;
    use std::time::{Duration, Instant};
    use tempfile::{tempdir, TempDir};

    fn data_dir(symbols: &[&str]) -> TempDir {
        let dir = tempdir().unwrap();
        for s in symbols {
            fs::write(dir.path().join(format!("{s}.csv")), "Date,Close,Volume\n").unwrap();
        }
        dir
    }

    fn bridge(dir: &TempDir, predictor: Arc<dyn Predictor>) -> PredictionBridge {
        PredictionBridge::new(ServiceConfig::new(dir.path(), "predict.py"), predictor)
    }

    fn sym(s: &str) -> Symbol {
        Symbol::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_result_returned_unchanged() {
        let dir = data_dir(&["RELIANCE"]);
        let predictor = Arc::new(InMemoryPredictor::new(r#"{"trend":"UP"}"#));
        let bridge = bridge(&dir, predictor.clone());

        let result = bridge.predict(&sym("RELIANCE"), &Algorithm::RandomForest).await.unwrap();
        assert_eq!(result, PredictionResult::new(Trend::Up));
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"trend":"UP"}"#);

        let calls = predictor.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, Algorithm::RandomForest);
        assert!(calls[0].1.is_absolute());
        assert!(calls[0].1.ends_with("RELIANCE.csv"));
    }

    #[tokio::test]
    async fn test_non_json_output_is_parse_error() {
        let dir = data_dir(&["RELIANCE"]);
        let bridge = bridge(&dir, Arc::new(InMemoryPredictor::new("model crashed: ValueError")));

        match bridge.predict(&sym("RELIANCE"), &Algorithm::Svm).await {
            Err(StockError::Parse { raw, .. }) => assert_eq!(raw, "model crashed: ValueError"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_symbol_never_reaches_predictor() {
        let dir = data_dir(&[]);
        let predictor = Arc::new(InMemoryPredictor::new(r#"{"trend":"UP"}"#));
        let bridge = bridge(&dir, predictor.clone());

        let err = bridge.predict(&sym("GHOST"), &Algorithm::RandomForest).await.unwrap_err();
        assert!(matches!(err, StockError::NotFound { .. }));
        assert!(predictor.calls().is_empty());
    }

    #[tokio::test]
    async fn test_exit_status_ignored_by_default() {
        let dir = data_dir(&["TCS"]);
        let output = PredictorOutput {
            stdout: r#"{"trend":"DOWN"}"#.into(),
            stderr: "UserWarning: few samples".into(),
            exit_code: Some(1),
        };
        let predictor = Arc::new(InMemoryPredictor::default().with_output("rf", output));

        let result = bridge(&dir, predictor.clone())
            .predict(&sym("TCS"), &Algorithm::RandomForest)
            .await
            .unwrap();
        assert_eq!(result.trend, Trend::Down);

        let strict = PredictionBridge::new(
            ServiceConfig::new(dir.path(), "predict.py")
                .with_exit_status_policy(ExitStatusPolicy::Reject),
            predictor,
        );
        match strict.predict(&sym("TCS"), &Algorithm::RandomForest).await {
            Err(StockError::Bridge(msg)) => {
                assert!(msg.contains("status 1"));
                assert!(msg.contains("few samples"));
            }
            other => panic!("expected bridge error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let dir = data_dir(&["HANG"]);
        let predictor = Arc::new(
            InMemoryPredictor::new(r#"{"trend":"UP"}"#).with_delay(Duration::from_secs(5)),
        );
        let config = ServiceConfig::new(dir.path(), "predict.py")
            .with_prediction_timeout(Duration::from_millis(50));
        let bridge = PredictionBridge::new(config, predictor);

        let err = bridge.predict(&sym("HANG"), &Algorithm::RandomForest).await.unwrap_err();
        assert!(matches!(err, StockError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_unbounded_runs_overlap() {
        let dir = data_dir(&["A"]);
        let predictor = Arc::new(
            InMemoryPredictor::new(r#"{"trend":"UP"}"#).with_delay(Duration::from_millis(100)),
        );
        let bridge = bridge(&dir, predictor.clone());

        let symbol = sym("A");
        let runs = (0..4).map(|_| bridge.predict(&symbol, &Algorithm::RandomForest));
        let results = futures::future::join_all(runs).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(predictor.max_in_flight(), 4);
    }

    #[tokio::test]
    async fn test_concurrency_cap_queues_callers() {
        let dir = data_dir(&["A"]);
        let predictor = Arc::new(
            InMemoryPredictor::new(r#"{"trend":"UP"}"#).with_delay(Duration::from_millis(50)),
        );
        let config = ServiceConfig::new(dir.path(), "predict.py").with_max_concurrent_predictions(2);
        let bridge = PredictionBridge::new(config, predictor.clone());

        let symbol = sym("A");
        let started = Instant::now();
        let runs = (0..4).map(|_| bridge.predict(&symbol, &Algorithm::RandomForest));
        let results = futures::future::join_all(runs).await;

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(predictor.max_in_flight(), 2);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_bridge_end_to_end() {
        let dir = data_dir(&["INFY"]);
        let script = dir.path().join("predict.sh");
        fs::write(
            &script,
            "echo \"training $1\" >&2\nif [ -f \"$2\" ]; then echo '{\"trend\":\"UP\"}'; else echo missing; fi\n",
        )
        .unwrap();

        let config = ServiceConfig::new(dir.path(), &script).with_interpreter("sh");
        let bridge = PredictionBridge::from_config(config).unwrap();
        assert_eq!(bridge.predictor_name(), "process");

        let result = bridge.predict(&sym("INFY"), &Algorithm::Svm).await.unwrap();
        assert_eq!(result.trend, Trend::Up);
    }
}
