use crate::error::{Result, StockError};
use crate::models::Symbol;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, TryFromFloatSecsError};

pub const DEFAULT_WINDOW_SIZE: usize = 30;
pub const DEFAULT_INTERPRETER: &str = "python3";

/// What the bridge does with a predictor that exits non-zero
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitStatusPolicy {
    /// Decode stdout regardless of the exit status
    #[default]
    Ignore,
    /// Fail before decoding when the exit status is non-zero
    Reject,
}

/// Paths and limits shared by the catalog, reader and bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub script_path: PathBuf,
    pub interpreter: String,
    pub company_file: Option<PathBuf>,
    pub window_size: usize,
    /// None keeps predictor runs unbounded
    pub max_concurrent_predictions: Option<usize>,
    #[serde(with = "optional_secs")]
    pub prediction_timeout: Option<Duration>,
    pub exit_status_policy: ExitStatusPolicy,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/stocks"),
            script_path: PathBuf::from("ml/predict.py"),
            interpreter: DEFAULT_INTERPRETER.to_string(),
            company_file: None,
            window_size: DEFAULT_WINDOW_SIZE,
            max_concurrent_predictions: None,
            prediction_timeout: None,
            exit_status_policy: ExitStatusPolicy::Ignore,
        }
    }
}

impl ServiceConfig {
    pub fn new(data_dir: impl Into<PathBuf>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            script_path: script_path.into(),
            ..Self::default()
        }
    }

    pub fn with_interpreter(mut self, interpreter: impl Into<String>) -> Self {
        self.interpreter = interpreter.into();
        self
    }

    pub fn with_company_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.company_file = Some(path.into());
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_max_concurrent_predictions(mut self, limit: usize) -> Self {
        self.max_concurrent_predictions = Some(limit);
        self
    }

    pub fn with_prediction_timeout(mut self, timeout: Duration) -> Self {
        self.prediction_timeout = Some(timeout);
        self
    }

    pub fn with_exit_status_policy(mut self, policy: ExitStatusPolicy) -> Self {
        self.exit_status_policy = policy;
        self
    }

    /// Backing file for a symbol: `<data_dir>/<symbol>.csv`, made absolute
    pub fn data_file(&self, symbol: &Symbol) -> Result<PathBuf> {
        let path = self.data_dir.join(symbol.file_name());
        absolute(&path)
    }

    /// Predictor script, made absolute so the child does not depend on its cwd
    pub fn script_file(&self) -> Result<PathBuf> {
        absolute(&self.script_path)
    }
}

/// Predictor timeout from seconds. Zero or negative disables it; values a
/// `Duration` cannot hold (infinity, NaN, overflow) are rejected.
pub fn timeout_from_secs(secs: f64) -> std::result::Result<Option<Duration>, TryFromFloatSecsError> {
    if secs <= 0.0 {
        return Ok(None);
    }
    Duration::try_from_secs_f64(secs).map(Some)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(StockError::Io)
}

mod optional_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&d.as_secs_f64()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let secs: Option<f64> = Option::deserialize(d)?;
        match secs {
            Some(secs) => super::timeout_from_secs(secs).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.window_size, 30);
        assert_eq!(config.interpreter, "python3");
        assert!(config.max_concurrent_predictions.is_none());
        assert!(config.prediction_timeout.is_none());
        assert_eq!(config.exit_status_policy, ExitStatusPolicy::Ignore);
    }

    #[test]
    fn test_data_file_is_absolute() {
        let config = ServiceConfig::new("data/stocks", "ml/predict.py");
        let symbol = Symbol::parse("RELIANCE").unwrap();
        let path = config.data_file(&symbol).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("data/stocks/RELIANCE.csv"));
    }

    #[test]
    fn test_timeout_from_seconds() {
        let config: ServiceConfig = serde_json::from_str(
            r#"{
                "data_dir": "d",
                "script_path": "s.py",
                "interpreter": "python",
                "company_file": null,
                "window_size": 10,
                "max_concurrent_predictions": 4,
                "prediction_timeout": 2.5,
                "exit_status_policy": "reject"
            }"#,
        )
        .unwrap();
        assert_eq!(config.prediction_timeout, Some(Duration::from_millis(2500)));
        assert_eq!(config.exit_status_policy, ExitStatusPolicy::Reject);
        assert_eq!(config.max_concurrent_predictions, Some(4));
    }

    #[test]
    fn test_timeout_rejects_unrepresentable_seconds() {
        assert_eq!(timeout_from_secs(0.0).unwrap(), None);
        assert_eq!(timeout_from_secs(-3.0).unwrap(), None);
        assert_eq!(timeout_from_secs(1.5).unwrap(), Some(Duration::from_millis(1500)));
        assert!(timeout_from_secs(f64::INFINITY).is_err());
        assert!(timeout_from_secs(f64::NAN).is_err());
        assert!(timeout_from_secs(1e300).is_err());
    }
}
