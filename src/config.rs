use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::str::FromStr;
use stockpredict::config::{timeout_from_secs, ExitStatusPolicy, ServiceConfig};

pub const DEFAULT_PORT: u16 = 8000;

// YAML-serializable configuration structure
#[derive(Serialize, Deserialize, Debug)]
pub struct ConfigYaml {
    pub node_name: Option<String>,
    pub environment: Option<String>,
    pub port: Option<u16>,
    pub cors_allow_any: Option<bool>,
    #[serde(default)]
    pub service: ServiceConfig,
}

// Holds application-wide settings
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub node_name: String,
    pub environment: String,
    pub port: u16,
    pub cors_allow_any: bool,
    pub service: ServiceConfig,
}

impl AppConfig {
    // Load configuration from YAML file or environment variables
    pub fn load() -> Result<Self> {
        if let Ok(config_file) = env::var("CONFIG_FILE") {
            Self::from_yaml(&config_file)
        } else {
            dotenvy::dotenv().ok(); // Load .env file if present
            Self::from_lookup(|name| env::var(name).ok())
        }
    }

    pub fn from_yaml(file_path: &str) -> Result<Self> {
        let yaml_content = fs::read_to_string(file_path)
            .with_context(|| format!("Failed to read config file {}", file_path))?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self> {
        let yaml_config: ConfigYaml =
            serde_yaml::from_str(yaml_content).context("Failed to parse YAML config")?;

        Ok(Self {
            node_name: yaml_config.node_name.unwrap_or_else(default_node_name),
            environment: yaml_config.environment.unwrap_or_else(default_environment),
            port: yaml_config.port.unwrap_or(DEFAULT_PORT),
            cors_allow_any: yaml_config.cors_allow_any.unwrap_or(true),
            service: yaml_config.service,
        })
    }

    /// Build from variables as returned by `lookup`; unset means default,
    /// set but unparsable is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut service = ServiceConfig::default();
        if let Some(dir) = lookup("DATA_DIR") {
            service.data_dir = dir.into();
        }
        if let Some(script) = lookup("PREDICT_SCRIPT") {
            service.script_path = script.into();
        }
        if let Some(python) = lookup("PYTHON_BIN") {
            service.interpreter = python;
        }
        service.company_file = lookup("COMPANY_FILE").map(Into::into);
        if let Some(window) = parse_var(&lookup, "HISTORY_WINDOW")? {
            service.window_size = window;
        }
        service.max_concurrent_predictions = parse_var(&lookup, "MAX_CONCURRENT_PREDICTIONS")?;
        service.prediction_timeout = parse_var::<f64>(&lookup, "PREDICTION_TIMEOUT_SECS")?
            .map(timeout_from_secs)
            .transpose()
            .context("Invalid value for PREDICTION_TIMEOUT_SECS")?
            .flatten();
        if parse_var(&lookup, "REJECT_NONZERO_EXIT")?.unwrap_or(false) {
            service.exit_status_policy = ExitStatusPolicy::Reject;
        }

        Ok(Self {
            node_name: lookup("NODE_NAME").unwrap_or_else(default_node_name),
            environment: lookup("ENVIRONMENT").unwrap_or_else(default_environment),
            port: parse_var(&lookup, "PORT")?.unwrap_or(DEFAULT_PORT),
            cors_allow_any: parse_var(&lookup, "CORS_ALLOW_ANY")?.unwrap_or(true),
            service,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    lookup(name)
        .filter(|v| !v.trim().is_empty())
        .map(|v| v.trim().parse::<T>())
        .transpose()
        .with_context(|| format!("Invalid value for {}", name))
}

fn default_node_name() -> String {
    "stockpredict-server".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;
    use std::time::Duration;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_env_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8000);
        assert!(config.cors_allow_any);
        assert_eq!(config.service.window_size, 30);
        assert_eq!(config.service.max_concurrent_predictions, None);
        assert_eq!(config.service.prediction_timeout, None);
        assert_eq!(config.service.exit_status_policy, ExitStatusPolicy::Ignore);
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("DATA_DIR", "/srv/stocks"),
            ("PYTHON_BIN", "python3.11"),
            ("COMPANY_FILE", "NSE Symbols.CSV"),
            ("MAX_CONCURRENT_PREDICTIONS", "4"),
            ("PREDICTION_TIMEOUT_SECS", "90"),
            ("REJECT_NONZERO_EXIT", "true"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.service.data_dir, PathBuf::from("/srv/stocks"));
        assert_eq!(config.service.interpreter, "python3.11");
        assert_eq!(config.service.company_file, Some(PathBuf::from("NSE Symbols.CSV")));
        assert_eq!(config.service.max_concurrent_predictions, Some(4));
        assert_eq!(config.service.prediction_timeout, Some(Duration::from_secs(90)));
        assert_eq!(config.service.exit_status_policy, ExitStatusPolicy::Reject);
    }

    #[test]
    fn test_invalid_env_value() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_infinite_timeout_is_rejected() {
        for value in ["inf", "NaN", "1e300"] {
            let err = AppConfig::from_lookup(lookup(&[("PREDICTION_TIMEOUT_SECS", value)])).unwrap_err();
            assert!(err.to_string().contains("PREDICTION_TIMEOUT_SECS"));
        }

        let config = AppConfig::from_lookup(lookup(&[("PREDICTION_TIMEOUT_SECS", "0")])).unwrap();
        assert_eq!(config.service.prediction_timeout, None);
    }

    #[test]
    fn test_yaml_infinite_timeout_is_rejected() {
        assert!(AppConfig::from_yaml_str("service:\n  prediction_timeout: .inf\n").is_err());
    }

    #[test]
    fn test_yaml() {
        let config = AppConfig::from_yaml_str(
            "node_name: nse-1\nport: 8080\nservice:\n  data_dir: /data\n  window_size: 60\n  exit_status_policy: reject\n",
        )
        .unwrap();
        assert_eq!(config.node_name, "nse-1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.environment, "development");
        assert_eq!(config.service.data_dir, PathBuf::from("/data"));
        assert_eq!(config.service.window_size, 60);
        assert_eq!(config.service.script_path, PathBuf::from("ml/predict.py"));
        assert_eq!(config.service.exit_status_policy, ExitStatusPolicy::Reject);
    }
}
