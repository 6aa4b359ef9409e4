use crate::error::{Result, StockError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Model the external predictor should train. The set is open: names other
/// than `rf` and `svm` are forwarded to the predictor verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    RandomForest,
    Svm,
    Other(String),
}

impl Algorithm {
    pub fn as_str(&self) -> &str {
        match self {
            Algorithm::RandomForest => "rf",
            Algorithm::Svm => "svm",
            Algorithm::Other(name) => name,
        }
    }

    /// Name shown next to results, e.g. "RF"
    pub fn label(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl FromStr for Algorithm {
    type Err = StockError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(StockError::Validation(format!(
                "Invalid model type {s:?}"
            )));
        }
        Ok(match name {
            "rf" => Algorithm::RandomForest,
            "svm" => Algorithm::Svm,
            other => Algorithm::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Direction reported by the predictor. `UP` and `DOWN` are the usual
/// values; any other string is kept verbatim so it reaches the caller as
/// the predictor wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Trend {
    Up,
    Down,
    Other(String),
}

impl Trend {
    pub fn as_str(&self) -> &str {
        match self {
            Trend::Up => "UP",
            Trend::Down => "DOWN",
            Trend::Other(raw) => raw,
        }
    }
}

impl From<String> for Trend {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "UP" => Trend::Up,
            "DOWN" => Trend::Down,
            _ => Trend::Other(raw),
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Trend {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Trend {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(d).map(Trend::from)
    }
}

/// What the predictor printed, decoded. Fields beyond `trend` are passed
/// through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub trend: Trend,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PredictionResult {
    pub fn new(trend: Trend) -> Self {
        Self {
            trend,
            extra: serde_json::Map::new(),
        }
    }

    /// Decode buffered predictor output. Anything but one well-formed
    /// result object is a parse error carrying the raw text.
    pub fn decode(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(StockError::Parse {
                reason: "predictor produced no output".to_string(),
                raw: raw.to_string(),
            });
        }
        serde_json::from_str(raw.trim()).map_err(|e| StockError::Parse {
            reason: e.to_string(),
            raw: raw.to_string(),
        })
    }
}

/// A validated prediction call: which symbol, which model
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionRequest {
    pub symbol: super::Symbol,
    pub algorithm: Algorithm,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!("rf".parse::<Algorithm>().unwrap(), Algorithm::RandomForest);
        assert_eq!(" svm ".parse::<Algorithm>().unwrap(), Algorithm::Svm);
        assert_eq!(
            "xgb".parse::<Algorithm>().unwrap(),
            Algorithm::Other("xgb".to_string())
        );
        assert!("".parse::<Algorithm>().is_err());
        assert!("random forest".parse::<Algorithm>().is_err());
        assert_eq!(Algorithm::default().as_str(), "rf");
        assert_eq!(Algorithm::Svm.label(), "SVM");
    }

    #[test]
    fn test_decode_passes_fields_through() {
        let result = PredictionResult::decode("{\"trend\":\"UP\"}\n").unwrap();
        assert_eq!(result.trend, Trend::Up);
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"trend":"UP"}"#);

        let result =
            PredictionResult::decode(r#"{"trend":"DOWN","confidence":0.61,"model":"svm"}"#).unwrap();
        assert_eq!(result.trend, Trend::Down);
        assert_eq!(result.extra["confidence"], 0.61);
        assert_eq!(result.extra["model"], "svm");
    }

    #[test]
    fn test_decode_failures_keep_raw_text() {
        let failures = [
            "",
            "   \n",
            "Traceback (most recent call last):",
            r#"{"confidence":0.5}"#,
            r#"{"trend":1}"#,
            "{\"trend\":\"UP\"}{\"trend\":\"UP\"}",
        ];
        for raw in failures {
            match PredictionResult::decode(raw) {
                Err(StockError::Parse { raw: kept, .. }) => assert_eq!(kept, raw),
                other => panic!("expected parse error for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_decode_keeps_unrecognised_trend_verbatim() {
        let result = PredictionResult::decode(r#"{"trend":"SIDEWAYS","confidence":0.4}"#).unwrap();
        assert_eq!(result.trend, Trend::Other("SIDEWAYS".to_string()));
        assert_eq!(
            serde_json::to_string(&result).unwrap(),
            r#"{"trend":"SIDEWAYS","confidence":0.4}"#
        );

        let result = PredictionResult::decode(r#"{"trend":"up"}"#).unwrap();
        assert_eq!(result.trend.as_str(), "up");
        assert_eq!(serde_json::to_string(&result).unwrap(), r#"{"trend":"up"}"#);
    }
}
