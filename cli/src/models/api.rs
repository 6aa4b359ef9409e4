//! JSON bodies exchanged between the server and its clients

use super::prediction::{Algorithm, PredictionRequest};
use super::price_point::{PricePoint, HistorySummary};
use super::symbol::Symbol;
use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StocksResponse {
    pub stocks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub data: Vec<PricePoint>,
    pub info: HistorySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompaniesResponse {
    pub companies: BTreeMap<String, String>,
}

/// Body of `POST /api/predict`; both fields are optional on the wire so the
/// handler can answer a missing symbol with 400 instead of a decode error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequestBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_type: Option<String>,
}

impl PredictRequestBody {
    /// Validate the body. A missing or blank symbol is a validation error;
    /// a missing model means random forest.
    pub fn into_request(self) -> Result<PredictionRequest> {
        let symbol = match self.stock_symbol.as_deref().map(str::trim) {
            Some(s) if !s.is_empty() => Symbol::parse(s)?,
            _ => return Err(StockError::Validation("Stock symbol required".to_string())),
        };
        let algorithm = match self.model_type.as_deref() {
            Some(name) => name.parse()?,
            None => Algorithm::default(),
        };
        Ok(PredictionRequest { symbol, algorithm })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predict_body_wire_names() {
        let body: PredictRequestBody =
            serde_json::from_str(r#"{"stockSymbol":"TCS","modelType":"svm"}"#).unwrap();
        assert_eq!(body.stock_symbol.as_deref(), Some("TCS"));
        assert_eq!(body.model_type.as_deref(), Some("svm"));

        let body: PredictRequestBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body, PredictRequestBody::default());
    }

    #[test]
    fn test_into_request() {
        let request = PredictRequestBody {
            stock_symbol: Some(" TCS ".into()),
            model_type: None,
        }
        .into_request()
        .unwrap();
        assert_eq!(request.symbol.as_str(), "TCS");
        assert_eq!(request.algorithm, Algorithm::RandomForest);

        let err = PredictRequestBody::default().into_request().unwrap_err();
        assert!(matches!(err, StockError::Validation(msg) if msg == "Stock symbol required"));

        let err = PredictRequestBody {
            stock_symbol: Some("TCS".into()),
            model_type: Some("random forest".into()),
        }
        .into_request()
        .unwrap_err();
        assert!(matches!(err, StockError::Validation(_)));
    }

    #[test]
    fn test_error_body_omits_missing_details() {
        let body = ErrorResponse { error: "Stock data not found".into(), details: None };
        assert_eq!(
            serde_json::to_string(&body).unwrap(),
            r#"{"error":"Stock data not found"}"#
        );
    }
}
