use crate::error::{Result, StockError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of a symbol's history file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Open", default, skip_serializing_if = "Option::is_none")]
    pub open: Option<f64>,
    #[serde(rename = "High", default, skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(rename = "Low", default, skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
    #[serde(rename = "Close")]
    pub close: f64,
    #[serde(rename = "VWAP", default, skip_serializing_if = "Option::is_none")]
    pub vwap: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: u64,
    /// Columns without a typed rule, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64, volume: u64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            vwap: None,
            volume,
            extra: BTreeMap::new(),
        }
    }

    /// Percent change of this close against an earlier one
    pub fn change_percent_from(&self, previous: &PricePoint) -> f64 {
        (self.close - previous.close) / previous.close * 100.0
    }
}

/// Figures derived from the two most recent points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistorySummary {
    pub latest_close: f64,
    pub volume: u64,
    /// Rounded to two decimals; this is the value compared and displayed
    pub day_change_percent: f64,
}

impl HistorySummary {
    pub const MIN_POINTS: usize = 2;

    /// `points` must be most-recent-first.
    pub fn from_points(symbol: &str, points: &[PricePoint]) -> Result<Self> {
        let (latest, previous) = match points {
            [latest, previous, ..] => (latest, previous),
            _ => {
                return Err(StockError::InsufficientData {
                    symbol: symbol.to_string(),
                    required: Self::MIN_POINTS,
                    found: points.len(),
                })
            }
        };

        Ok(Self {
            latest_close: latest.close,
            volume: latest.volume,
            day_change_percent: round_half_up(latest.change_percent_from(previous), 2),
        })
    }
}

/// Windowed history of one symbol, most recent point first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub symbol: String,
    pub points: Vec<PricePoint>,
    pub summary: HistorySummary,
}

/// Slack for binary representation error when a value should sit on a tie
const TIE_EPSILON: f64 = 1e-9;

/// Ties go away from zero, so 0.125 -> 0.13 and -0.125 -> -0.13.
/// A scaled value within [`TIE_EPSILON`] of a tie counts as the tie, so
/// (200.01 - 200.00) / 200.00 * 100 rounds to 0.01 rather than 0.0.
pub fn round_half_up(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let scaled = value * factor;
    let slack = TIE_EPSILON * scaled.abs().max(1.0);
    (scaled + scaled.signum() * slack).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, close: f64, volume: u64) -> PricePoint {
        PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), close, volume)
    }

    #[test]
    fn test_summary_uses_two_most_recent() {
        let points = vec![point(3, 102.0, 500), point(2, 100.0, 400), point(1, 50.0, 300)];
        let summary = HistorySummary::from_points("RELIANCE", &points).unwrap();
        assert_eq!(summary.latest_close, 102.0);
        assert_eq!(summary.volume, 500);
        assert_eq!(summary.day_change_percent, 2.0);
    }

    #[test]
    fn test_summary_rounds_to_two_decimals() {
        let points = vec![point(2, 101.0, 1), point(1, 3.0, 1)];
        let summary = HistorySummary::from_points("X", &points).unwrap();
        // 98 / 3 * 100 = 3266.666...
        assert_eq!(summary.day_change_percent, 3266.67);

        let points = vec![point(2, 97.0, 1), point(1, 300.0, 1)];
        let summary = HistorySummary::from_points("X", &points).unwrap();
        assert_eq!(summary.day_change_percent, -67.67);
    }

    #[test]
    fn test_summary_needs_two_points() {
        let err = HistorySummary::from_points("ONE", &[point(1, 10.0, 1)]).unwrap_err();
        match err {
            StockError::InsufficientData { symbol, required, found } => {
                assert_eq!(symbol, "ONE");
                assert_eq!(required, 2);
                assert_eq!(found, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(HistorySummary::from_points("NONE", &[]).is_err());
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(2.0, 2), 2.0);
        assert_eq!(round_half_up(1.234, 2), 1.23);
        assert_eq!(round_half_up(0.125, 2), 0.13);
        assert_eq!(round_half_up(-0.125, 2), -0.13);
        assert_eq!(round_half_up(0.0, 2), 0.0);
    }

    #[test]
    fn test_summary_rounds_representation_ties_up() {
        let points = vec![point(2, 200.01, 10), point(1, 200.00, 10)];
        let summary = HistorySummary::from_points("TIE", &points).unwrap();
        assert_eq!(summary.day_change_percent, 0.01);

        let points = vec![point(2, 200.00, 10), point(1, 200.01, 10)];
        let summary = HistorySummary::from_points("TIE", &points).unwrap();
        assert_eq!(summary.day_change_percent, -0.0);
    }

    #[test]
    fn test_json_shape() {
        let mut p = point(5, 2500.5, 1200);
        p.open = Some(2490.0);
        p.extra.insert("Symbol".into(), "RELIANCE".into());

        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["Date"], "2024-01-05");
        assert_eq!(json["Open"], 2490.0);
        assert_eq!(json["Close"], 2500.5);
        assert_eq!(json["Volume"], 1200);
        assert_eq!(json["Symbol"], "RELIANCE");
        assert!(json.get("High").is_none());

        let back: PricePoint = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);

        let summary = HistorySummary { latest_close: 1.0, volume: 2, day_change_percent: 3.5 };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["latestClose"], 1.0);
        assert_eq!(json["dayChangePercent"], 3.5);
    }
}
