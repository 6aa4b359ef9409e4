//! Column schema for price history files.
//!
//! The header row is bound against the schema once per file; every data row
//! is then decoded by column index with the rule of the field it belongs to.
//! Columns the schema does not name are carried through as text.

use super::price_point::PricePoint;
use chrono::NaiveDate;
use csv::StringRecord;
use std::collections::BTreeMap;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%Y/%m/%d", "%d-%b-%Y"];

/// How a raw cell becomes a typed value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeRule {
    Date,
    Float,
    Integer,
    Text,
}

/// Typed slots of a [`PricePoint`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Date,
    Open,
    High,
    Low,
    Close,
    Vwap,
    Volume,
}

#[derive(Debug, Clone)]
pub struct SchemaField {
    pub header: String,
    pub field: PriceField,
    pub rule: DecodeRule,
    pub required: bool,
}

impl SchemaField {
    fn new(header: &str, field: PriceField, rule: DecodeRule, required: bool) -> Self {
        Self {
            header: header.to_string(),
            field,
            rule,
            required,
        }
    }
}

/// Ordered header name -> decode rule table
#[derive(Debug, Clone)]
pub struct CsvSchema {
    fields: Vec<SchemaField>,
}

impl Default for CsvSchema {
    fn default() -> Self {
        Self::price_history()
    }
}

impl CsvSchema {
    /// Date, Open, High, Low, Close, VWAP, Volume. Date, Close and Volume
    /// must be present; the other typed columns are optional.
    pub fn price_history() -> Self {
        use DecodeRule::*;
        Self {
            fields: vec![
                SchemaField::new("Date", PriceField::Date, Date, true),
                SchemaField::new("Open", PriceField::Open, Float, false),
                SchemaField::new("High", PriceField::High, Float, false),
                SchemaField::new("Low", PriceField::Low, Float, false),
                SchemaField::new("Close", PriceField::Close, Float, true),
                SchemaField::new("VWAP", PriceField::Vwap, Float, false),
                SchemaField::new("Volume", PriceField::Volume, Integer, true),
            ],
        }
    }

    /// Resolve every schema field to a column index of `headers`.
    pub fn bind(&self, headers: &StringRecord) -> Result<BoundSchema, String> {
        let names: Vec<String> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = if i == 0 { h.trim_start_matches('\u{feff}') } else { h };
                h.trim().to_string()
            })
            .collect();

        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(format!("duplicate column {name:?}"));
            }
        }

        let mut typed = Vec::new();
        for field in &self.fields {
            match names.iter().position(|n| *n == field.header) {
                Some(index) => typed.push(BoundField {
                    index,
                    header: field.header.clone(),
                    field: field.field,
                    rule: field.rule,
                }),
                None if field.required => {
                    return Err(format!("missing required column {:?}", field.header));
                }
                None => {}
            }
        }

        let text = names
            .iter()
            .enumerate()
            .filter(|(i, _)| !typed.iter().any(|t| t.index == *i))
            .map(|(i, n)| (i, n.clone()))
            .collect();

        Ok(BoundSchema { typed, text })
    }
}

#[derive(Debug, Clone)]
struct BoundField {
    index: usize,
    header: String,
    field: PriceField,
    rule: DecodeRule,
}

/// Cell that failed its decode rule
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub value: String,
}

/// A schema resolved against one file's header row
#[derive(Debug, Clone)]
pub struct BoundSchema {
    typed: Vec<BoundField>,
    text: Vec<(usize, String)>,
}

enum Cell {
    Date(NaiveDate),
    Float(f64),
    Integer(u64),
    Empty,
}

impl BoundSchema {
    pub fn decode(&self, record: &StringRecord) -> Result<PricePoint, FieldError> {
        let mut date = None;
        let mut close = None;
        let mut volume = None;
        let mut point = PricePoint::new(NaiveDate::MIN, 0.0, 0);

        for bound in &self.typed {
            let raw = record.get(bound.index).unwrap_or("").trim();
            let err = || FieldError {
                field: bound.header.clone(),
                value: raw.to_string(),
            };

            let cell = decode_cell(raw, bound.rule).ok_or_else(err)?;
            match (bound.field, cell) {
                (_, Cell::Empty) => {}
                (PriceField::Date, Cell::Date(d)) => date = Some(d),
                (PriceField::Open, Cell::Float(v)) => point.open = Some(v),
                (PriceField::High, Cell::Float(v)) => point.high = Some(v),
                (PriceField::Low, Cell::Float(v)) => point.low = Some(v),
                (PriceField::Vwap, Cell::Float(v)) => point.vwap = Some(v),
                (PriceField::Close, Cell::Float(v)) if v > 0.0 => close = Some(v),
                (PriceField::Volume, Cell::Integer(v)) => volume = Some(v),
                _ => return Err(err()),
            }
        }

        point.date = date.ok_or_else(|| self.missing(record, PriceField::Date))?;
        point.close = close.ok_or_else(|| self.missing(record, PriceField::Close))?;
        point.volume = volume.ok_or_else(|| self.missing(record, PriceField::Volume))?;

        point.extra = self
            .text
            .iter()
            .map(|(i, name)| (name.clone(), record.get(*i).unwrap_or("").to_string()))
            .collect::<BTreeMap<_, _>>();

        Ok(point)
    }

    fn missing(&self, record: &StringRecord, field: PriceField) -> FieldError {
        let bound = self.typed.iter().find(|b| b.field == field);
        FieldError {
            field: bound.map(|b| b.header.clone()).unwrap_or_default(),
            value: bound
                .and_then(|b| record.get(b.index))
                .unwrap_or("")
                .to_string(),
        }
    }
}

fn decode_cell(raw: &str, rule: DecodeRule) -> Option<Cell> {
    if raw.is_empty() {
        return Some(Cell::Empty);
    }
    match rule {
        DecodeRule::Date => parse_date(raw).map(Cell::Date),
        DecodeRule::Float => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(Cell::Float),
        DecodeRule::Integer => parse_integer(raw).map(Cell::Integer),
        DecodeRule::Text => Some(Cell::Empty),
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    // Timestamps such as "2024-01-05 00:00:00" keep only the date part
    let raw = raw.split(' ').next().unwrap_or(raw);
    let raw = match raw.as_bytes().get(10) {
        Some(b'T') => &raw[..10],
        _ => raw,
    };
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

fn parse_integer(raw: &str) -> Option<u64> {
    if let Ok(v) = raw.parse::<u64>() {
        return Some(v);
    }
    // Exports sometimes write integral volumes as "1234.0"
    let v = raw.parse::<f64>().ok()?;
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= u64::MAX as f64).then_some(v as u64)
}
