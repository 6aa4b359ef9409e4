use crate::{
    config::ServiceConfig,
    error::{Result, StockError},
    models::{CsvSchema, History, HistorySummary, PricePoint, Symbol},
    utils::{Logger, Timer},
};
use std::{fs::File, io, path::Path};

/// Reads a symbol's CSV file into typed points and derives its summary.
/// Nothing is cached: each call opens and parses the file again.
#[derive(Debug, Clone)]
pub struct HistoryReader {
    config: ServiceConfig,
    schema: CsvSchema,
    logger: Logger,
}

impl HistoryReader {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            config,
            schema: CsvSchema::price_history(),
            logger: Logger::new("HISTORY"),
        }
    }

    /// Configured window size
    pub fn default_window(&self) -> usize {
        self.config.window_size
    }

    /// The last `window_size` rows, most recent first, with the summary of
    /// the two most recent rows.
    pub fn load_recent_history(&self, symbol: &Symbol, window_size: usize) -> Result<History> {
        let timer = Timer::start(&format!("{symbol} history load"));
        let path = self.config.data_file(symbol)?;

        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.logger.debug(&format!("No data file at {}", path.display()));
                return Err(StockError::not_found(symbol.as_str()));
            }
            Err(e) => return Err(e.into()),
        };
        if !path.is_file() {
            return Err(StockError::not_found(symbol.as_str()));
        }

        let rows = self.read_points(file, &path)?;
        let total = rows.len();
        let points = recent_window(rows, window_size);
        let summary = HistorySummary::from_points(symbol.as_str(), &points)?;

        self.logger.info(&format!(
            "Loaded {}: {} of {} rows, latest close {}, day change {}%",
            symbol,
            points.len(),
            total,
            summary.latest_close,
            summary.day_change_percent
        ));
        timer.log_elapsed(self.logger.context());

        Ok(History {
            symbol: symbol.to_string(),
            points,
            summary,
        })
    }

    /// Parse every data row in file order
    fn read_points<R: io::Read>(&self, source: R, path: &Path) -> Result<Vec<PricePoint>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        let bound = self.schema.bind(&headers).map_err(|reason| StockError::Schema {
            path: path.to_path_buf(),
            reason,
        })?;

        let mut points = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|cell| cell.trim().is_empty()) {
                continue;
            }
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let point = bound.decode(&record).map_err(|e| StockError::MalformedRow {
                path: path.to_path_buf(),
                line,
                field: e.field,
                value: e.value,
            })?;
            points.push(point);
        }

        Ok(points)
    }
}

/// Keep the last `window_size` rows of a chronological series and reverse
/// them so index 0 is the most recent.
pub fn recent_window(mut rows: Vec<PricePoint>, window_size: usize) -> Vec<PricePoint> {
    let start = rows.len().saturating_sub(window_size);
    let mut window = rows.split_off(start);
    window.reverse();
    window
}
