use crate::{error::Result, utils::Logger};
use std::{collections::BTreeMap, path::PathBuf};

const SYMBOL_COLUMN: &str = "Scrip";
const NAME_COLUMN: &str = "Company Name";

/// Symbol -> company name lookup read from an exchange listing CSV
/// (`Scrip,Company Name`).
#[derive(Debug, Clone)]
pub struct CompanyDirectory {
    path: Option<PathBuf>,
    logger: Logger,
}

impl CompanyDirectory {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            logger: Logger::new("COMPANIES"),
        }
    }

    /// Read the listing. Without a configured file the map is empty.
    pub fn load(&self) -> Result<BTreeMap<String, String>> {
        let Some(path) = &self.path else {
            return Ok(BTreeMap::new());
        };

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        let symbol_idx = headers.iter().position(|h| h.trim() == SYMBOL_COLUMN);
        let name_idx = headers.iter().position(|h| h.trim() == NAME_COLUMN);
        // Some exports quote the whole header into one column
        let combined_idx = headers
            .iter()
            .position(|h| h.trim() == format!("{SYMBOL_COLUMN},{NAME_COLUMN}"));

        let mut companies = BTreeMap::new();
        for record in reader.records() {
            let record = record?;
            let pair = match (symbol_idx, name_idx, combined_idx) {
                (Some(s), Some(n), _) => record.get(s).zip(record.get(n)),
                (_, _, Some(c)) => record.get(c).and_then(|cell| cell.split_once(',')),
                _ => None,
            };

            if let Some((symbol, name)) = pair {
                let (symbol, name) = (symbol.trim(), name.trim());
                if !symbol.is_empty() && !name.is_empty() {
                    companies.insert(symbol.to_string(), name.to_string());
                }
            }
        }

        self.logger.info(&format!(
            "Loaded {} company names from {}",
            companies.len(),
            path.display()
        ));
        Ok(companies)
    }
}
