use crate::{
    error::Result,
    models::Symbol,
    utils::Logger,
};
use std::{collections::BTreeSet, fs, path::PathBuf};

/// Lists symbols by scanning the data directory for `<symbol>.csv` files.
/// Every call re-reads the directory.
#[derive(Debug, Clone)]
pub struct StockCatalog {
    data_dir: PathBuf,
    logger: Logger,
}

impl StockCatalog {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            logger: Logger::new("CATALOG"),
        }
    }

    /// Sorted, de-duplicated symbols. An unreadable directory is an error,
    /// not an empty list.
    pub fn list_symbols(&self) -> Result<BTreeSet<Symbol>> {
        let mut symbols = BTreeSet::new();

        for entry in fs::read_dir(&self.data_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() && !entry.path().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                self.logger.debug(&format!("Skipping non UTF-8 file name {:?}", entry.file_name()));
                continue;
            };
            if let Some(symbol) = Symbol::from_file_name(&name) {
                symbols.insert(symbol);
            }
        }

        self.logger.debug(&format!(
            "Found {} symbols in {}",
            symbols.len(),
            self.data_dir.display()
        ));
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StockError;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_lists_only_csv_files() {
        let dir = tempdir().unwrap();
        for name in ["RELIANCE.csv", "TCS.csv", "notes.txt", "INFY.CSV", "README.md", " WIPRO .csv"] {
            fs::write(dir.path().join(name), "Date,Close,Volume\n").unwrap();
        }
        fs::create_dir(dir.path().join("archive.csv")).unwrap();

        let catalog = StockCatalog::new(dir.path());
        let symbols: Vec<String> = catalog
            .list_symbols()
            .unwrap()
            .into_iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(symbols, vec!["RELIANCE", "TCS"]);
    }

    #[test]
    fn test_listing_is_stable() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("HDFC.csv"), "").unwrap();
        fs::write(dir.path().join("ITC.csv"), "").unwrap();

        let catalog = StockCatalog::new(dir.path());
        let first = catalog.list_symbols().unwrap();
        let second = catalog.list_symbols().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);

        fs::write(dir.path().join("WIPRO.csv"), "").unwrap();
        assert_eq!(catalog.list_symbols().unwrap().len(), 3);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let catalog = StockCatalog::new(dir.path().join("does-not-exist"));
        assert!(matches!(catalog.list_symbols(), Err(StockError::Io(_))));
    }
}
