use crate::error::{Result, StockError};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DATA_FILE_EXTENSION: &str = "csv";

/// Ticker identifier, one per backing `<symbol>.csv` file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    /// Accepts names that stay inside the data directory once joined to it.
    /// Anything else cannot have a backing file and is reported as not found.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StockError::Validation("Stock symbol required".to_string()));
        }

        let escapes_dir = trimmed.contains(['/', '\\', '\0'])
            || trimmed.starts_with('.')
            || trimmed.contains("..");
        if escapes_dir {
            return Err(StockError::not_found(trimmed));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Symbol for a directory entry, `None` unless it is a `.csv` file name.
    /// A stem with surrounding whitespace is skipped: its symbol would name a
    /// different file than the one listed.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let stem = file_name.strip_suffix(".csv")?;
        if stem != stem.trim() {
            return None;
        }
        Self::parse(stem).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, DATA_FILE_EXTENSION)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbol() {
        assert_eq!(Symbol::parse(" RELIANCE ").unwrap().as_str(), "RELIANCE");
        assert_eq!(Symbol::parse("M&M").unwrap().file_name(), "M&M.csv");
        assert!(matches!(Symbol::parse(""), Err(StockError::Validation(_))));
        assert!(matches!(Symbol::parse("   "), Err(StockError::Validation(_))));
    }

    #[test]
    fn test_path_like_symbols_are_not_found() {
        for raw in ["../secrets", "a/b", "a\\b", ".hidden", "x..y"] {
            assert!(
                matches!(Symbol::parse(raw), Err(StockError::NotFound { .. })),
                "{raw} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_file_name() {
        assert_eq!(Symbol::from_file_name("TCS.csv").unwrap().as_str(), "TCS");
        assert!(Symbol::from_file_name("TCS.CSV").is_none());
        assert!(Symbol::from_file_name("notes.txt").is_none());
        assert!(Symbol::from_file_name(".csv").is_none());
        assert!(Symbol::from_file_name(" TCS .csv").is_none());
        assert!(Symbol::from_file_name("TCS\t.csv").is_none());
    }
}
