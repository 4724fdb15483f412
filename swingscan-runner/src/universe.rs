//! Symbol universe handling.
//!
//! A universe file is a CSV with a `symbol` column (other columns are
//! ignored, so an index constituents dump works as-is). Without a file the
//! scanner falls back to a small built-in list of liquid large caps.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Fallback universe when no file is configured.
pub const DEFAULT_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "JPM", "XOM", "UNH",
];

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("cannot read universe file {path}: {source}")]
    Csv {
        path: PathBuf,
        source: csv::Error,
    },
    #[error("universe file {path} has no `symbol` column")]
    NoSymbolColumn { path: PathBuf },
    #[error("universe file {path} lists no symbols")]
    Empty { path: PathBuf },
}

/// Load the symbol list, or the built-in default when no file is given.
/// Symbols are uppercased and deduplicated, keeping first-seen order.
pub fn load_universe(path: Option<&Path>) -> Result<Vec<String>, UniverseError> {
    let path = match path {
        Some(p) => p,
        None => {
            return Ok(DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect());
        }
    };

    let mut reader = csv::Reader::from_path(path).map_err(|source| UniverseError::Csv {
        path: path.to_path_buf(),
        source,
    })?;

    let headers = reader.headers().map_err(|source| UniverseError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let column = headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("symbol"))
        .ok_or_else(|| UniverseError::NoSymbolColumn {
            path: path.to_path_buf(),
        })?;

    let mut symbols: Vec<String> = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| UniverseError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(raw) = record.get(column) {
            let symbol = raw.trim().to_ascii_uppercase();
            if !symbol.is_empty() && !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
    }

    if symbols.is_empty() {
        return Err(UniverseError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(symbols)
}
