use crate::config::SearchVariables;
use crate::listing_source::{ListingSource, SourceError};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tracing::info;

/// Replays a saved dataset export instead of running the scraper.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ListingSource for FileSource {
    fn fetch_listings(&self, _search: &SearchVariables) -> Result<Value, SourceError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| SourceError::IoError(format!("{}: {e}", self.path.display())))?;
        let data: Value =
            serde_json::from_str(&text).map_err(|e| SourceError::JsonParse(e.to_string()))?;
        info!("Loaded listings from {}", self.path.display());
        Ok(data)
    }
}
