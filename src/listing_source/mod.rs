mod apify;
mod file_source;
mod source_error;

pub use apify::ApifyClient;
pub use file_source::FileSource;
pub use source_error::SourceError;

use crate::config::SearchVariables;
use serde_json::Value;

/// Where raw listings come from. Implementations return the scraped records
/// untouched; shape validation happens in the cleaning pipeline.
pub trait ListingSource: Send + Sync {
    fn fetch_listings(&self, search: &SearchVariables) -> Result<Value, SourceError>;
}
