// errors.rs
use crate::cleaning::CleaningError;
use crate::config::ConfigError;
use crate::listing_source::SourceError;
use thiserror::Error;

/// Errors originating from either the server logic
/// (routing, missing resources, etc.) or downstream layers (DB, cleaning, export).
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Database Error: {0}")]
    DbError(String),

    #[error("Spreadsheet Error: {0}")]
    XlsxError(String),

    #[error("CSV Error: {0}")]
    CsvError(String),

    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    #[error("Listing Source Error: {0}")]
    Source(#[from] SourceError),

    #[error("Cleaning Error: {0}")]
    Cleaning(#[from] CleaningError),

    #[error("Internal Server Error")]
    InternalError,
}

impl ServerError {
    pub fn status(&self) -> u16 {
        match self {
            ServerError::NotFound => 404,
            ServerError::BadRequest(_) => 400,
            ServerError::Config(ConfigError::Invalid(_)) => 400,
            _ => 500,
        }
    }
}
