use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Listing source configuration error: {0}")]
    Config(String),

    #[error("Listing API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("JSON parse error: {0}")]
    JsonParse(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("no listings returned")]
    NoListings,
}
