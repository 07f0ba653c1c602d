use thiserror::Error;

#[derive(Debug, Error)]
pub enum CleaningError {
    /// A review has no `createdAt` value.
    #[error("review is missing its createdAt timestamp")]
    MissingTimestamp,

    /// A review's `createdAt` is not an ISO 8601 UTC timestamp.
    #[error("invalid review timestamp {value:?}: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// One listing could not be read as a listing record.
    #[error("malformed listing: {0}")]
    MalformedListing(#[from] serde_json::Error),

    /// The run's input is not a sequence of mappings. Fatal for the whole run.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
