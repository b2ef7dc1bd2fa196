/// Error types for the geostat core library
use thiserror::Error;

/// Main error type for geostat operations
#[derive(Error, Debug)]
pub enum GeostatError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    /// The statistics API answered with a non-success status
    #[error("Unexpected status {status} for {url}")]
    BadStatus { status: u16, url: String },

    /// Response body was not valid JSON
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Payload parsed but lacks the expected nested fields
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Catalog group or chart id does not exist
    #[error("Catalog entry not found: {0}")]
    CatalogNotFound(String),

    /// Language code other than `ge` / `en`
    #[error("Unknown language code: {0}")]
    UnknownLanguage(String),

    /// Configuration value could not be used
    #[error("Invalid configuration: {0}")]
    Config(String),
}

#[cfg(feature = "api")]
impl From<reqwest::Error> for GeostatError {
    fn from(e: reqwest::Error) -> Self {
        GeostatError::HttpRequest(e.to_string())
    }
}

/// Type alias for Results using GeostatError
pub type Result<T> = std::result::Result<T, GeostatError>;
