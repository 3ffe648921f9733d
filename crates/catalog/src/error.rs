use thiserror::Error;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Errors that can occur while loading or decoding a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The payload is not valid JSON
    #[error("Catalog parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// The payload is JSON but not an array of records
    #[error("Catalog must be a JSON array of records, got {0}")]
    NotAnArray(String),

    /// IO error occurred while reading the catalog
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// A single record could not be decoded
    #[error("Invalid record at index {index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Unknown facet name
    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    /// Unknown tier name
    #[error("Unknown tier: {0}")]
    UnknownTier(String),
}

impl CatalogError {
    /// Create an invalid record error
    pub fn invalid_record(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }
}
