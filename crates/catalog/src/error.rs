/// All errors that can be returned by an [`crate::AsdpCatalog`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No ASDP with the given id exists.
    #[error("data product not found: {id}")]
    NotFound { id: i64 },

    /// `update_metadata` targeted a field the ASDP does not carry.
    #[error("data product {id} has no metadata field '{field}'")]
    UnknownField { id: i64, field: String },

    /// A backend-specific error (I/O, serialization, connection, ...).
    #[error("catalog backend error: {0}")]
    Backend(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> CatalogError {
        CatalogError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> CatalogError {
        CatalogError::Backend(err.to_string())
    }
}
