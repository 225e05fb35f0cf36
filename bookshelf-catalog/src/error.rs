//! Domain errors for catalog operations.

use bookshelf::error::DocumentStoreError;
use thiserror::Error;

/// Errors returned by the catalog services.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A single looked-up item does not exist.
    #[error("{entity} with id {id} not found!")]
    NotFound { entity: &'static str, id: String },

    /// Input failed validation or could not be interpreted.
    #[error("{0}")]
    Validation(String),

    /// The document store failed.
    #[error("Store error: {0}")]
    Store(DocumentStoreError),
}

impl CatalogError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<DocumentStoreError> for CatalogError {
    fn from(err: DocumentStoreError) -> Self {
        match err {
            DocumentStoreError::DocumentNotFound(id, _) => Self::NotFound { entity: "Document", id },
            DocumentStoreError::InvalidDocument(message)
            | DocumentStoreError::InvalidQuery(message)
            | DocumentStoreError::Serialization(message) => Self::Validation(message),
            other => Self::Store(other),
        }
    }
}

impl From<bson::error::Error> for CatalogError {
    fn from(err: bson::error::Error) -> Self {
        DocumentStoreError::from(err).into()
    }
}

/// Result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = CatalogError::not_found("User", "42");
        assert_eq!(err.to_string(), "User with id 42 not found!");
    }

    #[test]
    fn test_store_error_mapping() {
        assert!(matches!(
            CatalogError::from(DocumentStoreError::InvalidQuery("bad".into())),
            CatalogError::Validation(_)
        ));
        assert!(matches!(
            CatalogError::from(DocumentStoreError::DocumentNotFound("1".into(), "books".into())),
            CatalogError::NotFound { .. }
        ));
        assert!(matches!(
            CatalogError::from(DocumentStoreError::Backend("down".into())),
            CatalogError::Store(_)
        ));
    }
}
