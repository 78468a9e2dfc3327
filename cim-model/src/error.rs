//! Error types for cim-model

use thiserror::Error;

/// Errors from building model objects.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Key property {property} of class {classname} has no value")]
    MissingKeyProperty { classname: String, property: String },
}

/// Raw signals from the object store. Callers translate these into
/// operation-level errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Object not found: {key}")]
    NotFound { key: String },

    #[error("Object already exists: {key}")]
    AlreadyExists { key: String },

    #[error("Namespace not found: {0}")]
    NamespaceNotFound(String),

    #[error("Namespace already exists: {0}")]
    NamespaceAlreadyExists(String),
}
