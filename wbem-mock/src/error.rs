//! Error taxonomy for CIM operations and provider registration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// CIM status codes (DSP0200) reported by the mock server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CimStatus {
    Failed,
    InvalidNamespace,
    InvalidParameter,
    InvalidClass,
    NotFound,
    NotSupported,
    ClassHasChildren,
    ClassHasInstances,
    InvalidSuperclass,
    AlreadyExists,
    QueryLanguageNotSupported,
    InvalidQuery,
    MethodNotFound,
    NamespaceNotEmpty,
    InvalidEnumerationContext,
}

impl CimStatus {
    /// Numeric status code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Failed => 1,
            Self::InvalidNamespace => 3,
            Self::InvalidParameter => 4,
            Self::InvalidClass => 5,
            Self::NotFound => 6,
            Self::NotSupported => 7,
            Self::ClassHasChildren => 8,
            Self::ClassHasInstances => 9,
            Self::InvalidSuperclass => 10,
            Self::AlreadyExists => 11,
            Self::QueryLanguageNotSupported => 14,
            Self::InvalidQuery => 15,
            Self::MethodNotFound => 17,
            Self::NamespaceNotEmpty => 20,
            Self::InvalidEnumerationContext => 21,
        }
    }

    /// Symbolic name, e.g. `CIM_ERR_NOT_FOUND`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Failed => "CIM_ERR_FAILED",
            Self::InvalidNamespace => "CIM_ERR_INVALID_NAMESPACE",
            Self::InvalidParameter => "CIM_ERR_INVALID_PARAMETER",
            Self::InvalidClass => "CIM_ERR_INVALID_CLASS",
            Self::NotFound => "CIM_ERR_NOT_FOUND",
            Self::NotSupported => "CIM_ERR_NOT_SUPPORTED",
            Self::ClassHasChildren => "CIM_ERR_CLASS_HAS_CHILDREN",
            Self::ClassHasInstances => "CIM_ERR_CLASS_HAS_INSTANCES",
            Self::InvalidSuperclass => "CIM_ERR_INVALID_SUPERCLASS",
            Self::AlreadyExists => "CIM_ERR_ALREADY_EXISTS",
            Self::QueryLanguageNotSupported => "CIM_ERR_QUERY_LANGUAGE_NOT_SUPPORTED",
            Self::InvalidQuery => "CIM_ERR_INVALID_QUERY",
            Self::MethodNotFound => "CIM_ERR_METHOD_NOT_FOUND",
            Self::NamespaceNotEmpty => "CIM_ERR_NAMESPACE_NOT_EMPTY",
            Self::InvalidEnumerationContext => "CIM_ERR_INVALID_ENUMERATION_CONTEXT",
        }
    }
}

impl fmt::Display for CimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

/// Failure of a CIM operation: a status plus a message naming the
/// offending namespace, class, instance or parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {message}")]
pub struct CimError {
    pub status: CimStatus,
    pub message: String,
}

impl CimError {
    pub fn new(status: CimStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::new(CimStatus::Failed, message)
    }

    pub fn invalid_namespace(message: impl Into<String>) -> Self {
        Self::new(CimStatus::InvalidNamespace, message)
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(CimStatus::InvalidParameter, message)
    }

    pub fn invalid_class(message: impl Into<String>) -> Self {
        Self::new(CimStatus::InvalidClass, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(CimStatus::NotFound, message)
    }

    pub fn not_supported(message: impl Into<String>) -> Self {
        Self::new(CimStatus::NotSupported, message)
    }

    pub fn class_has_children(message: impl Into<String>) -> Self {
        Self::new(CimStatus::ClassHasChildren, message)
    }

    pub fn class_has_instances(message: impl Into<String>) -> Self {
        Self::new(CimStatus::ClassHasInstances, message)
    }

    pub fn invalid_superclass(message: impl Into<String>) -> Self {
        Self::new(CimStatus::InvalidSuperclass, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(CimStatus::AlreadyExists, message)
    }

    pub fn query_language_not_supported(message: impl Into<String>) -> Self {
        Self::new(CimStatus::QueryLanguageNotSupported, message)
    }

    pub fn invalid_query(message: impl Into<String>) -> Self {
        Self::new(CimStatus::InvalidQuery, message)
    }

    pub fn method_not_found(message: impl Into<String>) -> Self {
        Self::new(CimStatus::MethodNotFound, message)
    }

    pub fn namespace_not_empty(message: impl Into<String>) -> Self {
        Self::new(CimStatus::NamespaceNotEmpty, message)
    }

    pub fn invalid_enumeration_context(message: impl Into<String>) -> Self {
        Self::new(CimStatus::InvalidEnumerationContext, message)
    }
}

/// Result type for CIM operations.
pub type Result<T> = std::result::Result<T, CimError>;

/// Errors from registering a user provider.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The provider declares a type that does not match its capability
    #[error("Provider for {classnames:?} declares type {declared} but implements {actual}")]
    TypeMismatch {
        classnames: Vec<String>,
        declared: String,
        actual: String,
    },

    /// The provider names no classes
    #[error("Provider declares no classnames")]
    NoClassnames,

    /// A target namespace does not exist
    #[error("Namespace {0} does not exist; add it before registering providers")]
    NamespaceNotFound(String),

    /// A target class does not exist and no class source supplies it
    #[error("Class {classname} does not exist in namespace {namespace}")]
    ClassNotFound { namespace: String, classname: String },

    /// Setting up classes or running the post-registration hook failed
    #[error("Provider setup failed: {0}")]
    Setup(#[from] CimError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(CimStatus::NotFound.code(), 6);
        assert_eq!(CimStatus::InvalidEnumerationContext.code(), 21);
        assert_eq!(CimStatus::NamespaceNotEmpty.as_str(), "CIM_ERR_NAMESPACE_NOT_EMPTY");
    }

    #[test]
    fn test_error_display() {
        let err = CimError::invalid_class("Class CIM_Foo not found in namespace root/cimv2");
        assert_eq!(err.status, CimStatus::InvalidClass);
        assert_eq!(
            err.to_string(),
            "CIM_ERR_INVALID_CLASS (5): Class CIM_Foo not found in namespace root/cimv2"
        );
    }
}
