//! CIM object model
//!
//! Typed representations of the objects a WBEM server manages:
//!
//! - **Classes** with properties, methods and qualifiers
//! - **Instances** and their paths (creation class plus key bindings)
//! - **Qualifier declarations** with scopes and flavors
//! - **Values** for every CIM data type, including references and
//!   embedded objects
//!
//! CIM names compare case-insensitively; [`NocaseMap`] keeps insertion
//! order and original case while looking entries up without case.
//!
//! The [`InMemoryRepository`] holds one [`NamespaceStores`] per namespace,
//! each a set of [`InMemoryObjectStore`]s for classes, instances and
//! qualifier declarations.

pub mod class;
pub mod error;
pub mod instance;
pub mod method;
pub mod nocase;
pub mod path;
pub mod property;
pub mod qualifier;
pub mod repository;
pub mod store;
pub mod types;

pub use class::CimClass;
pub use error::{ModelError, StoreError};
pub use instance::CimInstance;
pub use method::{CimMethod, CimParamValue, CimParameter};
pub use nocase::NocaseMap;
pub use path::{CimClassName, CimInstanceName, CimObjectName};
pub use property::CimProperty;
pub use qualifier::{CimQualifier, CimQualifierDeclaration, QUALIFIER_SCOPES};
pub use repository::{normalize_namespace, InMemoryRepository, NamespaceStores};
pub use store::{InMemoryObjectStore, StoreKey};
pub use types::{CimDateTime, CimType, CimValue, EmbeddedObject};
